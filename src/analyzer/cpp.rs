use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::debug;

use super::{json_object, parse_with, ManifestParser};
use crate::models::{DependencyType, Ecosystem, Package, ParseResult, ANY_VERSION};

/// Parser for vcpkg manifest files (`vcpkg.json`).
pub struct VcpkgParser;

impl VcpkgParser {
    /// Create a new `VcpkgParser`.
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for VcpkgParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Cpp
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["vcpkg.json"]
    }

    fn can_parse(&self, content: &str) -> bool {
        let Some(json) = json_object(content) else {
            return false;
        };

        // npm buckets never appear in a vcpkg manifest.
        if ["devDependencies", "peerDependencies", "optionalDependencies"]
            .iter()
            .any(|key| json.contains_key(*key))
        {
            return false;
        }

        json.get("dependencies").is_some_and(Value::is_array)
            || json
                .get("$schema")
                .and_then(Value::as_str)
                .is_some_and(|s| s.contains("vcpkg"))
            || json.contains_key("builtin-baseline")
            || json.contains_key("version-string")
            || json.contains_key("port-version")
    }

    fn parse(&self, content: &str) -> ParseResult {
        parse_with(self.ecosystem(), self.file_type(), content, parse_vcpkg_json)
    }
}

fn parse_vcpkg_json(content: &str, result: &mut ParseResult) -> Result<()> {
    let json: Value = serde_json::from_str(content).context("invalid JSON")?;
    let Value::Object(json) = json else {
        bail!("expected a JSON object at the top level");
    };

    result.project_name = json.get("name").and_then(Value::as_str).map(str::to_string);
    result.project_version = ["version", "version-semver", "version-date", "version-string"]
        .iter()
        .find_map(|key| json.get(*key).and_then(Value::as_str))
        .map(str::to_string);

    let Some(deps) = json.get("dependencies") else {
        return Ok(());
    };
    let Some(deps) = deps.as_array() else {
        bail!("`dependencies` must be an array");
    };

    for entry in deps {
        match entry {
            Value::String(name) => {
                result.push_package(Package::new(name.clone(), ANY_VERSION, DependencyType::Dependencies));
            }
            Value::Object(obj) => {
                let Some(name) = obj.get("name").and_then(Value::as_str) else {
                    debug!("vcpkg dependency without a name skipped");
                    continue;
                };

                let version = obj
                    .get("version>=")
                    .and_then(Value::as_str)
                    .map(|v| format!(">={}", v))
                    .or_else(|| obj.get("version").and_then(Value::as_str).map(str::to_string))
                    .unwrap_or_else(|| ANY_VERSION.to_string());

                // Features are either plain names or `{ "name": ..., "platform": ... }` objects.
                let features = obj
                    .get("features")
                    .and_then(Value::as_array)
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|f| match f {
                                Value::String(s) => Some(s.clone()),
                                Value::Object(o) => o.get("name").and_then(Value::as_str).map(str::to_string),
                                _ => None,
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                let dep_type = if obj.get("host").and_then(Value::as_bool).unwrap_or(false) {
                    DependencyType::BuildDependencies
                } else {
                    DependencyType::Dependencies
                };

                result.push_package(Package::new(name, version, dep_type).with_extras(features));
            }
            other => debug!(?other, "unsupported vcpkg dependency entry"),
        }
    }

    Ok(())
}
