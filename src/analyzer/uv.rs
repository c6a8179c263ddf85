use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use super::{matches, parse_with, toml_doc, ManifestParser};
use crate::models::{DependencyType, Ecosystem, Package, ParseResult, ANY_VERSION, SOURCE_GIT, SOURCE_PATH};

#[derive(Debug, Deserialize)]
struct UvLockPackage {
    /// Blocks without a name are skipped.
    name: Option<String>,
    version: Option<String>,
    #[serde(default)]
    source: Option<toml::Table>,
    #[serde(default)]
    dependencies: Vec<UvLockDependency>,
}

#[derive(Debug, Deserialize)]
struct UvLockDependency {
    name: Option<String>,
}

/// Parser for uv's `uv.lock` lockfile (`[[package]]` array of tables).
///
/// The project itself (an `editable`/`virtual` source) supplies the project identity
/// instead of becoming a package. Each package's own `dependencies` names are kept in
/// `extras`.
pub struct UvLockParser;

impl UvLockParser {
    /// Create a new `UvLockParser`.
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for UvLockParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["uv.lock"]
    }

    fn can_parse(&self, content: &str) -> bool {
        // Cargo.lock shares `[[package]]` but uses string sources and checksums.
        matches(r"(?m)^\s*\[\[package\]\]\s*$", content)
            && (content.contains("requires-python") || matches(r"(?m)^\s*source\s*=\s*\{", content))
            && !matches(r"(?m)^\s*\[(project|package|dependencies)\]\s*$", content)
    }

    fn parse(&self, content: &str) -> ParseResult {
        parse_with(self.ecosystem(), self.file_type(), content, parse_uv_lock)
    }
}

fn parse_uv_lock(content: &str, result: &mut ParseResult) -> Result<()> {
    let (doc, decoded) = toml_doc::decode(content);
    let blocks = doc.get("package").and_then(toml::Value::as_array).cloned().unwrap_or_default();

    for block in blocks {
        let pkg: UvLockPackage = match block.try_into() {
            Ok(pkg) => pkg,
            Err(err) => {
                debug!("uv.lock package block skipped: {err}");
                continue;
            }
        };
        let Some(name) = pkg.name else {
            debug!("uv.lock package block without a name skipped");
            continue;
        };
        let version = pkg.version.unwrap_or_else(|| ANY_VERSION.to_string());

        let source = pkg.source.as_ref();
        let is_project = source.is_some_and(|s| s.contains_key("editable") || s.contains_key("virtual"));
        if is_project && result.project_name.is_none() {
            result.project_name = Some(name);
            result.project_version = Some(version);
            continue;
        }

        let extras = pkg.dependencies.into_iter().filter_map(|d| d.name).collect();
        let package = Package::new(name, version, DependencyType::Dependencies).with_extras(extras);
        let package = match source {
            Some(s) if s.contains_key("git") => package.with_source(SOURCE_GIT),
            Some(s) if s.contains_key("path") || s.contains_key("directory") => package.with_source(SOURCE_PATH),
            Some(s) => match s.get("registry").and_then(toml::Value::as_str) {
                Some(registry) => package.with_source(registry),
                None => package,
            },
            None => package,
        };
        result.push_package(package);
    }

    decoded.context("invalid TOML")
}
