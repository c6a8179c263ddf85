use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

use super::{json_object, parse_with, ManifestParser};
use crate::models::{DependencyType, Ecosystem, Package, ParseResult, ANY_VERSION};

/// npm dependency buckets, in the order they are read.
const NPM_BUCKETS: &[(&str, DependencyType)] = &[
    ("dependencies", DependencyType::Dependencies),
    ("devDependencies", DependencyType::DevDependencies),
    ("peerDependencies", DependencyType::PeerDependencies),
    ("optionalDependencies", DependencyType::OptionalDependencies),
];

/// Parser for npm `package.json` manifests.
pub struct PackageJsonParser;

impl PackageJsonParser {
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for PackageJsonParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::JavaScript
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["package.json"]
    }

    fn can_parse(&self, content: &str) -> bool {
        let Some(json) = json_object(content) else {
            return false;
        };

        // tsconfig and vcpkg share the JSON grammar; their markers win.
        if json.get("compilerOptions").is_some_and(Value::is_object)
            || json.get("dependencies").is_some_and(Value::is_array)
        {
            return false;
        }

        let has_bucket = NPM_BUCKETS
            .iter()
            .any(|(key, _)| json.get(*key).is_some_and(Value::is_object));
        let has_npm_fields = ["scripts", "workspaces", "engines", "main", "module", "exports"]
            .iter()
            .any(|key| json.contains_key(*key));
        let has_identity = json.get("name").is_some_and(Value::is_string)
            && json.get("version").is_some_and(Value::is_string);

        has_bucket || has_npm_fields || has_identity
    }

    fn parse(&self, content: &str) -> ParseResult {
        parse_with(self.ecosystem(), self.file_type(), content, |content, result| {
            let json: Value = serde_json::from_str(content).context("invalid JSON")?;
            let Value::Object(map) = json else {
                bail!("expected a JSON object at the top level");
            };
            collect_npm_manifest(&map, result);
            Ok(())
        })
    }
}

/// Fill `result` from an npm-style manifest object: identity plus every bucket.
///
/// Shared with the legacy fallback, which treats any JSON object this way.
pub(crate) fn collect_npm_manifest(json: &Map<String, Value>, result: &mut ParseResult) {
    result.project_name = json.get("name").and_then(Value::as_str).map(str::to_string);
    result.project_version = json.get("version").and_then(Value::as_str).map(str::to_string);

    for (section, dep_type) in NPM_BUCKETS {
        if let Some(pkgs) = json.get(*section).and_then(Value::as_object) {
            for (name, version_range) in pkgs {
                let version = version_range
                    .as_str()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .unwrap_or(ANY_VERSION);
                result.push_package(Package::new(name.clone(), version, *dep_type));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_json() {
        let json = r#"{
  "name": "my-app",
  "version": "1.2.0",
  "dependencies": {
    "express": "^4.18.2",
    "lodash": "^4.17.21"
  },
  "devDependencies": {
    "jest": "^29.0.0"
  },
  "peerDependencies": {
    "react": ">=17"
  },
  "optionalDependencies": {
    "fsevents": ""
  }
}"#;
        let result = PackageJsonParser::new().parse(json);
        assert!(result.errors.is_empty());
        assert_eq!(result.project_name.as_deref(), Some("my-app"));
        assert_eq!(result.project_version.as_deref(), Some("1.2.0"));
        assert_eq!(result.packages.len(), 5);
        assert_eq!(result.count_of(DependencyType::Dependencies), 2);
        assert_eq!(result.packages[0].name, "express");
        assert_eq!(result.packages[0].version, "^4.18.2");
        assert_eq!(result.packages[3].dep_type, DependencyType::PeerDependencies);
        assert_eq!(result.packages[4].version, "*");
    }

    #[test]
    fn test_invalid_json_is_reported_not_raised() {
        let result = PackageJsonParser::new().parse(r#"{"dependencies": {"a": "1.0.0""#);
        assert!(result.packages.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Error parsing package.json: invalid JSON"));
    }

    #[test]
    fn test_non_object_json() {
        let result = PackageJsonParser::new().parse("[1, 2, 3]");
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_detection_markers() {
        let parser = PackageJsonParser::new();
        assert!(parser.can_parse(r#"{"dependencies": {"a": "1"}}"#));
        assert!(parser.can_parse(r#"{"name": "x", "version": "1.0.0"}"#));
        assert!(!parser.can_parse(r#"{"dependencies": ["fmt"]}"#));
        assert!(!parser.can_parse(r#"{"compilerOptions": {}, "devDependencies": {}}"#));
        assert!(!parser.can_parse(r#"{"name": "x"}"#));
        assert!(!parser.can_parse(r#"{"dependencies": {"#));
        assert!(!parser.can_parse("lodash==1.0"));
    }
}
