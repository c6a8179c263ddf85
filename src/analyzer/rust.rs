use anyhow::{Context, Result};
use toml::{Table, Value};
use tracing::debug;

use super::{matches, parse_with, toml_doc, ManifestParser};
use crate::models::{
    DependencyType, Ecosystem, Package, ParseResult, ANY_VERSION, SOURCE_GIT, SOURCE_PATH, SOURCE_WORKSPACE,
};

/// Cargo dependency tables and the bucket each one feeds.
const CARGO_SECTIONS: &[(&str, DependencyType)] = &[
    ("dependencies", DependencyType::Dependencies),
    ("dev-dependencies", DependencyType::DevDependencies),
    ("build-dependencies", DependencyType::BuildDependencies),
];

/// Parser for `Cargo.toml` manifests, including workspace roots and
/// `[target.'cfg(..)'.*dependencies]` tables.
pub struct CargoTomlParser;

impl CargoTomlParser {
    /// Create a new `CargoTomlParser`.
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for CargoTomlParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rust
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["Cargo.toml"]
    }

    fn can_parse(&self, content: &str) -> bool {
        matches(
            r"(?m)^\s*\[(package|workspace|dependencies|dev-dependencies|build-dependencies|workspace\.dependencies)\]\s*$",
            content,
        )
    }

    fn parse(&self, content: &str) -> ParseResult {
        parse_with(self.ecosystem(), self.file_type(), content, parse_cargo_toml)
    }
}

fn parse_cargo_toml(content: &str, result: &mut ParseResult) -> Result<()> {
    let (doc, decoded) = toml_doc::decode(content);

    // Workspace-only manifests have no [package]; `version.workspace = true` is not a string.
    if let Some(package) = doc.get("package").and_then(Value::as_table) {
        result.project_name = package.get("name").and_then(Value::as_str).map(str::to_string);
        result.project_version = package.get("version").and_then(Value::as_str).map(str::to_string);
    }

    push_sections(result, &doc);

    if let Some(workspace_deps) = doc
        .get("workspace")
        .and_then(|w| w.get("dependencies"))
        .and_then(Value::as_table)
    {
        push_table(result, workspace_deps, DependencyType::Dependencies);
    }

    if let Some(targets) = doc.get("target").and_then(Value::as_table) {
        for (cfg, target) in targets {
            if let Some(target) = target.as_table() {
                debug!(target = cfg.as_str(), "reading target-specific dependencies");
                push_sections(result, target);
            }
        }
    }

    decoded.context("invalid TOML")
}

fn push_sections(result: &mut ParseResult, table: &Table) {
    for (section, dep_type) in CARGO_SECTIONS {
        if let Some(deps) = table.get(*section).and_then(Value::as_table) {
            push_table(result, deps, *dep_type);
        }
    }
}

fn push_table(result: &mut ParseResult, deps: &Table, dep_type: DependencyType) {
    for (name, spec) in deps {
        match cargo_dependency(name, spec, dep_type) {
            Some(package) => {
                result.push_package(package);
            }
            None => debug!(name = name.as_str(), "unsupported dependency value"),
        }
    }
}

/// `serde = "1.0"` or `serde = { version = "1.0", features = ["derive"] }`.
fn cargo_dependency(name: &str, spec: &Value, dep_type: DependencyType) -> Option<Package> {
    match spec {
        Value::String(version) => Some(Package::new(name, version.as_str(), dep_type)),
        Value::Table(table) => {
            let version = table
                .get("version")
                .and_then(Value::as_str)
                .unwrap_or(ANY_VERSION);

            let features = table
                .get("features")
                .and_then(Value::as_array)
                .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default();

            let optional = table.get("optional").and_then(Value::as_bool).unwrap_or(false);
            let dep_type = if optional && dep_type == DependencyType::Dependencies {
                DependencyType::OptionalDependencies
            } else {
                dep_type
            };

            let package = Package::new(name, version, dep_type).with_extras(features);
            let package = if table.get("workspace").and_then(Value::as_bool).unwrap_or(false) {
                package.with_source(SOURCE_WORKSPACE)
            } else if table.contains_key("git") {
                package.with_source(SOURCE_GIT)
            } else if table.contains_key("path") {
                package.with_source(SOURCE_PATH)
            } else if let Some(registry) = table.get("registry").and_then(Value::as_str) {
                package.with_source(registry)
            } else {
                package
            };
            Some(package)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARGO_TOML: &str = r#"
[package]
name = "my-service"
version = "0.3.1"
edition = "2021"

[dependencies]
serde = { version = "1.0", features = ["derive"] }
tokio = { version = "1", features = ["full"], optional = true }
regex = "1.5.4"
shared = { path = "../shared" }
failure = "0.1"

[dev-dependencies]
tempfile = "3"

[build-dependencies]
cc = "1.0"

[target.'cfg(windows)'.dependencies]
winapi = "0.3"
"#;

    #[test]
    fn test_parse_cargo_toml() {
        let result = CargoTomlParser::new().parse(CARGO_TOML);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.project_name.as_deref(), Some("my-service"));
        assert_eq!(result.project_version.as_deref(), Some("0.3.1"));
        assert_eq!(result.count_of(DependencyType::Dependencies), 5);
        assert_eq!(result.count_of(DependencyType::OptionalDependencies), 1);
        assert_eq!(result.count_of(DependencyType::DevDependencies), 1);
        assert_eq!(result.count_of(DependencyType::BuildDependencies), 1);

        let serde = result.packages.iter().find(|p| p.name == "serde").unwrap();
        assert_eq!(serde.extras, vec!["derive"]);
        let shared = result.packages.iter().find(|p| p.name == "shared").unwrap();
        assert!(shared.is_local());
    }

    #[test]
    fn test_workspace_manifest() {
        let content = r#"
[workspace]
members = ["crates/*"]

[workspace.dependencies]
anyhow = "1"

[dependencies]
log = "0.4"
"#;
        let result = CargoTomlParser::new().parse(content);
        assert!(result.project_name.is_none());
        let names: Vec<&str> = result.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["log", "anyhow"]);
    }

    #[test]
    fn test_workspace_inherited_dependency_is_local() {
        let content = "[package]\nname = \"m\"\nversion.workspace = true\n\n[dependencies]\nserde = { workspace = true }\n";
        let result = CargoTomlParser::new().parse(content);
        assert!(result.project_version.is_none());
        assert!(result.packages[0].is_local());
    }

    #[test]
    fn test_truncated_manifest_keeps_complete_entries() {
        let truncated = "[package]\nname = \"gateway\"\nversion = \"0.9.0\"\n\n[dependencies]\nhyper = \"0.14.2\"\nfailure = \"0.1.8\"\nserde = { version = \"1\", feat";
        let result = CargoTomlParser::new().parse(truncated);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Error parsing Cargo.toml"));
        assert_eq!(result.project_name.as_deref(), Some("gateway"));

        let mut names: Vec<&str> = result.packages.iter().map(|p| p.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["failure", "hyper"]);
    }

    #[test]
    fn test_broken_section_does_not_hide_later_ones() {
        let content = "[dependencies]\nregex = \"1.5.4\"\nbad = = \"1\"\n\n[dev-dependencies]\ntempdir = \"0.3\"\n";
        let result = CargoTomlParser::new().parse(content);
        assert_eq!(result.errors.len(), 1);
        assert!(result.packages.iter().any(|p| p.name == "regex"));
        let tempdir = result.packages.iter().find(|p| p.name == "tempdir").unwrap();
        assert_eq!(tempdir.dep_type, DependencyType::DevDependencies);
    }

    #[test]
    fn test_detection() {
        let parser = CargoTomlParser::new();
        assert!(parser.can_parse(CARGO_TOML));
        assert!(!parser.can_parse("[[package]]\nname = \"x\"\n"));
        assert!(!parser.can_parse("[project]\nname = \"x\"\n"));
    }
}
