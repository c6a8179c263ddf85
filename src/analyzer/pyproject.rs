use anyhow::{Context, Result};
use toml::{Table, Value};
use tracing::debug;

use super::python::parse_requirement;
use super::{matches, parse_with, toml_doc, ManifestParser};
use crate::models::{DependencyType, Ecosystem, Package, ParseResult, ANY_VERSION, SOURCE_GIT, SOURCE_PATH};

/// Parser for `pyproject.toml`: PEP 621 `[project]` tables, `[build-system]`,
/// PEP 735 `[dependency-groups]` and Poetry's `[tool.poetry.*]` tables.
pub struct PyprojectParser;

impl PyprojectParser {
    /// Create a new `PyprojectParser`.
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for PyprojectParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["pyproject.toml"]
    }

    fn can_parse(&self, content: &str) -> bool {
        matches(
            r"(?m)^\s*\[(project|build-system|dependency-groups|tool\.poetry)(\.[^\]]+)?\]\s*$",
            content,
        )
    }

    fn parse(&self, content: &str) -> ParseResult {
        parse_with(self.ecosystem(), self.file_type(), content, parse_pyproject_toml)
    }
}

fn parse_pyproject_toml(content: &str, result: &mut ParseResult) -> Result<()> {
    let (doc, decoded) = toml_doc::decode(content);

    if let Some(project) = doc.get("project").and_then(Value::as_table) {
        result.project_name = project.get("name").and_then(Value::as_str).map(str::to_string);
        result.project_version = project.get("version").and_then(Value::as_str).map(str::to_string);

        push_pep508_list(result, project.get("dependencies"), DependencyType::Dependencies, None);

        if let Some(groups) = project.get("optional-dependencies").and_then(Value::as_table) {
            for (_, specs) in groups {
                push_pep508_list(result, Some(specs), DependencyType::OptionalDependencies, None);
            }
        }
    }

    if let Some(groups) = doc.get("dependency-groups").and_then(Value::as_table) {
        for (group, specs) in groups {
            push_pep508_list(result, Some(specs), DependencyType::DevDependencies, Some(group.as_str()));
        }
    }

    let build_requires = doc.get("build-system").and_then(|b| b.get("requires"));
    push_pep508_list(result, build_requires, DependencyType::BuildDependencies, None);

    if let Some(poetry) = doc.get("tool").and_then(|t| t.get("poetry")).and_then(Value::as_table) {
        parse_poetry(poetry, result);
    }

    decoded.context("invalid TOML")
}

fn push_pep508_list(result: &mut ParseResult, specs: Option<&Value>, dep_type: DependencyType, group: Option<&str>) {
    let Some(specs) = specs.and_then(Value::as_array) else {
        return;
    };

    for spec in specs.iter().filter_map(Value::as_str) {
        match parse_requirement(spec) {
            Some(req) => {
                let mut extras = req.extras;
                extras.extend(group.map(str::to_string));
                result.push_package(Package::new(req.name, req.constraint, dep_type).with_extras(extras));
            }
            None => debug!(spec, "unrecognized PEP 508 requirement"),
        }
    }
}

fn parse_poetry(poetry: &Table, result: &mut ParseResult) {
    if result.project_name.is_none() {
        result.project_name = poetry.get("name").and_then(Value::as_str).map(str::to_string);
    }
    if result.project_version.is_none() {
        result.project_version = poetry.get("version").and_then(Value::as_str).map(str::to_string);
    }

    if let Some(deps) = poetry.get("dependencies").and_then(Value::as_table) {
        push_poetry_table(result, deps, DependencyType::Dependencies, None);
    }
    if let Some(deps) = poetry.get("dev-dependencies").and_then(Value::as_table) {
        push_poetry_table(result, deps, DependencyType::DevDependencies, None);
    }
    if let Some(groups) = poetry.get("group").and_then(Value::as_table) {
        for (group, body) in groups {
            if let Some(deps) = body.get("dependencies").and_then(Value::as_table) {
                push_poetry_table(result, deps, DependencyType::DevDependencies, Some(group.as_str()));
            }
        }
    }
}

fn push_poetry_table(result: &mut ParseResult, deps: &Table, dep_type: DependencyType, group: Option<&str>) {
    for (name, spec) in deps {
        // The interpreter constraint is not a package.
        if name.eq_ignore_ascii_case("python") {
            continue;
        }

        let mut package = poetry_dependency(name, spec, dep_type);
        package.extras.extend(group.map(str::to_string));
        result.push_package(package);
    }
}

/// One Poetry dependency value: `"^2.0"`, `{ version = "^1.0", extras = [...] }`,
/// or a list of such tables for multiple constraints.
fn poetry_dependency(name: &str, spec: &Value, dep_type: DependencyType) -> Package {
    match spec {
        Value::String(version) => Package::new(name, version.as_str(), dep_type),
        Value::Table(table) => {
            let version = table
                .get("version")
                .and_then(Value::as_str)
                .unwrap_or(ANY_VERSION);
            let extras = table
                .get("extras")
                .and_then(Value::as_array)
                .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default();
            let optional = table.get("optional").and_then(Value::as_bool).unwrap_or(false);
            let dep_type = if optional && dep_type == DependencyType::Dependencies {
                DependencyType::OptionalDependencies
            } else {
                dep_type
            };

            let package = Package::new(name, version, dep_type).with_extras(extras);
            if table.contains_key("git") {
                package.with_source(SOURCE_GIT)
            } else if table.contains_key("path") {
                package.with_source(SOURCE_PATH)
            } else {
                package
            }
        }
        Value::Array(alternatives) => alternatives
            .first()
            .map(|first| poetry_dependency(name, first, dep_type))
            .unwrap_or_else(|| Package::new(name, ANY_VERSION, dep_type)),
        _ => Package::new(name, ANY_VERSION, dep_type),
    }
}
