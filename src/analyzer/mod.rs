use anyhow::Result;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::{AnalysisResult, AuditOptions, Ecosystem, ParseResult};
use crate::rules;

pub mod cpp;
pub mod dotnet;
pub mod go;
pub mod lua;
pub mod node;
pub mod pyproject;
pub mod python;
pub mod ruby;
pub mod rust;
pub mod typescript;
pub mod uv;
mod toml_doc;
pub mod yarn;

/// One manifest/lockfile format.
///
/// Detection must be cheap and must never panic; parsing never fails outright and
/// reports trouble through [`ParseResult::errors`] instead.
pub trait ManifestParser: Send + Sync {
    fn ecosystem(&self) -> Ecosystem;

    /// Recognized file-type names. The first entry is the canonical one.
    fn file_types(&self) -> &'static [&'static str];

    fn can_parse(&self, content: &str) -> bool;

    fn parse(&self, content: &str) -> ParseResult;

    fn analyze(&self, result: &ParseResult, options: &AuditOptions) -> AnalysisResult {
        rules::analyze(result, options)
    }

    fn file_type(&self) -> &'static str {
        self.file_types().first().copied().unwrap_or("unknown")
    }
}

/// Run `extract` inside a failure boundary. Packages pushed before an error are kept.
pub(crate) fn parse_with<F>(ecosystem: Ecosystem, file_type: &str, content: &str, extract: F) -> ParseResult
where
    F: FnOnce(&str, &mut ParseResult) -> Result<()>,
{
    let mut result = ParseResult::new(ecosystem, file_type);

    if let Err(err) = extract(content, &mut result) {
        warn!(
            file_type,
            recovered = result.packages.len(),
            "parse did not complete cleanly: {err:#}"
        );
        result.errors.push(format!("Error parsing {}: {:#}", file_type, err));
    }

    debug!(file_type, packages = result.packages.len(), "parsed manifest");
    result
}

/// Decode `content` as a JSON object, or `None` for anything else.
pub(crate) fn json_object(content: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Regex test used by detectors, where a bad pattern must read as "no match".
pub(crate) fn matches(pattern: &str, content: &str) -> bool {
    Regex::new(pattern)
        .map(|re| re.is_match(content))
        .unwrap_or(false)
}

/// Collect the string entries of a JSON/TOML-ish array into owned strings.
pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DependencyType, Package};

    #[test]
    fn test_parse_with_keeps_partial_packages() {
        let result = parse_with(Ecosystem::Go, "go.mod", "", |_, result| {
            result.push_package(Package::new("a", "v1.0.0", DependencyType::Dependencies));
            anyhow::bail!("boom")
        });
        assert_eq!(result.packages.len(), 1);
        assert_eq!(result.errors, vec!["Error parsing go.mod: boom".to_string()]);
    }

    #[test]
    fn test_json_object_rejects_non_objects() {
        assert!(json_object("{\"a\": 1}").is_some());
        assert!(json_object("[1, 2]").is_none());
        assert!(json_object("{\"a\": ").is_none());
    }
}
