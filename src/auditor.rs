use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::analyzer::node::collect_npm_manifest;
use crate::analyzer::ManifestParser;
use crate::detector::ParserRegistry;
use crate::error::AuditError;
use crate::models::{AnalysisResult, AuditOptions, Ecosystem, ParseResult};
use crate::report::markdown;
use crate::rules;

/// Hint value that asks for content sniffing.
pub const AUTO_FILE_TYPE: &str = "auto";

/// One audit invocation, in the JSON shape tool wrappers pass in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_content: Option<String>,
    /// Older callers send npm manifests under this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_json_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(flatten)]
    pub options: AuditOptions,
}

impl AuditRequest {
    pub fn new(content: impl Into<String>) -> Self {
        AuditRequest {
            dependency_content: Some(content.into()),
            ..AuditRequest::default()
        }
    }

    pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    pub fn with_options(mut self, options: AuditOptions) -> Self {
        self.options = options;
        self
    }

    /// `dependencyContent` wins over `packageJsonContent`; blank text counts as absent.
    fn content(&self) -> Option<&str> {
        [&self.dependency_content, &self.package_json_content]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|c| !c.trim().is_empty())
    }
}

/// Parse and analyze the request's content with a fresh registry.
pub fn audit(request: &AuditRequest) -> Result<AnalysisResult, AuditError> {
    audit_with(&ParserRegistry::new(), request)
}

pub fn audit_with(registry: &ParserRegistry, request: &AuditRequest) -> Result<AnalysisResult, AuditError> {
    let content = request.content().ok_or(AuditError::NoContent)?;

    let Some(parser) = resolve_parser(registry, request.file_type.as_deref(), content) else {
        return legacy_fallback(registry, content, &request.options);
    };

    let parsed = parser.parse(content);
    if parsed.has_errors() {
        warn!(
            file_type = parsed.file_type.as_str(),
            errors = parsed.errors.len(),
            "manifest parsed with errors"
        );
    }
    info!(
        file_type = parsed.file_type.as_str(),
        ecosystem = parsed.ecosystem.id(),
        packages = parsed.packages.len(),
        "manifest parsed"
    );

    Ok(parser.analyze(&parsed, &request.options))
}

/// Run an audit and always return a markdown document, error reports included.
pub fn audit_dependencies(request: &AuditRequest) -> String {
    match audit(request) {
        Ok(analysis) => markdown::render(&analysis, &request.options),
        Err(err) => {
            warn!("audit failed: {err}");
            markdown::render_error(&err)
        }
    }
}

fn resolve_parser<'r>(registry: &'r ParserRegistry, hint: Option<&str>, content: &str) -> Option<&'r dyn ManifestParser> {
    match hint.map(str::trim).filter(|h| !h.is_empty()) {
        Some(hint) if hint.eq_ignore_ascii_case(AUTO_FILE_TYPE) => registry.detect(content),
        Some(hint) => match registry.by_file_type(hint) {
            Some(parser) => {
                debug!(hint, file_type = parser.file_type(), "using requested parser");
                Some(parser)
            }
            None => {
                warn!(hint, "unknown file type; falling back to content detection");
                registry.detect(content)
            }
        },
        None => registry.detect(content),
    }
}

/// Unrecognized but valid JSON is read as an npm-style manifest.
fn legacy_fallback(
    registry: &ParserRegistry,
    content: &str,
    options: &AuditOptions,
) -> Result<AnalysisResult, AuditError> {
    let Ok(json) = serde_json::from_str::<Value>(content) else {
        return Err(AuditError::UnrecognizedContent {
            supported: registry.supported_file_types(),
        });
    };

    debug!("no parser matched; reading content as a legacy npm manifest");
    let mut parsed = ParseResult::new(Ecosystem::JavaScript, "package.json");
    if let Value::Object(map) = &json {
        collect_npm_manifest(map, &mut parsed);
    }
    Ok(rules::analyze(&parsed, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_content() {
        assert_eq!(audit(&AuditRequest::default()), Err(AuditError::NoContent));
        assert_eq!(audit(&AuditRequest::new("  \n\t")), Err(AuditError::NoContent));
    }

    #[test]
    fn test_dependency_content_wins() {
        let request = AuditRequest {
            dependency_content: Some("requests==2.31.0\n".to_string()),
            package_json_content: Some(r#"{"dependencies": {"lodash": "^4.17.21"}}"#.to_string()),
            ..AuditRequest::default()
        };
        let analysis = audit(&request).unwrap();
        assert_eq!(analysis.parse_result.file_type, "requirements.txt");
    }

    #[test]
    fn test_package_json_content_used_when_primary_blank() {
        let request = AuditRequest {
            dependency_content: Some("   ".to_string()),
            package_json_content: Some(r#"{"dependencies": {"lodash": "^4.17.21"}}"#.to_string()),
            ..AuditRequest::default()
        };
        let analysis = audit(&request).unwrap();
        assert_eq!(analysis.parse_result.file_type, "package.json");
    }

    #[test]
    fn test_hint_is_case_insensitive_and_unknown_hint_sniffs() {
        let gemfile = "source 'https://rubygems.org'\ngem 'rails', '~> 7.0'\n";
        let analysis = audit(&AuditRequest::new(gemfile).with_file_type("GEMFILE")).unwrap();
        assert_eq!(analysis.parse_result.ecosystem, Ecosystem::Ruby);

        let analysis = audit(&AuditRequest::new(gemfile).with_file_type("Podfile")).unwrap();
        assert_eq!(analysis.parse_result.ecosystem, Ecosystem::Ruby);

        let analysis = audit(&AuditRequest::new(gemfile).with_file_type("auto")).unwrap();
        assert_eq!(analysis.parse_result.ecosystem, Ecosystem::Ruby);
    }

    #[test]
    fn test_legacy_fallback_for_unrecognized_json() {
        let analysis = audit(&AuditRequest::new("{}")).unwrap();
        assert_eq!(analysis.parse_result.file_type, "package.json");
        assert!(analysis.issues.is_empty());

        let analysis = audit(&AuditRequest::new("[1, 2, 3]")).unwrap();
        assert!(analysis.parse_result.packages.is_empty());
    }

    #[test]
    fn test_unrecognized_content() {
        let err = audit(&AuditRequest::new("this is not a manifest at all!")).unwrap_err();
        match err {
            AuditError::UnrecognizedContent { supported } => assert_eq!(supported.len(), 12),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_request_deserializes_from_tool_arguments() {
        let request: AuditRequest = serde_json::from_str(
            r#"{"dependencyContent": "go 1.21", "fileType": "go.mod", "checkOutdated": false, "inputFile": "svc/go.mod"}"#,
        )
        .unwrap();
        assert_eq!(request.file_type.as_deref(), Some("go.mod"));
        assert!(!request.options.check_outdated);
        assert!(request.options.check_vulnerabilities);
        assert_eq!(request.options.input_file.as_deref(), Some("svc/go.mod"));
    }

    #[test]
    fn test_audit_dependencies_error_report() {
        let report = audit_dependencies(&AuditRequest::default());
        assert!(report.starts_with("Error"));
        assert!(report.contains("No dependency content provided."));
    }
}
