use std::fmt::Write as _;

use crate::error::AuditError;
use crate::models::{AnalysisResult, AuditOptions, DependencyType, Issue, Severity};
use crate::rules::tables;

pub const TITLE: &str = "# Dependency Audit Report";

const DISCLAIMER: &str = "_This report is generated from a static, offline advisory snapshot and \
heuristic version rules. It is not a substitute for a live vulnerability scan; confirm findings with \
your ecosystem's audit tooling before acting on them._";

/// Render the full markdown report. Sections always appear in the same order.
pub fn render(analysis: &AnalysisResult, options: &AuditOptions) -> String {
    let mut out = String::new();
    out.push_str(TITLE);
    out.push_str("\n\n");

    if options.include_metadata {
        render_metadata(&mut out, analysis, options);
    }
    render_summary(&mut out, analysis);
    render_parse_errors(&mut out, analysis);
    render_by_severity(&mut out, analysis);
    render_issue_table(&mut out, &analysis.issues);
    render_recommendations(&mut out, &analysis.recommendations);
    if options.include_references {
        render_references(&mut out, analysis);
    }

    out.push_str("---\n\n");
    out.push_str(DISCLAIMER);
    out.push('\n');
    out
}

/// The report returned when the audit itself could not run.
pub fn render_error(err: &AuditError) -> String {
    let mut out = format!("Error: {}\n\n", err);
    if let AuditError::UnrecognizedContent { supported } = err {
        out.push_str("Pass an explicit `fileType` when automatic detection fails. Recognized file types:\n\n");
        for file_type in supported {
            let _ = writeln!(out, "- `{}`", file_type);
        }
    }
    out
}

fn render_metadata(out: &mut String, analysis: &AnalysisResult, options: &AuditOptions) {
    let parsed = &analysis.parse_result;
    out.push_str("## Metadata\n\n");
    let _ = writeln!(out, "- **Tool:** dep-auditor v{}", env!("CARGO_PKG_VERSION"));
    if let Some(input) = &options.input_file {
        let _ = writeln!(out, "- **Input file:** `{}`", escape_md(input));
    }
    let _ = writeln!(out, "- **File type:** `{}`", parsed.file_type);
    let _ = writeln!(out, "- **Ecosystem:** {}", parsed.ecosystem);
    let checks = options.enabled_checks();
    let checks = if checks.is_empty() {
        "none".to_string()
    } else {
        checks.join(", ")
    };
    let _ = writeln!(out, "- **Checks:** {}", checks);
    out.push('\n');
}

fn render_summary(out: &mut String, analysis: &AnalysisResult) {
    let parsed = &analysis.parse_result;
    out.push_str("## Summary\n\n");
    out.push_str("| Metric | Value |\n");
    out.push_str("|---|---|\n");
    let _ = writeln!(out, "| Ecosystem | {} |", parsed.ecosystem);
    let _ = writeln!(out, "| File Type | `{}` |", parsed.file_type);

    if let Some(name) = &parsed.project_name {
        let project = match &parsed.project_version {
            Some(version) => format!("{}@{}", name, version),
            None => name.clone(),
        };
        let _ = writeln!(out, "| Project | {} |", escape_md(&project));
    }

    let _ = writeln!(out, "| Total Packages | {} |", parsed.packages.len());
    for dep_type in DependencyType::ALL {
        let count = parsed.count_of(dep_type);
        if dep_type == DependencyType::Dependencies || count > 0 {
            let _ = writeln!(out, "| {} | {} |", dep_type.label(), count);
        }
    }

    let _ = writeln!(out, "| Total Issues | {} |", analysis.issues.len());
    for severity in Severity::ALL {
        let _ = writeln!(
            out,
            "| {} {} | {} |",
            severity.emoji(),
            severity,
            analysis.count_by_severity(severity)
        );
    }
    out.push('\n');
}

fn render_parse_errors(out: &mut String, analysis: &AnalysisResult) {
    let errors = &analysis.parse_result.errors;
    if errors.is_empty() {
        return;
    }
    out.push_str("## Parse Errors\n\n");
    out.push_str("The manifest could not be read completely; results below cover the packages found before the failure.\n\n");
    for err in errors {
        let _ = writeln!(out, "- {}", escape_md(err));
    }
    out.push('\n');
}

fn render_by_severity(out: &mut String, analysis: &AnalysisResult) {
    if analysis.issues.is_empty() {
        out.push_str("## ✅ No Issues Detected\n\n");
        out.push_str("None of the enabled checks flagged a package in this manifest.\n\n");
        return;
    }

    out.push_str("## Issues by Severity\n\n");
    for severity in Severity::ALL {
        let mut issues = analysis.issues_with_severity(severity).peekable();
        if issues.peek().is_none() {
            continue;
        }
        let _ = writeln!(out, "### {} {}\n", severity.emoji(), severity);
        for issue in issues {
            render_issue(out, issue);
        }
    }
}

fn render_issue(out: &mut String, issue: &Issue) {
    let _ = writeln!(
        out,
        "- **{}**: `{}`",
        issue.issue_type,
        escape_md(&issue.package.display_id())
    );
    let _ = writeln!(out, "  - {}", issue.description);
    if let Some(rec) = &issue.recommendation {
        let _ = writeln!(out, "  - Recommendation: {}", rec);
    }
    out.push('\n');
}

fn render_issue_table(out: &mut String, issues: &[Issue]) {
    if issues.is_empty() {
        return;
    }
    out.push_str("## All Issues\n\n");
    out.push_str("| Severity | Type | Package | Version | Description |\n");
    out.push_str("|---|---|---|---|---|\n");
    for issue in issues {
        let _ = writeln!(
            out,
            "| {} {} | {} | `{}` | `{}` | {} |",
            issue.severity.emoji(),
            issue.severity.as_str(),
            escape_md(&issue.issue_type),
            escape_md(&issue.package.name),
            escape_md(&issue.package.version),
            escape_md(&issue.description)
        );
    }
    out.push('\n');
}

fn render_recommendations(out: &mut String, recommendations: &[String]) {
    out.push_str("## Recommendations\n\n");
    for (i, rec) in recommendations.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, rec);
    }
    out.push('\n');
}

fn render_references(out: &mut String, analysis: &AnalysisResult) {
    let refs = tables::references(analysis.parse_result.ecosystem);
    if refs.is_empty() {
        return;
    }
    out.push_str("## References\n\n");
    for (label, url) in refs {
        let _ = writeln!(out, "- [{}]({})", label, url);
    }
    out.push('\n');
}

fn escape_md(s: &str) -> String {
    s.replace('|', "\\|").replace('`', "\\`")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ecosystem, Package, ParseResult};
    use crate::rules;

    fn analysis(packages: Vec<Package>) -> AnalysisResult {
        let mut parsed = ParseResult::new(Ecosystem::JavaScript, "package.json");
        parsed.project_name = Some("web".to_string());
        parsed.project_version = Some("1.0.0".to_string());
        for p in packages {
            parsed.push_package(p);
        }
        rules::analyze(&parsed, &AuditOptions::default())
    }

    #[test]
    fn test_sections_in_order() {
        let report = render(
            &analysis(vec![
                Package::new("minimist", "^1.2.0", DependencyType::Dependencies),
                Package::new("classnames", "^2.3.0", DependencyType::Dependencies),
            ]),
            &AuditOptions::default(),
        );
        let order = [
            "## Metadata",
            "## Summary",
            "## Issues by Severity",
            "### 🔴 Critical",
            "### ℹ️ Info",
            "## All Issues",
            "## Recommendations",
            "## References",
            "---",
        ];
        let mut last = 0;
        for heading in order {
            let pos = report[last..].find(heading).map(|p| p + last);
            assert!(pos.is_some(), "missing or misplaced {heading}\n{report}");
            last = pos.unwrap_or(last);
        }
        assert!(report.contains("| Project | web@1.0.0 |"));
        assert!(!report.contains("### 🟠 High"));
    }

    #[test]
    fn test_no_issues_block() {
        let report = render(&analysis(vec![]), &AuditOptions::default());
        assert!(report.contains("## ✅ No Issues Detected"));
        assert!(!report.contains("## Issues by Severity"));
        assert!(report.contains("| Dependencies | 0 |"));
        assert!(!report.contains("| Dev Dependencies |"));
    }

    #[test]
    fn test_optional_sections_follow_options() {
        let options = AuditOptions {
            include_metadata: false,
            include_references: false,
            ..AuditOptions::default()
        };
        let report = render(&analysis(vec![]), &options);
        assert!(!report.contains("## Metadata"));
        assert!(!report.contains("## References"));
        assert!(report.contains("## Summary"));
    }

    #[test]
    fn test_parse_errors_section() {
        let mut parsed = ParseResult::new(Ecosystem::Go, "go.mod");
        parsed.errors.push("Error parsing go.mod: unterminated block opened at line 3".to_string());
        let analysis = rules::analyze(&parsed, &AuditOptions::default());
        let report = render(&analysis, &AuditOptions::default());
        assert!(report.contains("## Parse Errors"));
        assert!(report.contains("unterminated block"));
    }

    #[test]
    fn test_error_report() {
        let report = render_error(&AuditError::NoContent);
        assert!(report.starts_with("Error: No dependency content provided."));
    }

    #[test]
    fn test_escape_md() {
        assert_eq!(escape_md("a|b`c"), "a\\|b\\`c");
    }
}
