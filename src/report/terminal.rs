use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::models::{AnalysisResult, DependencyType, Issue, Severity};

/// Render a colored terminal view of an analysis to a string.
///
/// `verbose` adds the full package table; `quiet` prints a single summary line.
pub fn render(analysis: &AnalysisResult, source: &str, verbose: bool, quiet: bool) -> String {
    let parsed = &analysis.parse_result;
    let mut out = String::new();

    if quiet {
        out.push_str(&format!(
            "Packages: {}  Critical: {}  High: {}  Moderate: {}  Low: {}  Info: {}\n",
            parsed.packages.len(),
            analysis.count_by_severity(Severity::Critical).to_string().red(),
            analysis.count_by_severity(Severity::High).to_string().red(),
            analysis.count_by_severity(Severity::Moderate).to_string().yellow(),
            analysis.count_by_severity(Severity::Low).to_string().blue(),
            analysis.count_by_severity(Severity::Info),
        ));
        return out;
    }

    out.push_str(&format!("\n {} v{}\n", "dep-auditor".bold(), env!("CARGO_PKG_VERSION")));
    out.push_str(&format!(" Auditing: {} ({}, {})\n\n", source, parsed.file_type, parsed.ecosystem));

    let project = match (&parsed.project_name, &parsed.project_version) {
        (Some(name), Some(version)) => format!("{}@{}", name, version),
        (Some(name), None) => name.clone(),
        _ => "(unnamed)".to_string(),
    };

    out.push_str(" ┌────────────────────────────────────────────────────┐\n");
    out.push_str(&format!(" │  {:<49} │\n", "SUMMARY".bold()));
    out.push_str(&format!(" │  {:<49} │\n", format!("Project            : {}", project)));
    out.push_str(&format!(
        " │  {:<49} │\n",
        format!("Total packages     : {}", parsed.packages.len())
    ));
    for dep_type in DependencyType::ALL {
        let count = parsed.count_of(dep_type);
        if count > 0 {
            out.push_str(&format!(
                " │  {:<49} │\n",
                format!("  {:<17}: {}", dep_type.label(), count)
            ));
        }
    }
    for severity in Severity::ALL {
        out.push_str(&format!(
            " │  {:<49} │\n",
            format!("{}  {:<15}: {:>4}", severity.emoji(), severity, analysis.count_by_severity(severity))
        ));
    }
    out.push_str(" └────────────────────────────────────────────────────┘\n\n");

    for err in &parsed.errors {
        out.push_str(&format!(" {} {}\n", "[PARSE]".red().bold(), err));
    }
    if !parsed.errors.is_empty() {
        out.push('\n');
    }

    if analysis.issues.is_empty() {
        out.push_str(&format!(" {} No issues detected.\n\n", "[OK]".green().bold()));
    } else {
        out.push_str(&format!(" {} Issues found:\n\n", "[ISSUES]".yellow().bold()));
        out.push_str(&issue_table(&analysis.issues).to_string());
        out.push_str("\n\n");
    }

    if verbose && !parsed.packages.is_empty() {
        out.push_str(&format!(" {} All packages:\n\n", "[PACKAGES]".cyan().bold()));
        out.push_str(&package_table(analysis).to_string());
        out.push_str("\n\n");
    }

    out.push_str(&format!(" {}\n", "Recommendations".bold()));
    for (i, rec) in analysis.recommendations.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, rec));
    }
    out
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::High => Color::DarkRed,
        Severity::Moderate => Color::Yellow,
        Severity::Low => Color::Blue,
        Severity::Info => Color::DarkGrey,
    }
}

fn issue_table(issues: &[Issue]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Severity").add_attribute(Attribute::Bold),
            Cell::new("Type").add_attribute(Attribute::Bold),
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("Recommendation").add_attribute(Attribute::Bold),
        ]);

    for issue in issues {
        table.add_row(vec![
            Cell::new(issue.severity.as_str())
                .fg(severity_color(issue.severity))
                .set_alignment(CellAlignment::Center),
            Cell::new(&issue.issue_type),
            Cell::new(&issue.package.name),
            Cell::new(&issue.package.version),
            Cell::new(issue.recommendation.as_deref().unwrap_or("")),
        ]);
    }
    table
}

fn package_table(analysis: &AnalysisResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("Type").add_attribute(Attribute::Bold),
            Cell::new("Worst Issue").add_attribute(Attribute::Bold),
        ]);

    for package in &analysis.parse_result.packages {
        let worst = analysis
            .issues
            .iter()
            .filter(|i| i.package.name == package.name && i.package.dep_type == package.dep_type)
            .map(|i| i.severity)
            .min();
        let worst_cell = match worst {
            Some(severity) => Cell::new(severity.as_str()).fg(severity_color(severity)),
            None => Cell::new("✓ none").fg(Color::Green),
        };
        table.add_row(vec![
            Cell::new(&package.name),
            Cell::new(&package.version),
            Cell::new(package.dep_type.as_str()),
            worst_cell,
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditOptions, Ecosystem, Package, ParseResult};
    use crate::rules;

    fn sample() -> AnalysisResult {
        let mut parsed = ParseResult::new(Ecosystem::Rust, "Cargo.toml");
        parsed.push_package(Package::new("failure", "0.1", DependencyType::Dependencies));
        parsed.push_package(Package::new("serde", "1.0", DependencyType::Dependencies));
        rules::analyze(&parsed, &AuditOptions::default())
    }

    #[test]
    fn test_render_lists_issues() {
        colored::control::set_override(false);
        let out = render(&sample(), "Cargo.toml", true, false);
        assert!(out.contains("Deprecated Package"));
        assert!(out.contains("serde"));
        assert!(out.contains("Recommendations"));
    }

    #[test]
    fn test_quiet_is_one_line() {
        colored::control::set_override(false);
        let out = render(&sample(), "Cargo.toml", false, true);
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("Packages: 2  Critical: 0  High: 1"));
    }
}
