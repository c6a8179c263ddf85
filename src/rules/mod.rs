//! Rule engine: turns a [`ParseResult`] into issues and recommendations.
//!
//! Every enabled check runs over each package in manifest order. Within one package
//! issues are produced as version policy, deprecation, vulnerability, alternatives,
//! bundle size; the final list is then stably sorted by severity.

use tracing::{debug, warn};

use crate::models::{AnalysisResult, AuditOptions, DependencyType, Ecosystem, Issue, Package, ParseResult, Severity};

pub mod recommend;
pub mod tables;
pub mod version;

use tables::names_match;
use version::{in_affected_range, VersionPolicy};

pub const ISSUE_UNPINNED: &str = "Unpinned Version";
pub const ISSUE_DEPRECATED: &str = "Deprecated Package";
pub const ISSUE_VULNERABLE: &str = "Known Vulnerabilities";
pub const ISSUE_ALTERNATIVE: &str = "Alternative Available";
pub const ISSUE_BUNDLE_SIZE: &str = "Large Bundle Size";

/// Bundles above this size (KB) are reported as `low` instead of `info`.
const LARGE_BUNDLE_KB: u32 = 100;

pub(crate) fn issue(
    issue_type: &str,
    severity: Severity,
    package: &Package,
    description: impl Into<String>,
    recommendation: impl Into<String>,
) -> Issue {
    Issue {
        issue_type: issue_type.to_string(),
        severity,
        package: package.clone(),
        description: description.into(),
        recommendation: Some(recommendation.into()),
    }
}

/// Run every enabled check over `result`.
pub fn analyze(result: &ParseResult, options: &AuditOptions) -> AnalysisResult {
    let ecosystem = result.ecosystem;
    let policy = if options.check_outdated {
        let policy = VersionPolicy::new();
        if policy.is_none() {
            warn!("version policy patterns failed to compile; skipping version checks");
        }
        policy
    } else {
        None
    };

    let mut issues = Vec::new();
    for package in &result.packages {
        if let Some(policy) = &policy {
            if !package.is_local() {
                issues.extend(policy.check(package, ecosystem, &result.file_type));
            }
        }
        if options.check_deprecated {
            issues.extend(check_deprecated(package, ecosystem));
        }
        if options.check_vulnerabilities && !package.is_local() {
            issues.extend(check_vulnerabilities(package, ecosystem));
        }
        if options.suggest_alternatives {
            issues.extend(check_alternatives(package, ecosystem));
        }
        if options.analyze_bundle_size {
            issues.extend(check_bundle_size(package, ecosystem));
        }
    }

    issues.sort_by_key(|i| i.severity);
    debug!(
        ecosystem = ecosystem.id(),
        packages = result.packages.len(),
        issues = issues.len(),
        "analysis finished"
    );

    let recommendations = recommend::recommendations(ecosystem, &issues);
    AnalysisResult {
        parse_result: result.clone(),
        issues,
        recommendations,
    }
}

fn check_deprecated(package: &Package, ecosystem: Ecosystem) -> Option<Issue> {
    let entry = tables::deprecations(ecosystem)
        .iter()
        .find(|d| names_match(ecosystem, d.name, &package.name))?;
    Some(issue(
        ISSUE_DEPRECATED,
        Severity::High,
        package,
        format!("`{}` is deprecated and no longer maintained.", package.name),
        format!("Migrate to {}.", entry.replacement),
    ))
}

/// All matching advisory ranges fold into one issue carrying the highest severity.
fn check_vulnerabilities(package: &Package, ecosystem: Ecosystem) -> Option<Issue> {
    let hits: Vec<&tables::Advisory> = tables::advisories(ecosystem)
        .iter()
        .filter(|a| names_match(ecosystem, a.name, &package.name))
        .filter(|a| in_affected_range(&package.version, ecosystem, a.introduced, a.fixed))
        .collect();

    let severity = hits.iter().map(|a| a.severity).min()?;

    let mut ids: Vec<String> = Vec::new();
    for hit in &hits {
        let line = format!("{} ({})", hit.id, hit.summary);
        if !ids.contains(&line) {
            ids.push(line);
        }
    }

    let recommendation = if hits.iter().any(|a| a.fixed.is_none()) {
        "No fixed release exists; replace the package.".to_string()
    } else {
        let target = hits
            .iter()
            .filter_map(|a| a.fixed)
            .max_by(|a, b| version::compare_for(ecosystem, a, b))
            .unwrap_or_default();
        format!("Upgrade to {} or later.", target)
    };

    Some(issue(
        ISSUE_VULNERABLE,
        severity,
        package,
        format!("`{}` is affected by {}.", package.display_id(), ids.join("; ")),
        recommendation,
    ))
}

fn check_alternatives(package: &Package, ecosystem: Ecosystem) -> Option<Issue> {
    let entry = tables::alternatives(ecosystem)
        .iter()
        .find(|a| names_match(ecosystem, a.name, &package.name))?;
    Some(issue(
        ISSUE_ALTERNATIVE,
        Severity::Info,
        package,
        format!("A lighter or more modern alternative to `{}` exists.", package.name),
        format!("Consider {}.", entry.suggestion),
    ))
}

fn check_bundle_size(package: &Package, ecosystem: Ecosystem) -> Option<Issue> {
    // Dev tooling never reaches the shipped bundle.
    if package.dep_type == DependencyType::DevDependencies {
        return None;
    }
    let entry = tables::bundle_weights(ecosystem)
        .iter()
        .find(|b| names_match(ecosystem, b.name, &package.name))?;
    let severity = if entry.size_kb > LARGE_BUNDLE_KB {
        Severity::Low
    } else {
        Severity::Info
    };
    Some(issue(
        ISSUE_BUNDLE_SIZE,
        severity,
        package,
        format!("`{}` adds roughly {} KB (minified) to client bundles.", package.name, entry.size_kb),
        format!("Consider {}.", entry.suggestion),
    ))
}
