use super::tables::audit_command;
use super::{ISSUE_DEPRECATED, ISSUE_UNPINNED, ISSUE_VULNERABLE};
use crate::models::{Ecosystem, Issue, Severity};

pub const NO_ISSUES: &str = "No issues detected - continue monitoring dependencies for new advisories.";

/// Summary guidance derived from the collected issues, without duplicates.
pub fn recommendations(ecosystem: Ecosystem, issues: &[Issue]) -> Vec<String> {
    if issues.is_empty() {
        return vec![NO_ISSUES.to_string()];
    }

    let mut out: Vec<String> = Vec::new();

    let critical = issues.iter().filter(|i| i.severity == Severity::Critical).count();
    if critical > 0 {
        out.push(format!("Address {} critical {} immediately.", critical, plural(critical, "issue")));
    }
    let high = issues.iter().filter(|i| i.severity == Severity::High).count();
    if high > 0 {
        out.push(format!(
            "Resolve {} high-severity {} before the next release.",
            high,
            plural(high, "issue")
        ));
    }

    let deprecated = package_names(issues, ISSUE_DEPRECATED);
    if !deprecated.is_empty() {
        out.push(format!("Replace deprecated packages: {}.", deprecated.join(", ")));
    }
    let vulnerable = package_names(issues, ISSUE_VULNERABLE);
    if !vulnerable.is_empty() {
        out.push(format!("Upgrade vulnerable packages: {}.", vulnerable.join(", ")));
    }
    let unpinned = package_names(issues, ISSUE_UNPINNED).len();
    if unpinned > 0 {
        out.push(format!(
            "Pin {} unpinned {} to explicit version ranges.",
            unpinned,
            plural(unpinned, "dependency")
        ));
    }

    out.push(format!(
        "Run `{}` regularly to check against the live advisory database.",
        audit_command(ecosystem)
    ));
    out.push("Review this manifest regularly and keep dependencies up to date.".to_string());

    let mut seen = std::collections::HashSet::new();
    out.retain(|line| seen.insert(line.clone()));
    out
}

fn package_names<'a>(issues: &'a [Issue], issue_type: &str) -> Vec<&'a str> {
    let mut names: Vec<&str> = Vec::new();
    for issue in issues.iter().filter(|i| i.issue_type == issue_type) {
        if !names.contains(&issue.package.name.as_str()) {
            names.push(&issue.package.name);
        }
    }
    names
}

fn plural(count: usize, word: &str) -> String {
    match (count, word) {
        (1, _) => word.to_string(),
        (_, "dependency") => "dependencies".to_string(),
        _ => format!("{}s", word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DependencyType, Package};

    fn issue(issue_type: &str, severity: Severity, name: &str) -> Issue {
        Issue {
            issue_type: issue_type.to_string(),
            severity,
            package: Package::new(name, "*", DependencyType::Dependencies),
            description: String::new(),
            recommendation: None,
        }
    }

    #[test]
    fn test_no_issues() {
        assert_eq!(recommendations(Ecosystem::Rust, &[]), vec![NO_ISSUES.to_string()]);
    }

    #[test]
    fn test_guidance_lines() {
        let issues = vec![
            issue(ISSUE_VULNERABLE, Severity::Critical, "minimist"),
            issue(ISSUE_DEPRECATED, Severity::High, "request"),
            issue(ISSUE_UNPINNED, Severity::Moderate, "left-pad"),
            issue(ISSUE_UNPINNED, Severity::Moderate, "chalk"),
        ];
        let recs = recommendations(Ecosystem::JavaScript, &issues);
        assert_eq!(recs[0], "Address 1 critical issue immediately.");
        assert_eq!(recs[1], "Resolve 1 high-severity issue before the next release.");
        assert_eq!(recs[2], "Replace deprecated packages: request.");
        assert_eq!(recs[3], "Upgrade vulnerable packages: minimist.");
        assert_eq!(recs[4], "Pin 2 unpinned dependencies to explicit version ranges.");
        assert!(recs[5].contains("npm audit"));
        assert_eq!(recs.len(), 7);
    }
}
