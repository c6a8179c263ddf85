//! Version handling shared by the parsers and the rule engine.
//!
//! Cargo requirements go through `semver` and npm ranges through `node_semver`.
//! PEP 440 specifiers, Ruby pessimistic constraints, NuGet intervals and Go module
//! versions have no crate here and fall back to [`LooseVersion`].

use std::cmp::Ordering;

use regex::Regex;
use semver::{Version, VersionReq};

use super::issue;
use crate::models::{Ecosystem, Issue, Package, Severity, ANY_VERSION};

/// A version split into its numeric release and an optional pre-release tag.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LooseVersion {
    release: Vec<u64>,
    pre: Option<String>,
}

impl LooseVersion {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim().trim_start_matches(['v', 'V', '=']);
        // Build metadata (`+incompatible`, `+build.5`) never affects ordering.
        let raw = raw.split('+').next().unwrap_or("");

        let (core, mut pre) = match raw.split_once('-') {
            Some((core, pre)) => (core, Some(pre.to_string())),
            None => (raw, None),
        };

        let mut release = Vec::new();
        for segment in core.split('.') {
            let digits: String = segment.chars().take_while(char::is_ascii_digit).collect();
            let Ok(number) = digits.parse::<u64>() else {
                break;
            };
            release.push(number);

            // `1.0rc1`, `2.0.0a1`: trailing letters start a pre-release.
            let tail = &segment[digits.len()..];
            if !tail.is_empty() {
                pre.get_or_insert_with(|| tail.trim_start_matches(['.', '_']).to_string());
                break;
            }
        }

        LooseVersion { release, pre }
    }
}

impl Ord for LooseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        for i in 0..len {
            let a = self.release.get(i).copied().unwrap_or(0);
            let b = other.release.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }

        match (&self.pre, &other.pre) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => compare_pre_release(a, b),
        }
    }
}

impl PartialOrd for LooseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dot-separated identifiers; numeric ones compare numerically.
fn compare_pre_release(a: &str, b: &str) -> Ordering {
    let mut left = a.split(['.', '-']);
    let mut right = b.split(['.', '-']);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Compare two concrete versions. Missing release components count as zero and a
/// pre-release sorts before its release.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    LooseVersion::parse(a).cmp(&LooseVersion::parse(b))
}

/// `true` when `raw` starts with a digit once prefixes like `v` are removed.
fn is_concrete(raw: &str) -> bool {
    raw.trim_start_matches(['v', 'V']).starts_with(|c: char| c.is_ascii_digit())
}

/// The lowest version a constraint admits, or `None` when it has no lower bound
/// (`*`, `latest`, `<2.0`) or cannot be read.
///
/// Alternatives (`||`) and clause lists (`,` or whitespace) are all considered;
/// upper-bound and exclusion clauses are ignored.
pub fn lowest_version(constraint: &str) -> Option<String> {
    let constraint = constraint.trim();
    if is_unconstrained(constraint) {
        return None;
    }

    constraint
        .split("||")
        .filter_map(lowest_in_alternative)
        .min_by(|a, b| compare_versions(a, b))
}

fn lowest_in_alternative(alt: &str) -> Option<String> {
    let alt = alt.trim();

    // NuGet interval notation: `[1.0,2.0)`, `(,3.0]`, `[1.2.3]`.
    if let Some(interval) = alt.strip_prefix(['[', '(']) {
        let lower = interval.split([',', ']', ')']).next().unwrap_or("").trim();
        return is_concrete(lower).then(|| fill_wildcards(lower));
    }

    let mut lowest: Option<String> = None;
    for clause in clauses(alt) {
        if clause.starts_with('<') || clause.starts_with("!=") {
            continue;
        }
        let bare = clause.trim_start_matches(['=', '>', '~', '^', '!']);
        if !is_concrete(bare) {
            continue;
        }
        let candidate = fill_wildcards(bare.trim_start_matches(['v', 'V']));
        lowest = match lowest {
            Some(current) if compare_versions(&current, &candidate) != Ordering::Greater => Some(current),
            _ => Some(candidate),
        };
    }
    lowest
}

/// Split `>= 0.18, < 2.0` or `>=1.2.0 <2.0.0` into operator-attached clauses.
fn clauses(alt: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut pending_operator = String::new();

    for token in alt.split([',', ' ', '\t']).filter(|t| !t.is_empty()) {
        if token == "-" {
            continue;
        }
        if token.chars().all(|c| matches!(c, '=' | '>' | '<' | '~' | '^' | '!')) {
            pending_operator.push_str(token);
            continue;
        }
        out.push(format!("{}{}", pending_operator, token));
        pending_operator.clear();
    }
    out
}

/// `1.x` → `1.0`, `2.*` → `2.0`.
fn fill_wildcards(version: &str) -> String {
    version
        .split('.')
        .map(|part| match part {
            "x" | "X" | "*" => "0",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn is_unconstrained(constraint: &str) -> bool {
    matches!(constraint, "" | ANY_VERSION | "x" | "X" | "latest" | "next")
}

/// A constraint parsed with the grammar of its ecosystem.
#[derive(Debug)]
enum Constraint {
    Cargo(VersionReq),
    Npm(node_semver::Range),
}

impl Constraint {
    /// `None` for ecosystems without a range grammar, or text the grammar rejects
    /// (`file:../x`, `git+https://...`).
    fn parse(raw: &str, ecosystem: Ecosystem) -> Option<Self> {
        match ecosystem {
            Ecosystem::Rust => VersionReq::parse(raw).ok().map(Constraint::Cargo),
            Ecosystem::JavaScript | Ecosystem::TypeScript => node_semver::Range::parse(raw).ok().map(Constraint::Npm),
            _ => None,
        }
    }

    fn admits(&self, version: &str) -> bool {
        let version = full_release(version);
        match self {
            Constraint::Cargo(req) => Version::parse(&version).is_ok_and(|v| req.matches(&v)),
            Constraint::Npm(range) => node_semver::Version::parse(&version).is_ok_and(|v| range.satisfies(&v)),
        }
    }
}

/// `1` → `1.0.0`, `v2.3` → `2.3.0`. Build metadata is dropped, a pre-release kept.
fn full_release(raw: &str) -> String {
    let raw = raw.trim().trim_start_matches(['v', 'V', '=']);
    let raw = raw.split('+').next().unwrap_or("");
    let (core, pre) = match raw.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (raw, None),
    };

    let mut parts: Vec<&str> = core.split('.').take(3).collect();
    while parts.len() < 3 {
        parts.push("0");
    }
    let core = parts.join(".");
    match pre {
        Some(pre) => format!("{}-{}", core, pre),
        None => core,
    }
}

fn next_patch(version: &str) -> Option<String> {
    let core = version.split(['-', '+']).next()?;
    let mut parts = core
        .split('.')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<u64>>>()?;
    *parts.last_mut()? += 1;
    Some(parts.iter().map(u64::to_string).collect::<Vec<_>>().join("."))
}

/// Versions that could be the lowest one a constraint admits: every lower-bound
/// clause, its release without a pre-release tag, and the next patch for `>`.
fn lower_bound_candidates(constraint: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    for alt in constraint.split("||") {
        for clause in clauses(alt) {
            if clause.starts_with('<') || clause.starts_with("!=") {
                continue;
            }
            let bare = clause.trim_start_matches(['=', '>', '~', '^', '!']);
            if !is_concrete(bare) {
                continue;
            }
            let base = full_release(&fill_wildcards(bare.trim_start_matches(['v', 'V'])));
            if let Some(next) = next_patch(&base) {
                candidates.push(next);
            }
            if let Some((release, _)) = base.split_once('-') {
                candidates.push(release.to_string());
            }
            candidates.push(base);
        }
    }
    candidates
}

/// Order two concrete versions of one ecosystem. Cargo and npm versions use their
/// crates; anything those reject, and every other ecosystem, uses [`compare_versions`].
pub fn compare_for(ecosystem: Ecosystem, a: &str, b: &str) -> Ordering {
    let (fa, fb) = (full_release(a), full_release(b));
    let strict = match ecosystem {
        Ecosystem::Rust => Version::parse(&fa)
            .ok()
            .zip(Version::parse(&fb).ok())
            .map(|(x, y)| x.cmp(&y)),
        Ecosystem::JavaScript | Ecosystem::TypeScript => node_semver::Version::parse(&fa)
            .ok()
            .zip(node_semver::Version::parse(&fb).ok())
            .map(|(x, y)| x.cmp(&y)),
        _ => None,
    };
    strict.unwrap_or_else(|| compare_versions(a, b))
}

/// Does `constraint` admit a release in `[introduced, fixed)`?
///
/// The lowest admitted release is tested, and so is `introduced` itself when the
/// constraint can be evaluated exactly. Unbounded constraints never match.
pub fn in_affected_range(
    constraint: &str,
    ecosystem: Ecosystem,
    introduced: Option<&str>,
    fixed: Option<&str>,
) -> bool {
    let constraint = constraint.trim();
    if is_unconstrained(constraint) {
        return false;
    }

    let in_window = |version: &str| {
        introduced.map_or(true, |intro| compare_for(ecosystem, version, intro) != Ordering::Less)
            && fixed.map_or(true, |fix| compare_for(ecosystem, version, fix) == Ordering::Less)
    };

    let Some(parsed) = Constraint::parse(constraint, ecosystem) else {
        return lowest_version(constraint).is_some_and(|lowest| in_window(&lowest));
    };

    let lowest = lower_bound_candidates(constraint)
        .into_iter()
        .filter(|candidate| parsed.admits(candidate))
        .min_by(|a, b| compare_for(ecosystem, a, b));

    lowest.is_some_and(|v| in_window(&v)) || introduced.is_some_and(|intro| parsed.admits(intro) && in_window(intro))
}

/// Compiled patterns for the version-policy checks.
pub(crate) struct VersionPolicy {
    wildcard: Regex,
    pre_release: Regex,
    pep440_pre: Regex,
    pseudo_version: Regex,
    bare_version: Regex,
}

impl VersionPolicy {
    pub(crate) fn new() -> Option<Self> {
        Some(VersionPolicy {
            wildcard: Regex::new(r"(^|[.\s=~^])(x|X|\*)(\.|$)").ok()?,
            pre_release: Regex::new(r"(?i)[-.+_]?\b(alpha|beta|dev|snapshot|canary|nightly|next|rc|preview|pre)(\b|\d|[.\-_]|$)")
                .ok()?,
            pep440_pre: Regex::new(r"\d(a|b|rc|c)\d+").ok()?,
            pseudo_version: Regex::new(r"\d{14}-[0-9a-f]{12}").ok()?,
            bare_version: Regex::new(r"^v?\d+(\.\d+)*([-.+][0-9A-Za-z.\-+]+)?$").ok()?,
        })
    }

    /// Version-policy issues for one non-local package.
    pub(crate) fn check(&self, package: &Package, ecosystem: Ecosystem, file_type: &str) -> Vec<Issue> {
        let version = package.version.trim();
        let mut issues = Vec::new();

        if is_unconstrained(version) {
            issues.push(issue(
                "Unpinned Version",
                Severity::Moderate,
                package,
                format!("`{}` accepts any release, so every install may resolve differently.", display(version)),
                "Constrain the dependency to a tested version range.",
            ));
            return issues;
        }

        if self.wildcard.is_match(version) {
            issues.push(issue(
                "Unpinned Version",
                Severity::Low,
                package,
                format!("Wildcard constraint `{}` accepts any release within that prefix.", version),
                "Use an explicit range with a tested lower bound.",
            ));
            return issues;
        }

        if ecosystem == Ecosystem::Go {
            if self.pseudo_version.is_match(version) {
                issues.push(issue(
                    "Pseudo-version",
                    Severity::Moderate,
                    package,
                    format!("`{}` is a pseudo-version pointing at an untagged commit.", version),
                    "Depend on a tagged release of the module.",
                ));
            }
            if version.contains("+incompatible") {
                issues.push(issue(
                    "Incompatible Module Version",
                    Severity::Moderate,
                    package,
                    format!("`{}` is a major version without Go module support.", version),
                    "Move to a release that ships a go.mod with a /vN module path.",
                ));
            }
            if !issues.is_empty() {
                return issues;
            }
        }

        if let Some(tag) = self.pre_release_tag(version, ecosystem) {
            let severity = match tag.as_str() {
                "rc" | "preview" | "pre" | "c" => Severity::Info,
                _ => Severity::Low,
            };
            issues.push(issue(
                "Pre-release Version",
                severity,
                package,
                format!("`{}` is a pre-release ({}) build.", version, tag),
                "Prefer a stable release for production use.",
            ));
            return issues;
        }

        if !is_lockfile(file_type) && self.is_exact_pin(version, ecosystem) {
            issues.push(issue(
                "Exact Version Pin",
                Severity::Low,
                package,
                format!("`{}` is pinned exactly and will not pick up patch releases.", version),
                "Allow compatible patch updates, or keep the pin under an automated update tool.",
            ));
        } else if !is_lockfile(file_type) && ecosystem != Ecosystem::Cpp && has_open_upper_bound(version) {
            issues.push(issue(
                "Version Constraint Issue",
                Severity::Info,
                package,
                format!("`{}` sets a lower bound only and admits future major releases.", version),
                "Add an upper bound that excludes the next major version.",
            ));
        }

        issues
    }

    fn pre_release_tag(&self, version: &str, ecosystem: Ecosystem) -> Option<String> {
        if let Some(caps) = self.pre_release.captures(version) {
            return Some(caps[1].to_ascii_lowercase());
        }
        if ecosystem == Ecosystem::Python {
            if let Some(caps) = self.pep440_pre.captures(version) {
                return Some(caps[1].to_string());
            }
        }
        None
    }

    fn is_exact_pin(&self, version: &str, ecosystem: Ecosystem) -> bool {
        match ecosystem {
            Ecosystem::JavaScript | Ecosystem::Ruby => {
                let bare = version.strip_prefix('=').unwrap_or(version).trim();
                self.bare_version.is_match(bare)
            }
            Ecosystem::Python | Ecosystem::Lua => version
                .strip_prefix("===")
                .or_else(|| version.strip_prefix("=="))
                .is_some_and(|rest| self.bare_version.is_match(rest.trim())),
            Ecosystem::Rust => version
                .strip_prefix('=')
                .is_some_and(|rest| self.bare_version.is_match(rest.trim())),
            Ecosystem::DotNet => version
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
                .is_some_and(|inner| !inner.contains(',') && self.bare_version.is_match(inner.trim())),
            Ecosystem::Cpp => self.bare_version.is_match(version),
            Ecosystem::Go | Ecosystem::TypeScript => false,
        }
    }
}

fn is_lockfile(file_type: &str) -> bool {
    matches!(file_type, "yarn.lock" | "uv.lock" | "go.mod")
}

/// `>=1.0` with nothing capping it from above.
fn has_open_upper_bound(version: &str) -> bool {
    let has_lower = version.contains(">=") || version.trim_start().starts_with('>');
    let has_upper = version.contains('<') || version.contains("~>") || version.contains("~=") || version.contains('^');
    has_lower && !has_upper && !version.contains("||")
}

fn display(version: &str) -> &str {
    if version.is_empty() {
        "(empty)"
    } else {
        version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DependencyType;

    fn pkg(version: &str) -> Package {
        Package::new("demo", version, DependencyType::Dependencies)
    }

    fn types(issues: &[Issue]) -> Vec<(&str, Severity)> {
        issues.iter().map(|i| (i.issue_type.as_str(), i.severity)).collect()
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("1.2.3", "1.10.0"), Ordering::Less);
        assert_eq!(compare_versions("v0.17.0", "0.17.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("2.0.0-beta.2", "2.0.0"), Ordering::Less);
        assert_eq!(compare_versions("2.0.0-beta.10", "2.0.0-beta.2"), Ordering::Greater);
        assert_eq!(compare_versions("2.2.8.1", "2.2.8"), Ordering::Greater);
        assert_eq!(compare_versions("2.0.0+incompatible", "2.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.0rc1", "1.0"), Ordering::Less);
    }

    #[test]
    fn test_lowest_version() {
        assert_eq!(lowest_version("^4.17.15").as_deref(), Some("4.17.15"));
        assert_eq!(lowest_version("~> 7.0.4").as_deref(), Some("7.0.4"));
        assert_eq!(lowest_version(">= 0.18, < 2.0").as_deref(), Some("0.18"));
        assert_eq!(lowest_version(">=1.2.0 <2.0.0").as_deref(), Some("1.2.0"));
        assert_eq!(lowest_version("^2.0.0 || ^1.5.0").as_deref(), Some("1.5.0"));
        assert_eq!(lowest_version("~=2.28").as_deref(), Some("2.28"));
        assert_eq!(lowest_version("[13.0.1,14.0)").as_deref(), Some("13.0.1"));
        assert_eq!(lowest_version("v0.5.0").as_deref(), Some("0.5.0"));
        assert_eq!(lowest_version("1.x").as_deref(), Some("1.0"));
        assert_eq!(lowest_version("*"), None);
        assert_eq!(lowest_version("<2.0"), None);
        assert_eq!(lowest_version("(,3.0]"), None);
    }

    #[test]
    fn test_in_affected_range() {
        let js = Ecosystem::JavaScript;
        assert!(in_affected_range("^0.21.0", js, None, Some("0.21.2")));
        assert!(!in_affected_range("^1.6.0", js, None, Some("1.6.0")));
        assert!(in_affected_range("7.5.1", js, Some("7.0.0"), Some("7.5.2")));
        assert!(!in_affected_range("6.3.0", js, Some("7.0.0"), Some("7.5.2")));
        assert!(in_affected_range("v3.2.0", Ecosystem::Go, None, None));
        assert!(!in_affected_range("*", js, None, None));
        assert!(in_affected_range("==5.3.1", Ecosystem::Python, None, Some("5.4")));
        assert!(!in_affected_range("~> 6.1", Ecosystem::Ruby, None, Some("6.1.0")));
    }

    #[test]
    fn test_strict_lower_bounds() {
        // `>1.6.0` admits 1.6.1 at the lowest, which is already fixed.
        assert!(!in_affected_range(">1.6.0", Ecosystem::JavaScript, None, Some("1.6.1")));
        assert!(in_affected_range(">=1.6.0", Ecosystem::JavaScript, None, Some("1.6.1")));
        assert!(in_affected_range(">1.5.9", Ecosystem::JavaScript, None, Some("1.6.0")));
        assert!(!in_affected_range(">0.14.9", Ecosystem::Rust, None, Some("0.14.10")));
    }

    #[test]
    fn test_npm_ranges() {
        let js = Ecosystem::JavaScript;
        assert!(in_affected_range("^2.0.0 || ^0.21.0", js, None, Some("0.21.2")));
        assert!(in_affected_range("<2.0.0", js, Some("1.2.0"), Some("1.2.6")));
        assert!(!in_affected_range("^8.17.1", js, Some("8.0.0"), Some("8.17.1")));
        assert!(in_affected_range("8.x", js, Some("8.0.0"), Some("8.17.1")));
        // Not a range: falls back to the lenient reading.
        assert!(!in_affected_range("file:../shared", js, None, Some("1.0.0")));
    }

    #[test]
    fn test_cargo_requirements() {
        let rust = Ecosystem::Rust;
        assert!(in_affected_range("0.14.2", rust, None, Some("0.14.10")));
        assert!(in_affected_range("1", rust, None, Some("1.5.5")));
        assert!(!in_affected_range("1.6", rust, None, Some("1.5.5")));
        assert!(in_affected_range(">=0.4, <0.5", rust, None, Some("0.4.20")));
        assert!(!in_affected_range("=0.4.20", rust, None, Some("0.4.20")));
    }

    #[test]
    fn test_compare_for_uses_ecosystem_grammar() {
        assert_eq!(compare_for(Ecosystem::JavaScript, "1.2.10", "1.2.9"), Ordering::Greater);
        assert_eq!(compare_for(Ecosystem::Rust, "1.0.0-alpha", "1.0.0"), Ordering::Less);
        assert_eq!(compare_for(Ecosystem::Ruby, "2.2.8.1", "2.2.8"), Ordering::Greater);
        assert_eq!(compare_for(Ecosystem::JavaScript, "1.2", "1.2.0"), Ordering::Equal);
    }

    #[test]
    fn test_unpinned_versions() {
        let policy = VersionPolicy::new().unwrap();
        let eco = Ecosystem::JavaScript;
        assert_eq!(types(&policy.check(&pkg("*"), eco, "package.json")), vec![("Unpinned Version", Severity::Moderate)]);
        assert_eq!(types(&policy.check(&pkg("latest"), eco, "package.json")), vec![("Unpinned Version", Severity::Moderate)]);
        assert_eq!(types(&policy.check(&pkg("1.x"), eco, "package.json")), vec![("Unpinned Version", Severity::Low)]);
        assert_eq!(types(&policy.check(&pkg("2.*"), eco, "package.json")), vec![("Unpinned Version", Severity::Low)]);
        assert!(policy.check(&pkg("^1.2.0"), eco, "package.json").is_empty());
    }

    #[test]
    fn test_pre_release_versions() {
        let policy = VersionPolicy::new().unwrap();
        assert_eq!(
            types(&policy.check(&pkg("^2.0.0-beta.3"), Ecosystem::JavaScript, "package.json")),
            vec![("Pre-release Version", Severity::Low)]
        );
        assert_eq!(
            types(&policy.check(&pkg("8.0.0-preview.4"), Ecosystem::DotNet, "csproj")),
            vec![("Pre-release Version", Severity::Info)]
        );
        assert_eq!(
            types(&policy.check(&pkg("==2.0.0a1"), Ecosystem::Python, "requirements.txt")),
            vec![("Pre-release Version", Severity::Low)]
        );
    }

    #[test]
    fn test_exact_pins_are_ecosystem_aware() {
        let policy = VersionPolicy::new().unwrap();
        let pinned = |v: &str, eco: Ecosystem, ft: &str| {
            policy
                .check(&pkg(v), eco, ft)
                .iter()
                .any(|i| i.issue_type == "Exact Version Pin")
        };
        assert!(pinned("4.17.21", Ecosystem::JavaScript, "package.json"));
        assert!(pinned("==2.31.0", Ecosystem::Python, "requirements.txt"));
        assert!(pinned("=1.0.100", Ecosystem::Rust, "Cargo.toml"));
        assert!(pinned("[13.0.1]", Ecosystem::DotNet, "csproj"));
        assert!(pinned("6.4.0", Ecosystem::Ruby, "Gemfile"));
        assert!(!pinned("1.0.100", Ecosystem::Rust, "Cargo.toml"));
        assert!(!pinned("13.0.1", Ecosystem::DotNet, "csproj"));
        assert!(!pinned("4.17.21", Ecosystem::JavaScript, "yarn.lock"));
        assert!(!pinned("v1.9.1", Ecosystem::Go, "go.mod"));
    }

    #[test]
    fn test_open_lower_bound() {
        let policy = VersionPolicy::new().unwrap();
        assert_eq!(
            types(&policy.check(&pkg(">=0.4"), Ecosystem::Python, "pyproject.toml")),
            vec![("Version Constraint Issue", Severity::Info)]
        );
        assert!(policy.check(&pkg(">=3.2,<4"), Ecosystem::Python, "pyproject.toml").is_empty());
        assert!(policy.check(&pkg(">=3.0.2"), Ecosystem::Cpp, "vcpkg.json").is_empty());
    }

    #[test]
    fn test_go_module_versions() {
        let policy = VersionPolicy::new().unwrap();
        assert_eq!(
            types(&policy.check(&pkg("v0.0.0-20230101120000-abcdef123456"), Ecosystem::Go, "go.mod")),
            vec![("Pseudo-version", Severity::Moderate)]
        );
        assert_eq!(
            types(&policy.check(&pkg("v2.0.0+incompatible"), Ecosystem::Go, "go.mod")),
            vec![("Incompatible Module Version", Severity::Moderate)]
        );
        assert!(policy.check(&pkg("v1.9.1"), Ecosystem::Go, "go.mod").is_empty());
    }
}
