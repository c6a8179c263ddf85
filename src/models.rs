use serde::{Deserialize, Serialize};

/// A single declared or locked dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    /// Literal constraint string as written in the manifest; `"*"` means unconstrained.
    pub version: String,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Package {
    pub fn new(name: impl Into<String>, version: impl Into<String>, dep_type: DependencyType) -> Self {
        Package {
            name: name.into(),
            version: version.into(),
            dep_type,
            extras: Vec::new(),
            source: None,
        }
    }

    pub fn with_extras(mut self, extras: Vec<String>) -> Self {
        self.extras = extras;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Local references (project references, `extends`, path/git crates) carry no
    /// registry version and are excluded from version-policy checks.
    pub fn is_local(&self) -> bool {
        self.version == LOCAL_VERSION
            || matches!(
                self.source.as_deref(),
                Some(SOURCE_PROJECT_REFERENCE | SOURCE_EXTENDS | SOURCE_PATH | SOURCE_GIT | SOURCE_WORKSPACE)
            )
    }

    pub fn display_id(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

pub const ANY_VERSION: &str = "*";
pub const LOCAL_VERSION: &str = "local";
pub const SOURCE_PROJECT_REFERENCE: &str = "project-reference";
pub const SOURCE_EXTENDS: &str = "extends";
pub const SOURCE_PATH: &str = "path";
pub const SOURCE_GIT: &str = "git";
pub const SOURCE_WORKSPACE: &str = "workspace";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyType {
    Dependencies,
    DevDependencies,
    PeerDependencies,
    OptionalDependencies,
    BuildDependencies,
}

impl DependencyType {
    pub const ALL: [DependencyType; 5] = [
        DependencyType::Dependencies,
        DependencyType::DevDependencies,
        DependencyType::PeerDependencies,
        DependencyType::OptionalDependencies,
        DependencyType::BuildDependencies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::Dependencies => "dependencies",
            DependencyType::DevDependencies => "devDependencies",
            DependencyType::PeerDependencies => "peerDependencies",
            DependencyType::OptionalDependencies => "optionalDependencies",
            DependencyType::BuildDependencies => "buildDependencies",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DependencyType::Dependencies => "Dependencies",
            DependencyType::DevDependencies => "Dev Dependencies",
            DependencyType::PeerDependencies => "Peer Dependencies",
            DependencyType::OptionalDependencies => "Optional Dependencies",
            DependencyType::BuildDependencies => "Build Dependencies",
        }
    }
}

impl std::fmt::Display for DependencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    JavaScript,
    TypeScript,
    Python,
    Rust,
    Go,
    Ruby,
    DotNet,
    Cpp,
    Lua,
}

impl Ecosystem {
    pub fn id(&self) -> &'static str {
        match self {
            Ecosystem::JavaScript => "javascript",
            Ecosystem::TypeScript => "typescript",
            Ecosystem::Python => "python",
            Ecosystem::Rust => "rust",
            Ecosystem::Go => "go",
            Ecosystem::Ruby => "ruby",
            Ecosystem::DotNet => "dotnet",
            Ecosystem::Cpp => "cpp",
            Ecosystem::Lua => "lua",
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ecosystem::JavaScript => write!(f, "JavaScript"),
            Ecosystem::TypeScript => write!(f, "TypeScript"),
            Ecosystem::Python => write!(f, "Python"),
            Ecosystem::Rust => write!(f, "Rust"),
            Ecosystem::Go => write!(f, "Go"),
            Ecosystem::Ruby => write!(f, "Ruby"),
            Ecosystem::DotNet => write!(f, ".NET"),
            Ecosystem::Cpp => write!(f, "C++"),
            Ecosystem::Lua => write!(f, "Lua"),
        }
    }
}

/// Normalized output of one manifest parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub ecosystem: Ecosystem,
    pub file_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_version: Option<String>,
    pub packages: Vec<Package>,
    /// Non-empty only when the parse could not complete cleanly.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ParseResult {
    pub fn new(ecosystem: Ecosystem, file_type: &str) -> Self {
        ParseResult {
            ecosystem,
            file_type: file_type.to_string(),
            project_name: None,
            project_version: None,
            packages: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Add a package unless one with the same name already sits in its bucket.
    /// Returns `false` when the package was a duplicate.
    pub fn push_package(&mut self, package: Package) -> bool {
        let duplicate = self
            .packages
            .iter()
            .any(|p| p.dep_type == package.dep_type && p.name == package.name);
        if duplicate {
            return false;
        }
        self.packages.push(package);
        true
    }

    pub fn count_of(&self, dep_type: DependencyType) -> usize {
        self.packages.iter().filter(|p| p.dep_type == dep_type).count()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Issue severity, declared from most to least severe so the derived `Ord`
/// sorts critical first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Moderate,
    Low,
    Info,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Moderate,
        Severity::Low,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Moderate => "moderate",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Critical => "🔴",
            Severity::High => "🟠",
            Severity::Moderate => "🟡",
            Severity::Low => "🔵",
            Severity::Info => "ℹ️",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "Critical"),
            Severity::High => write!(f, "High"),
            Severity::Moderate => write!(f, "Moderate"),
            Severity::Low => write!(f, "Low"),
            Severity::Info => write!(f, "Info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub severity: Severity,
    pub package: Package,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub parse_result: ParseResult,
    pub issues: Vec<Issue>,
    pub recommendations: Vec<String>,
}

impl AnalysisResult {
    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn issues_with_severity(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    /// `true` when at least one critical or high issue was found.
    pub fn has_blocking_issues(&self) -> bool {
        self.issues
            .iter()
            .any(|i| matches!(i.severity, Severity::Critical | Severity::High))
    }
}

fn default_true() -> bool {
    true
}

/// Which rule categories and report sections are enabled for one audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditOptions {
    #[serde(default = "default_true")]
    pub check_outdated: bool,
    #[serde(default = "default_true")]
    pub check_deprecated: bool,
    #[serde(default = "default_true")]
    pub check_vulnerabilities: bool,
    #[serde(default = "default_true")]
    pub suggest_alternatives: bool,
    #[serde(default = "default_true")]
    pub analyze_bundle_size: bool,
    #[serde(default = "default_true")]
    pub include_references: bool,
    #[serde(default = "default_true")]
    pub include_metadata: bool,
    /// Display-only path shown in the metadata block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_file: Option<String>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        AuditOptions {
            check_outdated: true,
            check_deprecated: true,
            check_vulnerabilities: true,
            suggest_alternatives: true,
            analyze_bundle_size: true,
            include_references: true,
            include_metadata: true,
            input_file: None,
        }
    }
}

impl AuditOptions {
    /// Options with every rule category disabled; report sections stay on.
    pub fn checks_disabled() -> Self {
        AuditOptions {
            check_outdated: false,
            check_deprecated: false,
            check_vulnerabilities: false,
            suggest_alternatives: false,
            analyze_bundle_size: false,
            ..AuditOptions::default()
        }
    }

    pub fn enabled_checks(&self) -> Vec<&'static str> {
        let mut checks = Vec::new();
        if self.check_outdated {
            checks.push("version policy");
        }
        if self.check_deprecated {
            checks.push("deprecation");
        }
        if self.check_vulnerabilities {
            checks.push("vulnerabilities");
        }
        if self.suggest_alternatives {
            checks.push("alternatives");
        }
        if self.analyze_bundle_size {
            checks.push("bundle size");
        }
        checks
    }
}
