use std::path::PathBuf;

use clap::Parser;

use dep_auditor::models::AuditOptions;

#[derive(Parser, Debug)]
#[command(
    name = "dep-auditor",
    about = "Audit a dependency manifest for deprecated, vulnerable and loosely pinned packages",
    version
)]
pub struct Cli {
    /// Manifest or lockfile to audit; `-` reads standard input
    #[arg(default_value = "-")]
    pub input: String,

    /// File type of the input (e.g. package.json, go.mod, csproj, auto) [default: from file name, else auto]
    #[arg(long, value_name = "TYPE")]
    pub file_type: Option<String>,

    /// Output format
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Config file [default: ./.dep-auditor/config.toml, fallback ~/.config/dep-auditor/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Skip version-policy checks
    #[arg(long)]
    pub no_outdated: bool,

    /// Skip deprecated-package checks
    #[arg(long)]
    pub no_deprecated: bool,

    /// Skip known-vulnerability checks
    #[arg(long)]
    pub no_vulnerabilities: bool,

    /// Skip alternative-package suggestions
    #[arg(long)]
    pub no_alternatives: bool,

    /// Skip bundle-size analysis
    #[arg(long)]
    pub no_bundle_size: bool,

    /// Leave the References section out of the report
    #[arg(long)]
    pub no_references: bool,

    /// Leave the Metadata section out of the report
    #[arg(long)]
    pub no_metadata: bool,

    /// Verbose output (info logs; full package table in terminal format)
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print a summary line (terminal format)
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug logging
    #[arg(long)]
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Markdown,
    Json,
    Terminal,
}

impl Cli {
    pub fn reads_stdin(&self) -> bool {
        self.input == "-"
    }

    /// Apply `--no-*` flags on top of options loaded from configuration.
    pub fn apply_overrides(&self, mut options: AuditOptions) -> AuditOptions {
        if self.no_outdated {
            options.check_outdated = false;
        }
        if self.no_deprecated {
            options.check_deprecated = false;
        }
        if self.no_vulnerabilities {
            options.check_vulnerabilities = false;
        }
        if self.no_alternatives {
            options.suggest_alternatives = false;
        }
        if self.no_bundle_size {
            options.analyze_bundle_size = false;
        }
        if self.no_references {
            options.include_references = false;
        }
        if self.no_metadata {
            options.include_metadata = false;
        }
        if !self.reads_stdin() {
            options.input_file = Some(self.input.clone());
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from(["dep-auditor", "Cargo.toml", "--no-deprecated", "--no-metadata"]);
        let opts = cli.apply_overrides(AuditOptions::default());
        assert!(!opts.check_deprecated);
        assert!(!opts.include_metadata);
        assert!(opts.check_vulnerabilities);
        assert_eq!(opts.input_file.as_deref(), Some("Cargo.toml"));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["dep-auditor"]);
        assert!(cli.reads_stdin());
        assert_eq!(cli.format, OutputFormat::Markdown);
        assert!(cli.apply_overrides(AuditOptions::default()).input_file.is_none());
    }

    #[test]
    fn test_format_and_file_type() {
        let cli = Cli::parse_from(["dep-auditor", "-", "--format", "json", "--file-type", "go.mod"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.file_type.as_deref(), Some("go.mod"));
    }
}
