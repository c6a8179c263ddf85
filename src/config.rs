use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::models::AuditOptions;

const CONFIG_DIR: &str = ".dep-auditor";
const CONFIG_FILE: &str = "config.toml";

/// Root configuration structure, deserialized from `.dep-auditor/config.toml`.
/// Every key is optional; anything left out stays enabled.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub checks: ChecksConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Which rule categories run.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ChecksConfig {
    pub outdated: Option<bool>,
    pub deprecated: Option<bool>,
    pub vulnerabilities: Option<bool>,
    pub alternatives: Option<bool>,
    pub bundle_size: Option<bool>,
}

/// Optional report sections.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    pub references: Option<bool>,
    pub metadata: Option<bool>,
}

impl Config {
    pub fn to_options(&self) -> AuditOptions {
        let on = |flag: Option<bool>| flag.unwrap_or(true);
        AuditOptions {
            check_outdated: on(self.checks.outdated),
            check_deprecated: on(self.checks.deprecated),
            check_vulnerabilities: on(self.checks.vulnerabilities),
            suggest_alternatives: on(self.checks.alternatives),
            analyze_bundle_size: on(self.checks.bundle_size),
            include_references: on(self.report.references),
            include_metadata: on(self.report.metadata),
            input_file: None,
        }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`, the path passed via `--config`
/// 2. `<project_path>/.dep-auditor/config.toml`
/// 3. `~/.config/dep-auditor/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(CONFIG_DIR).join(CONFIG_FILE);
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home_config) = home_config_path() {
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    debug!("no configuration file found; using defaults");
    Ok(Config::default())
}

fn home_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("dep-auditor").join(CONFIG_FILE))
}

fn read_config(path: &Path) -> Result<Config> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = toml::from_str(&content).with_context(|| format!("invalid config file {}", path.display()))?;
    debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}
