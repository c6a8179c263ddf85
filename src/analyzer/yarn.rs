use std::cmp::Ordering;

use anyhow::Result;
use regex::Regex;
use tracing::debug;

use super::{matches, parse_with, ManifestParser};
use crate::models::{DependencyType, Ecosystem, Package, ParseResult};
use crate::rules::version::compare_for;

/// Parser for `yarn.lock`, both the classic v1 format and the YAML-like berry (v2+) format.
///
/// Every entry lands in the `dependencies` bucket. Range aliases resolving to the same
/// `(name, version)` collapse into one package; when a name resolves to several versions
/// the lowest one is kept so that vulnerable copies stay visible to the rule engine.
pub struct YarnLockParser;

impl YarnLockParser {
    /// Create a new `YarnLockParser`.
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for YarnLockParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::JavaScript
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["yarn.lock"]
    }

    fn can_parse(&self, content: &str) -> bool {
        if content.contains("# yarn lockfile v1") || content.contains("\n__metadata:") || content.starts_with("__metadata:") {
            return true;
        }
        // Unlabelled lockfile: at least one `name@range:` header followed by a version line.
        matches(r#"(?m)^"?@?[A-Za-z0-9][^\s@"]*@[^\n]*:\s*$"#, content)
            && matches(r#"(?m)^\s+version:?\s+"?[0-9]"#, content)
    }

    fn parse(&self, content: &str) -> ParseResult {
        parse_with(self.ecosystem(), self.file_type(), content, parse_yarn_lock)
    }
}

/// Split a header spec like `"@scope/pkg@^1.0.0"` or `lodash@npm:^4.17.0` into `(name, range)`.
fn split_spec(spec: &str) -> Option<(&str, &str)> {
    let spec = spec.trim().trim_matches('"');
    // The separating `@` is never the first character (scoped names start with `@`).
    let at = spec.get(1..)?.find('@')? + 1;
    let (name, range) = spec.split_at(at);
    Some((name, &range[1..]))
}

/// Lockfile protocols that point inside the workspace rather than at a registry.
fn is_workspace_protocol(range: &str) -> bool {
    ["workspace:", "patch:", "link:", "portal:", "file:"]
        .iter()
        .any(|proto| range.starts_with(proto))
}

fn parse_yarn_lock(content: &str, result: &mut ParseResult) -> Result<()> {
    // v1: `  version "1.2.3"`, v2: `  version: 1.2.3`
    let version_re = Regex::new(r#"^\s+version:?\s+"?([^"\s]+)"?\s*$"#)?;

    let mut current: Option<String> = None;

    for line in content.lines() {
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        // Block header (not indented, ends with ":")
        if !line.starts_with(' ') && !line.starts_with('\t') {
            current = None;
            let header = line.trim_end().trim_end_matches(':');
            if header == "__metadata" {
                continue;
            }

            let first_spec = header.split(',').next().unwrap_or(header);
            match split_spec(first_spec) {
                Some((_, range)) if is_workspace_protocol(range.trim_start_matches("npm:")) => {
                    debug!(header, "skipping workspace-local lockfile entry");
                }
                Some((name, _)) => current = Some(name.to_string()),
                None => debug!(header, "unrecognized yarn.lock header"),
            }
            continue;
        }

        if let (Some(name), Some(caps)) = (current.as_ref(), version_re.captures(line)) {
            record_resolution(result, name, &caps[1]);
            current = None;
        }
    }

    Ok(())
}

fn record_resolution(result: &mut ParseResult, name: &str, version: &str) {
    let existing = result
        .packages
        .iter_mut()
        .find(|p| p.name == name && p.dep_type == DependencyType::Dependencies);

    match existing {
        Some(pkg) => {
            if compare_for(Ecosystem::JavaScript, version, &pkg.version) == Ordering::Less {
                pkg.version = version.to_string();
            }
        }
        None => {
            result.push_package(Package::new(name, version, DependencyType::Dependencies));
        }
    }
}
