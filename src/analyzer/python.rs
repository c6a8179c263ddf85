use anyhow::Result;
use regex::Regex;
use tracing::debug;

use super::{parse_with, ManifestParser};
use crate::models::{DependencyType, Ecosystem, Package, ParseResult, ANY_VERSION};

/// Parser for pip `requirements.txt` files.
///
/// Option lines (`-r`, `-c`, `--extra-index-url`, ...), editable installs and
/// URL/VCS references are skipped. Bare names get the `"*"` version.
pub struct RequirementsParser;

impl RequirementsParser {
    /// Create a new `RequirementsParser`.
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for RequirementsParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["requirements.txt", "requirements-dev.txt", "requirements.in"]
    }

    fn can_parse(&self, content: &str) -> bool {
        let mut requirements = 0;
        for line in content.lines().filter_map(requirement_line) {
            if parse_requirement(line).is_none() {
                return false;
            }
            requirements += 1;
        }
        requirements > 0
    }

    fn parse(&self, content: &str) -> ParseResult {
        parse_with(self.ecosystem(), self.file_type(), content, parse_requirements_txt)
    }
}

/// A PEP 508 requirement split into the pieces the canonical model needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Requirement {
    pub name: String,
    pub extras: Vec<String>,
    /// Version specifier as written (e.g. `>=2.0,<3`), or `"*"`.
    pub constraint: String,
}

/// Strip comments/continuations and drop lines that carry no requirement.
fn requirement_line(raw: &str) -> Option<&str> {
    let line = raw
        .split(" #")
        .next()
        .unwrap_or(raw)
        .trim()
        .trim_end_matches('\\')
        .trim();

    if line.is_empty() || line.starts_with('#') || line.starts_with('-') || is_url_reference(line) {
        return None;
    }
    // `pkg==1.0 --hash=sha256:...`
    Some(line.split(" --").next().unwrap_or(line).trim())
}

fn is_url_reference(line: &str) -> bool {
    ["git+", "hg+", "svn+", "bzr+", "http://", "https://", "file:"]
        .iter()
        .any(|prefix| line.starts_with(prefix))
        || line.contains(" @ ")
}

/// Split one PEP 508 requirement string (`name[extra1,extra2] >=1.0 ; marker`).
///
/// Returns `None` when the text is not a requirement at all.
pub(crate) fn parse_requirement(spec: &str) -> Option<Requirement> {
    let without_marker = spec.split(';').next().unwrap_or(spec).trim();

    let name_end = without_marker
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        .unwrap_or(without_marker.len());
    let name = &without_marker[..name_end];
    if name.is_empty() || !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return None;
    }

    let mut rest = without_marker[name_end..].trim_start();
    let mut extras = Vec::new();
    if let Some(after_bracket) = rest.strip_prefix('[') {
        let close = after_bracket.find(']')?;
        extras = after_bracket[..close]
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect();
        rest = after_bracket[close + 1..].trim_start();
    }

    // Legacy parenthesized form: `django (>=3.2)`
    let rest = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .unwrap_or(rest)
        .trim();

    let constraint = if rest.is_empty() {
        ANY_VERSION.to_string()
    } else {
        let starts_with_operator = ["===", "==", ">=", "<=", "~=", "!=", "<", ">"]
            .iter()
            .any(|op| rest.starts_with(op));
        if !starts_with_operator {
            return None;
        }
        rest.split_whitespace().collect::<String>()
    };

    Some(Requirement {
        name: name.to_string(),
        extras,
        constraint,
    })
}

/// PEP 503 normalization: case-insensitive, runs of `-`, `_`, `.` are equivalent.
pub(crate) fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_sep = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !last_sep {
                out.push('-');
            }
            last_sep = true;
        } else {
            out.push(c.to_ascii_lowercase());
            last_sep = false;
        }
    }
    out
}

fn parse_requirements_txt(content: &str, result: &mut ParseResult) -> Result<()> {
    let option_re = Regex::new(r"^-{1,2}[A-Za-z]")?;
    let mut seen = std::collections::HashSet::new();

    for (index, raw) in content.lines().enumerate() {
        if option_re.is_match(raw.trim()) {
            debug!(line = index + 1, "skipping pip option line");
            continue;
        }
        let Some(line) = requirement_line(raw) else {
            continue;
        };
        let Some(req) = parse_requirement(line) else {
            debug!(line = index + 1, text = line, "unrecognized requirement line");
            continue;
        };

        if seen.insert(normalize_name(&req.name)) {
            result.push_package(
                Package::new(req.name, req.constraint, DependencyType::Dependencies).with_extras(req.extras),
            );
        }
    }

    Ok(())
}
