use anyhow::{bail, Result};
use regex::Regex;
use tracing::debug;

use super::{matches, parse_with, ManifestParser};
use crate::models::{DependencyType, Ecosystem, Package, ParseResult};

/// Parser for Go module files (`go.mod`).
///
/// `// indirect` requirements go to the `optionalDependencies` bucket with an
/// `indirect` marker in `extras`. `replace`, `exclude` and `retract` directives are
/// read past without producing packages.
pub struct GoModParser;

impl GoModParser {
    /// Create a new `GoModParser`.
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for GoModParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["go.mod"]
    }

    fn can_parse(&self, content: &str) -> bool {
        matches(r"(?m)^\s*module\s+\S+", content)
            && (matches(r"(?m)^\s*go\s+\d", content) || matches(r"(?m)^\s*require\s", content))
    }

    fn parse(&self, content: &str) -> ParseResult {
        parse_with(self.ecosystem(), self.file_type(), content, parse_go_mod)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Require,
    Ignored,
}

fn parse_go_mod(content: &str, result: &mut ParseResult) -> Result<()> {
    let module_re = Regex::new(r#"^module\s+"?([^\s"]+)"?"#)?;
    let go_re = Regex::new(r"^go\s+(\S+)")?;
    let block_re = Regex::new(r"^(require|replace|exclude|retract)\s*\($")?;
    let require_re = Regex::new(r"^require\s+(.+)$")?;

    let mut block: Option<(Block, usize)> = None;

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if let Some((kind, _)) = block {
            if line == ")" {
                block = None;
            } else if kind == Block::Require {
                push_requirement(result, line, line_no);
            }
            continue;
        }

        if let Some(caps) = module_re.captures(line) {
            result.project_name = Some(caps[1].to_string());
        } else if let Some(caps) = go_re.captures(line) {
            result.project_version = Some(format!("go{}", &caps[1]));
        } else if let Some(caps) = block_re.captures(line) {
            let kind = if &caps[1] == "require" {
                Block::Require
            } else {
                Block::Ignored
            };
            block = Some((kind, line_no));
        } else if let Some(caps) = require_re.captures(line) {
            push_requirement(result, &caps[1], line_no);
        } else {
            debug!(line = line_no, text = line, "ignoring go.mod directive");
        }
    }

    if let Some((_, opened_at)) = block {
        bail!("unterminated block opened at line {}", opened_at);
    }

    Ok(())
}

/// `golang.org/x/crypto v0.5.0 // indirect`
fn push_requirement(result: &mut ParseResult, line: &str, line_no: usize) {
    let (spec, comment) = match line.split_once("//") {
        Some((spec, comment)) => (spec.trim(), comment.trim()),
        None => (line.trim(), ""),
    };

    let mut fields = spec.split_whitespace();
    let (Some(path), Some(version)) = (fields.next(), fields.next()) else {
        debug!(line = line_no, text = line, "malformed requirement skipped");
        return;
    };
    let path = path.trim_matches('"');

    let indirect = comment.split(';').any(|part| part.trim() == "indirect");
    let package = if indirect {
        Package::new(path, version, DependencyType::OptionalDependencies).with_extras(vec!["indirect".to_string()])
    } else {
        Package::new(path, version, DependencyType::Dependencies)
    };
    result.push_package(package);
}
