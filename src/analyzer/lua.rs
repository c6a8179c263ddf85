use anyhow::{bail, Result};
use regex::Regex;
use tracing::debug;

use super::{matches, parse_with, ManifestParser};
use crate::models::{DependencyType, Ecosystem, Package, ParseResult, ANY_VERSION};

const ROCKSPEC_TABLES: &[(&str, DependencyType)] = &[
    ("dependencies", DependencyType::Dependencies),
    ("build_dependencies", DependencyType::BuildDependencies),
    ("test_dependencies", DependencyType::DevDependencies),
];

/// Parser for LuaRocks `.rockspec` files.
///
/// Only the string literals inside the dependency tables are read; the rest of the
/// Lua source is never evaluated.
pub struct RockspecParser;

impl RockspecParser {
    /// Create a new `RockspecParser`.
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for RockspecParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Lua
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["rockspec", ".rockspec"]
    }

    fn can_parse(&self, content: &str) -> bool {
        matches(r#"(?m)^\s*package\s*=\s*["']"#, content)
            && (matches(r#"(?m)^\s*version\s*=\s*["']"#, content)
                || matches(r"(?m)^\s*dependencies\s*=\s*\{", content))
    }

    fn parse(&self, content: &str) -> ParseResult {
        parse_with(self.ecosystem(), self.file_type(), content, parse_rockspec)
    }
}

fn parse_rockspec(content: &str, result: &mut ParseResult) -> Result<()> {
    let source = strip_lua_comments(content);

    let package_re = Regex::new(r#"(?m)^\s*package\s*=\s*["']([^"']+)["']"#)?;
    let version_re = Regex::new(r#"(?m)^\s*version\s*=\s*["']([^"']+)["']"#)?;
    result.project_name = package_re.captures(&source).map(|c| c[1].to_string());
    result.project_version = version_re.captures(&source).map(|c| c[1].to_string());

    let string_re = Regex::new(r#""([^"]*)"|'([^']*)'"#)?;

    for (table, dep_type) in ROCKSPEC_TABLES {
        let table_re = Regex::new(&format!(r"(?m)^\s*{}\s*=\s*\{{", table))?;
        let Some(open) = table_re.find(&source) else {
            continue;
        };

        let body_start = open.end();
        let (body, terminated) = match closing_brace(&source[body_start..]) {
            Some(end) => (&source[body_start..body_start + end], true),
            None => (&source[body_start..], false),
        };

        for caps in string_re.captures_iter(body) {
            let spec = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            match rock_dependency(spec, *dep_type) {
                Some(package) => {
                    result.push_package(package);
                }
                None => debug!(table = *table, spec, "malformed rock dependency dropped"),
            }
        }

        if !terminated {
            bail!("`{}` table is never closed", table);
        }
    }

    Ok(())
}

/// Byte offset of the `}` closing a table whose `{` was just consumed.
fn closing_brace(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, c) in body.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '{') => depth += 1,
            (None, '}') if depth == 0 => return Some(i),
            (None, '}') => depth -= 1,
            _ => {}
        }
    }
    None
}

/// `"luasocket >= 3.0"` → name `luasocket`, constraint `>= 3.0`.
fn rock_dependency(spec: &str, dep_type: DependencyType) -> Option<Package> {
    let spec = spec.trim();
    let name_len = spec
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/')))
        .unwrap_or(spec.len());
    if name_len == 0 {
        return None;
    }

    let name = &spec[..name_len];
    let constraint = spec[name_len..].trim();
    if !constraint.is_empty() && !constraint.starts_with(['=', '>', '<', '~']) && !constraint.starts_with(char::is_numeric) {
        return None;
    }

    let version = if constraint.is_empty() { ANY_VERSION } else { constraint };
    Some(Package::new(name, version, dep_type))
}

/// Drop `--` line comments and `--[[ ]]` block comments that sit outside strings.
fn strip_lua_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_block = false;

    for line in content.lines() {
        let mut rest = line;
        loop {
            if in_block {
                match rest.find("]]") {
                    Some(end) => {
                        rest = &rest[end + 2..];
                        in_block = false;
                    }
                    None => {
                        rest = "";
                        break;
                    }
                }
            }
            match comment_start(rest) {
                Some(start) => {
                    out.push_str(&rest[..start]);
                    if rest[start + 2..].starts_with("[[") {
                        in_block = true;
                        rest = &rest[start + 4..];
                    } else {
                        rest = "";
                        break;
                    }
                }
                None => break,
            }
        }
        out.push_str(rest);
        out.push('\n');
    }
    out
}

fn comment_start(line: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let bytes = line.as_bytes();
    for (i, c) in line.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '-') if bytes.get(i + 1) == Some(&b'-') => return Some(i),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROCKSPEC: &str = r#"rockspec_format = "3.0"
package = "weather"
version = "1.2.0-1"
source = {
   url = "git+https://github.com/acme/weather.git",
}
-- runtime requirements
dependencies = {
   "lua >= 5.1, < 5.5",
   "luasocket ~> 3.0",
   "lua-cjson",
   "",
   "  ",
   "!!bad",
}
build_dependencies = {
   "luarocks-build-rust-mlua",
}
test_dependencies = {
   "busted == 2.2.0", --[[ pinned for CI ]]
}
"#;

    #[test]
    fn test_parse_rockspec() {
        let result = RockspecParser::new().parse(ROCKSPEC);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.project_name.as_deref(), Some("weather"));
        assert_eq!(result.project_version.as_deref(), Some("1.2.0-1"));

        let names: Vec<&str> = result.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["lua", "luasocket", "lua-cjson", "luarocks-build-rust-mlua", "busted"]);
        assert_eq!(result.packages[0].version, ">= 5.1, < 5.5");
        assert_eq!(result.packages[2].version, "*");
        assert_eq!(result.count_of(DependencyType::BuildDependencies), 1);
        assert_eq!(result.count_of(DependencyType::DevDependencies), 1);
        assert_eq!(result.packages[4].version, "== 2.2.0");
    }

    #[test]
    fn test_unterminated_table_keeps_packages() {
        let result = RockspecParser::new().parse("package = \"x\"\ndependencies = {\n  \"lua >= 5.1\",\n");
        assert_eq!(result.packages.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Error parsing rockspec"));
    }

    #[test]
    fn test_rock_dependency_splitting() {
        let p = rock_dependency("penlight>=1.5", DependencyType::Dependencies).unwrap();
        assert_eq!(p.name, "penlight");
        assert_eq!(p.version, ">=1.5");
        assert!(rock_dependency("", DependencyType::Dependencies).is_none());
        assert!(rock_dependency(">= 1.0", DependencyType::Dependencies).is_none());
    }

    #[test]
    fn test_detection() {
        let parser = RockspecParser::new();
        assert!(parser.can_parse(ROCKSPEC));
        assert!(!parser.can_parse("[package]\nname = \"x\"\nversion = \"1\"\n"));
    }
}
