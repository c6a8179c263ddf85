use anyhow::{bail, Context, Result};
use serde_json::Value;

use super::{parse_with, string_list, ManifestParser};
use crate::models::{
    DependencyType, Ecosystem, Package, ParseResult, ANY_VERSION, LOCAL_VERSION, SOURCE_EXTENDS,
    SOURCE_PROJECT_REFERENCE,
};

/// Parser for `tsconfig.json`.
///
/// `compilerOptions.types` become `@types/*` dev dependencies, `references[].path`
/// become project-reference pseudo-packages and `extends` becomes an `extends`
/// pseudo-package. Comments and trailing commas are tolerated.
pub struct TsconfigParser;

impl TsconfigParser {
    /// Create a new `TsconfigParser`.
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for TsconfigParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::TypeScript
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["tsconfig.json", "jsconfig.json"]
    }

    fn can_parse(&self, content: &str) -> bool {
        let Ok(Value::Object(json)) = serde_json::from_str::<Value>(&strip_jsonc(content)) else {
            return false;
        };
        json.get("compilerOptions").is_some_and(Value::is_object)
            || json.get("references").is_some_and(Value::is_array)
            || json
                .get("extends")
                .is_some_and(|v| v.is_string() || v.is_array())
    }

    fn parse(&self, content: &str) -> ParseResult {
        parse_with(self.ecosystem(), self.file_type(), content, parse_tsconfig)
    }
}

fn parse_tsconfig(content: &str, result: &mut ParseResult) -> Result<()> {
    let json: Value = serde_json::from_str(&strip_jsonc(content)).context("invalid JSON")?;
    let Value::Object(json) = json else {
        bail!("expected a JSON object at the top level");
    };

    let types = json
        .get("compilerOptions")
        .and_then(|opts| opts.get("types"));
    for name in string_list(types) {
        result.push_package(Package::new(
            types_package(&name),
            ANY_VERSION,
            DependencyType::DevDependencies,
        ));
    }

    if let Some(references) = json.get("references").and_then(Value::as_array) {
        for path in references
            .iter()
            .filter_map(|r| r.get("path").and_then(Value::as_str))
        {
            result.push_package(
                Package::new(path, LOCAL_VERSION, DependencyType::BuildDependencies)
                    .with_source(SOURCE_PROJECT_REFERENCE),
            );
        }
    }

    // TypeScript 5 allows an array of bases.
    let bases = match json.get("extends") {
        Some(Value::String(base)) => vec![base.clone()],
        Some(array @ Value::Array(_)) => string_list(Some(array)),
        _ => Vec::new(),
    };
    for base in bases {
        let version = if base.starts_with('.') || base.starts_with('/') {
            LOCAL_VERSION
        } else {
            ANY_VERSION
        };
        result.push_package(
            Package::new(base, version, DependencyType::DevDependencies).with_source(SOURCE_EXTENDS),
        );
    }

    Ok(())
}

/// `node` → `@types/node`; scoped names (including `@types/*`) pass through.
fn types_package(name: &str) -> String {
    if name.starts_with('@') {
        name.to_string()
    } else {
        format!("@types/{}", name)
    }
}

/// Remove `//` and `/* */` comments plus trailing commas, leaving string literals intact.
pub(crate) fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    remove_trailing_commas(&out)
}

fn remove_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            if !matches!(next, Some('}') | Some(']')) {
                out.push(c);
            }
        } else {
            out.push(c);
        }
        i += 1;
    }

    out
}
