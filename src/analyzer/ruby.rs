use anyhow::{bail, Result};
use regex::Regex;
use tracing::debug;

use super::{matches, parse_with, ManifestParser};
use crate::models::{DependencyType, Ecosystem, Package, ParseResult, ANY_VERSION, SOURCE_GIT, SOURCE_PATH};

/// Bundler groups that still ship with the application.
const RUNTIME_GROUPS: &[&str] = &["default", "production"];

/// Parser for Bundler `Gemfile`s.
///
/// Only `gem` statements produce packages. `group ... do` blocks mark the gems
/// inside them as dev dependencies until the matching `end`; other `do` blocks
/// (`platforms`, `source`, `git`) and Ruby control flow (`if`, `unless`, `case`)
/// are tracked only to keep `end`s balanced.
pub struct GemfileParser;

impl GemfileParser {
    /// Create a new `GemfileParser`.
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for GemfileParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Ruby
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["Gemfile"]
    }

    fn can_parse(&self, content: &str) -> bool {
        matches(r#"(?m)^\s*gem\s+['"][^'"]+['"]"#, content)
            || matches(r#"(?m)^\s*source\s+['"]https?://"#, content)
    }

    fn parse(&self, content: &str) -> ParseResult {
        parse_with(self.ecosystem(), self.file_type(), content, parse_gemfile)
    }
}

#[derive(Debug)]
struct Block {
    dev: bool,
    opened_at: usize,
}

fn parse_gemfile(content: &str, result: &mut ParseResult) -> Result<()> {
    let gem_re = Regex::new(r#"^gem\s*\(?\s*['"]([^'"]+)['"](.*)$"#)?;
    let group_re = Regex::new(r"^group\s+(.+?)\s+do(\s*\|.*\|)?$")?;
    let do_re = Regex::new(r"\bdo(\s*\|[^|]*\|)?$")?;
    let end_re = Regex::new(r"^end\b")?;
    let keyword_re = Regex::new(r"^(if|unless|case|while|until|begin|def)\b")?;

    let mut stack: Vec<Block> = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if end_re.is_match(line) {
            if stack.pop().is_none() {
                bail!("unmatched `end` at line {}", line_no);
            }
            continue;
        }

        if let Some(caps) = group_re.captures(line) {
            let dev = !symbol_list(&caps[1]).iter().all(|g| RUNTIME_GROUPS.contains(&g.as_str()));
            stack.push(Block { dev, opened_at: line_no });
            continue;
        }

        if let Some(caps) = gem_re.captures(line) {
            let in_dev_group = stack.iter().any(|b| b.dev);
            result.push_package(gem_package(&caps[1], &caps[2], in_dev_group));
            // `gem "x", git: "..." do` is rare but legal.
            if do_re.is_match(line) {
                stack.push(Block { dev: false, opened_at: line_no });
            }
            continue;
        }

        if keyword_re.is_match(line) || do_re.is_match(line) {
            let inherited = stack.last().is_some_and(|b| b.dev);
            stack.push(Block { dev: inherited, opened_at: line_no });
        } else {
            debug!(line = line_no, text = line, "ignoring Gemfile statement");
        }
    }

    if let Some(block) = stack.first() {
        bail!("block opened at line {} is never closed", block.opened_at);
    }

    Ok(())
}

/// Build a package from the argument tail of `gem 'name', <args>`.
fn gem_package(name: &str, args: &str, in_dev_group: bool) -> Package {
    let mut constraints = Vec::new();
    let mut dev = in_dev_group;
    let mut source = None;

    for arg in split_args(args) {
        let arg = arg.trim().trim_end_matches(')').trim();
        if arg.is_empty() || arg == "do" {
            continue;
        }
        if let Some(quoted) = unquote(arg) {
            constraints.push(quoted.to_string());
            continue;
        }

        let Some((key, value)) = option_pair(arg) else {
            continue;
        };
        match key {
            "group" | "groups" => {
                let groups = symbol_list(value);
                if !groups.is_empty() && !groups.iter().all(|g| RUNTIME_GROUPS.contains(&g.as_str())) {
                    dev = true;
                }
            }
            "git" | "github" => source = Some(SOURCE_GIT),
            "path" => source = Some(SOURCE_PATH),
            _ => {}
        }
    }

    let version = if constraints.is_empty() {
        ANY_VERSION.to_string()
    } else {
        constraints.join(", ")
    };
    let dep_type = if dev {
        DependencyType::DevDependencies
    } else {
        DependencyType::Dependencies
    };

    let package = Package::new(name, version, dep_type);
    match source {
        Some(source) => package.with_source(source),
        None => package,
    }
}

/// Split on top-level commas, leaving commas inside brackets or quotes alone.
fn split_args(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in args.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[' | '(' | '{') => depth += 1,
            (None, ']' | ')' | '}') => depth -= 1,
            (None, ',') if depth <= 0 => {
                parts.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&args[start..]);
    parts
}

fn unquote(arg: &str) -> Option<&str> {
    let bytes = arg.as_bytes();
    if bytes.len() >= 2 && (bytes[0] == b'\'' || bytes[0] == b'"') && bytes[bytes.len() - 1] == bytes[0] {
        Some(&arg[1..arg.len() - 1])
    } else {
        None
    }
}

/// `group: :test`, `:require => false`
fn option_pair(arg: &str) -> Option<(&str, &str)> {
    if let Some((key, value)) = arg.split_once("=>") {
        return Some((key.trim().trim_start_matches(':'), value.trim()));
    }
    let (key, value) = arg.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

/// `:development, :test` or `[:development, "test"]` as plain names.
fn symbol_list(value: &str) -> Vec<String> {
    value
        .trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .map(|s| s.trim().trim_start_matches(':').trim_matches(|c| c == '\'' || c == '"'))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '#') => return &line[..i],
            _ => {}
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEMFILE: &str = r#"source "https://rubygems.org"
ruby "3.2.2"

gem "rails", "~> 7.0.4"
gem 'pg', '>= 0.18', '< 2.0'
gem "puma", "6.4.0" # web server
gem "sass-rails"
gem "internal", path: "../internal"
gem "rspec-rails", group: [:development, :test]

group :development, :test do
  gem "byebug", platforms: %i[mri mingw]
  gem "rubocop", require: false
end

group :production do
  gem "lograge"
end
"#;

    #[test]
    fn test_parse_gemfile() {
        let result = GemfileParser::new().parse(GEMFILE);
        assert!(result.errors.is_empty(), "{:?}", result.errors);

        let names: Vec<&str> = result.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["rails", "pg", "puma", "sass-rails", "internal", "rspec-rails", "byebug", "rubocop", "lograge"]
        );

        let pg = &result.packages[1];
        assert_eq!(pg.version, ">= 0.18, < 2.0");
        assert_eq!(result.packages[3].version, "*");
        assert!(result.packages[4].is_local());

        assert_eq!(result.count_of(DependencyType::DevDependencies), 3);
        let lograge = result.packages.iter().find(|p| p.name == "lograge").unwrap();
        assert_eq!(lograge.dep_type, DependencyType::Dependencies);
    }

    #[test]
    fn test_unclosed_group_keeps_packages() {
        let result = GemfileParser::new().parse("gem 'rails'\ngroup :test do\n  gem 'rspec'\n");
        assert_eq!(result.packages.len(), 2);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Error parsing Gemfile"));
    }

    #[test]
    fn test_unmatched_end() {
        let result = GemfileParser::new().parse("gem 'rails'\nend\ngem 'pg'\n");
        assert_eq!(result.packages.len(), 1);
        assert!(result.errors[0].contains("unmatched `end` at line 2"));
    }

    #[test]
    fn test_conditionals_keep_ends_balanced() {
        let content = "gem 'rails', '~> 7.0'\nif ENV['CI']\n  gem 'simplecov'\nend\ngem 'pg', '~> 1.5'\n\ngroup :test do\n  unless RUBY_PLATFORM =~ /java/\n    gem 'sqlite3'\n  end\n  gem 'capybara'\nend\ngem 'puma'\n";
        let result = GemfileParser::new().parse(content);
        assert!(result.errors.is_empty(), "{:?}", result.errors);

        let names: Vec<&str> = result.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["rails", "simplecov", "pg", "sqlite3", "capybara", "puma"]);
        assert_eq!(result.count_of(DependencyType::DevDependencies), 2);
        assert_eq!(result.packages[3].dep_type, DependencyType::DevDependencies);
    }

    #[test]
    fn test_hash_inside_quotes_is_not_a_comment() {
        assert_eq!(strip_comment("gem 'a#b', '1.0' # note"), "gem 'a#b', '1.0' ");
    }

    #[test]
    fn test_detection() {
        let parser = GemfileParser::new();
        assert!(parser.can_parse(GEMFILE));
        assert!(!parser.can_parse("module example.com/m\n"));
        assert!(!parser.can_parse("flask==2.0\n"));
    }
}
