//! TOML decoding with section-level recovery.
//!
//! A single syntax error makes `toml::from_str` reject the whole document. When that
//! happens the document is cut at its table headers, each section is decoded on its
//! own (keeping the longest prefix of it that is valid), and the surviving sections are
//! merged back together. The original decode error is handed back so the parser can
//! still report it.

use regex::Regex;
use toml::{Table, Value};
use tracing::debug;

/// Decode `content`, falling back to per-section recovery on a syntax error.
pub(crate) fn decode(content: &str) -> (Table, Result<(), toml::de::Error>) {
    match toml::from_str::<Table>(content) {
        Ok(doc) => (doc, Ok(())),
        Err(err) => {
            let mut doc = Table::new();
            for section in sections(content) {
                merge(&mut doc, longest_valid_prefix(&section));
            }
            debug!(recovered_keys = doc.len(), "recovered TOML sections after a decode error");
            (doc, Err(err))
        }
    }
}

/// Lines grouped so that each group starts at a `[table]` or `[[array]]` header.
/// The first group holds the root keys and may be empty.
fn sections(content: &str) -> Vec<Vec<&str>> {
    let header = Regex::new(r#"^\s*\[\[?\s*[A-Za-z0-9_\-][^\[\]=]*\]\]?\s*(#.*)?$"#).ok();
    let mut groups: Vec<Vec<&str>> = vec![Vec::new()];

    for line in content.lines() {
        let starts_section = header.as_ref().is_some_and(|re| re.is_match(line));
        match groups.last_mut() {
            Some(group) if !starts_section => group.push(line),
            _ => groups.push(vec![line]),
        }
    }
    groups
}

fn longest_valid_prefix(lines: &[&str]) -> Table {
    (1..=lines.len())
        .rev()
        .find_map(|end| toml::from_str::<Table>(&lines[..end].join("\n")).ok())
        .unwrap_or_default()
}

/// Tables merge key by key and arrays of tables are appended, so repeated
/// `[[package]]` sections add up.
fn merge(into: &mut Table, from: Table) {
    for (key, incoming) in from {
        match into.get_mut(&key) {
            Some(Value::Table(existing)) if incoming.is_table() => {
                if let Value::Table(incoming) = incoming {
                    merge(existing, incoming);
                }
            }
            Some(Value::Array(existing)) if incoming.is_array() => {
                if let Value::Array(incoming) = incoming {
                    existing.extend(incoming);
                }
            }
            _ => {
                into.insert(key, incoming);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_document_decodes_whole() {
        let (doc, decoded) = decode("[a]\nx = 1\n\n[b]\ny = 2\n");
        assert!(decoded.is_ok());
        assert_eq!(doc["a"]["x"].as_integer(), Some(1));
        assert_eq!(doc["b"]["y"].as_integer(), Some(2));
    }

    #[test]
    fn test_broken_tail_keeps_earlier_sections() {
        let content = "[a]\nx = 1\n\n[b]\ny = 2\nz = { broken = \n";
        let (doc, decoded) = decode(content);
        assert!(decoded.is_err());
        assert_eq!(doc["a"]["x"].as_integer(), Some(1));
        assert_eq!(doc["b"]["y"].as_integer(), Some(2));
        assert!(doc["b"].get("z").is_none());
    }

    #[test]
    fn test_array_sections_are_appended() {
        let content = "[[package]]\nname = \"a\"\n\n[[package]]\nname = \"b\"\n\n[[package]]\nname = \"c\"\nversion = \"1.";
        let (doc, decoded) = decode(content);
        assert!(decoded.is_err());
        let names: Vec<&str> = doc["package"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p.get("name").and_then(Value::as_str))
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dotted_headers_nest() {
        let content = "[project]\nname = \"x\"\n\n[project.optional-dependencies]\ndocs = [\"mkdocs\"]\n\n[tool.x]\ny = [\n";
        let (doc, _) = decode(content);
        assert_eq!(doc["project"]["name"].as_str(), Some("x"));
        assert!(doc["project"]["optional-dependencies"]["docs"].is_array());
    }

    #[test]
    fn test_array_lines_are_not_headers() {
        let groups = sections("deps = [\n  \"a\",\n]\n[x]\n");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1], vec!["[x]"]);
    }
}
