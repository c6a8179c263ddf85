use tracing::debug;

use crate::analyzer::cpp::VcpkgParser;
use crate::analyzer::dotnet::CsprojParser;
use crate::analyzer::go::GoModParser;
use crate::analyzer::lua::RockspecParser;
use crate::analyzer::node::PackageJsonParser;
use crate::analyzer::pyproject::PyprojectParser;
use crate::analyzer::python::RequirementsParser;
use crate::analyzer::ruby::GemfileParser;
use crate::analyzer::rust::CargoTomlParser;
use crate::analyzer::typescript::TsconfigParser;
use crate::analyzer::uv::UvLockParser;
use crate::analyzer::yarn::YarnLockParser;
use crate::analyzer::ManifestParser;

/// Ordered set of manifest parsers.
///
/// Content sniffing asks each parser in turn and takes the first that accepts, so
/// the order below decides ambiguous inputs: `tsconfig.json` before the generic
/// JSON formats, `vcpkg.json` before `package.json`, lockfiles before manifests,
/// and `requirements.txt`, whose line grammar accepts almost anything, last.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn ManifestParser>>,
}

impl ParserRegistry {
    /// Create the registry with every parser in detection order.
    pub fn new() -> Self {
        let parsers: Vec<Box<dyn ManifestParser>> = vec![
            Box::new(TsconfigParser::new()),
            Box::new(VcpkgParser::new()),
            Box::new(PackageJsonParser::new()),
            Box::new(YarnLockParser::new()),
            Box::new(UvLockParser::new()),
            Box::new(PyprojectParser::new()),
            Box::new(CargoTomlParser::new()),
            Box::new(GoModParser::new()),
            Box::new(CsprojParser::new()),
            Box::new(RockspecParser::new()),
            Box::new(GemfileParser::new()),
            Box::new(RequirementsParser::new()),
        ];
        ParserRegistry { parsers }
    }

    pub fn parsers(&self) -> impl Iterator<Item = &dyn ManifestParser> {
        self.parsers.iter().map(|p| p.as_ref())
    }

    /// Look a parser up by file-type name, ignoring case. File names carrying a
    /// recognized extension (`Api.csproj`, `weather-1.0-1.rockspec`) also resolve.
    pub fn by_file_type(&self, hint: &str) -> Option<&dyn ManifestParser> {
        let hint = hint.trim();
        if hint.is_empty() {
            return None;
        }

        let exact = self
            .parsers()
            .find(|p| p.file_types().iter().any(|ft| ft.eq_ignore_ascii_case(hint)));
        if exact.is_some() {
            return exact;
        }

        let lower = hint.to_ascii_lowercase();
        self.parsers().find(|p| {
            p.file_types()
                .iter()
                .filter(|ft| ft.starts_with('.'))
                .any(|ext| lower.ends_with(&ext.to_ascii_lowercase()))
        })
    }

    /// First parser, in registry order, that recognizes `content`.
    pub fn detect(&self, content: &str) -> Option<&dyn ManifestParser> {
        let found = self.parsers().find(|p| p.can_parse(content));
        match found {
            Some(parser) => debug!(file_type = parser.file_type(), "content sniffing matched"),
            None => debug!("no parser recognized the content"),
        }
        found
    }

    /// Canonical file-type names in registry order.
    pub fn supported_file_types(&self) -> Vec<String> {
        self.parsers().map(|p| p.file_type().to_string()).collect()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ecosystem;

    #[test]
    fn test_registry_order_is_frozen() {
        let registry = ParserRegistry::new();
        assert_eq!(
            registry.supported_file_types(),
            vec![
                "tsconfig.json",
                "vcpkg.json",
                "package.json",
                "yarn.lock",
                "uv.lock",
                "pyproject.toml",
                "Cargo.toml",
                "go.mod",
                "csproj",
                "rockspec",
                "Gemfile",
                "requirements.txt",
            ]
        );
    }

    #[test]
    fn test_by_file_type() {
        let registry = ParserRegistry::new();
        assert_eq!(registry.by_file_type("CARGO.TOML").map(|p| p.ecosystem()), Some(Ecosystem::Rust));
        assert_eq!(registry.by_file_type("gemfile").map(|p| p.ecosystem()), Some(Ecosystem::Ruby));
        assert_eq!(registry.by_file_type("Weather.Api.csproj").map(|p| p.file_type()), Some("csproj"));
        assert_eq!(registry.by_file_type("luasocket-3.0-1.rockspec").map(|p| p.file_type()), Some("rockspec"));
        assert!(registry.by_file_type("auto").is_none());
        assert!(registry.by_file_type("pom.xml").is_none());
        assert!(registry.by_file_type("").is_none());
    }

    #[test]
    fn test_detect_prefers_specific_json_formats() {
        let registry = ParserRegistry::new();
        let tsconfig = r#"{ "compilerOptions": { "strict": true }, "dependencies": {} }"#;
        assert_eq!(registry.detect(tsconfig).map(|p| p.file_type()), Some("tsconfig.json"));

        let vcpkg = r#"{ "name": "engine", "dependencies": ["fmt"] }"#;
        assert_eq!(registry.detect(vcpkg).map(|p| p.file_type()), Some("vcpkg.json"));

        let npm = r#"{ "name": "web", "dependencies": { "react": "^18.0.0" } }"#;
        assert_eq!(registry.detect(npm).map(|p| p.file_type()), Some("package.json"));
    }

    #[test]
    fn test_detect_nothing() {
        let registry = ParserRegistry::new();
        assert!(registry.detect("").is_none());
        assert!(registry.detect("{}").is_none());
    }
}
