use dep_auditor::{audit_dependencies, AuditRequest, ParserRegistry};
use proptest::prelude::*;

fn manifest_like() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<String>(),
        "[a-z@/._-]{1,20}(==|>=|@|: | )[0-9.^~*x]{0,10}\n{0,3}",
        prop::collection::vec("[ \t]*(gem|require|module|go|\\[|\\{|\\}|\\(|\\)|end|do|<Project>|<PackageReference Include=\"a\"/>)[ a-z0-9\"'.=,]{0,12}", 0..12)
            .prop_map(|lines| lines.join("\n")),
    ]
}

proptest! {
    #[test]
    fn detection_and_parsing_never_panic(content in manifest_like()) {
        let registry = ParserRegistry::new();
        if let Some(parser) = registry.detect(&content) {
            let _ = parser.parse(&content);
        }
        for parser in registry.parsers() {
            let _ = parser.parse(&content);
        }
    }

    #[test]
    fn report_always_has_a_known_shape(content in manifest_like()) {
        let report = audit_dependencies(&AuditRequest::new(content));
        prop_assert!(report.starts_with("# Dependency Audit Report") || report.starts_with("Error"));
    }

    #[test]
    fn same_input_same_report(content in manifest_like()) {
        let request = AuditRequest::new(content);
        prop_assert_eq!(audit_dependencies(&request), audit_dependencies(&request));
    }

    #[test]
    fn parsed_packages_are_unique_per_bucket(content in manifest_like()) {
        let registry = ParserRegistry::new();
        for parser in registry.parsers() {
            let result = parser.parse(&content);
            for (i, a) in result.packages.iter().enumerate() {
                for b in &result.packages[i + 1..] {
                    prop_assert!(!(a.name == b.name && a.dep_type == b.dep_type));
                }
            }
        }
    }
}
