//! Dependency-manifest audit engine.
//!
//! # Flow
//! 1. Pick a parser by file-type hint or by sniffing the content ([`detector::ParserRegistry`]).
//! 2. Parse the manifest into the canonical model ([`analyzer`], [`models::ParseResult`]).
//! 3. Run the enabled rule checks ([`rules::analyze`]).
//! 4. Render the markdown report ([`report::markdown`]).
//!
//! [`auditor::audit_dependencies`] runs all four steps and always returns a report,
//! including for empty or unrecognized input.

pub mod analyzer;
pub mod auditor;
pub mod config;
pub mod detector;
pub mod error;
pub mod models;
pub mod report;
pub mod rules;

pub use auditor::{audit, audit_dependencies, AuditRequest};
pub use detector::ParserRegistry;
pub use error::AuditError;
pub use models::{AnalysisResult, AuditOptions, DependencyType, Ecosystem, Issue, Package, ParseResult, Severity};
