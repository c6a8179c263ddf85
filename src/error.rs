use thiserror::Error;

/// Failures of a whole audit, as opposed to per-parser trouble recorded in
/// [`crate::models::ParseResult::errors`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("No dependency content provided.")]
    NoContent,

    #[error(
        "Invalid content: the input is not a recognized dependency manifest and is not valid JSON. Supported formats: {}",
        .supported.join(", ")
    )]
    UnrecognizedContent { supported: Vec<String> },
}
