//! Report renderers for audit results.
//!
//! - [`markdown`]: the canonical report document returned by the engine.
//! - [`terminal`]: colored, tabular view for the CLI; respects `--verbose` / `--quiet`.

pub mod markdown;
pub mod terminal;
