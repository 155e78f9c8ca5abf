//! Error types for outline rendering

use std::io;
use thiserror::Error;

/// A ruleset or dump configuration that cannot be used.
///
/// These indicate a caller mistake rather than bad document data.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("unknown ruleset preset '{0}' (expected one of: book, full)")]
    UnknownPreset(String),

    #[error("no rule matches tag '{tag}' and the ruleset has no wildcard default")]
    NoRule { tag: String },

    #[error("invalid wrap width {0} (must be > 0)")]
    InvalidWidth(usize),

    #[error("invalid dump configuration: {0}")]
    Invalid(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DumpError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("failed to write outline: {0}")]
    Io(#[from] io::Error),
}
