//! Error types for identifier reconciliation

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, IdmapError>;

/// Main error type for the reconciliation engine
///
/// Every variant is fatal to the run; inputs must be fixed at the source.
#[derive(Error, Debug)]
pub enum IdmapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Input file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error(
        "Malformed line {line} in {}: expected at least {expected} fields, found {found}",
        path.display()
    )]
    MalformedLine {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid value at line {line} in {}: {message}", path.display())]
    InvalidValue {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IdmapError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid value error for a line of `path`
    pub fn invalid_value(path: impl Into<PathBuf>, line: usize, msg: impl Into<String>) -> Self {
        Self::InvalidValue {
            path: path.into(),
            line,
            message: msg.into(),
        }
    }
}
