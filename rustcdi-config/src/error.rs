//! Error types for rustcdi-config.

use thiserror::Error;

use crate::verify::VerifyError;

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration file line.
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// Malformed literal value.
    #[error("invalid literal: {0}")]
    Literal(String),

    /// Schema verification failure.
    #[error(transparent)]
    Verify(#[from] VerifyError),
}
