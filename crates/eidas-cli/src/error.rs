//! CLI error types.

use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Node configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(#[from] eidas_core::Error),

    /// A certificate could not be read or parsed.
    #[error("certificate error: {0}")]
    Certificate(String),

    /// One or more checks failed.
    #[error("{0} check(s) failed")]
    ChecksFailed(usize),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
