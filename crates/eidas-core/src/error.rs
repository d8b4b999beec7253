//! Error handling for node bootstrap.
//!
//! Protocol failures live in `eidas-protocol`; this type only covers what can
//! go wrong before a node starts processing messages.

use thiserror::Error;

/// Result type alias using the core error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading or checking node configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is syntactically valid but inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("configuration parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true when the error came from the operator's input rather than
    /// the environment.
    #[must_use]
    pub const fn is_operator_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Parse(_))
    }
}
