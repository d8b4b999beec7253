//! Protocol error types.
//!
//! Every failure carries an [`ErrorKey`] from the node's error catalog and
//! belongs to one of four categories that decide how the outer layer reacts.
//! A fifth variant, [`ProtocolError::Reply`], carries a ready-made failure
//! response that must be sent back to the counter-party instead of an error
//! page.

use eidas_core::ErrorKey;
use thiserror::Error;

use crate::types::AuthenticationResponse;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// How a failure must be treated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing endpoint, metadata or keying material. Fatal to the attempt.
    Configuration,
    /// A message failed a content check.
    Validation,
    /// Replay, country mismatch, untrusted signer or audience mismatch.
    Security,
    /// No correlation between a response and an outbound request.
    Session,
    /// A protocol-conformant failure reply is ready to be returned.
    Reply,
}

/// A failure response ready to be returned to the counter-party.
#[derive(Debug, Clone)]
pub struct FailureReply {
    /// Catalog entry explaining the failure.
    pub key: ErrorKey,
    /// The failure response.
    pub response: AuthenticationResponse,
    /// Marshalled and signed response from the wire engine.
    pub bytes: Vec<u8>,
    /// Relay state of the request being answered.
    pub relay_state: Option<String>,
}

/// Protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Configuration or collaborator failure.
    #[error("configuration error [{key}]: {detail}")]
    Configuration {
        /// Catalog entry.
        key: ErrorKey,
        /// Diagnostic detail, never shown to end users.
        detail: String,
    },

    /// Content validation failure.
    #[error("validation error [{key}]: {detail}")]
    Validation {
        /// Catalog entry.
        key: ErrorKey,
        /// Diagnostic detail, never shown to end users.
        detail: String,
    },

    /// Security failure. Always fail closed.
    #[error("security error [{key}]: {detail}")]
    Security {
        /// Catalog entry.
        key: ErrorKey,
        /// Diagnostic detail, never shown to end users.
        detail: String,
    },

    /// Correlation failure.
    #[error("session error [{key}]: {detail}")]
    Session {
        /// Catalog entry.
        key: ErrorKey,
        /// Diagnostic detail, never shown to end users.
        detail: String,
    },

    /// A failure reply for the counter-party.
    #[error("failure reply [{}]", .0.key)]
    Reply(Box<FailureReply>),
}

impl ProtocolError {
    /// Creates a configuration error.
    pub fn configuration(key: ErrorKey, detail: impl Into<String>) -> Self {
        Self::Configuration {
            key,
            detail: detail.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(key: ErrorKey, detail: impl Into<String>) -> Self {
        Self::Validation {
            key,
            detail: detail.into(),
        }
    }

    /// Creates a security error.
    pub fn security(key: ErrorKey, detail: impl Into<String>) -> Self {
        Self::Security {
            key,
            detail: detail.into(),
        }
    }

    /// Creates a session error.
    pub fn session(key: ErrorKey, detail: impl Into<String>) -> Self {
        Self::Session {
            key,
            detail: detail.into(),
        }
    }

    /// Catalog entry for this error.
    #[must_use]
    pub fn key(&self) -> ErrorKey {
        match self {
            Self::Configuration { key, .. }
            | Self::Validation { key, .. }
            | Self::Security { key, .. }
            | Self::Session { key, .. } => *key,
            Self::Reply(reply) => reply.key,
        }
    }

    /// Category of this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Security { .. } => ErrorCategory::Security,
            Self::Session { .. } => ErrorCategory::Session,
            Self::Reply(_) => ErrorCategory::Reply,
        }
    }

    /// Error code shown to the counter-party.
    #[must_use]
    pub fn error_code(&self) -> String {
        self.key().code()
    }

    /// Message key shown to the counter-party.
    #[must_use]
    pub fn error_message(&self) -> String {
        self.key().message()
    }

    /// Whether the failure must be audit-logged as security relevant.
    #[must_use]
    pub fn is_security_relevant(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Security | ErrorCategory::Session
        ) || self.key().is_security_relevant()
    }

    /// HTTP status the outer layer should render.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. } | Self::Reply(_) => 400,
            Self::Security { .. } | Self::Session { .. } => 403,
            Self::Configuration { .. } => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_and_http_status() {
        let err = ProtocolError::validation(ErrorKey::InvalidResponseLoaValue, "HIGH requested");
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.error_code(), "idp.incorrect.loa.code");
        assert!(!err.is_security_relevant());

        let err = ProtocolError::session(ErrorKey::AuRequestId, "no entry");
        assert_eq!(err.category(), ErrorCategory::Session);
        assert_eq!(err.http_status(), 403);
        assert!(err.is_security_relevant());

        let err = ProtocolError::configuration(ErrorKey::SamlEngineNoMetadata, "timeout");
        assert_eq!(err.http_status(), 500);
        assert_eq!(
            err.to_string(),
            "configuration error [SAML_ENGINE_NO_METADATA]: timeout"
        );
    }
}
