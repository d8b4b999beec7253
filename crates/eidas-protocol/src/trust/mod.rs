//! Certificate and algorithm trust.
//!
//! The checks judge the signer certificate and algorithms a message declares.
//! They never verify signature bytes; that is the wire engine's job.

mod anchors;
pub(crate) mod certificate;
mod checks;
mod signature;
mod validator;

pub use anchors::TrustAnchorSet;
pub use certificate::Certificate;
pub use checks::{
    check_certificate_country, check_certificate_signature_hash, check_key_length,
    check_not_self_signed, check_signature_algorithm_whitelisted, check_trust_anchor,
    check_validity_period, extract_signer_certificate, normalize_digest_algorithm,
    signature_chain,
};
pub use signature::SignatureInfo;
pub use validator::{TrustPolicy, TrustValidator};

use chrono::{DateTime, Utc};
use eidas_core::ErrorKey;
use thiserror::Error;

/// Trust check failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrustError {
    /// The signature carries no usable key info.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// The certificate is outside its validity period.
    #[error("certificate {subject} is not valid outside [{not_before}, {not_after}]")]
    ExpiredCertificate {
        /// Subject DN.
        subject: String,
        /// Start of validity.
        not_before: DateTime<Utc>,
        /// End of validity.
        not_after: DateTime<Utc>,
    },

    /// Self-signed certificates are not accepted.
    #[error("self-signed certificate: {0}")]
    SelfSignedCertificate(String),

    /// Hash strength below policy.
    #[error("weak algorithm: {0}")]
    WeakAlgorithm(String),

    /// Algorithm not whitelisted.
    #[error("unapproved algorithm: {0}")]
    UnapprovedAlgorithm(String),

    /// No certificate of the chain is a trust anchor.
    #[error("untrusted certificate: {0}")]
    UntrustedCertificate(String),

    /// Key shorter than policy.
    #[error("weak key: {0}")]
    WeakKey(String),

    /// The certificate cannot be parsed or read.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Subject country differs from the expected one.
    #[error("certificate country {found:?} does not match {expected}")]
    CountryMismatch {
        /// Expected country.
        expected: String,
        /// Subject country, if any.
        found: Option<String>,
    },
}

impl TrustError {
    /// Catalog entry reported for this failure.
    #[must_use]
    pub const fn error_key(&self) -> ErrorKey {
        match self {
            Self::WeakAlgorithm(_) | Self::UnapprovedAlgorithm(_) => {
                ErrorKey::InvalidSignatureAlgorithm
            }
            Self::UntrustedCertificate(_) => ErrorKey::SamlEngineUntrustedCertificate,
            Self::MalformedSignature(_)
            | Self::ExpiredCertificate { .. }
            | Self::SelfSignedCertificate(_)
            | Self::WeakKey(_)
            | Self::InvalidCertificate(_)
            | Self::CountryMismatch { .. } => ErrorKey::SamlEngineInvalidCertificate,
        }
    }

    /// Whether the failure is a security failure rather than a content one.
    #[must_use]
    pub const fn is_security(&self) -> bool {
        matches!(
            self,
            Self::UntrustedCertificate(_) | Self::CountryMismatch { .. }
        )
    }
}
