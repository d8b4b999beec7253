//! The signer certificate pipeline.

use chrono::{DateTime, Utc};
use eidas_core::config::TrustConfig;
use eidas_crypto::KeyLengthPolicy;
use tracing::{debug, warn};

use super::checks::{
    check_certificate_signature_hash, check_key_length, check_not_self_signed,
    check_signature_algorithm_whitelisted, check_trust_anchor, check_validity_period,
    extract_signer_certificate, normalize_digest_algorithm, signature_chain,
};
use super::{Certificate, SignatureInfo, TrustAnchorSet, TrustError};

/// Toggles and limits consulted by [`TrustValidator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPolicy {
    /// Enforce certificate validity periods.
    pub check_validity_period: bool,
    /// Reject self-signed signers.
    pub disallow_self_signed: bool,
    /// Accepted signature algorithm URIs.
    pub signature_algorithm_whitelist: Vec<String>,
    /// Digest algorithm for outgoing signatures; `None` selects SHA-512.
    pub digest_algorithm: Option<String>,
    /// Minimum key sizes.
    pub key_length: KeyLengthPolicy,
}

impl From<&TrustConfig> for TrustPolicy {
    fn from(config: &TrustConfig) -> Self {
        Self {
            check_validity_period: config.check_validity_period,
            disallow_self_signed: config.disallow_self_signed,
            signature_algorithm_whitelist: config.signature_algorithm_whitelist.clone(),
            digest_algorithm: config.digest_algorithm.clone(),
            key_length: KeyLengthPolicy {
                min_rsa_bits: config.min_rsa_key_bits,
                min_ec_bits: config.min_ec_key_bits,
            },
        }
    }
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self::from(&TrustConfig::default())
    }
}

/// Runs every trust check against a message signature, in a fixed order,
/// stopping at the first failure.
#[derive(Debug, Clone)]
pub struct TrustValidator {
    policy: TrustPolicy,
    anchors: TrustAnchorSet,
}

impl TrustValidator {
    /// Creates a validator.
    #[must_use]
    pub const fn new(policy: TrustPolicy, anchors: TrustAnchorSet) -> Self {
        Self { policy, anchors }
    }

    /// Creates a validator from configuration, loading the configured
    /// anchor files.
    ///
    /// ## Errors
    ///
    /// Returns [`TrustError::InvalidCertificate`] when an anchor file cannot
    /// be loaded.
    pub fn from_config(config: &TrustConfig) -> Result<Self, TrustError> {
        let anchors = TrustAnchorSet::load_pem_files(&config.trust_anchors)?;
        Ok(Self::new(TrustPolicy::from(config), anchors))
    }

    /// The policy in force.
    #[must_use]
    pub const fn policy(&self) -> &TrustPolicy {
        &self.policy
    }

    /// The anchor set.
    #[must_use]
    pub const fn anchors(&self) -> &TrustAnchorSet {
        &self.anchors
    }

    /// Digest algorithm URI for outgoing signatures.
    ///
    /// ## Errors
    ///
    /// Returns [`TrustError::WeakAlgorithm`] when SHA-1 is configured.
    pub fn signing_digest_algorithm(&self) -> Result<&'static str, TrustError> {
        normalize_digest_algorithm(self.policy.digest_algorithm.as_deref())
    }

    /// Validates the signer of a message at the current time.
    ///
    /// ## Errors
    ///
    /// Returns the first failing check.
    pub fn validate_signature(&self, signature: &SignatureInfo) -> Result<Certificate, TrustError> {
        self.validate_signature_at(signature, Utc::now())
    }

    /// Validates the signer of a message at `now`.
    ///
    /// ## Errors
    ///
    /// Returns the first failing check.
    pub fn validate_signature_at(
        &self,
        signature: &SignatureInfo,
        now: DateTime<Utc>,
    ) -> Result<Certificate, TrustError> {
        let result = self.run_pipeline(signature, now);
        match &result {
            Ok(cert) => debug!(
                subject = %cert.subject(),
                fingerprint = %cert.fingerprint(),
                "Signer certificate accepted"
            ),
            Err(e) => warn!(error = %e, "Signer certificate rejected"),
        }
        result
    }

    fn run_pipeline(
        &self,
        signature: &SignatureInfo,
        now: DateTime<Utc>,
    ) -> Result<Certificate, TrustError> {
        let signer = extract_signer_certificate(signature)?;
        check_signature_algorithm_whitelisted(
            signature.signature_algorithm.as_deref(),
            &self.policy.signature_algorithm_whitelist,
        )?;
        normalize_digest_algorithm(signature.digest_algorithm.as_deref())?;
        check_validity_period(&signer, self.policy.check_validity_period, now)?;
        check_not_self_signed(&signer, self.policy.disallow_self_signed)?;
        check_certificate_signature_hash(&signer)?;
        check_key_length(&signer, &self.policy.key_length)?;
        check_trust_anchor(&signature_chain(signature)?, &self.anchors)?;
        Ok(signer)
    }
}
