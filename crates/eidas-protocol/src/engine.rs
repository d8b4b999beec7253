//! Wire engine contract.
//!
//! The engine owns XML marshalling, XML-DSig computation and verification,
//! and time-window checks. Processors hand it validated values and receive
//! bytes, or hand it bytes and receive decoded values together with the
//! [`SignatureInfo`] the trust pipeline judges.

use thiserror::Error;

use crate::trust::SignatureInfo;
use crate::types::{AuthenticationRequest, AuthenticationResponse};

/// Engine failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A value could not be marshalled or signed.
    #[error("cannot generate message: {0}")]
    Generation(String),

    /// Bytes could not be decoded.
    #[error("cannot decode message: {0}")]
    Decoding(String),

    /// The signature or a time window did not verify.
    #[error("message rejected: {0}")]
    Rejected(String),
}

/// Signing settings the trust policy hands to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningParameters {
    /// Digest algorithm URI.
    pub digest_algorithm: String,
}

/// Accepted clock drift around the issue instant, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockSkew {
    /// Drift tolerated before the issue instant.
    pub before_ms: i64,
    /// Drift tolerated after the validity window.
    pub after_ms: i64,
}

/// A generated request.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// Signed wire bytes.
    pub bytes: Vec<u8>,
    /// The request as marshalled. Its id is the correlation key.
    pub request: AuthenticationRequest,
}

/// Fields readable from a response before it is validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Response id.
    pub id: String,
    /// Id of the answered request.
    pub in_response_to: Option<String>,
    /// Issuer entity id.
    pub issuer: Option<String>,
}

/// A response whose signature and time windows verified.
#[derive(Debug, Clone)]
pub struct ValidatedResponse {
    /// Decoded response.
    pub response: AuthenticationResponse,
    /// Signature declarations.
    pub signature: SignatureInfo,
}

/// A decoded inbound request.
#[derive(Debug, Clone)]
pub struct DecodedRequest {
    /// Decoded request.
    pub request: AuthenticationRequest,
    /// Signature declarations.
    pub signature: SignatureInfo,
}

/// Marshals, signs, decodes and verifies wire messages.
pub trait ProtocolEngine: Send + Sync {
    /// Marshals and signs an outbound request.
    fn generate_request(
        &self,
        request: &AuthenticationRequest,
        destination_metadata_url: &str,
        signing: &SigningParameters,
    ) -> Result<EngineRequest, EngineError>;

    /// Reads the header of a response without verifying it.
    fn peek_response(&self, token: &[u8]) -> Result<ResponseHeader, EngineError>;

    /// Decodes a response and verifies its signature and time windows.
    fn validate_response(
        &self,
        token: &[u8],
        remote_ip: Option<&str>,
        skew: ClockSkew,
        audience: Option<&str>,
    ) -> Result<ValidatedResponse, EngineError>;

    /// Decodes an inbound request and verifies its signature.
    fn decode_request(&self, token: &[u8]) -> Result<DecodedRequest, EngineError>;

    /// Marshals and signs a successful response.
    fn generate_response(
        &self,
        request: &AuthenticationRequest,
        response: &AuthenticationResponse,
        remote_ip: Option<&str>,
        signing: &SigningParameters,
    ) -> Result<Vec<u8>, EngineError>;

    /// Marshals and signs a failure response.
    fn generate_error_response(
        &self,
        request: &AuthenticationRequest,
        response: &AuthenticationResponse,
        remote_ip: Option<&str>,
        signing: &SigningParameters,
    ) -> Result<Vec<u8>, EngineError>;
}
