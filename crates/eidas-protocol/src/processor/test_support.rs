//! Scripted collaborators for processor tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use eidas_cache::InMemoryAntiReplayCache;
use eidas_core::event::{AuditSink, Event, EventType};
use parking_lot::Mutex;

use super::Collaborators;
use crate::engine::{
    ClockSkew, DecodedRequest, EngineError, EngineRequest, ProtocolEngine, ResponseHeader,
    SigningParameters, ValidatedResponse,
};
use crate::metadata::StaticMetadataFetcher;
use crate::trust::certificate::test_support::{chain, Fixture};
use crate::trust::{SignatureInfo, TrustAnchorSet, TrustPolicy, TrustValidator};
use crate::types::{new_message_id, AuthenticationRequest, AuthenticationResponse};

/// Engine that hands back whatever a test scripted for a token.
#[derive(Default)]
pub struct ScriptedEngine {
    responses: Mutex<HashMap<Vec<u8>, ValidatedResponse>>,
    requests: Mutex<HashMap<Vec<u8>, DecodedRequest>>,
    generated: Mutex<Vec<AuthenticationResponse>>,
    skews: Mutex<Vec<ClockSkew>>,
}

impl ScriptedEngine {
    pub fn script_response(&self, token: &[u8], response: AuthenticationResponse, signature: SignatureInfo) {
        self.responses.lock().insert(
            token.to_vec(),
            ValidatedResponse {
                response,
                signature,
            },
        );
    }

    pub fn script_request(&self, token: &[u8], request: AuthenticationRequest, signature: SignatureInfo) {
        self.requests
            .lock()
            .insert(token.to_vec(), DecodedRequest { request, signature });
    }

    pub fn generated(&self) -> Vec<AuthenticationResponse> {
        self.generated.lock().clone()
    }

    pub fn skews(&self) -> Vec<ClockSkew> {
        self.skews.lock().clone()
    }
}

impl ProtocolEngine for ScriptedEngine {
    fn generate_request(
        &self,
        request: &AuthenticationRequest,
        _destination_metadata_url: &str,
        _signing: &SigningParameters,
    ) -> Result<EngineRequest, EngineError> {
        let id = new_message_id();
        Ok(EngineRequest {
            bytes: format!("<AuthnRequest ID=\"{id}\"/>").into_bytes(),
            request: request.clone().with_id(id),
        })
    }

    fn peek_response(&self, token: &[u8]) -> Result<ResponseHeader, EngineError> {
        self.responses
            .lock()
            .get(token)
            .map(|v| ResponseHeader {
                id: v.response.id.clone(),
                in_response_to: Some(v.response.in_response_to.clone()),
                issuer: Some(v.response.issuer.clone()),
            })
            .ok_or_else(|| EngineError::Decoding("unknown token".to_string()))
    }

    fn validate_response(
        &self,
        token: &[u8],
        _remote_ip: Option<&str>,
        skew: ClockSkew,
        _audience: Option<&str>,
    ) -> Result<ValidatedResponse, EngineError> {
        self.skews.lock().push(skew);
        self.responses
            .lock()
            .get(token)
            .cloned()
            .ok_or_else(|| EngineError::Rejected("unknown token".to_string()))
    }

    fn decode_request(&self, token: &[u8]) -> Result<DecodedRequest, EngineError> {
        self.requests
            .lock()
            .get(token)
            .cloned()
            .ok_or_else(|| EngineError::Decoding("unknown token".to_string()))
    }

    fn generate_response(
        &self,
        _request: &AuthenticationRequest,
        response: &AuthenticationResponse,
        _remote_ip: Option<&str>,
        _signing: &SigningParameters,
    ) -> Result<Vec<u8>, EngineError> {
        self.generated.lock().push(response.clone());
        Ok(format!("<Response ID=\"{}\"/>", response.id).into_bytes())
    }

    fn generate_error_response(
        &self,
        request: &AuthenticationRequest,
        response: &AuthenticationResponse,
        remote_ip: Option<&str>,
        signing: &SigningParameters,
    ) -> Result<Vec<u8>, EngineError> {
        self.generate_response(request, response, remote_ip, signing)
    }
}

/// Audit sink that keeps every event.
#[derive(Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingAuditSink {
    pub fn types(&self) -> Vec<EventType> {
        self.events.lock().iter().map(|e| e.event_type).collect()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}

/// Collaborators plus handles on the scripted parts.
pub struct Harness {
    pub metadata: Arc<StaticMetadataFetcher>,
    pub engine: Arc<ScriptedEngine>,
    pub audit: Arc<RecordingAuditSink>,
    pub signer: Fixture,
}

impl Harness {
    pub fn new(country: &str) -> Self {
        Self {
            metadata: Arc::new(StaticMetadataFetcher::new()),
            engine: Arc::new(ScriptedEngine::default()),
            audit: Arc::new(RecordingAuditSink::default()),
            signer: chain(country),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            metadata: self.metadata.clone(),
            engine: self.engine.clone(),
            replay: Arc::new(InMemoryAntiReplayCache::new(Duration::from_secs(60))),
            audit: self.audit.clone(),
        }
    }

    /// Validator that anchors the harness signer's CA.
    pub fn trust(&self) -> TrustValidator {
        TrustValidator::new(
            TrustPolicy::default(),
            TrustAnchorSet::from_certificates([self.signer.ca.clone()]),
        )
    }

    /// Signature declarations of a message signed by the harness signer.
    pub fn signature(&self) -> SignatureInfo {
        SignatureInfo::default()
            .with_signature_algorithm("http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256")
            .with_digest_algorithm("http://www.w3.org/2001/04/xmlenc#sha512")
            .with_certificate(STANDARD.encode(self.signer.leaf.der()))
            .with_certificate(STANDARD.encode(self.signer.ca.der()))
    }
}
