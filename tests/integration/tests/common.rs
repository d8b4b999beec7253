//! Common test utilities and fixtures.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use eidas_cache::InMemoryAntiReplayCache;
use eidas_core::config::{CacheConfig, ConnectorConfig, ProxyServiceConfig, ServiceConfig, SpType};
use eidas_core::event::{AuditSink, Event, EventType};
use eidas_protocol::attribute::{eidas_registry, uris, AttributeCatalog};
use eidas_protocol::engine::{
    ClockSkew, DecodedRequest, EngineError, EngineRequest, ProtocolEngine, ResponseHeader,
    SigningParameters, ValidatedResponse,
};
use eidas_protocol::loa::LevelOfAssurance;
use eidas_protocol::metadata::{Endpoint, MetadataParameters, StaticMetadataFetcher};
use eidas_protocol::processor::{Collaborators, ConnectorProcessor, ProxyServiceProcessor};
use eidas_protocol::trust::{Certificate, SignatureInfo, TrustAnchorSet, TrustPolicy, TrustValidator};
use eidas_protocol::types::{new_message_id, AuthenticationRequest, AuthenticationResponse};
use parking_lot::Mutex;
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};

pub const CONNECTOR_METADATA: &str = "https://connector.example.be/metadata";
pub const PS_METADATA: &str = "https://ps.example.es/metadata";
pub const PS_POST: &str = "https://ps.example.es/post";
pub const SP_ISSUER: &str = "https://sp.example.be/metadata";

/// Messages in flight between the two nodes, keyed by message id.
#[derive(Default)]
pub struct Wire {
    requests: Mutex<HashMap<String, DecodedRequest>>,
    responses: Mutex<HashMap<String, ValidatedResponse>>,
}

/// Engine of one node. Bytes on the wire are the message id.
pub struct LoopbackEngine {
    wire: Arc<Wire>,
    signature: SignatureInfo,
}

impl LoopbackEngine {
    pub fn new(wire: Arc<Wire>, signature: SignatureInfo) -> Self {
        Self { wire, signature }
    }

    fn send_response(&self, response: &AuthenticationResponse) -> Vec<u8> {
        self.wire.responses.lock().insert(
            response.id.clone(),
            ValidatedResponse {
                response: response.clone(),
                signature: self.signature.clone(),
            },
        );
        response.id.clone().into_bytes()
    }
}

fn message_id(token: &[u8]) -> Result<&str, EngineError> {
    std::str::from_utf8(token).map_err(|e| EngineError::Decoding(e.to_string()))
}

impl ProtocolEngine for LoopbackEngine {
    fn generate_request(
        &self,
        request: &AuthenticationRequest,
        _destination_metadata_url: &str,
        _signing: &SigningParameters,
    ) -> Result<EngineRequest, EngineError> {
        let request = request.clone().with_id(new_message_id());
        self.wire.requests.lock().insert(
            request.id.clone(),
            DecodedRequest {
                request: request.clone(),
                signature: self.signature.clone(),
            },
        );
        Ok(EngineRequest {
            bytes: request.id.clone().into_bytes(),
            request,
        })
    }

    fn peek_response(&self, token: &[u8]) -> Result<ResponseHeader, EngineError> {
        let id = message_id(token)?;
        self.wire
            .responses
            .lock()
            .get(id)
            .map(|v| ResponseHeader {
                id: v.response.id.clone(),
                in_response_to: Some(v.response.in_response_to.clone()),
                issuer: Some(v.response.issuer.clone()),
            })
            .ok_or_else(|| EngineError::Decoding(format!("no response {id}")))
    }

    fn validate_response(
        &self,
        token: &[u8],
        _remote_ip: Option<&str>,
        _skew: ClockSkew,
        audience: Option<&str>,
    ) -> Result<ValidatedResponse, EngineError> {
        let id = message_id(token)?;
        let validated = self
            .wire
            .responses
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::Rejected(format!("no response {id}")))?;
        match (audience, validated.response.audience_restriction.as_deref()) {
            (Some(expected), Some(found)) if expected != found => Err(EngineError::Rejected(format!(
                "audience {found} is not {expected}"
            ))),
            _ => Ok(validated),
        }
    }

    fn decode_request(&self, token: &[u8]) -> Result<DecodedRequest, EngineError> {
        let id = message_id(token)?;
        self.wire
            .requests
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::Decoding(format!("no request {id}")))
    }

    fn generate_response(
        &self,
        _request: &AuthenticationRequest,
        response: &AuthenticationResponse,
        _remote_ip: Option<&str>,
        _signing: &SigningParameters,
    ) -> Result<Vec<u8>, EngineError> {
        Ok(self.send_response(response))
    }

    fn generate_error_response(
        &self,
        _request: &AuthenticationRequest,
        response: &AuthenticationResponse,
        _remote_ip: Option<&str>,
        _signing: &SigningParameters,
    ) -> Result<Vec<u8>, EngineError> {
        Ok(self.send_response(response))
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
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}

/// A CA and node signers issued by it.
pub struct Federation {
    ca_key: KeyPair,
    ca: rcgen::Certificate,
    anchor: Certificate,
}

impl Federation {
    pub fn new() -> anyhow::Result<Self> {
        let ca_key = KeyPair::generate()?;
        let mut params = CertificateParams::new(Vec::<String>::new())?;
        params.distinguished_name.push(DnType::CommonName, "eIDAS federation CA");
        params.distinguished_name.push(DnType::CountryName, "EU");
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let ca = params.self_signed(&ca_key)?;
        let anchor = Certificate::from_der(ca.der())?;
        Ok(Self { ca_key, ca, anchor })
    }

    /// Signature declarations of a node signer for `country`.
    pub fn signer(&self, country: &str) -> anyhow::Result<SignatureInfo> {
        let key = KeyPair::generate()?;
        let mut params = CertificateParams::new(vec![format!("node.example.{}", country.to_lowercase())])?;
        params.distinguished_name.push(DnType::CommonName, format!("{country} node signer"));
        params.distinguished_name.push(DnType::CountryName, country);
        let leaf = params.signed_by(&key, &self.ca, &self.ca_key)?;
        Ok(SignatureInfo::default()
            .with_signature_algorithm("http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256")
            .with_digest_algorithm("http://www.w3.org/2001/04/xmlenc#sha512")
            .with_certificate(STANDARD.encode(leaf.der()))
            .with_certificate(STANDARD.encode(self.ca.der())))
    }

    pub fn validator(&self) -> TrustValidator {
        TrustValidator::new(
            TrustPolicy::default(),
            TrustAnchorSet::from_certificates([self.anchor.clone()]),
        )
    }
}

/// A Belgian Connector and a Spanish ProxyService wired together.
pub struct Nodes {
    pub metadata: Arc<StaticMetadataFetcher>,
    pub connector: ConnectorProcessor,
    pub proxy: ProxyServiceProcessor,
    pub connector_audit: Arc<RecordingAuditSink>,
    pub proxy_audit: Arc<RecordingAuditSink>,
}

pub struct NodesBuilder {
    ps_versions: Vec<String>,
    ps_published: Vec<String>,
    ps_signer_federation: Option<Federation>,
}

impl NodesBuilder {
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("eidas_protocol=debug,eidas::audit=info")
            .with_test_writer()
            .try_init();
        Self {
            ps_versions: vec!["1.2".to_string()],
            ps_published: vec![
                LevelOfAssurance::SUBSTANTIAL.uri().to_string(),
                LevelOfAssurance::HIGH.uri().to_string(),
            ],
            ps_signer_federation: None,
        }
    }

    /// Protocol versions the ProxyService speaks and publishes.
    pub fn ps_versions(mut self, versions: &[&str]) -> Self {
        self.ps_versions = versions.iter().map(|v| v.to_string()).collect();
        self
    }

    /// Levels the ProxyService publishes.
    pub fn ps_published(mut self, levels: &[LevelOfAssurance]) -> Self {
        self.ps_published = levels.iter().map(|l| l.uri().to_string()).collect();
        self
    }

    /// Has the ProxyService sign with a certificate the Connector does not
    /// trust.
    pub fn rogue_proxy_signer(mut self) -> anyhow::Result<Self> {
        self.ps_signer_federation = Some(Federation::new()?);
        Ok(self)
    }

    pub fn build(self) -> anyhow::Result<Nodes> {
        let federation = Federation::new()?;
        let wire = Arc::new(Wire::default());
        let metadata = Arc::new(StaticMetadataFetcher::new());

        metadata.insert(
            PS_METADATA,
            MetadataParameters {
                entity_id: Some(PS_METADATA.to_string()),
                node_country: Some("ES".to_string()),
                protocol_versions: self.ps_versions.clone(),
                assurance_levels: self.ps_published.clone(),
                endpoints: vec![Endpoint::new("POST", PS_POST)],
                ..MetadataParameters::default()
            },
        );
        metadata.insert(
            CONNECTOR_METADATA,
            MetadataParameters {
                entity_id: Some(CONNECTOR_METADATA.to_string()),
                node_country: Some("BE".to_string()),
                protocol_versions: vec!["1.2".to_string(), "1.1".to_string()],
                assertion_consumer_service_url: Some("https://connector.example.be/acs".to_string()),
                ..MetadataParameters::default()
            },
        );

        let connector_audit = Arc::new(RecordingAuditSink::default());
        let mut connector_config = ConnectorConfig {
            metadata_url: Some(CONNECTOR_METADATA.to_string()),
            sp_type: Some(SpType::Public),
            ..ConnectorConfig::default()
        };
        connector_config.services.insert(
            "ES".to_string(),
            ServiceConfig {
                metadata_url: PS_METADATA.to_string(),
                skew_before_ms: 0,
                skew_after_ms: 0,
            },
        );
        let connector = ConnectorProcessor::with_in_memory_stores(
            connector_config,
            federation.validator(),
            Collaborators {
                metadata: metadata.clone(),
                engine: Arc::new(LoopbackEngine::new(wire.clone(), federation.signer("BE")?)),
                replay: Arc::new(InMemoryAntiReplayCache::new(Duration::from_secs(3600))),
                audit: connector_audit.clone(),
            },
            &CacheConfig::default(),
        )?;

        let proxy_signer = match &self.ps_signer_federation {
            Some(rogue) => rogue.signer("ES")?,
            None => federation.signer("ES")?,
        };
        let proxy_audit = Arc::new(RecordingAuditSink::default());
        let proxy = ProxyServiceProcessor::with_in_memory_store(
            ProxyServiceConfig {
                country_code: "ES".to_string(),
                metadata_url: Some(PS_METADATA.to_string()),
                post_destination: Some(PS_POST.to_string()),
                published_loas: self.ps_published,
                protocol_versions: self.ps_versions,
                prefix_identifiers_country_code: true,
                ..ProxyServiceConfig::default()
            },
            federation.validator(),
            Collaborators {
                metadata: metadata.clone(),
                engine: Arc::new(LoopbackEngine::new(wire.clone(), proxy_signer)),
                replay: Arc::new(InMemoryAntiReplayCache::new(Duration::from_secs(3600))),
                audit: proxy_audit.clone(),
            },
            &CacheConfig::default(),
        )?;

        Ok(Nodes {
            metadata,
            connector,
            proxy,
            connector_audit,
            proxy_audit,
        })
    }
}

/// Natural person minimum data set, requested as mandatory.
pub fn natural_person_request() -> anyhow::Result<AttributeCatalog> {
    let registry = eidas_registry();
    let mut builder = AttributeCatalog::builder();
    for uri in [
        uris::PERSON_IDENTIFIER,
        uris::CURRENT_FAMILY_NAME,
        uris::CURRENT_GIVEN_NAME,
        uris::DATE_OF_BIRTH,
    ] {
        let definition = registry
            .get(uri)
            .ok_or_else(|| anyhow::anyhow!("{uri} is not registered"))?;
        builder = builder.put_definition(definition.clone());
    }
    Ok(builder.build()?)
}

/// What the Spanish identity provider asserts for a citizen.
pub fn spanish_citizen() -> anyhow::Result<AttributeCatalog> {
    let registry = eidas_registry();
    let definition = |uri: &str| {
        registry
            .get(uri)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("{uri} is not registered"))
    };
    Ok(AttributeCatalog::builder()
        .put_str(definition(uris::PERSON_IDENTIFIER)?, &["02635542Y"])
        .put_str(definition(uris::CURRENT_FAMILY_NAME)?, &["Garcia"])
        .put_str(definition(uris::CURRENT_GIVEN_NAME)?, &["Javier"])
        .put_str(definition(uris::DATE_OF_BIRTH)?, &["1965-01-01"])
        .build()?)
}
