//! Connector and ProxyService half-flows.
//!
//! Each processor owns its configuration, trust validator and correlation
//! stores, and reaches everything else through [`Collaborators`]. Processors
//! are shared across concurrent requests; all per-request state lives in the
//! caches.

mod checks;
mod connector;
mod proxy_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use checks::{
    check_identifier_prefixes, check_requested_name_id_format, check_requester_id,
    check_response_name_id, NameIdOutcome,
};
pub use connector::{ConnectorProcessor, OutboundRequest, ValidatedExchange};
pub use proxy_service::{IdpResult, OutboundResponse, ProxyServiceProcessor};

use std::sync::Arc;

use eidas_cache::{AntiReplayCache, CacheError, CorrelationStore};
use eidas_core::event::AuditSink;
use eidas_core::ErrorKey;

use crate::engine::{ProtocolEngine, SigningParameters};
use crate::error::{ProtocolError, ProtocolResult};
use crate::loa::LevelOfAssurance;
use crate::metadata::{MetadataError, MetadataFetcher, MetadataParameters};
use crate::trust::{Certificate, TrustError, TrustValidator};
use crate::types::{AuthenticationRequest, HttpMethod};

/// Services a processor consumes.
#[derive(Clone)]
pub struct Collaborators {
    /// Counter-party metadata.
    pub metadata: Arc<dyn MetadataFetcher>,
    /// Wire engine.
    pub engine: Arc<dyn ProtocolEngine>,
    /// Message id replay cache.
    pub replay: Arc<dyn AntiReplayCache>,
    /// Audit event sink.
    pub audit: Arc<dyn AuditSink>,
}

/// Transport facts about an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Address of the user agent.
    pub remote_ip: Option<String>,
    /// HTTP method the message arrived with.
    pub http_method: HttpMethod,
}

impl RequestContext {
    /// Creates a context with no remote address.
    #[must_use]
    pub const fn new(http_method: HttpMethod) -> Self {
        Self {
            remote_ip: None,
            http_method,
        }
    }

    /// Sets the user agent address.
    #[must_use]
    pub fn with_remote_ip(mut self, remote_ip: impl Into<String>) -> Self {
        self.remote_ip = Some(remote_ip.into());
        self
    }
}

/// A correlation entry: a request and the address it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRequest {
    /// The request.
    pub request: AuthenticationRequest,
    /// Address of the user agent.
    pub remote_ip: Option<String>,
}

pub(crate) async fn fetch_metadata(
    fetcher: &dyn MetadataFetcher,
    url: &str,
) -> ProtocolResult<MetadataParameters> {
    fetcher.fetch(url).await.map_err(|e: MetadataError| {
        tracing::warn!(url, error = %e, "Metadata unavailable");
        ProtocolError::configuration(ErrorKey::SamlEngineNoMetadata, e.to_string())
    })
}

pub(crate) fn cache_failure(e: CacheError) -> ProtocolError {
    ProtocolError::configuration(ErrorKey::InternalError, e.to_string())
}

pub(crate) fn trust_failure(e: &TrustError) -> ProtocolError {
    if e.is_security() {
        ProtocolError::security(e.error_key(), e.to_string())
    } else {
        ProtocolError::validation(e.error_key(), e.to_string())
    }
}

/// The signer must be the certificate the peer publishes in its metadata,
/// when it publishes one.
pub(crate) fn check_published_signer(
    metadata: &MetadataParameters,
    signer: &Certificate,
) -> ProtocolResult<()> {
    match &metadata.signing_certificate {
        Some(published) if published != signer => Err(ProtocolError::security(
            ErrorKey::SamlEngineUntrustedCertificate,
            format!(
                "signer {} is not the certificate published by {}",
                signer.subject(),
                metadata.entity_id.as_deref().unwrap_or("the peer")
            ),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn signing_parameters(trust: &TrustValidator) -> ProtocolResult<SigningParameters> {
    let digest = trust
        .signing_digest_algorithm()
        .map_err(|e| ProtocolError::configuration(e.error_key(), e.to_string()))?;
    Ok(SigningParameters {
        digest_algorithm: digest.to_string(),
    })
}

pub(crate) async fn lookup_request(
    store: &dyn CorrelationStore<StoredRequest>,
    id: &str,
) -> ProtocolResult<StoredRequest> {
    store.get(id).await.map_err(cache_failure)?.ok_or_else(|| {
        ProtocolError::session(ErrorKey::AuRequestId, format!("no request {id} awaits a response"))
    })
}

pub(crate) fn published_levels(uris: &[String]) -> Vec<LevelOfAssurance> {
    uris.iter().map(|u| LevelOfAssurance::from_uri(u)).collect()
}
