//! Counter-party metadata.
//!
//! Metadata is fetched, signature-checked and cached outside this crate.
//! Processors see it through [`MetadataFetcher`] as read-only
//! [`MetadataParameters`].

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use crate::trust::Certificate;
use crate::types::{HttpMethod, SpType};

/// Metadata retrieval failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetadataError {
    /// No metadata is published at the URL.
    #[error("no metadata at {0}")]
    NotFound(String),

    /// Metadata could not be fetched or trusted.
    #[error("metadata retrieval failed for {url}: {reason}")]
    Retrieval {
        /// Metadata URL.
        url: String,
        /// Cause.
        reason: String,
    },
}

/// A single SSO endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// HTTP method name, such as `POST`.
    pub method: String,
    /// Endpoint URL.
    pub location: String,
}

impl Endpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(method: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            location: location.into(),
        }
    }
}

/// What a counter-party publishes about itself.
#[derive(Debug, Clone, Default)]
pub struct MetadataParameters {
    /// Entity id.
    pub entity_id: Option<String>,
    /// Country the node serves.
    pub node_country: Option<String>,
    /// Supported protocol versions.
    pub protocol_versions: Vec<String>,
    /// Published level of assurance URIs.
    pub assurance_levels: Vec<String>,
    /// Supported NameID format URIs.
    pub name_id_formats: Vec<String>,
    /// Whether private SPs must send a requester id.
    pub requester_id_required: bool,
    /// SSO endpoints in publication order.
    pub endpoints: Vec<Endpoint>,
    /// Signing certificate.
    pub signing_certificate: Option<Certificate>,
    /// Sector of a service provider.
    pub sp_type: Option<SpType>,
    /// Default assertion consumer service URL.
    pub assertion_consumer_service_url: Option<String>,
    /// HTTP method names a service provider accepts responses with.
    pub protocol_bindings: Vec<String>,
}

impl MetadataParameters {
    /// Endpoint for an HTTP method, ignoring case, falling back to the last
    /// published endpoint.
    #[must_use]
    pub fn select_endpoint(&self, method: HttpMethod) -> Option<&Endpoint> {
        self.endpoints
            .iter()
            .find(|e| e.method.trim().eq_ignore_ascii_case(method.as_str()))
            .or_else(|| self.endpoints.last())
    }

    /// Whether the counter-party accepts responses over `method`. An empty
    /// binding list accepts everything.
    #[must_use]
    pub fn accepts_binding(&self, method: HttpMethod) -> bool {
        self.protocol_bindings.is_empty()
            || self
                .protocol_bindings
                .iter()
                .any(|b| b.trim().eq_ignore_ascii_case(method.as_str()))
    }
}

/// Source of counter-party metadata.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetches the metadata published at `url`.
    async fn fetch(&self, url: &str) -> Result<MetadataParameters, MetadataError>;
}

/// Metadata held in memory, keyed by URL.
#[derive(Debug, Default)]
pub struct StaticMetadataFetcher {
    entries: RwLock<HashMap<String, MetadataParameters>>,
}

impl StaticMetadataFetcher {
    /// Creates an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes metadata under `url`, replacing any previous entry.
    pub fn insert(&self, url: impl Into<String>, metadata: MetadataParameters) {
        self.entries.write().insert(url.into(), metadata);
    }

    /// Removes the metadata under `url`.
    pub fn remove(&self, url: &str) -> Option<MetadataParameters> {
        self.entries.write().remove(url)
    }
}

#[async_trait]
impl MetadataFetcher for StaticMetadataFetcher {
    async fn fetch(&self, url: &str) -> Result<MetadataParameters, MetadataError> {
        self.entries
            .read()
            .get(url)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(url.to_string()))
    }
}
