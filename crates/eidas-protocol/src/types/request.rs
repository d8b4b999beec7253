//! Authentication request.
//!
//! Connectors send these to ProxyServices on behalf of a service provider.

use chrono::{DateTime, Utc};

use super::SpType;
use crate::attribute::AttributeCatalog;
use crate::loa::LevelsOfAssurance;

/// eIDAS authentication request.
///
/// Immutable once built: every change goes through a `with_*` transform that
/// returns a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationRequest {
    /// Unique identifier of this request.
    pub id: String,

    /// Entity id of the requesting party.
    pub issuer: String,

    /// Issuer before the Connector replaced it with its own metadata URL.
    pub original_issuer: Option<String>,

    /// URL the request is sent to.
    pub destination: Option<String>,

    /// Country of the citizen being authenticated.
    pub citizen_country_code: String,

    /// Country of the service provider.
    pub service_provider_country_code: Option<String>,

    /// Display name of the service provider.
    pub provider_name: Option<String>,

    /// Requested attributes. Values are empty.
    pub requested_attributes: AttributeCatalog,

    /// Requested levels of assurance.
    pub levels_of_assurance: LevelsOfAssurance,

    /// Requested NameID format URI.
    pub name_id_format: Option<String>,

    /// Identifier of the final requester behind a private SP.
    pub requester_id: Option<String>,

    /// Sector of the service provider.
    pub sp_type: Option<SpType>,

    /// Where the response must be posted.
    pub assertion_consumer_service_url: Option<String>,

    /// Opaque state echoed back with the response.
    pub relay_state: Option<String>,

    /// HTTP method name the request arrived with.
    pub binding: Option<String>,

    /// When the request was issued.
    pub issue_instant: DateTime<Utc>,
}

impl AuthenticationRequest {
    /// Creates a request with no levels of assurance.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        issuer: impl Into<String>,
        citizen_country_code: impl Into<String>,
        requested_attributes: AttributeCatalog,
    ) -> Self {
        Self {
            id: id.into(),
            issuer: issuer.into(),
            original_issuer: None,
            destination: None,
            citizen_country_code: citizen_country_code.into(),
            service_provider_country_code: None,
            provider_name: None,
            requested_attributes,
            levels_of_assurance: LevelsOfAssurance::default(),
            name_id_format: None,
            requester_id: None,
            sp_type: None,
            assertion_consumer_service_url: None,
            relay_state: None,
            binding: None,
            issue_instant: Utc::now(),
        }
    }

    /// Replaces the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Replaces the issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Records the issuer the SP originally used.
    #[must_use]
    pub fn with_original_issuer(mut self, original_issuer: Option<String>) -> Self {
        self.original_issuer = original_issuer;
        self
    }

    /// Sets the destination URL.
    #[must_use]
    pub fn with_destination(mut self, destination: Option<String>) -> Self {
        self.destination = destination;
        self
    }

    /// Sets the service provider country.
    #[must_use]
    pub fn with_service_provider_country_code(mut self, country: Option<String>) -> Self {
        self.service_provider_country_code = country;
        self
    }

    /// Sets the provider name.
    #[must_use]
    pub fn with_provider_name(mut self, provider_name: Option<String>) -> Self {
        self.provider_name = provider_name;
        self
    }

    /// Replaces the requested attributes.
    #[must_use]
    pub fn with_requested_attributes(mut self, attributes: AttributeCatalog) -> Self {
        self.requested_attributes = attributes;
        self
    }

    /// Replaces the requested levels of assurance.
    #[must_use]
    pub fn with_levels_of_assurance(mut self, levels: LevelsOfAssurance) -> Self {
        self.levels_of_assurance = levels;
        self
    }

    /// Sets the NameID format.
    #[must_use]
    pub fn with_name_id_format(mut self, format: Option<String>) -> Self {
        self.name_id_format = format;
        self
    }

    /// Sets the requester id.
    #[must_use]
    pub fn with_requester_id(mut self, requester_id: Option<String>) -> Self {
        self.requester_id = requester_id;
        self
    }

    /// Sets the SP type.
    #[must_use]
    pub fn with_sp_type(mut self, sp_type: Option<SpType>) -> Self {
        self.sp_type = sp_type;
        self
    }

    /// Sets the assertion consumer service URL.
    #[must_use]
    pub fn with_assertion_consumer_service_url(mut self, url: Option<String>) -> Self {
        self.assertion_consumer_service_url = url;
        self
    }

    /// Sets the relay state.
    #[must_use]
    pub fn with_relay_state(mut self, relay_state: Option<String>) -> Self {
        self.relay_state = relay_state;
        self
    }

    /// Sets the binding.
    #[must_use]
    pub fn with_binding(mut self, binding: Option<String>) -> Self {
        self.binding = binding;
        self
    }

    /// Checks the structural invariants: id, issuer and citizen country are
    /// non-blank.
    ///
    /// ## Errors
    ///
    /// Returns a description of the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("request id is blank".to_string());
        }
        if self.issuer.trim().is_empty() {
            return Err("request issuer is blank".to_string());
        }
        if self.citizen_country_code.trim().is_empty() {
            return Err("citizen country code is blank".to_string());
        }
        Ok(())
    }

    /// Whether a requester id is present and non-blank.
    #[must_use]
    pub fn has_requester_id(&self) -> bool {
        self.requester_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }
}
