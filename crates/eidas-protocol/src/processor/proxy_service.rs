//! ProxyService half-flows.
//!
//! A ProxyService validates requests from foreign Connectors and answers
//! them with the identity its national identity provider asserted. Content
//! failures on either side are answered with a signed failure response
//! carried in [`ProtocolError::Reply`].

use std::sync::Arc;
use std::time::Duration;

use eidas_cache::{CorrelationStore, InMemoryCorrelationStore};
use eidas_core::config::{CacheConfig, ProxyServiceConfig};
use eidas_core::event::{EventBuilder, EventType};
use eidas_core::ErrorKey;

use super::checks::check_requester_id;
use super::{
    cache_failure, check_published_signer, fetch_metadata, lookup_request, published_levels,
    signing_parameters, trust_failure, Collaborators, RequestContext, StoredRequest,
};
use crate::attribute::{
    check_mandatory_attributes, check_representative_attributes, missing_required_attribute,
    uris, validate_attributes, AttributeCatalog, AttributeValue,
};
use crate::engine::SigningParameters;
use crate::error::{FailureReply, ProtocolError, ProtocolResult};
use crate::loa::{
    published_serves_any_requested, response_satisfies_request, LevelOfAssurance, LoaComparison,
};
use crate::metadata::MetadataParameters;
use crate::trust::TrustValidator;
use crate::types::{
    new_message_id, protocol_versions_compatible, AuthenticationRequest, AuthenticationResponse,
    HttpMethod, NameIdFormat, Status, StatusCode,
};

/// What the national identity provider asserted.
#[derive(Debug, Clone)]
pub struct IdpResult {
    /// Outcome of the authentication.
    pub status: Status,
    /// NameID subject. Derived from the unique identifier when absent.
    pub subject: Option<String>,
    /// NameID format of the subject.
    pub subject_name_id_format: Option<String>,
    /// Level of assurance reached.
    pub level_of_assurance: Option<String>,
    /// Asserted attributes.
    pub attributes: AttributeCatalog,
}

impl IdpResult {
    /// A successful authentication.
    #[must_use]
    pub fn success(attributes: AttributeCatalog, level_of_assurance: impl Into<String>) -> Self {
        Self {
            status: Status::success(),
            subject: None,
            subject_name_id_format: None,
            level_of_assurance: Some(level_of_assurance.into()),
            attributes,
        }
    }

    /// Sets the NameID subject and format.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>, format: Option<String>) -> Self {
        self.subject = Some(subject.into());
        self.subject_name_id_format = format;
        self
    }
}

/// A response ready to be returned to a Connector.
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    /// Signed wire bytes.
    pub bytes: Vec<u8>,
    /// The response as sent.
    pub response: AuthenticationResponse,
    /// Assertion consumer service the bytes must be delivered to.
    pub destination: Option<String>,
    /// Relay state of the answered request.
    pub relay_state: Option<String>,
}

struct Rejection {
    key: ErrorKey,
    detail: String,
}

fn reject(key: ErrorKey, detail: impl Into<String>) -> Rejection {
    Rejection {
        key,
        detail: detail.into(),
    }
}

/// The ProxyService role.
pub struct ProxyServiceProcessor {
    config: ProxyServiceConfig,
    issuer: String,
    collaborators: Collaborators,
    trust: TrustValidator,
    signing: SigningParameters,
    requests: Arc<dyn CorrelationStore<StoredRequest>>,
}

impl ProxyServiceProcessor {
    /// Creates a ProxyService.
    ///
    /// `requests` keeps accepted Connector requests, keyed by request id,
    /// until they are answered.
    ///
    /// ## Errors
    ///
    /// Returns a configuration error when no metadata URL is configured or
    /// the trust policy names an unusable digest algorithm.
    pub fn new(
        config: ProxyServiceConfig,
        trust: TrustValidator,
        collaborators: Collaborators,
        requests: Arc<dyn CorrelationStore<StoredRequest>>,
    ) -> ProtocolResult<Self> {
        let issuer = config.metadata_url.clone().ok_or_else(|| {
            ProtocolError::configuration(
                ErrorKey::InternalError,
                "proxy_service.metadata_url is not configured",
            )
        })?;
        let signing = signing_parameters(&trust)?;
        Ok(Self {
            config,
            issuer,
            collaborators,
            trust,
            signing,
            requests,
        })
    }

    /// Creates a ProxyService whose correlation store lives in process
    /// memory.
    ///
    /// ## Errors
    ///
    /// See [`ProxyServiceProcessor::new`].
    pub fn with_in_memory_store(
        config: ProxyServiceConfig,
        trust: TrustValidator,
        collaborators: Collaborators,
        cache: &CacheConfig,
    ) -> ProtocolResult<Self> {
        let ttl = Duration::from_secs(cache.correlation_ttl_secs);
        Self::new(config, trust, collaborators, Arc::new(InMemoryCorrelationStore::new(ttl)))
    }

    /// The configuration in force.
    #[must_use]
    pub const fn config(&self) -> &ProxyServiceConfig {
        &self.config
    }

    // ========================================================================
    // Inbound request
    // ========================================================================

    /// Decodes and validates a Connector request.
    ///
    /// The accepted request is returned with its ACS URL and SP type
    /// defaulted from the Connector metadata, and kept until
    /// [`generate_response`](Self::generate_response) answers it.
    ///
    /// ## Errors
    ///
    /// - [`ProtocolError::Reply`] with a REQUESTER failure for content
    ///   failures
    /// - Validation or security errors when the message cannot be decoded
    ///   or its signer is not trusted
    /// - A security error when the request id was already seen
    /// - Configuration errors when metadata is unavailable
    pub async fn process_connector_request(
        &self,
        ctx: &RequestContext,
        token: &[u8],
    ) -> ProtocolResult<AuthenticationRequest> {
        let result = self.accept_request(ctx, token).await;

        let event = match &result {
            Ok(request) => EventBuilder::new(EventType::ProxyRequestAccepted)
                .request_id(request.id.clone())
                .country(request.citizen_country_code.clone())
                .issuer(request.issuer.clone()),
            Err(e) => {
                tracing::warn!(error = %e, category = ?e.category(), "Connector request rejected");
                EventBuilder::new(EventType::ProxyRequestRejected)
                    .failure(e.key())
                    .detail("reason", e.to_string())
            }
        };
        self.collaborators
            .audit
            .record(&event.ip_address(ctx.remote_ip.as_deref()).build());

        result
    }

    async fn accept_request(
        &self,
        ctx: &RequestContext,
        token: &[u8],
    ) -> ProtocolResult<AuthenticationRequest> {
        let decoded = self
            .collaborators
            .engine
            .decode_request(token)
            .map_err(|e| ProtocolError::validation(ErrorKey::ColleagueReqInvalidSaml, e.to_string()))?;
        let signer = self.trust.validate_signature(&decoded.signature).map_err(|e| {
            self.collaborators.audit.record(
                &EventBuilder::new(EventType::CertificateRejected)
                    .failure(e.error_key())
                    .request_id(decoded.request.id.clone())
                    .issuer(decoded.request.issuer.clone())
                    .ip_address(ctx.remote_ip.as_deref())
                    .build(),
            );
            trust_failure(&e)
        })?;

        let request = decoded.request;
        request
            .validate()
            .map_err(|e| ProtocolError::validation(ErrorKey::ColleagueReqInvalidSaml, e))?;

        let metadata = fetch_metadata(&*self.collaborators.metadata, &request.issuer).await?;
        check_published_signer(&metadata, &signer)?;

        let request = match self.check_request(ctx, &request, &metadata) {
            Ok(accepted) => accepted,
            Err(rejection) => {
                let status = Status::requester_failure(rejection.key.code());
                return Err(self.failure_reply(ctx, &request, rejection, status));
            }
        };

        let first_sighting = self
            .collaborators
            .replay
            .check_and_record(&request.id, &request.citizen_country_code)
            .await
            .map_err(cache_failure)?;
        if !first_sighting {
            self.collaborators.audit.record(
                &EventBuilder::new(EventType::ReplayDetected)
                    .failure(ErrorKey::SproviderSelectorInvalidSaml)
                    .request_id(request.id.clone())
                    .country(request.citizen_country_code.clone())
                    .issuer(request.issuer.clone())
                    .ip_address(ctx.remote_ip.as_deref())
                    .build(),
            );
            return Err(ProtocolError::security(
                ErrorKey::SproviderSelectorInvalidSaml,
                format!("request {} was already processed", request.id),
            ));
        }

        self.requests
            .put(
                &request.id,
                StoredRequest {
                    request: request.clone(),
                    remote_ip: ctx.remote_ip.clone(),
                },
            )
            .await
            .map_err(cache_failure)?;

        Ok(request)
    }

    fn check_request(
        &self,
        ctx: &RequestContext,
        request: &AuthenticationRequest,
        metadata: &MetadataParameters,
    ) -> Result<AuthenticationRequest, Rejection> {
        let config = &self.config;

        if !protocol_versions_compatible(&config.protocol_versions, &metadata.protocol_versions) {
            return Err(reject(
                ErrorKey::ProtocolVersionUnsupported,
                format!("no common protocol version: {:?}", metadata.protocol_versions),
            ));
        }

        let acs_url = match (
            request.assertion_consumer_service_url.as_deref(),
            metadata.assertion_consumer_service_url.as_deref(),
        ) {
            (Some(requested), Some(published)) if requested != published => {
                return Err(reject(
                    ErrorKey::ColleagueReqInvalidSaml,
                    format!("ACS URL {requested} is not published by the Connector"),
                ));
            }
            (requested, published) => requested.or(published).map(str::to_string),
        };

        check_requester_id(
            request.requester_id.as_deref(),
            request.sp_type.or(metadata.sp_type),
            config.requester_id_required,
        )
        .map_err(|e| reject(ErrorKey::ColleagueReqMissingRequesterId, e))?;

        let citizen_country = request
            .citizen_country_code
            .split('-')
            .next()
            .unwrap_or_default()
            .trim();
        if !citizen_country.eq_ignore_ascii_case(&config.country_code) {
            return Err(reject(
                ErrorKey::ColleagueReqInvalidCountrycode,
                format!("citizen country {citizen_country} is not served here"),
            ));
        }

        self.check_requested_attributes(&request.requested_attributes)?;

        if config.validate_binding {
            if let Some(binding) = request.binding.as_deref() {
                if !binding.trim().eq_ignore_ascii_case(ctx.http_method.as_str()) {
                    return Err(reject(
                        ErrorKey::InvalidProtocolBinding,
                        format!("binding {binding} used over {}", ctx.http_method.as_str()),
                    ));
                }
            }
        }

        if let Some(format) = request.name_id_format.as_deref() {
            if !config.name_id_formats.iter().any(|f| f.trim() == format.trim()) {
                return Err(reject(
                    ErrorKey::ColleagueReqInvalidNameid,
                    format!("NameID format {format} is not published"),
                ));
            }
        }

        let expected_destination = match ctx.http_method {
            HttpMethod::Post => config.post_destination.as_deref(),
            HttpMethod::Get => config.redirect_destination.as_deref(),
        };
        if let Some(expected) = expected_destination {
            if request.destination.as_deref() != Some(expected) {
                return Err(reject(
                    ErrorKey::ColleagueReqInvalidDestUrl,
                    format!("destination {:?} is not {expected}", request.destination),
                ));
            }
        }

        if !config.published_loas.is_empty() {
            let published = published_levels(&config.published_loas);
            if !published_serves_any_requested(&request.levels_of_assurance.levels, &published) {
                return Err(reject(
                    ErrorKey::ColleagueReqInvalidLoa,
                    "no requested level of assurance is offered",
                ));
            }
        }

        if !metadata.accepts_binding(ctx.http_method) {
            return Err(reject(
                ErrorKey::ColleagueReqInvalidSaml,
                format!("Connector does not accept {}", ctx.http_method.as_str()),
            ));
        }
        let sp_type = match (request.sp_type, metadata.sp_type) {
            (Some(_), Some(_)) => {
                return Err(reject(
                    ErrorKey::ColleagueReqInconsistentSptype,
                    "SP type declared in both the request and the metadata",
                ));
            }
            (None, None) => {
                return Err(reject(
                    ErrorKey::ColleagueReqMissingSptype,
                    "SP type declared in neither the request nor the metadata",
                ));
            }
            (declared, published) => declared.or(published),
        };

        Ok(request
            .clone()
            .with_assertion_consumer_service_url(acs_url)
            .with_sp_type(sp_type))
    }

    fn check_requested_attributes(&self, requested: &AttributeCatalog) -> Result<(), Rejection> {
        if requested.is_empty() {
            return Err(reject(ErrorKey::ColleagueReqAttrNull, "no attribute requested"));
        }
        if let Some(unsupported) = requested.definitions().find(|d| {
            d.required
                && self
                    .config
                    .unsupported_attributes
                    .iter()
                    .any(|u| u.trim() == d.name_uri)
        }) {
            return Err(reject(
                ErrorKey::ColleagueReqAttrList,
                format!("{} is not supported", unsupported.name_uri),
            ));
        }
        if !check_mandatory_attributes(requested) {
            return Err(reject(
                ErrorKey::EidasMandatoryAttributes,
                "requested attributes do not form a minimum data set",
            ));
        }
        if !check_representative_attributes(requested) {
            return Err(reject(
                ErrorKey::EidasRepresentativeAttributes,
                "representative attributes cannot be requested",
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Outbound response
    // ========================================================================

    /// Answers an accepted request with what the identity provider asserted.
    ///
    /// ## Errors
    ///
    /// - A session error when no accepted request has `request_id`
    /// - [`ProtocolError::Reply`] with a RESPONDER failure when the identity
    ///   provider result cannot be forwarded
    /// - A configuration error when the engine cannot sign the response
    pub async fn generate_response(
        &self,
        ctx: &RequestContext,
        request_id: &str,
        idp: Option<IdpResult>,
    ) -> ProtocolResult<OutboundResponse> {
        let result = self.answer(ctx, request_id, idp).await;

        let event = match &result {
            Ok(outbound) => EventBuilder::new(EventType::ProxyResponseGenerated)
                .request_id(outbound.response.id.clone())
                .country(self.config.country_code.clone())
                .detail(
                    "level_of_assurance",
                    outbound.response.level_of_assurance.clone().unwrap_or_default(),
                ),
            Err(e) => {
                tracing::warn!(request_id, error = %e, "Identity provider result rejected");
                EventBuilder::new(EventType::ProxyResponseRejected)
                    .failure(e.key())
                    .detail("reason", e.to_string())
            }
        };
        self.collaborators.audit.record(
            &event
                .in_response_to(request_id)
                .ip_address(ctx.remote_ip.as_deref())
                .build(),
        );

        result
    }

    async fn answer(
        &self,
        ctx: &RequestContext,
        request_id: &str,
        idp: Option<IdpResult>,
    ) -> ProtocolResult<OutboundResponse> {
        let stored = lookup_request(&*self.requests, request_id).await?;
        let request = &stored.request;

        let idp = match self.check_idp_result(request, idp) {
            Ok(idp) => idp,
            Err(rejection) => {
                let status = Status::responder_failure(Some(rejection.key.code()));
                return Err(self.failure_reply(ctx, request, rejection, status));
            }
        };

        let attributes = if self.config.prefix_identifiers_country_code {
            self.prefix_identifiers(request, idp.attributes)
        } else {
            idp.attributes
        };
        let subject = idp.subject.or_else(|| {
            [uris::PERSON_IDENTIFIER, uris::LEGAL_PERSON_IDENTIFIER]
                .into_iter()
                .find_map(|uri| attributes.first_value(uri))
                .map(AttributeValue::marshal)
        });
        let name_id_format = request
            .name_id_format
            .clone()
            .or(idp.subject_name_id_format)
            .unwrap_or_else(|| NameIdFormat::Persistent.uri().to_string());

        let mut response = AuthenticationResponse::new(
            new_message_id(),
            request.id.clone(),
            self.issuer.clone(),
            Status::success(),
        )
        .with_country(Some(self.config.country_code.clone()))
        .with_level_of_assurance(idp.level_of_assurance)
        .with_attributes(attributes)
        .with_audience_restriction(Some(request.issuer.clone()))
        .with_ip_address(ctx.remote_ip.clone().or_else(|| stored.remote_ip.clone()));
        if let Some(subject) = subject {
            response = response.with_subject(subject, Some(name_id_format));
        }

        if let Err(e) = response.validate() {
            let status = Status::responder_failure(Some(ErrorKey::MessageValidationError.code()));
            return Err(self.failure_reply(
                ctx,
                request,
                reject(ErrorKey::MessageValidationError, e),
                status,
            ));
        }

        let bytes = self
            .collaborators
            .engine
            .generate_response(request, &response, ctx.remote_ip.as_deref(), &self.signing)
            .map_err(|e| ProtocolError::configuration(ErrorKey::InternalError, e.to_string()))?;

        tracing::info!(
            request_id = %request.id,
            response_id = %response.id,
            "Response generated for Connector"
        );
        Ok(OutboundResponse {
            bytes,
            response,
            destination: request.assertion_consumer_service_url.clone(),
            relay_state: request.relay_state.clone(),
        })
    }

    fn check_idp_result(
        &self,
        request: &AuthenticationRequest,
        idp: Option<IdpResult>,
    ) -> Result<IdpResult, Rejection> {
        let idp = idp
            .filter(|idp| !idp.status.failure)
            .ok_or_else(|| reject(ErrorKey::InvalidAttributeList, "identity provider reported no identity"))?;
        if idp.attributes.is_empty() {
            return Err(reject(ErrorKey::InvalidAttributeList, "identity provider asserted no attribute"));
        }
        if let Some(missing) = missing_required_attribute(&request.requested_attributes, &idp.attributes) {
            return Err(reject(
                ErrorKey::AttVerificationMandatory,
                format!("{} is required but missing", missing.name_uri),
            ));
        }
        if !check_mandatory_attributes(&idp.attributes) {
            return Err(reject(
                ErrorKey::EidasMandatoryAttributes,
                "asserted attributes do not form a minimum data set",
            ));
        }
        validate_attributes(&idp.attributes, &self.config.protocol_versions)
            .map_err(|e| reject(ErrorKey::InvalidAttributeValue, e.to_string()))?;

        let asserted = idp
            .level_of_assurance
            .as_deref()
            .map(LevelOfAssurance::from_uri)
            .ok_or_else(|| reject(ErrorKey::MessageValidationError, "level of assurance is mandatory"))?;
        if !self.config.published_loas.is_empty()
            && !published_levels(&self.config.published_loas).contains(&asserted)
        {
            return Err(reject(
                ErrorKey::InvalidResponseLoaValueUnpublished,
                format!("{asserted} is not published"),
            ));
        }
        let requested = &request.levels_of_assurance;
        let satisfied = requested.is_empty()
            || match requested.comparison {
                LoaComparison::Minimum => response_satisfies_request(&requested.levels, &asserted),
                LoaComparison::Exact => requested.contains(&asserted),
            };
        if !satisfied {
            return Err(reject(
                ErrorKey::InvalidResponseLoaValue,
                format!("{asserted} does not satisfy the request"),
            ));
        }

        Ok(idp)
    }

    /// Rewrites unique identifiers to `ORIGIN/DESTINATION/value`.
    fn prefix_identifiers(
        &self,
        request: &AuthenticationRequest,
        attributes: AttributeCatalog,
    ) -> AttributeCatalog {
        let destination = request
            .service_provider_country_code
            .as_deref()
            .unwrap_or(&request.citizen_country_code);
        let prefix = format!("{}/{}/", self.config.country_code, destination);

        let identifiers: Vec<_> = attributes
            .definitions()
            .filter(|d| d.unique_identifier)
            .cloned()
            .collect();

        identifiers.into_iter().fold(attributes, |catalog, definition| {
            let values: Vec<AttributeValue> = catalog
                .values(&definition.name_uri)
                .iter()
                .map(|value| {
                    let marshalled = value.marshal();
                    if marshalled.starts_with(&prefix) {
                        return value.clone();
                    }
                    match definition.value_type.unmarshal(&format!("{prefix}{marshalled}")) {
                        Ok(typed) => AttributeValue {
                            value: typed,
                            non_latin_script_alternate: value.non_latin_script_alternate,
                        },
                        Err(_) => value.clone(),
                    }
                })
                .collect();
            catalog.with_values(&definition.name_uri, values)
        })
    }

    /// Builds a signed failure response for an accepted request.
    ///
    /// ## Errors
    ///
    /// Returns a session error when no accepted request has `request_id`,
    /// and a configuration error when the engine cannot sign.
    pub async fn build_error_response(
        &self,
        ctx: &RequestContext,
        request_id: &str,
        status_code: StatusCode,
        message: Option<String>,
    ) -> ProtocolResult<OutboundResponse> {
        let stored = lookup_request(&*self.requests, request_id).await?;
        let request = &stored.request;
        let status = Status {
            status_code,
            status_message: message,
            failure: true,
        };
        let response = AuthenticationResponse::new(
            new_message_id(),
            request.id.clone(),
            self.issuer.clone(),
            status,
        )
        .with_country(Some(self.config.country_code.clone()))
        .with_ip_address(ctx.remote_ip.clone());

        let bytes = self
            .collaborators
            .engine
            .generate_error_response(request, &response, ctx.remote_ip.as_deref(), &self.signing)
            .map_err(|e| ProtocolError::configuration(ErrorKey::InternalError, e.to_string()))?;

        Ok(OutboundResponse {
            bytes,
            response,
            destination: request.assertion_consumer_service_url.clone(),
            relay_state: request.relay_state.clone(),
        })
    }

    fn failure_reply(
        &self,
        ctx: &RequestContext,
        request: &AuthenticationRequest,
        rejection: Rejection,
        status: Status,
    ) -> ProtocolError {
        tracing::debug!(
            request_id = %request.id,
            key = %rejection.key,
            detail = %rejection.detail,
            "Answering with failure"
        );
        let response = AuthenticationResponse::new(
            new_message_id(),
            request.id.clone(),
            self.issuer.clone(),
            status,
        )
        .with_country(Some(self.config.country_code.clone()))
        .with_ip_address(ctx.remote_ip.clone());

        match self.collaborators.engine.generate_error_response(
            request,
            &response,
            ctx.remote_ip.as_deref(),
            &self.signing,
        ) {
            Ok(bytes) => ProtocolError::Reply(Box::new(FailureReply {
                key: rejection.key,
                response,
                bytes,
                relay_state: request.relay_state.clone(),
            })),
            Err(e) => ProtocolError::configuration(
                ErrorKey::InternalError,
                format!("cannot sign failure for {}: {e}", rejection.detail),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::eidas_registry;
    use crate::error::ErrorCategory;
    use crate::loa::LevelsOfAssurance;
    use crate::processor::test_support::Harness;
    use crate::types::{status_codes, sub_status_codes, SpType};

    const PS_METADATA: &str = "https://ps.example.es/metadata";
    const CONNECTOR_METADATA: &str = "https://connector.example.be/metadata";
    const POST_DESTINATION: &str = "https://ps.example.es/post";

    fn config() -> ProxyServiceConfig {
        ProxyServiceConfig {
            country_code: "ES".to_string(),
            metadata_url: Some(PS_METADATA.to_string()),
            post_destination: Some(POST_DESTINATION.to_string()),
            published_loas: vec![
                LevelOfAssurance::SUBSTANTIAL.uri().to_string(),
                LevelOfAssurance::HIGH.uri().to_string(),
            ],
            ..ProxyServiceConfig::default()
        }
    }

    fn connector_metadata() -> MetadataParameters {
        MetadataParameters {
            entity_id: Some(CONNECTOR_METADATA.to_string()),
            protocol_versions: vec!["1.2".to_string()],
            sp_type: Some(SpType::Public),
            assertion_consumer_service_url: Some("https://connector.example.be/acs".to_string()),
            ..MetadataParameters::default()
        }
    }

    fn natural_person_mds() -> AttributeCatalog {
        let registry = eidas_registry();
        [
            uris::PERSON_IDENTIFIER,
            uris::CURRENT_FAMILY_NAME,
            uris::CURRENT_GIVEN_NAME,
            uris::DATE_OF_BIRTH,
        ]
        .into_iter()
        .fold(AttributeCatalog::builder(), |builder, uri| {
            builder.put_definition(registry.get(uri).unwrap().clone())
        })
        .build()
        .unwrap()
    }

    fn connector_request(id: &str) -> AuthenticationRequest {
        AuthenticationRequest::new(id, CONNECTOR_METADATA, "ES", natural_person_mds())
            .with_destination(Some(POST_DESTINATION.to_string()))
            .with_service_provider_country_code(Some("BE".to_string()))
            .with_levels_of_assurance(LevelsOfAssurance::new(vec![LevelOfAssurance::SUBSTANTIAL]))
            .with_relay_state(Some("relay-42".to_string()))
            .with_binding(Some("POST".to_string()))
    }

    fn asserted_identity(identifier: &str) -> AttributeCatalog {
        let registry = eidas_registry();
        AttributeCatalog::builder()
            .put_str(registry.get(uris::PERSON_IDENTIFIER).unwrap().clone(), &[identifier])
            .put_str(registry.get(uris::CURRENT_FAMILY_NAME).unwrap().clone(), &["Garcia"])
            .put_str(registry.get(uris::CURRENT_GIVEN_NAME).unwrap().clone(), &["Javier"])
            .put_str(registry.get(uris::DATE_OF_BIRTH).unwrap().clone(), &["1965-01-01"])
            .build()
            .unwrap()
    }

    fn proxy(harness: &Harness, config: ProxyServiceConfig) -> ProxyServiceProcessor {
        harness.metadata.insert(CONNECTOR_METADATA, connector_metadata());
        ProxyServiceProcessor::with_in_memory_store(
            config,
            harness.trust(),
            harness.collaborators(),
            &CacheConfig::default(),
        )
        .unwrap()
    }

    fn post() -> RequestContext {
        RequestContext::new(HttpMethod::Post).with_remote_ip("192.0.2.10")
    }

    fn expect_reply(err: ProtocolError) -> Box<FailureReply> {
        match err {
            ProtocolError::Reply(reply) => reply,
            other => panic!("expected a failure reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn valid_request_is_accepted_with_defaults() {
        let harness = Harness::new("BE");
        let proxy = proxy(&harness, config());
        harness
            .engine
            .script_request(b"req-1", connector_request("_c1"), harness.signature());

        let accepted = proxy.process_connector_request(&post(), b"req-1").await.unwrap();

        assert_eq!(accepted.sp_type, Some(SpType::Public));
        assert_eq!(
            accepted.assertion_consumer_service_url.as_deref(),
            Some("https://connector.example.be/acs")
        );
        assert_eq!(harness.audit.types(), vec![EventType::ProxyRequestAccepted]);
    }

    #[tokio::test]
    async fn signer_must_match_the_published_certificate() {
        let harness = Harness::new("BE");
        let proxy = proxy(&harness, config());
        let other = Harness::new("BE");
        harness.metadata.insert(
            CONNECTOR_METADATA,
            MetadataParameters {
                signing_certificate: Some(other.signer.leaf.clone()),
                ..connector_metadata()
            },
        );
        harness
            .engine
            .script_request(b"req-1", connector_request("_c1"), harness.signature());

        let err = proxy.process_connector_request(&post(), b"req-1").await.unwrap_err();
        assert_eq!(err.key(), ErrorKey::SamlEngineUntrustedCertificate);
        assert_eq!(err.category(), ErrorCategory::Security);

        harness.metadata.insert(
            CONNECTOR_METADATA,
            MetadataParameters {
                signing_certificate: Some(harness.signer.leaf.clone()),
                ..connector_metadata()
            },
        );
        harness
            .engine
            .script_request(b"req-2", connector_request("_c2"), harness.signature());
        assert!(proxy.process_connector_request(&post(), b"req-2").await.is_ok());
    }

    #[tokio::test]
    async fn content_failures_are_answered_with_requester_replies() {
        let harness = Harness::new("BE");
        let proxy = proxy(&harness, config());

        let cases = [
            (
                connector_request("_c1").with_binding(Some("GET".to_string())),
                ErrorKey::InvalidProtocolBinding,
            ),
            (
                AuthenticationRequest {
                    citizen_country_code: "PT".to_string(),
                    ..connector_request("_c2")
                },
                ErrorKey::ColleagueReqInvalidCountrycode,
            ),
            (
                connector_request("_c3").with_requested_attributes(AttributeCatalog::empty()),
                ErrorKey::ColleagueReqAttrNull,
            ),
            (
                connector_request("_c4").with_destination(Some("https://elsewhere.example".to_string())),
                ErrorKey::ColleagueReqInvalidDestUrl,
            ),
            (
                connector_request("_c5")
                    .with_levels_of_assurance(LevelsOfAssurance::new(vec![LevelOfAssurance::from_uri(
                        "urn:example:loa:gold",
                    )])),
                ErrorKey::ColleagueReqInvalidLoa,
            ),
            (
                connector_request("_c6").with_sp_type(Some(SpType::Private)),
                ErrorKey::ColleagueReqInconsistentSptype,
            ),
            (
                connector_request("_c7").with_name_id_format(Some(NameIdFormat::Entity.uri().to_string())),
                ErrorKey::ColleagueReqInvalidNameid,
            ),
        ];

        for (i, (request, expected)) in cases.into_iter().enumerate() {
            let token = format!("req-{i}");
            harness
                .engine
                .script_request(token.as_bytes(), request, harness.signature());
            let reply = expect_reply(
                proxy
                    .process_connector_request(&post(), token.as_bytes())
                    .await
                    .unwrap_err(),
            );
            assert_eq!(reply.key, expected, "case {i}");
            assert_eq!(reply.response.status.status_code.value, status_codes::REQUESTER);
            assert_eq!(reply.response.status.status_message, Some(expected.code()));
            assert_eq!(reply.relay_state.as_deref(), Some("relay-42"));
        }
    }

    #[tokio::test]
    async fn country_suffix_is_ignored() {
        let harness = Harness::new("BE");
        let proxy = proxy(&harness, config());
        let request = AuthenticationRequest {
            citizen_country_code: "ES-CT".to_string(),
            ..connector_request("_c1")
        };
        harness.engine.script_request(b"req-1", request, harness.signature());

        assert!(proxy.process_connector_request(&post(), b"req-1").await.is_ok());
    }

    #[tokio::test]
    async fn replayed_request_is_a_security_error() {
        let harness = Harness::new("BE");
        let proxy = proxy(&harness, config());
        harness
            .engine
            .script_request(b"req-1", connector_request("_c1"), harness.signature());

        proxy.process_connector_request(&post(), b"req-1").await.unwrap();
        let err = proxy.process_connector_request(&post(), b"req-1").await.unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Security);
        assert_eq!(err.key(), ErrorKey::SproviderSelectorInvalidSaml);
    }

    #[tokio::test]
    async fn undecodable_request_is_not_a_reply() {
        let harness = Harness::new("BE");
        let proxy = proxy(&harness, config());

        let err = proxy.process_connector_request(&post(), b"garbage").await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.key(), ErrorKey::ColleagueReqInvalidSaml);
    }

    #[tokio::test]
    async fn response_carries_prefixed_identifier() {
        let harness = Harness::new("BE");
        let proxy = proxy(
            &harness,
            ProxyServiceConfig {
                prefix_identifiers_country_code: true,
                ..config()
            },
        );
        harness
            .engine
            .script_request(b"req-1", connector_request("_c1"), harness.signature());
        proxy.process_connector_request(&post(), b"req-1").await.unwrap();

        let idp = IdpResult::success(asserted_identity("02635542Y"), LevelOfAssurance::HIGH.uri());
        let outbound = proxy.generate_response(&post(), "_c1", Some(idp)).await.unwrap();

        let response = &outbound.response;
        assert_eq!(response.in_response_to, "_c1");
        assert_eq!(response.issuer, PS_METADATA);
        assert_eq!(response.country.as_deref(), Some("ES"));
        assert_eq!(response.audience_restriction.as_deref(), Some(CONNECTOR_METADATA));
        assert_eq!(
            response
                .attributes
                .first_value(uris::PERSON_IDENTIFIER)
                .map(AttributeValue::marshal)
                .as_deref(),
            Some("ES/BE/02635542Y")
        );
        assert_eq!(response.subject.as_deref(), Some("ES/BE/02635542Y"));
        assert_eq!(outbound.relay_state.as_deref(), Some("relay-42"));
        assert_eq!(harness.engine.generated().len(), 1);
    }

    #[tokio::test]
    async fn already_prefixed_identifier_is_kept() {
        let harness = Harness::new("BE");
        let proxy = proxy(
            &harness,
            ProxyServiceConfig {
                prefix_identifiers_country_code: true,
                ..config()
            },
        );
        harness
            .engine
            .script_request(b"req-1", connector_request("_c1"), harness.signature());
        proxy.process_connector_request(&post(), b"req-1").await.unwrap();

        let idp = IdpResult::success(asserted_identity("ES/BE/02635542Y"), LevelOfAssurance::HIGH.uri());
        let outbound = proxy.generate_response(&post(), "_c1", Some(idp)).await.unwrap();
        assert_eq!(
            outbound
                .response
                .attributes
                .first_value(uris::PERSON_IDENTIFIER)
                .map(AttributeValue::marshal)
                .as_deref(),
            Some("ES/BE/02635542Y")
        );
    }

    #[tokio::test]
    async fn foreign_prefix_is_not_mistaken_for_ours() {
        let harness = Harness::new("BE");
        let proxy = proxy(
            &harness,
            ProxyServiceConfig {
                prefix_identifiers_country_code: true,
                ..config()
            },
        );
        harness
            .engine
            .script_request(b"req-1", connector_request("_c1"), harness.signature());
        proxy.process_connector_request(&post(), b"req-1").await.unwrap();

        let idp = IdpResult::success(asserted_identity("PT/BE/02635542Y"), LevelOfAssurance::HIGH.uri());
        let outbound = proxy.generate_response(&post(), "_c1", Some(idp)).await.unwrap();
        assert_eq!(
            outbound
                .response
                .attributes
                .first_value(uris::PERSON_IDENTIFIER)
                .map(AttributeValue::marshal)
                .as_deref(),
            Some("ES/BE/PT/BE/02635542Y")
        );
    }

    #[tokio::test]
    async fn idp_failures_are_answered_with_responder_replies() {
        let harness = Harness::new("BE");
        let proxy = proxy(&harness, config());
        harness
            .engine
            .script_request(b"req-1", connector_request("_c1"), harness.signature());
        proxy.process_connector_request(&post(), b"req-1").await.unwrap();

        let cases = [
            (None, ErrorKey::InvalidAttributeList),
            (
                Some(IdpResult::success(asserted_identity("02635542Y"), LevelOfAssurance::LOW.uri())),
                ErrorKey::InvalidResponseLoaValueUnpublished,
            ),
            (
                Some(IdpResult {
                    level_of_assurance: None,
                    ..IdpResult::success(asserted_identity("02635542Y"), LevelOfAssurance::HIGH.uri())
                }),
                ErrorKey::MessageValidationError,
            ),
            (
                Some(IdpResult::success(
                    asserted_identity("02635542Y").with_values(uris::CURRENT_GIVEN_NAME, vec![]),
                    LevelOfAssurance::HIGH.uri(),
                )),
                ErrorKey::AttVerificationMandatory,
            ),
        ];

        for (i, (idp, expected)) in cases.into_iter().enumerate() {
            let reply = expect_reply(proxy.generate_response(&post(), "_c1", idp).await.unwrap_err());
            assert_eq!(reply.key, expected, "case {i}");
            assert_eq!(reply.response.status.status_code.value, status_codes::RESPONDER);
            assert_eq!(reply.response.in_response_to, "_c1");
        }
    }

    #[tokio::test]
    async fn unknown_request_is_a_session_error() {
        let harness = Harness::new("BE");
        let proxy = proxy(&harness, config());
        let idp = IdpResult::success(asserted_identity("02635542Y"), LevelOfAssurance::HIGH.uri());

        let err = proxy.generate_response(&post(), "_nobody", Some(idp)).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Session);
    }

    #[tokio::test]
    async fn error_response_from_status_parts() {
        let harness = Harness::new("BE");
        let proxy = proxy(&harness, config());
        harness
            .engine
            .script_request(b"req-1", connector_request("_c1"), harness.signature());
        proxy.process_connector_request(&post(), b"req-1").await.unwrap();

        let outbound = proxy
            .build_error_response(
                &post(),
                "_c1",
                StatusCode::responder().with_sub_status(sub_status_codes::AUTHN_FAILED),
                Some("user cancelled".to_string()),
            )
            .await
            .unwrap();

        assert!(outbound.response.is_failure());
        assert_eq!(
            outbound.response.status.status_code.sub_status_value(),
            Some(sub_status_codes::AUTHN_FAILED)
        );
        assert_eq!(outbound.destination.as_deref(), Some("https://connector.example.be/acs"));
    }
}
