//! Connector half-flows.
//!
//! A Connector turns a service provider request into a signed request for
//! the citizen's ProxyService, and validates the response that comes back
//! before handing it to the service provider.

use std::sync::Arc;
use std::time::Duration;

use eidas_cache::{CorrelationStore, InMemoryCorrelationStore};
use eidas_core::config::{CacheConfig, ConnectorConfig};
use eidas_core::event::{EventBuilder, EventType};
use eidas_core::ErrorKey;

use super::checks::{
    check_identifier_prefixes, check_requested_name_id_format, check_requester_id,
    check_response_name_id, NameIdOutcome,
};
use super::{
    cache_failure, check_published_signer, fetch_metadata, lookup_request, published_levels,
    signing_parameters, trust_failure, Collaborators, RequestContext, StoredRequest,
};
use crate::attribute::validate_attributes;
use crate::engine::{ClockSkew, SigningParameters};
use crate::error::{ProtocolError, ProtocolResult};
use crate::loa::{
    adapt_for_legacy_target, extrapolate_for_exact_comparison, request_satisfies_published,
    response_satisfies_published, response_satisfies_request, LevelOfAssurance,
};
use crate::metadata::MetadataParameters;
use crate::trust::{check_certificate_country, Certificate, SignatureInfo, TrustValidator};
use crate::types::{
    protocol_versions_compatible, AuthenticationRequest, AuthenticationResponse, HttpMethod,
    ProtocolVersion, SpType, Status,
};

/// A request ready to be sent to a ProxyService.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// Signed wire bytes.
    pub bytes: Vec<u8>,
    /// The request as sent.
    pub request: AuthenticationRequest,
    /// Endpoint the bytes must be delivered to.
    pub destination: String,
}

/// A validated response together with the request it answers.
#[derive(Debug, Clone)]
pub struct ValidatedExchange {
    /// The service provider request, as received.
    pub sp_request: StoredRequest,
    /// The response, readdressed to the service provider.
    pub response: AuthenticationResponse,
}

/// The Connector role.
pub struct ConnectorProcessor {
    config: ConnectorConfig,
    collaborators: Collaborators,
    trust: TrustValidator,
    signing: SigningParameters,
    connector_requests: Arc<dyn CorrelationStore<StoredRequest>>,
    sp_requests: Arc<dyn CorrelationStore<StoredRequest>>,
}

impl ConnectorProcessor {
    /// Creates a Connector.
    ///
    /// `connector_requests` receives the requests sent to ProxyServices and
    /// `sp_requests` the service provider requests they were derived from,
    /// both keyed by the wire request id.
    ///
    /// ## Errors
    ///
    /// Returns a configuration error when the trust policy names a digest
    /// algorithm that cannot be used for signing.
    pub fn new(
        config: ConnectorConfig,
        trust: TrustValidator,
        collaborators: Collaborators,
        connector_requests: Arc<dyn CorrelationStore<StoredRequest>>,
        sp_requests: Arc<dyn CorrelationStore<StoredRequest>>,
    ) -> ProtocolResult<Self> {
        let signing = signing_parameters(&trust)?;
        Ok(Self {
            config,
            collaborators,
            trust,
            signing,
            connector_requests,
            sp_requests,
        })
    }

    /// Creates a Connector whose correlation stores live in process memory.
    ///
    /// ## Errors
    ///
    /// See [`ConnectorProcessor::new`].
    pub fn with_in_memory_stores(
        config: ConnectorConfig,
        trust: TrustValidator,
        collaborators: Collaborators,
        cache: &CacheConfig,
    ) -> ProtocolResult<Self> {
        let ttl = Duration::from_secs(cache.correlation_ttl_secs);
        Self::new(
            config,
            trust,
            collaborators,
            Arc::new(InMemoryCorrelationStore::new(ttl)),
            Arc::new(InMemoryCorrelationStore::new(ttl)),
        )
    }

    /// The configuration in force.
    #[must_use]
    pub const fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    // ========================================================================
    // Outbound request
    // ========================================================================

    /// Turns a service provider request into a signed request for the
    /// ProxyService of the citizen's country.
    ///
    /// Nothing is stored unless every check passes.
    ///
    /// ## Errors
    ///
    /// Returns the first failing check. No partial message is produced.
    pub async fn process_sp_request(
        &self,
        ctx: &RequestContext,
        request: AuthenticationRequest,
    ) -> ProtocolResult<OutboundRequest> {
        let sp_request_id = request.id.clone();
        let country = request.citizen_country_code.clone();
        let issuer = request.issuer.clone();

        let result = self.generate_request(ctx, request).await;

        let event = match &result {
            Ok(outbound) => {
                tracing::info!(
                    sp_request_id = %sp_request_id,
                    request_id = %outbound.request.id,
                    country = %country,
                    destination = %outbound.destination,
                    "Request generated for ProxyService"
                );
                EventBuilder::new(EventType::ConnectorRequestGenerated)
                    .request_id(outbound.request.id.clone())
                    .detail("sp_request_id", sp_request_id)
                    .detail("destination", outbound.destination.clone())
            }
            Err(e) => {
                tracing::warn!(
                    sp_request_id = %sp_request_id,
                    country = %country,
                    error = %e,
                    "Service provider request rejected"
                );
                EventBuilder::new(EventType::ConnectorRequestRejected)
                    .failure(e.key())
                    .request_id(sp_request_id)
                    .detail("reason", e.to_string())
            }
        };
        self.collaborators.audit.record(
            &event
                .country(country)
                .issuer(issuer)
                .ip_address(ctx.remote_ip.as_deref())
                .build(),
        );

        result
    }

    async fn generate_request(
        &self,
        ctx: &RequestContext,
        request: AuthenticationRequest,
    ) -> ProtocolResult<OutboundRequest> {
        request
            .validate()
            .map_err(|e| ProtocolError::validation(ErrorKey::SpRequestInvalid, e))?;

        let country = request.citizen_country_code.trim().to_ascii_uppercase();
        let service = self.config.service(&country).ok_or_else(|| {
            ProtocolError::configuration(
                ErrorKey::ServiceRedirectUrl,
                format!("no ProxyService configured for {country}"),
            )
        })?;
        let metadata = fetch_metadata(&*self.collaborators.metadata, &service.metadata_url).await?;

        if !protocol_versions_compatible(&self.config.protocol_versions, &metadata.protocol_versions) {
            return Err(ProtocolError::validation(
                ErrorKey::ProtocolVersionUnsupported,
                format!(
                    "no common protocol version with {}: {:?}",
                    service.metadata_url, metadata.protocol_versions
                ),
            ));
        }

        let method = request
            .binding
            .as_deref()
            .and_then(HttpMethod::parse)
            .unwrap_or(ctx.http_method);
        let endpoint = metadata.select_endpoint(method).ok_or_else(|| {
            ProtocolError::configuration(
                ErrorKey::ServiceRedirectUrl,
                format!("{} publishes no SSO endpoint", service.metadata_url),
            )
        })?;

        let sp_request = request.clone();
        let request = adapt_for_legacy_target(request, &metadata.protocol_versions)
            .map_err(|e| ProtocolError::validation(ErrorKey::ServiceProviderInvalidLoa, e.to_string()))?;

        self.check_outbound_request(&request, &metadata)?;

        let sp_type = self.config.sp_type.or(request.sp_type);
        let prepared = self.prepare_outbound(request, endpoint.location.clone(), sp_type);

        let generated = self
            .collaborators
            .engine
            .generate_request(&prepared, &service.metadata_url, &self.signing)
            .map_err(|e| {
                ProtocolError::configuration(ErrorKey::SproviderSelectorErrorCreateSaml, e.to_string())
            })?;

        let wire_id = generated.request.id.clone();
        self.connector_requests
            .put(
                &wire_id,
                StoredRequest {
                    request: generated.request.clone(),
                    remote_ip: ctx.remote_ip.clone(),
                },
            )
            .await
            .map_err(cache_failure)?;
        self.sp_requests
            .put(
                &wire_id,
                StoredRequest {
                    request: sp_request,
                    remote_ip: ctx.remote_ip.clone(),
                },
            )
            .await
            .map_err(cache_failure)?;

        Ok(OutboundRequest {
            bytes: generated.bytes,
            request: generated.request,
            destination: endpoint.location.clone(),
        })
    }

    fn check_outbound_request(
        &self,
        request: &AuthenticationRequest,
        metadata: &MetadataParameters,
    ) -> ProtocolResult<()> {
        if request.requested_attributes.is_empty() {
            return Err(ProtocolError::validation(
                ErrorKey::SproviderSelectorInvalidAttr,
                "no attribute requested",
            ));
        }

        let levels = &request.levels_of_assurance.levels;
        if levels.is_empty() {
            return Err(ProtocolError::validation(
                ErrorKey::ServiceProviderInvalidLoa,
                "no level of assurance requested",
            ));
        }
        if !metadata.assurance_levels.is_empty() {
            let published = published_levels(&metadata.assurance_levels);
            let version = ProtocolVersion::highest_or_legacy(&metadata.protocol_versions);
            if !request_satisfies_published(levels, &published, version) {
                return Err(ProtocolError::validation(
                    ErrorKey::ServiceProviderInvalidLoa,
                    format!(
                        "requested levels are not published by the ProxyService (protocol {})",
                        version.as_str()
                    ),
                ));
            }
        }

        check_requested_name_id_format(
            request.name_id_format.as_deref(),
            &self.config.name_id_formats,
            &metadata.name_id_formats,
        )
        .map_err(|e| ProtocolError::validation(ErrorKey::SpRequestInvalid, e))?;

        check_requester_id(
            request.requester_id.as_deref(),
            self.config.sp_type.or(request.sp_type),
            metadata.requester_id_required,
        )
        .map_err(|e| ProtocolError::validation(ErrorKey::SproviderInvalidRequesterId, e))
    }

    fn prepare_outbound(
        &self,
        request: AuthenticationRequest,
        destination: String,
        sp_type: Option<SpType>,
    ) -> AuthenticationRequest {
        let levels = extrapolate_for_exact_comparison(&request.levels_of_assurance.levels);
        let sp_country = request
            .service_provider_country_code
            .clone()
            .or_else(|| Some(request.citizen_country_code.clone()));

        let request = match &self.config.metadata_url {
            Some(own) if *own != request.issuer => {
                let original = request.issuer.clone();
                request.with_original_issuer(Some(original)).with_issuer(own.clone())
            }
            _ => request,
        };

        request
            .with_levels_of_assurance(levels)
            .with_service_provider_country_code(sp_country)
            .with_sp_type(sp_type)
            .with_destination(Some(destination))
            .with_binding(None)
    }

    // ========================================================================
    // Inbound response
    // ========================================================================

    /// Validates a ProxyService response and readdresses it to the service
    /// provider that started the exchange.
    ///
    /// A NameID format other than the one requested does not fail; the
    /// response is turned into an `InvalidNameIDPolicy` failure instead.
    ///
    /// ## Errors
    ///
    /// - Validation errors for a missing or undecodable token and for
    ///   content checks
    /// - Session errors when the response answers no known request
    /// - Security errors for replays, country or audience mismatches and
    ///   untrusted signers
    pub async fn process_proxy_service_response(
        &self,
        ctx: &RequestContext,
        token: Option<&[u8]>,
    ) -> ProtocolResult<ValidatedExchange> {
        let result = self.validate_response(ctx, token).await;

        let event = match &result {
            Ok(exchange) => EventBuilder::new(EventType::ConnectorResponseAccepted)
                .request_id(exchange.response.id.clone())
                .in_response_to(exchange.sp_request.request.id.clone())
                .country(exchange.sp_request.request.citizen_country_code.clone())
                .detail("status", exchange.response.status.status_code.value.clone()),
            Err(e) => {
                tracing::warn!(error = %e, category = ?e.category(), "ProxyService response rejected");
                EventBuilder::new(EventType::ConnectorResponseRejected)
                    .failure(e.key())
                    .detail("reason", e.to_string())
            }
        };
        self.collaborators
            .audit
            .record(&event.ip_address(ctx.remote_ip.as_deref()).build());

        result
    }

    async fn validate_response(
        &self,
        ctx: &RequestContext,
        token: Option<&[u8]>,
    ) -> ProtocolResult<ValidatedExchange> {
        let token = token.ok_or_else(|| {
            ProtocolError::validation(ErrorKey::ColleagueRespInvalidSaml, "no response token")
        })?;

        let header = self
            .collaborators
            .engine
            .peek_response(token)
            .map_err(|e| ProtocolError::validation(ErrorKey::ColleagueRespInvalidSaml, e.to_string()))?;
        let in_response_to = header
            .in_response_to
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                ProtocolError::session(
                    ErrorKey::AuRequestId,
                    format!("response {} has no InResponseTo", header.id),
                )
            })?;

        let connector_request = lookup_request(&*self.connector_requests, &in_response_to).await?;
        let sp_request = lookup_request(&*self.sp_requests, &in_response_to).await?;
        let citizen_country = connector_request
            .request
            .citizen_country_code
            .trim()
            .to_ascii_uppercase();

        let skew = self
            .config
            .service(&citizen_country)
            .map(|s| ClockSkew {
                before_ms: s.skew_before_ms,
                after_ms: s.skew_after_ms,
            })
            .unwrap_or_default();
        let validated = self
            .collaborators
            .engine
            .validate_response(
                token,
                ctx.remote_ip.as_deref(),
                skew,
                Some(&connector_request.request.issuer),
            )
            .map_err(|e| ProtocolError::validation(ErrorKey::ColleagueRespInvalidSaml, e.to_string()))?;
        let signer = self.validate_signer(&validated.signature, &validated.response, ctx)?;
        let response = validated.response;
        self.check_issuer(&response, &citizen_country)?;

        let replay_scope = response
            .country
            .clone()
            .unwrap_or_else(|| citizen_country.clone());
        let first_sighting = self
            .collaborators
            .replay
            .check_and_record(&response.id, &replay_scope)
            .await
            .map_err(cache_failure)?;
        if !first_sighting {
            self.collaborators.audit.record(
                &EventBuilder::new(EventType::ReplayDetected)
                    .failure(ErrorKey::SproviderSelectorInvalidSaml)
                    .request_id(response.id.clone())
                    .country(replay_scope)
                    .issuer(response.issuer.clone())
                    .ip_address(ctx.remote_ip.as_deref())
                    .build(),
            );
            return Err(ProtocolError::security(
                ErrorKey::SproviderSelectorInvalidSaml,
                format!("response {} was already processed", response.id),
            ));
        }

        let metadata = fetch_metadata(&*self.collaborators.metadata, &response.issuer).await?;
        check_published_signer(&metadata, &signer)?;
        self.check_country(&response, &citizen_country, &metadata, &signer)?;

        let response = if response.is_failure() {
            resolve_failure_message(response)
        } else {
            self.check_successful_response(response, &connector_request.request, &metadata)?
        };

        if let Some(audience) = response.audience_restriction.as_deref() {
            if audience != connector_request.request.issuer {
                return Err(ProtocolError::security(
                    ErrorKey::AudienceRestriction,
                    format!(
                        "audience {audience} differs from {}",
                        connector_request.request.issuer
                    ),
                ));
            }
        }

        let issuer = self
            .config
            .metadata_url
            .clone()
            .unwrap_or_else(|| response.issuer.clone());
        let response = response
            .with_in_response_to(sp_request.request.id.clone())
            .with_issuer(issuer);

        Ok(ValidatedExchange {
            sp_request,
            response,
        })
    }

    fn validate_signer(
        &self,
        signature: &SignatureInfo,
        response: &AuthenticationResponse,
        ctx: &RequestContext,
    ) -> ProtocolResult<Certificate> {
        self.trust.validate_signature(signature).map_err(|e| {
            self.collaborators.audit.record(
                &EventBuilder::new(EventType::CertificateRejected)
                    .failure(e.error_key())
                    .request_id(response.id.clone())
                    .issuer(response.issuer.clone())
                    .ip_address(ctx.remote_ip.as_deref())
                    .detail("reason", e.to_string())
                    .build(),
            );
            trust_failure(&e)
        })
    }

    /// The response must come from the ProxyService configured for the
    /// citizen country.
    fn check_issuer(
        &self,
        response: &AuthenticationResponse,
        citizen_country: &str,
    ) -> ProtocolResult<()> {
        let service = self.config.service(citizen_country).ok_or_else(|| {
            ProtocolError::configuration(
                ErrorKey::ServiceRedirectUrl,
                format!("no ProxyService configured for {citizen_country}"),
            )
        })?;
        if response.issuer != service.metadata_url {
            return Err(ProtocolError::security(
                ErrorKey::ColleagueRespInvalidSaml,
                format!(
                    "response issuer {} is not the {citizen_country} ProxyService {}",
                    response.issuer, service.metadata_url
                ),
            ));
        }
        Ok(())
    }

    /// The country of the answering node comes from its metadata, or from
    /// the signer `C=` when the metadata names none.
    fn check_country(
        &self,
        response: &AuthenticationResponse,
        citizen_country: &str,
        metadata: &MetadataParameters,
        signer: &Certificate,
    ) -> ProtocolResult<()> {
        let forced = self.config.check_citizen_certificate_service_certificate;
        let node_country = metadata
            .node_country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        if node_country.is_none() && !forced {
            return Ok(());
        }

        let service_country = node_country.or_else(|| signer.country()).unwrap_or_default();
        if !service_country.eq_ignore_ascii_case(citizen_country) {
            return Err(ProtocolError::security(
                ErrorKey::InvalidResponseCountryIsocode,
                format!(
                    "answering node country '{service_country}' differs from requested {citizen_country}"
                ),
            ));
        }
        if let Some(asserted) = response.country.as_deref() {
            if !asserted.eq_ignore_ascii_case(citizen_country) {
                return Err(ProtocolError::security(
                    ErrorKey::InvalidResponseCountryIsocode,
                    format!("asserted country '{asserted}' differs from requested {citizen_country}"),
                ));
            }
        }
        if forced {
            check_certificate_country(signer, citizen_country).map_err(|e| {
                ProtocolError::security(ErrorKey::InvalidResponseCountryIsocode, e.to_string())
            })?;
        }
        Ok(())
    }

    fn check_successful_response(
        &self,
        response: AuthenticationResponse,
        connector_request: &AuthenticationRequest,
        metadata: &MetadataParameters,
    ) -> ProtocolResult<AuthenticationResponse> {
        response
            .validate()
            .map_err(|e| ProtocolError::validation(ErrorKey::ColleagueRespInvalidSaml, e))?;
        let asserted_loa = response
            .level_of_assurance
            .as_deref()
            .map(LevelOfAssurance::from_uri)
            .ok_or_else(|| {
                ProtocolError::validation(ErrorKey::InvalidResponseLoaValue, "no level of assurance asserted")
            })?;
        if !response_satisfies_request(&connector_request.levels_of_assurance.levels, &asserted_loa) {
            return Err(ProtocolError::validation(
                ErrorKey::InvalidResponseLoaValue,
                format!("asserted level {asserted_loa} was not requested"),
            ));
        }
        if !metadata.assurance_levels.is_empty() {
            let published = published_levels(&metadata.assurance_levels);
            let version = ProtocolVersion::highest_or_legacy(&metadata.protocol_versions);
            if !response_satisfies_published(&asserted_loa, &published, version) {
                return Err(ProtocolError::validation(
                    ErrorKey::InvalidResponseLoaValueUnpublished,
                    format!("asserted level {asserted_loa} is not published"),
                ));
            }
        }

        if self.config.validate_prefix_country_code_identifiers {
            check_identifier_prefixes(&response.attributes, &connector_request.citizen_country_code)
                .map_err(|e| ProtocolError::validation(ErrorKey::ColleagueRespInvalidSaml, e))?;
        }

        validate_attributes(&response.attributes, &metadata.protocol_versions)
            .map_err(|e| ProtocolError::validation(ErrorKey::InvalidAttributeValue, e.to_string()))?;

        let outcome = check_response_name_id(
            connector_request.name_id_format.as_deref(),
            &response,
            &self.config.name_id_formats,
        )
        .map_err(|e| ProtocolError::validation(ErrorKey::ColleagueRespInvalidSaml, e))?;

        Ok(match outcome {
            NameIdOutcome::Accepted => response,
            NameIdOutcome::PolicyMismatch => {
                tracing::warn!(
                    response_id = %response.id,
                    requested = ?connector_request.name_id_format,
                    asserted = ?response.subject_name_id_format,
                    "NameID format mismatch, answering with InvalidNameIDPolicy"
                );
                response.with_status(Status::invalid_name_id_policy())
            }
        })
    }
}

/// Replaces a catalog code in the status message with its message key.
fn resolve_failure_message(response: AuthenticationResponse) -> AuthenticationResponse {
    let resolved = response
        .status
        .status_message
        .as_deref()
        .and_then(ErrorKey::from_code)
        .map(ErrorKey::message);
    match resolved {
        Some(message) => {
            let status = response.status.clone().with_message(Some(message));
            response.with_status(status)
        }
        None => response,
    }
}
