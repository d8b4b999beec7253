//! The node's error catalog.
//!
//! Every failure that leaves the node is reported as a stable
//! `(error code, error message)` pair. The message is a lookup key into a
//! localised bundle owned by the presentation layer; this crate only knows
//! the keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix appended to a catalog key to form the error code.
pub const CODE_SUFFIX: &str = ".code";

/// Suffix appended to a catalog key to form the message key.
pub const MESSAGE_SUFFIX: &str = ".message";

/// Entries of the error catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKey {
    // ========================================================================
    // Connector: service provider request
    // ========================================================================
    /// No metadata URL is configured for the target country.
    ServiceRedirectUrl,
    /// Requested attribute list is empty.
    SproviderSelectorInvalidAttr,
    /// Requested LoA is missing or cannot be satisfied.
    ServiceProviderInvalidLoa,
    /// Requested NameID format is not supported.
    SpRequestInvalid,
    /// Requester id is missing or malformed.
    SproviderInvalidRequesterId,
    /// The wire engine could not build the request.
    SproviderSelectorErrorCreateSaml,
    /// A replayed message was detected.
    SproviderSelectorInvalidSaml,

    // ========================================================================
    // Connector: ProxyService response
    // ========================================================================
    /// The response could not be decoded or validated.
    ColleagueRespInvalidSaml,
    /// No stored request matches the response.
    AuRequestId,
    /// Response LoA does not satisfy the request.
    InvalidResponseLoaValue,
    /// Response LoA is not among the published levels.
    InvalidResponseLoaValueUnpublished,
    /// Asserted country differs from the requested country.
    InvalidResponseCountryIsocode,
    /// An attribute value failed validation.
    InvalidAttributeValue,
    /// Audience restriction differs from the original issuer.
    AudienceRestriction,

    // ========================================================================
    // ProxyService: Connector request
    // ========================================================================
    /// The request could not be decoded or validated.
    ColleagueReqInvalidSaml,
    /// Requester id is mandatory for this service provider.
    ColleagueReqMissingRequesterId,
    /// Citizen country does not match this ProxyService.
    ColleagueReqInvalidCountrycode,
    /// Requested attribute list is empty.
    ColleagueReqAttrNull,
    /// A required attribute is not supported.
    ColleagueReqAttrList,
    /// Requested NameID format is not supported.
    ColleagueReqInvalidNameid,
    /// Destination does not match this ProxyService.
    ColleagueReqInvalidDestUrl,
    /// Requested LoA is not offered.
    ColleagueReqInvalidLoa,
    /// SP type is declared in both request and metadata.
    ColleagueReqInconsistentSptype,
    /// SP type is declared in neither request nor metadata.
    ColleagueReqMissingSptype,
    /// Protocol binding does not match the HTTP method.
    InvalidProtocolBinding,
    /// The minimum data set is incomplete.
    EidasMandatoryAttributes,
    /// Representative attributes were requested.
    EidasRepresentativeAttributes,

    // ========================================================================
    // ProxyService: identity provider response
    // ========================================================================
    /// The identity provider returned no usable attribute list.
    InvalidAttributeList,
    /// A required attribute is missing from the identity provider response.
    AttVerificationMandatory,
    /// A generated message failed validation.
    MessageValidationError,

    // ========================================================================
    // Shared
    // ========================================================================
    /// Metadata could not be retrieved.
    SamlEngineNoMetadata,
    /// No common protocol version.
    ProtocolVersionUnsupported,
    /// Signing certificate is invalid.
    SamlEngineInvalidCertificate,
    /// Signing certificate is not trusted.
    SamlEngineUntrustedCertificate,
    /// Signature or digest algorithm is not acceptable.
    InvalidSignatureAlgorithm,
    /// Unexpected internal failure.
    InternalError,
}

impl ErrorKey {
    /// Every catalog entry.
    pub const ALL: [Self; 36] = [
        Self::ServiceRedirectUrl,
        Self::SproviderSelectorInvalidAttr,
        Self::ServiceProviderInvalidLoa,
        Self::SpRequestInvalid,
        Self::SproviderInvalidRequesterId,
        Self::SproviderSelectorErrorCreateSaml,
        Self::SproviderSelectorInvalidSaml,
        Self::ColleagueRespInvalidSaml,
        Self::AuRequestId,
        Self::InvalidResponseLoaValue,
        Self::InvalidResponseLoaValueUnpublished,
        Self::InvalidResponseCountryIsocode,
        Self::InvalidAttributeValue,
        Self::AudienceRestriction,
        Self::ColleagueReqInvalidSaml,
        Self::ColleagueReqMissingRequesterId,
        Self::ColleagueReqInvalidCountrycode,
        Self::ColleagueReqAttrNull,
        Self::ColleagueReqAttrList,
        Self::ColleagueReqInvalidNameid,
        Self::ColleagueReqInvalidDestUrl,
        Self::ColleagueReqInvalidLoa,
        Self::ColleagueReqInconsistentSptype,
        Self::ColleagueReqMissingSptype,
        Self::InvalidProtocolBinding,
        Self::EidasMandatoryAttributes,
        Self::EidasRepresentativeAttributes,
        Self::InvalidAttributeList,
        Self::AttVerificationMandatory,
        Self::MessageValidationError,
        Self::SamlEngineNoMetadata,
        Self::ProtocolVersionUnsupported,
        Self::SamlEngineInvalidCertificate,
        Self::SamlEngineUntrustedCertificate,
        Self::InvalidSignatureAlgorithm,
        Self::InternalError,
    ];

    /// Catalog key used to derive the code and message.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::ServiceRedirectUrl => "serviceRedirectUrl",
            Self::SproviderSelectorInvalidAttr => "sProviderAction.invalidAttr",
            Self::ServiceProviderInvalidLoa => "serviceProviderRequest.invalidLoA",
            Self::SpRequestInvalid => "spRequest.invalid",
            Self::SproviderInvalidRequesterId => "sProviderAction.invalidRequesterId",
            Self::SproviderSelectorErrorCreateSaml => "sProviderAction.errorCreatingSAML",
            Self::SproviderSelectorInvalidSaml => "sProviderAction.invalidSaml",
            Self::ColleagueRespInvalidSaml => "colleagueResponse.invalidSAML",
            Self::AuRequestId => "auRequestIdError",
            Self::InvalidResponseLoaValue => "idp.incorrect.loa",
            Self::InvalidResponseLoaValueUnpublished => "idp.incorrect.loa.unpublished",
            Self::InvalidResponseCountryIsocode => "invalid.response.country.isocode",
            Self::InvalidAttributeValue => "invalidAttributeValue",
            Self::AudienceRestriction => "audienceRestrictionError",
            Self::ColleagueReqInvalidSaml => "colleagueRequest.invalidSAML",
            Self::ColleagueReqMissingRequesterId => "colleagueRequest.missing.requesterID",
            Self::ColleagueReqInvalidCountrycode => "colleagueRequest.invalidCountryCode",
            Self::ColleagueReqAttrNull => "colleagueRequest.attrNull",
            Self::ColleagueReqAttrList => "colleagueRequest.attrList",
            Self::ColleagueReqInvalidNameid => "colleagueRequest.invalidNameID",
            Self::ColleagueReqInvalidDestUrl => "colleagueRequest.invalidDestUrl",
            Self::ColleagueReqInvalidLoa => "colleagueRequest.invalidLoA",
            Self::ColleagueReqInconsistentSptype => "inconsistent.sptype",
            Self::ColleagueReqMissingSptype => "missing.sptype",
            Self::InvalidProtocolBinding => "invalidProtocolBinding.error",
            Self::EidasMandatoryAttributes => "missing.mandatory.attribute",
            Self::EidasRepresentativeAttributes => "request.representative.attribute",
            Self::InvalidAttributeList => "invalidAttributeList",
            Self::AttVerificationMandatory => "attVerification.mandatory",
            Self::MessageValidationError => "message.validation.error",
            Self::SamlEngineNoMetadata => "samlengine.metadata.retrieval.error",
            Self::ProtocolVersionUnsupported => "protocol.version.unsupported",
            Self::SamlEngineInvalidCertificate => "samlengine.invalid.certificate",
            Self::SamlEngineUntrustedCertificate => "samlengine.untrusted.certificate",
            Self::InvalidSignatureAlgorithm => "invalidReceivedSignAlgo.error",
            Self::InternalError => "internalError",
        }
    }

    /// Symbolic name, e.g. `COLLEAGUE_RESP_INVALID_SAML`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ServiceRedirectUrl => "SERVICE_REDIRECT_URL",
            Self::SproviderSelectorInvalidAttr => "SPROVIDER_SELECTOR_INVALID_ATTR",
            Self::ServiceProviderInvalidLoa => "SERVICE_PROVIDER_INVALID_LOA",
            Self::SpRequestInvalid => "SP_REQUEST_INVALID",
            Self::SproviderInvalidRequesterId => "SPROVIDER_INVALID_REQUESTERID",
            Self::SproviderSelectorErrorCreateSaml => "SPROVIDER_SELECTOR_ERROR_CREATE_SAML",
            Self::SproviderSelectorInvalidSaml => "SPROVIDER_SELECTOR_INVALID_SAML",
            Self::ColleagueRespInvalidSaml => "COLLEAGUE_RESP_INVALID_SAML",
            Self::AuRequestId => "AU_REQUEST_ID",
            Self::InvalidResponseLoaValue => "INVALID_RESPONSE_LOA_VALUE",
            Self::InvalidResponseLoaValueUnpublished => "INVALID_RESPONSE_LOA_VALUE_UNPUBLISHED",
            Self::InvalidResponseCountryIsocode => "INVALID_RESPONSE_COUNTRY_ISOCODE",
            Self::InvalidAttributeValue => "INVALID_ATTRIBUTE_VALUE",
            Self::AudienceRestriction => "AUDIENCE_RESTRICTION",
            Self::ColleagueReqInvalidSaml => "COLLEAGUE_REQ_INVALID_SAML",
            Self::ColleagueReqMissingRequesterId => "COLLEAGUE_REQ_MISSING_REQUESTER_ID",
            Self::ColleagueReqInvalidCountrycode => "COLLEAGUE_REQ_INVALID_COUNTRYCODE",
            Self::ColleagueReqAttrNull => "COLLEAGUE_REQ_ATTR_NULL",
            Self::ColleagueReqAttrList => "COLLEAGUE_REQ_ATTR_LIST",
            Self::ColleagueReqInvalidNameid => "COLLEAGUE_REQ_INVALID_NAMEID",
            Self::ColleagueReqInvalidDestUrl => "COLLEAGUE_REQ_INVALID_DEST_URL",
            Self::ColleagueReqInvalidLoa => "COLLEAGUE_REQ_INVALID_LOA",
            Self::ColleagueReqInconsistentSptype => "COLLEAGUE_REQ_INCONSISTENT_SPTYPE",
            Self::ColleagueReqMissingSptype => "COLLEAGUE_REQ_MISSING_SPTYPE",
            Self::InvalidProtocolBinding => "INVALID_PROTOCOL_BINDING",
            Self::EidasMandatoryAttributes => "EIDAS_MANDATORY_ATTRIBUTES",
            Self::EidasRepresentativeAttributes => "EIDAS_REPRESENTATIVE_ATTRIBUTES",
            Self::InvalidAttributeList => "INVALID_ATTRIBUTE_LIST",
            Self::AttVerificationMandatory => "ATT_VERIFICATION_MANDATORY",
            Self::MessageValidationError => "MESSAGE_VALIDATION_ERROR",
            Self::SamlEngineNoMetadata => "SAML_ENGINE_NO_METADATA",
            Self::ProtocolVersionUnsupported => "PROTOCOL_VERSION_UNSUPPORTED",
            Self::SamlEngineInvalidCertificate => "SAML_ENGINE_INVALID_CERTIFICATE",
            Self::SamlEngineUntrustedCertificate => "SAML_ENGINE_UNTRUSTED_CERTIFICATE",
            Self::InvalidSignatureAlgorithm => "INVALID_SIGNATURE_ALGORITHM",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Error code key, e.g. `colleagueResponse.invalidSAML.code`.
    #[must_use]
    pub fn code(self) -> String {
        format!("{}{CODE_SUFFIX}", self.key())
    }

    /// Error message key, e.g. `colleagueResponse.invalidSAML.message`.
    #[must_use]
    pub fn message(self) -> String {
        format!("{}{MESSAGE_SUFFIX}", self.key())
    }

    /// Looks an entry up by its error code or bare key.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let key = code.trim();
        let key = key.strip_suffix(CODE_SUFFIX).unwrap_or(key);
        Self::ALL.into_iter().find(|entry| entry.key() == key)
    }

    /// Whether the failure must be treated as security relevant and audited
    /// regardless of log level.
    #[must_use]
    pub const fn is_security_relevant(self) -> bool {
        matches!(
            self,
            Self::AuRequestId
                | Self::SproviderSelectorInvalidSaml
                | Self::InvalidResponseCountryIsocode
                | Self::AudienceRestriction
                | Self::SamlEngineUntrustedCertificate
                | Self::SamlEngineInvalidCertificate
        )
    }
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
