//! Authentication response.

use chrono::{DateTime, Utc};

use super::Status;
use crate::attribute::AttributeCatalog;

/// eIDAS authentication response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationResponse {
    /// Unique identifier of this response.
    pub id: String,

    /// Id of the request this response answers.
    pub in_response_to: String,

    /// Entity id of the responding node.
    pub issuer: String,

    /// Outcome.
    pub status: Status,

    /// NameID value of the authenticated subject.
    pub subject: Option<String>,

    /// NameID format URI of the subject.
    pub subject_name_id_format: Option<String>,

    /// Country that authenticated the subject.
    pub country: Option<String>,

    /// Asserted level of assurance URI.
    pub level_of_assurance: Option<String>,

    /// Asserted attributes with values.
    pub attributes: AttributeCatalog,

    /// Entity the assertion is restricted to.
    pub audience_restriction: Option<String>,

    /// Address of the authenticated user agent.
    pub ip_address: Option<String>,

    /// When the response was issued.
    pub issue_instant: DateTime<Utc>,
}

impl AuthenticationResponse {
    /// Creates a response with the given status and nothing asserted.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        in_response_to: impl Into<String>,
        issuer: impl Into<String>,
        status: Status,
    ) -> Self {
        Self {
            id: id.into(),
            in_response_to: in_response_to.into(),
            issuer: issuer.into(),
            status,
            subject: None,
            subject_name_id_format: None,
            country: None,
            level_of_assurance: None,
            attributes: AttributeCatalog::empty(),
            audience_restriction: None,
            ip_address: None,
            issue_instant: Utc::now(),
        }
    }

    /// Whether this response reports a failed authentication.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status.failure
    }

    /// Replaces the in-response-to id.
    #[must_use]
    pub fn with_in_response_to(mut self, id: impl Into<String>) -> Self {
        self.in_response_to = id.into();
        self
    }

    /// Replaces the issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Replaces the status.
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Sets the subject and its NameID format.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>, format: Option<String>) -> Self {
        self.subject = Some(subject.into());
        self.subject_name_id_format = format;
        self
    }

    /// Sets the country.
    #[must_use]
    pub fn with_country(mut self, country: Option<String>) -> Self {
        self.country = country;
        self
    }

    /// Sets the level of assurance.
    #[must_use]
    pub fn with_level_of_assurance(mut self, loa: Option<String>) -> Self {
        self.level_of_assurance = loa;
        self
    }

    /// Replaces the attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: AttributeCatalog) -> Self {
        self.attributes = attributes;
        self
    }

    /// Sets the audience restriction.
    #[must_use]
    pub fn with_audience_restriction(mut self, audience: Option<String>) -> Self {
        self.audience_restriction = audience;
        self
    }

    /// Sets the user agent address.
    #[must_use]
    pub fn with_ip_address(mut self, ip_address: Option<String>) -> Self {
        self.ip_address = ip_address;
        self
    }

    /// Checks the structural invariants. A successful response carries a
    /// subject, its format and at least one attribute.
    ///
    /// ## Errors
    ///
    /// Returns a description of the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("response id is blank".to_string());
        }
        if self.is_failure() {
            return Ok(());
        }
        if self.subject.as_deref().map_or(true, |s| s.trim().is_empty()) {
            return Err("successful response has no subject".to_string());
        }
        if self.subject_name_id_format.is_none() {
            return Err("successful response has no subject NameID format".to_string());
        }
        if self.attributes.is_empty() {
            return Err("successful response has no attributes".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{eidas_registry, AttributeCatalog};
    use crate::types::NameIdFormat;

    #[test]
    fn failure_responses_need_no_subject() {
        let response = AuthenticationResponse::new(
            "_r1",
            "_q1",
            "https://ps.example.es/metadata",
            Status::responder_failure(None),
        );
        assert!(response.is_failure());
        assert!(response.validate().is_ok());
    }

    #[test]
    fn successful_responses_need_subject_and_attributes() {
        let response =
            AuthenticationResponse::new("_r1", "_q1", "https://ps.example.es", Status::success());
        assert!(response.validate().is_err());

        let family = eidas_registry().by_friendly_name("FamilyName").unwrap().clone();
        let attributes = AttributeCatalog::builder()
            .put_str(family, &["Garcia"])
            .build()
            .unwrap();
        let response = response
            .with_subject("ES/BE/12345", Some(NameIdFormat::Persistent.uri().to_string()))
            .with_attributes(attributes);
        assert!(response.validate().is_ok());
    }
}
