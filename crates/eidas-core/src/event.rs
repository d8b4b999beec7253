//! Audit events.
//!
//! Security relevant steps of both half-flows emit an [`Event`]. Where the
//! events end up is decided by the [`AuditSink`] the node is wired with; the
//! default [`TracingAuditSink`] writes them to the `eidas::audit` tracing
//! target.
//!
//! Every event records:
//! - Timestamp (UTC)
//! - Event type and outcome
//! - Request and correlation ids (when available)
//! - Country and issuer (when available)
//! - Remote IP address (when available)
//! - Error catalog name (for failures)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::ErrorKey;

/// Event type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    // Connector
    /// Outbound request generated for a ProxyService.
    ConnectorRequestGenerated,
    /// Service provider request rejected before generation.
    ConnectorRequestRejected,
    /// ProxyService response accepted.
    ConnectorResponseAccepted,
    /// ProxyService response rejected.
    ConnectorResponseRejected,

    // ProxyService
    /// Connector request accepted.
    ProxyRequestAccepted,
    /// Connector request rejected.
    ProxyRequestRejected,
    /// Response generated for a Connector.
    ProxyResponseGenerated,
    /// Identity provider result rejected.
    ProxyResponseRejected,

    // Security
    /// A message id was seen twice.
    ReplayDetected,
    /// A signing certificate failed the trust pipeline.
    CertificateRejected,
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// An audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,

    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Type of event.
    pub event_type: EventType,

    /// Outcome of the event.
    pub outcome: EventOutcome,

    /// Id of the message being processed.
    pub request_id: Option<String>,

    /// Id of the request a response answers.
    pub in_response_to: Option<String>,

    /// Citizen or asserted country.
    pub country: Option<String>,

    /// Issuer of the message being processed.
    pub issuer: Option<String>,

    /// Source IP address.
    pub ip_address: Option<String>,

    /// Error catalog entry (for failure events).
    pub error: Option<ErrorKey>,

    /// Additional details as key-value pairs.
    pub details: Vec<(String, String)>,
}

impl Event {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: EventType) -> EventBuilder {
        EventBuilder::new(event_type)
    }
}

/// Builder for creating events.
pub struct EventBuilder {
    event_type: EventType,
    outcome: EventOutcome,
    request_id: Option<String>,
    in_response_to: Option<String>,
    country: Option<String>,
    issuer: Option<String>,
    ip_address: Option<String>,
    error: Option<ErrorKey>,
    details: Vec<(String, String)>,
}

impl EventBuilder {
    /// Creates a new event builder.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            request_id: None,
            in_response_to: None,
            country: None,
            issuer: None,
            ip_address: None,
            error: None,
            details: Vec::new(),
        }
    }

    /// Sets the outcome to failure with a catalog entry.
    #[must_use]
    pub const fn failure(mut self, error: ErrorKey) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error);
        self
    }

    /// Sets the message id.
    #[must_use]
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Sets the correlated request id.
    #[must_use]
    pub fn in_response_to(mut self, id: impl Into<String>) -> Self {
        self.in_response_to = Some(id.into());
        self
    }

    /// Sets the country.
    #[must_use]
    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Sets the issuer.
    #[must_use]
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Sets the IP address when known.
    #[must_use]
    pub fn ip_address(mut self, ip: Option<&str>) -> Self {
        self.ip_address = ip.map(str::to_string);
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            request_id: self.request_id,
            in_response_to: self.in_response_to,
            country: self.country,
            issuer: self.issuer,
            ip_address: self.ip_address,
            error: self.error,
            details: self.details,
        }
    }
}

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    /// Records one event. Must not block for long; slow sinks should buffer.
    fn record(&self, event: &Event);
}

/// Audit sink that writes events to the `eidas::audit` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &Event) {
        match event.outcome {
            EventOutcome::Success => tracing::info!(
                target: "eidas::audit",
                event_id = %event.id,
                event_type = ?event.event_type,
                request_id = event.request_id.as_deref(),
                in_response_to = event.in_response_to.as_deref(),
                country = event.country.as_deref(),
                issuer = event.issuer.as_deref(),
                ip = event.ip_address.as_deref(),
                "audit"
            ),
            EventOutcome::Failure => tracing::warn!(
                target: "eidas::audit",
                event_id = %event.id,
                event_type = ?event.event_type,
                error = event.error.map(ErrorKey::name),
                request_id = event.request_id.as_deref(),
                in_response_to = event.in_response_to.as_deref(),
                country = event.country.as_deref(),
                issuer = event.issuer.as_deref(),
                ip = event.ip_address.as_deref(),
                "audit"
            ),
        }
    }
}
