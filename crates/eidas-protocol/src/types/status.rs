//! Response status.

use super::{status_codes, sub_status_codes};

/// Status of an authentication response.
///
/// `failure` is carried separately from the code: a ProxyService may answer
/// with a non-success code that still counts as a business failure rather
/// than a protocol error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// The status code.
    pub status_code: StatusCode,

    /// Optional status message. For failures sent by eIDAS nodes this is an
    /// error catalog code.
    pub status_message: Option<String>,

    /// Whether the response reports a failed authentication.
    pub failure: bool,
}

impl Status {
    /// Creates a success status.
    #[must_use]
    pub fn success() -> Self {
        Self {
            status_code: StatusCode::success(),
            status_message: None,
            failure: false,
        }
    }

    /// Creates a requester failure status.
    #[must_use]
    pub fn requester_failure(message: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::requester(),
            status_message: Some(message.into()),
            failure: true,
        }
    }

    /// Creates a responder failure status.
    #[must_use]
    pub fn responder_failure(message: Option<String>) -> Self {
        Self {
            status_code: StatusCode::responder(),
            status_message: message,
            failure: true,
        }
    }

    /// Responder failure with the `InvalidNameIDPolicy` sub-status and no
    /// message.
    #[must_use]
    pub fn invalid_name_id_policy() -> Self {
        Self {
            status_code: StatusCode::responder()
                .with_sub_status(sub_status_codes::INVALID_NAMEID_POLICY),
            status_message: None,
            failure: true,
        }
    }

    /// Returns true if this status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.failure && self.status_code.value == status_codes::SUCCESS
    }

    /// Sets the status message.
    #[must_use]
    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.status_message = message;
        self
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::success()
    }
}

/// Status code with an optional nested sub-code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCode {
    /// The status code URI value.
    pub value: String,

    /// Optional nested status code providing more detail.
    pub status_code: Option<Box<StatusCode>>,
}

impl StatusCode {
    /// Creates a new status code with the given value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            status_code: None,
        }
    }

    /// Creates a success status code.
    #[must_use]
    pub fn success() -> Self {
        Self::new(status_codes::SUCCESS)
    }

    /// Creates a requester error status code.
    #[must_use]
    pub fn requester() -> Self {
        Self::new(status_codes::REQUESTER)
    }

    /// Creates a responder error status code.
    #[must_use]
    pub fn responder() -> Self {
        Self::new(status_codes::RESPONDER)
    }

    /// Adds a sub-status code.
    #[must_use]
    pub fn with_sub_status(mut self, sub_status: impl Into<String>) -> Self {
        self.status_code = Some(Box::new(Self::new(sub_status)));
        self
    }

    /// Returns the sub-status code value, if any.
    #[must_use]
    pub fn sub_status_value(&self) -> Option<&str> {
        self.status_code.as_ref().map(|s| s.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_status() {
        let status = Status::success();
        assert!(status.is_success());
        assert!(status.status_message.is_none());
    }

    #[test]
    fn invalid_name_id_policy_status() {
        let status = Status::invalid_name_id_policy();
        assert!(status.failure);
        assert!(!status.is_success());
        assert_eq!(status.status_code.value, status_codes::RESPONDER);
        assert_eq!(
            status.status_code.sub_status_value(),
            Some(sub_status_codes::INVALID_NAMEID_POLICY)
        );
        assert!(status.status_message.is_none());
    }

    #[test]
    fn requester_failure_carries_message() {
        let status = Status::requester_failure("colleagueRequest.attrNull.code");
        assert!(status.failure);
        assert_eq!(status.status_code.value, status_codes::REQUESTER);
        assert_eq!(
            status.status_message.as_deref(),
            Some("colleagueRequest.attrNull.code")
        );
    }
}
