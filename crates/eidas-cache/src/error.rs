//! Cache errors.

use thiserror::Error;

/// Failure of a cache operation.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The configured time-to-live cannot be applied to a timestamp.
    #[error("cache TTL out of range: {0}")]
    TtlOutOfRange(String),

    /// A backing store refused or lost the operation.
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_cause() {
        assert_eq!(
            CacheError::Backend("connection refused".to_string()).to_string(),
            "cache backend error: connection refused"
        );
        assert!(CacheError::TtlOutOfRange("overflow".to_string())
            .to_string()
            .contains("TTL"));
    }
}
