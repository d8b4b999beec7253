//! Anti-replay protection.

use async_trait::async_trait;

use crate::error::CacheResult;

/// Records message ids and detects their reuse.
///
/// Ids are scoped by country so that two member states reusing the same id
/// format do not collide.
#[async_trait]
pub trait AntiReplayCache: Send + Sync {
    /// Records `(id, country_scope)` and reports whether this was its first
    /// sighting.
    ///
    /// Returns `true` the first time a pair is seen and `false` afterwards,
    /// until the record expires. Check and record happen atomically.
    async fn check_and_record(&self, id: &str, country_scope: &str) -> CacheResult<bool>;
}
