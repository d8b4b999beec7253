//! Request/response correlation.

use async_trait::async_trait;

use crate::error::CacheResult;

/// Store of outbound requests awaiting their response.
///
/// Entries are keyed by the wire-level request id. Implementations must be
/// safe for concurrent use by unrelated authentication attempts.
///
/// Reading an entry does not consume it; entries live until their TTL
/// expires. Replay of a response is stopped by the anti-replay cache, not by
/// this store.
#[async_trait]
pub trait CorrelationStore<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    /// Stores an entry, replacing any previous entry under the same id.
    async fn put(&self, id: &str, value: V) -> CacheResult<()>;

    /// Gets an entry.
    ///
    /// Returns `None` if the id is unknown or the entry has expired.
    async fn get(&self, id: &str) -> CacheResult<Option<V>>;

    /// Removes an entry, returning it if it was present.
    async fn remove(&self, id: &str) -> CacheResult<Option<V>>;
}
