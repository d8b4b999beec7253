//! Process-local cache implementations.
//!
//! Expired entries are dropped lazily when touched and in bulk by
//! [`InMemoryCorrelationStore::purge_expired`] /
//! [`InMemoryAntiReplayCache::purge_expired`], which the hosting process may
//! call periodically.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::correlation::CorrelationStore;
use crate::error::{CacheError, CacheResult};
use crate::replay::AntiReplayCache;

fn expiry_after(ttl: Duration) -> CacheResult<DateTime<Utc>> {
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| CacheError::TtlOutOfRange(e.to_string()))?;
    Ok(Utc::now() + ttl)
}

#[derive(Clone)]
struct Expiring<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Correlation store held in process memory.
#[derive(Clone)]
pub struct InMemoryCorrelationStore<V> {
    entries: Arc<DashMap<String, Expiring<V>>>,
    ttl: Duration,
}

impl<V> InMemoryCorrelationStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty store whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Number of entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Removes `id` only if the entry stored now is expired at `now`, so a
    /// value put after the expiry was observed stays.
    fn evict_expired(&self, id: &str, now: DateTime<Utc>) -> bool {
        let evicted = self
            .entries
            .remove_if(id, |_, entry| entry.expires_at <= now)
            .is_some();
        if evicted {
            tracing::debug!(id, "correlation entry expired");
        }
        evicted
    }
}

#[async_trait]
impl<V> CorrelationStore<V> for InMemoryCorrelationStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn put(&self, id: &str, value: V) -> CacheResult<()> {
        let expires_at = expiry_after(self.ttl)?;
        self.entries
            .insert(id.to_string(), Expiring { value, expires_at });
        tracing::trace!(id, "correlation entry stored");
        Ok(())
    }

    async fn get(&self, id: &str) -> CacheResult<Option<V>> {
        let now = Utc::now();
        let found = self
            .entries
            .get(id)
            .map(|entry| (entry.expires_at > now, entry.value.clone()));

        match found {
            Some((true, value)) => Ok(Some(value)),
            Some((false, _)) => {
                self.evict_expired(id, now);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, id: &str) -> CacheResult<Option<V>> {
        let now = Utc::now();
        Ok(self
            .entries
            .remove(id)
            .filter(|(_, entry)| entry.expires_at > now)
            .map(|(_, entry)| entry.value))
    }
}

/// Anti-replay cache held in process memory.
#[derive(Clone)]
pub struct InMemoryAntiReplayCache {
    seen: Arc<DashMap<(String, String), DateTime<Utc>>>,
    ttl: Duration,
}

impl InMemoryAntiReplayCache {
    /// Creates an empty cache whose records live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            seen: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Drops every expired record and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.seen.len();
        self.seen.retain(|_, expires_at| *expires_at > now);
        before.saturating_sub(self.seen.len())
    }
}

#[async_trait]
impl AntiReplayCache for InMemoryAntiReplayCache {
    async fn check_and_record(&self, id: &str, country_scope: &str) -> CacheResult<bool> {
        let now = Utc::now();
        let expires_at = expiry_after(self.ttl)?;

        // The entry guard holds the shard lock, so check and record are atomic.
        match self.seen.entry((id.to_string(), country_scope.to_string())) {
            Entry::Occupied(mut occupied) => {
                if *occupied.get() > now {
                    tracing::warn!(id, country = country_scope, "replayed message id");
                    Ok(false)
                } else {
                    occupied.insert(expires_at);
                    Ok(true)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(expires_at);
                Ok(true)
            }
        }
    }
}
