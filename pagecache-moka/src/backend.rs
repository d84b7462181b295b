//! Moka store implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use pagecache_backend::{Backend, BackendResult, DeleteStatus};
use pagecache_core::{BackendLabel, CacheKey, Raw};

use crate::builder::{MokaStoreBuilder, Sweeper};

/// Encoded response with its absolute expiry.
#[derive(Clone, Debug)]
pub(crate) struct Entry {
    pub(crate) data: Raw,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(data: Raw, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        Self { data, expires_at }
    }

    /// Remaining lifetime measured from `now`. `None` never expires.
    pub(crate) fn time_to_live(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|expires_at| expires_at.saturating_duration_since(now))
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// In-memory store powered by Moka.
///
/// Clones share the same entries. Data lives in the process only and is lost
/// on restart; use a remote store to share responses between instances.
///
/// ```
/// use std::time::Duration;
/// use pagecache_backend::{Backend, DeleteStatus};
/// use pagecache_core::CacheKey;
/// use pagecache_moka::MokaStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MokaStore::builder().build();
/// let key = CacheKey::new("page:/");
///
/// store.write(&key, "bytes".into(), Some(Duration::from_secs(60))).await.unwrap();
/// assert_eq!(store.read(&key).await.unwrap().as_deref(), Some(&b"bytes"[..]));
/// assert_eq!(store.remove(&key).await.unwrap(), DeleteStatus::Deleted(1));
/// # }
/// ```
#[derive(Clone)]
pub struct MokaStore {
    cache: Cache<CacheKey, Entry>,
    label: BackendLabel,
    sweeper: Option<Arc<Sweeper>>,
}

impl MokaStore {
    /// Creates a builder with default settings.
    pub fn builder() -> MokaStoreBuilder {
        MokaStoreBuilder::new()
    }

    pub(crate) fn from_parts(
        cache: Cache<CacheKey, Entry>,
        label: BackendLabel,
        sweeper: Option<Arc<Sweeper>>,
    ) -> Self {
        Self {
            cache,
            label,
            sweeper,
        }
    }

    /// Approximate number of entries, including expired ones not yet swept.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Applies pending evictions now instead of waiting for housekeeping.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }

    /// Whether a background sweep is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.is_some()
    }
}

impl std::fmt::Debug for MokaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("label", &self.label)
            .field("entries", &self.cache.entry_count())
            .field("sweeping", &self.is_sweeping())
            .finish()
    }
}

#[async_trait]
impl Backend for MokaStore {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Raw>> {
        let Some(entry) = self.cache.get(key).await else {
            return Ok(None);
        };
        if entry.is_expired(Instant::now()) {
            self.cache.invalidate(key).await;
            return Ok(None);
        }
        Ok(Some(entry.data))
    }

    async fn write(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> BackendResult<()> {
        self.cache.insert(key.clone(), Entry::new(value, ttl)).await;
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        match self.cache.remove(key).await {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    fn name(&self) -> BackendLabel {
        self.label.clone()
    }
}
