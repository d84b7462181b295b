//! Builder for configuring [`MokaStore`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;
use pagecache_core::{BackendLabel, CacheKey};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{trace, warn};

use crate::backend::{Entry, MokaStore};
use crate::metrics;

/// Entry limit used when neither [`max_capacity`](MokaStoreBuilder::max_capacity)
/// nor [`max_bytes`](MokaStoreBuilder::max_bytes) is set.
pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Approximate per-entry bookkeeping cost counted by the byte weigher.
const ENTRY_OVERHEAD: usize = 64;

/// Per-entry expiration driven by the ttl given at write time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Expiration;

impl Expiry<CacheKey, Entry> for Expiration {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &Entry,
        created_at: Instant,
    ) -> Option<Duration> {
        value.time_to_live(created_at)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &Entry,
        updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // An overwrite always takes the new entry's ttl, never the old one.
        value.time_to_live(updated_at)
    }
}

#[derive(Debug, Clone, Copy)]
enum Capacity {
    Entries(u64),
    Bytes(u64),
}

/// Builder for [`MokaStore`].
///
/// Use [`MokaStore::builder`] to create one. Every setting is optional.
///
/// ```
/// use pagecache_moka::{EvictionPolicy, MokaStore};
///
/// let store = MokaStore::builder()
///     .max_bytes(64 * 1024 * 1024)
///     .eviction_policy(EvictionPolicy::lru())
///     .name("pages")
///     .build();
/// ```
#[derive(Debug)]
pub struct MokaStoreBuilder {
    capacity: Capacity,
    eviction_policy: Option<EvictionPolicy>,
    sweep_interval: Option<Duration>,
    label: BackendLabel,
}

impl MokaStoreBuilder {
    /// Creates a builder holding at most [`DEFAULT_MAX_CAPACITY`] entries.
    pub fn new() -> Self {
        Self {
            capacity: Capacity::Entries(DEFAULT_MAX_CAPACITY),
            eviction_policy: None,
            sweep_interval: None,
            label: BackendLabel::new_static("moka"),
        }
    }

    /// Maximum number of entries. Least recently used entries are evicted
    /// beyond it.
    pub fn max_capacity(mut self, entries: u64) -> Self {
        self.capacity = Capacity::Entries(entries);
        self
    }

    /// Approximate memory budget in bytes, counting key, encoded response and
    /// a fixed per-entry overhead. Replaces any entry limit.
    pub fn max_bytes(mut self, bytes: u64) -> Self {
        self.capacity = Capacity::Bytes(bytes);
        self
    }

    /// Eviction policy.
    ///
    /// Defaults to TinyLFU for entry limits and to LRU for byte budgets, where
    /// TinyLFU admission could reject a large entry that eviction would fit.
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    /// Period of the background sweep evicting expired entries nobody reads.
    ///
    /// The sweep runs on the tokio runtime current at [`build`](Self::build)
    /// time and stops when the last clone of the store is dropped. Without a
    /// sweep, expired entries are reclaimed by Moka's own housekeeping, which
    /// only runs alongside cache operations.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    /// Name of the store in logs and metrics. Defaults to `"moka"`.
    pub fn name(mut self, name: impl Into<BackendLabel>) -> Self {
        self.label = name.into();
        self
    }

    /// Builds the store.
    pub fn build(self) -> MokaStore {
        let cache: Cache<CacheKey, Entry> = match self.capacity {
            Capacity::Entries(entries) => CacheBuilder::new(entries)
                .eviction_policy(self.eviction_policy.unwrap_or_else(EvictionPolicy::tiny_lfu))
                .expire_after(Expiration)
                .build(),
            Capacity::Bytes(bytes) => CacheBuilder::new(bytes)
                .weigher(byte_weigher)
                .eviction_policy(self.eviction_policy.unwrap_or_else(EvictionPolicy::lru))
                .expire_after(Expiration)
                .build(),
        };

        let sweeper = self
            .sweep_interval
            .and_then(|interval| spawn_sweeper(cache.clone(), interval, self.label.clone()));

        MokaStore::from_parts(cache, self.label, sweeper)
    }
}

impl Default for MokaStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn byte_weigher(key: &CacheKey, value: &Entry) -> u32 {
    let size = key.len() + value.data.len() + ENTRY_OVERHEAD;
    u32::try_from(size).unwrap_or(u32::MAX)
}

/// Background task evicting expired entries. Aborted on drop.
#[derive(Debug)]
pub(crate) struct Sweeper(JoinHandle<()>);

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn spawn_sweeper(
    cache: Cache<CacheKey, Entry>,
    interval: Duration,
    label: BackendLabel,
) -> Option<Arc<Sweeper>> {
    if interval.is_zero() {
        warn!(store = %label, "zero sweep interval, sweeping disabled");
        return None;
    }
    let Ok(handle) = Handle::try_current() else {
        warn!(store = %label, "no tokio runtime, sweeping disabled");
        return None;
    };

    let task = handle.spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            cache.run_pending_tasks().await;
            trace!(store = %label, entries = cache.entry_count(), "swept expired entries");
            metrics::record_capacity(label.as_str(), cache.entry_count(), cache.weighted_size());
        }
    });
    Some(Arc::new(Sweeper(task)))
}
