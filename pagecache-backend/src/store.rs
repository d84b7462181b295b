use std::time::Duration;

use async_trait::async_trait;
use pagecache_core::{BackendLabel, CacheKey, CachedResponse};
use tracing::trace;

use crate::{
    Backend, DeleteStatus, StoreError,
    format::Encoding,
    metrics::{self, Timer},
};

/// Result alias for [`Store`] operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Typed response storage.
///
/// This trait provides the `get`, `set` and `delete` operations the cache
/// engine uses. It is implemented for every [`Backend`], so adapters never
/// implement it directly.
#[async_trait]
pub trait Store: Send + Sync {
    /// Encodes `value` and persists it under `key`, overwriting any previous
    /// entry. A zero `ttl` stores the entry without expiry.
    async fn set(
        &self,
        key: &CacheKey,
        value: &CachedResponse,
        ttl: Duration,
        encoding: &dyn Encoding,
    ) -> StoreResult<()>;

    /// Decodes the entry stored under `key` into `out`.
    ///
    /// Returns [`StoreError::CacheMiss`] when the key is absent or expired.
    /// `out` is left untouched on any error.
    async fn get(
        &self,
        key: &CacheKey,
        out: &mut CachedResponse,
        encoding: &dyn Encoding,
    ) -> StoreResult<()>;

    /// Removes the entry stored under `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &CacheKey) -> StoreResult<DeleteStatus>;

    /// Name of the underlying backend.
    fn label(&self) -> BackendLabel;
}

#[async_trait]
impl<B> Store for B
where
    B: Backend + ?Sized,
{
    async fn set(
        &self,
        key: &CacheKey,
        value: &CachedResponse,
        ttl: Duration,
        encoding: &dyn Encoding,
    ) -> StoreResult<()> {
        let label = self.name();
        let encode_timer = Timer::new();
        let raw = encoding.encode(value)?;
        metrics::record_encode(&label, encode_timer.elapsed());

        let bytes = raw.len();
        let ttl = (!ttl.is_zero()).then_some(ttl);
        trace!(%key, backend = %label, bytes, ?ttl, encoding = encoding.name(), "store set");

        let timer = Timer::new();
        let result = self.write(key, raw, ttl).await;
        metrics::record_write(&label, bytes, result.is_ok(), timer.elapsed());
        Ok(result?)
    }

    async fn get(
        &self,
        key: &CacheKey,
        out: &mut CachedResponse,
        encoding: &dyn Encoding,
    ) -> StoreResult<()> {
        let label = self.name();
        let timer = Timer::new();
        let result = self.read(key).await;
        let elapsed = timer.elapsed();

        let raw = match result {
            Ok(Some(raw)) => {
                metrics::record_read(&label, raw.len(), true, elapsed);
                raw
            }
            Ok(None) => {
                metrics::record_read(&label, 0, true, elapsed);
                trace!(%key, backend = %label, "store miss");
                return Err(StoreError::CacheMiss);
            }
            Err(err) => {
                metrics::record_read(&label, 0, false, elapsed);
                return Err(err.into());
            }
        };

        let decode_timer = Timer::new();
        encoding.decode(&raw, out)?;
        metrics::record_decode(&label, decode_timer.elapsed());
        trace!(%key, backend = %label, bytes = raw.len(), "store hit");
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> StoreResult<DeleteStatus> {
        let label = self.name();
        let result = self.remove(key).await;
        metrics::record_delete(&label, result.is_ok());
        Ok(result?)
    }

    fn label(&self) -> BackendLabel {
        self.name()
    }
}
