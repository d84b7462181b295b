use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use pagecache_core::{BackendLabel, CacheKey, Raw};

use crate::{BackendError, DeleteStatus};

/// Result alias for [`Backend`] operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Byte-level storage adapter.
///
/// Implementations persist opaque values under a key. A `ttl` of `None`
/// means the entry never expires. Reads of an expired entry must return
/// `Ok(None)`, whether the adapter evicts lazily or eagerly.
#[async_trait]
pub trait Backend: Sync + Send {
    /// Reads the raw value stored under `key`.
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Raw>>;

    /// Writes `value` under `key`, replacing any previous entry.
    async fn write(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> BackendResult<()>;

    /// Removes the entry stored under `key`.
    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus>;

    /// Name of this backend as it appears in logs and metrics.
    fn name(&self) -> BackendLabel {
        BackendLabel::new_static("backend")
    }
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for &T {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Raw>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> BackendResult<()> {
        (**self).write(key, value, ttl).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn name(&self) -> BackendLabel {
        (**self).name()
    }
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for Box<T> {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Raw>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> BackendResult<()> {
        (**self).write(key, value, ttl).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn name(&self) -> BackendLabel {
        (**self).name()
    }
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for Arc<T> {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Raw>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> BackendResult<()> {
        (**self).write(key, value, ttl).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn name(&self) -> BackendLabel {
        (**self).name()
    }
}
