//! Redis store implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use pagecache_backend::{Backend, BackendError, BackendResult, DeleteStatus};
use pagecache_core::{BackendLabel, CacheKey, Raw};
use redis::{Client, aio::ConnectionManager};
use tokio::sync::OnceCell;
use tracing::trace;

use crate::error::Error;

/// Redis store based on the redis-rs crate.
///
/// It uses a [`ConnectionManager`], created on first use and shared by every
/// clone, which reconnects transparently after network failures.
///
/// [`ConnectionManager`]: redis::aio::ConnectionManager
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    connection: Arc<OnceCell<ConnectionManager>>,
    name: BackendLabel,
}

impl RedisStore {
    /// Creates a store for a Redis server on localhost.
    pub fn new() -> Result<Self, BackendError> {
        Ok(Self::builder().build()?)
    }

    /// Creates a builder with default settings.
    #[must_use]
    pub fn builder() -> RedisStoreBuilder {
        RedisStoreBuilder::default()
    }

    /// Lazily connects through a [`ConnectionManager`].
    pub async fn connection(&self) -> Result<&ConnectionManager, BackendError> {
        trace!("Get connection manager");
        let manager = self
            .connection
            .get_or_try_init(|| {
                trace!("Initialize new redis connection manager");
                self.client.get_connection_manager()
            })
            .await
            .map_err(Error::from)?;
        Ok(manager)
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("name", &self.name)
            .field("connected", &self.connection.initialized())
            .finish_non_exhaustive()
    }
}

/// Builder for [`RedisStore`].
#[derive(Debug)]
pub struct RedisStoreBuilder {
    connection_info: String,
    name: BackendLabel,
}

impl Default for RedisStoreBuilder {
    fn default() -> Self {
        Self {
            connection_info: "redis://127.0.0.1/".to_owned(),
            name: BackendLabel::new_static("redis"),
        }
    }
}

impl RedisStoreBuilder {
    /// Connection URL (host, port, database, credentials).
    pub fn server(mut self, connection_info: impl Into<String>) -> Self {
        self.connection_info = connection_info.into();
        self
    }

    /// Name of the store in logs and metrics. Defaults to `"redis"`.
    pub fn name(mut self, name: impl Into<BackendLabel>) -> Self {
        self.name = name.into();
        self
    }

    /// Creates the store. No connection is made until the first operation.
    pub fn build(self) -> Result<RedisStore, Error> {
        Ok(RedisStore {
            client: Client::open(self.connection_info)?,
            connection: Arc::new(OnceCell::new()),
            name: self.name,
        })
    }
}

/// `PX` argument for a ttl. Redis rejects `PX 0`, so sub-millisecond ttls
/// round up.
fn expire_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl Backend for RedisStore {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Raw>> {
        let mut con = self.connection().await?.clone();
        let data: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key.as_str())
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(data.map(Bytes::from))
    }

    async fn write(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> BackendResult<()> {
        let mut con = self.connection().await?.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key.as_str()).arg(value.as_ref());
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(expire_millis(ttl));
        }
        cmd.query_async::<()>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        let mut con = self.connection().await?.clone();
        let deleted: u32 = redis::cmd("DEL")
            .arg(key.as_str())
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;

        if deleted > 0 {
            Ok(DeleteStatus::Deleted(deleted))
        } else {
            Ok(DeleteStatus::Missing)
        }
    }

    fn name(&self) -> BackendLabel {
        self.name.clone()
    }
}
