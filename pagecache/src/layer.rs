use std::sync::Arc;
use std::time::Duration;

use pagecache_backend::Store;
use tower::Layer;

use crate::config::CacheConfig;
use crate::key::RequestPath;
use crate::service::CacheService;

/// Tower layer caching whole responses of the wrapped service.
#[derive(Clone, Debug)]
pub struct Cache {
    config: Arc<CacheConfig>,
}

impl Cache {
    /// Creates the layer from a finished configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Caches responses keyed by the full request target.
    pub fn with_request_uri<S>(store: S, ttl: Duration) -> Self
    where
        S: Store + 'static,
    {
        Self::new(CacheConfig::new(store, ttl))
    }

    /// Caches responses keyed by the request path, ignoring the query.
    pub fn with_request_path<S>(store: S, ttl: Duration) -> Self
    where
        S: Store + 'static,
    {
        Self::new(
            CacheConfig::builder(store)
                .key_generator(RequestPath::default())
                .into_config(ttl),
        )
    }

    /// The configuration shared by every service this layer creates.
    pub fn config(&self) -> &Arc<CacheConfig> {
        &self.config
    }
}

impl From<CacheConfig> for Cache {
    fn from(config: CacheConfig) -> Self {
        Self::new(config)
    }
}

impl<S> Layer<S> for Cache {
    type Service = CacheService<S>;

    fn layer(&self, upstream: S) -> Self::Service {
        CacheService::new(upstream, Arc::clone(&self.config))
    }
}
