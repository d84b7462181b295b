//! Cache configuration.
//!
//! A [`CacheConfig`] bundles everything one cached route needs: the store,
//! the ttl policy, key generation, the single-flight coordinator, the
//! response pool, the failure logger and the encoding. It is built once and
//! shared read-only by every request to the route.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use pagecache::{CacheConfig, key::RequestPath, logger::TracingLogger, policy::random_jitter};
//! use pagecache_moka::MokaStore;
//!
//! let config = CacheConfig::builder(MokaStore::builder().build())
//!     .ttl(Duration::from_secs(60))
//!     .jitter(random_jitter(Duration::from_secs(5)))
//!     .key_generator(RequestPath::default())
//!     .logger(TracingLogger)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.ttl(), Duration::from_secs(60));
//! ```

use std::sync::Arc;
use std::time::Duration;

use pagecache_backend::{Encoding, JsonEncoding, Store};
use pagecache_core::{CachedResponse, Pool, ResponsePool};
use thiserror::Error;

use crate::concurrency::SingleFlight;
use crate::key::{KeyGenerator, RequestPath, RequestUri};
use crate::logger::{DiscardLogger, Logger};
use crate::policy::{EncodingPolicy, KeyPolicy, PolicyConfig, random_jitter};

/// A response shared between a leader and its followers.
pub type SharedResponse = Arc<CachedResponse>;

/// Single-flight coordinator used by the cache engine.
pub type Coordinator = SingleFlight<SharedResponse>;

/// Function producing the extra ttl added to each write.
pub type Jitter = Arc<dyn Fn() -> Duration + Send + Sync>;

/// Errors raised while building a [`CacheConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The builder was finished without a ttl.
    #[error("cache ttl is required")]
    MissingTtl,
    /// The policy asks for an encoding this build does not include.
    #[error("encoding not available: {0}")]
    EncodingNotAvailable(String),
}

/// Configuration of one cached route.
pub struct CacheConfig {
    store: Arc<dyn Store>,
    ttl: Duration,
    jitter: Jitter,
    key_generator: Arc<dyn KeyGenerator>,
    coordinator: Coordinator,
    pool: Arc<dyn Pool>,
    logger: Arc<dyn Logger>,
    encoding: Arc<dyn Encoding>,
    status_header: bool,
}

impl CacheConfig {
    /// Starts a builder around `store`.
    pub fn builder<S>(store: S) -> CacheConfigBuilder
    where
        S: Store + 'static,
    {
        CacheConfigBuilder::new(Arc::new(store))
    }

    /// Configuration with the given ttl and every collaborator at its default.
    pub fn new<S>(store: S, ttl: Duration) -> Self
    where
        S: Store + 'static,
    {
        Self::builder(store).into_config(ttl)
    }

    /// Builds a configuration from a declarative policy.
    pub fn from_policy<S>(store: S, policy: &PolicyConfig) -> Result<Self, ConfigError>
    where
        S: Store + 'static,
    {
        Self::builder(store).policy(policy)?.build()
    }

    /// The store responses are kept in.
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Base time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Time-to-live of the next write: base ttl plus jitter.
    pub fn expiry(&self) -> Duration {
        self.ttl.saturating_add((self.jitter)())
    }

    /// Key generator of this route.
    pub fn key_generator(&self) -> &dyn KeyGenerator {
        self.key_generator.as_ref()
    }

    /// Single-flight coordinator of this route.
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Response container pool.
    pub fn pool(&self) -> &dyn Pool {
        self.pool.as_ref()
    }

    /// Failure sink.
    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    /// Stored representation.
    pub fn encoding(&self) -> &dyn Encoding {
        self.encoding.as_ref()
    }

    /// Whether responses carry the `x-cache-status` header.
    pub fn status_header(&self) -> bool {
        self.status_header
    }

    /// Returns a shared response to the pool if nobody else holds it.
    pub(crate) fn recycle(&self, response: SharedResponse) {
        if let Ok(response) = Arc::try_unwrap(response) {
            self.pool.put(response);
        }
    }
}

impl std::fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheConfig")
            .field("store", &self.store.label())
            .field("ttl", &self.ttl)
            .field("encoding", &self.encoding.name())
            .field("coordinator", &self.coordinator)
            .field("status_header", &self.status_header)
            .finish_non_exhaustive()
    }
}

/// Builder for [`CacheConfig`].
///
/// Use [`CacheConfig::builder()`] to create a new builder. Only the ttl is
/// required; everything else falls back to a private default.
pub struct CacheConfigBuilder {
    store: Arc<dyn Store>,
    ttl: Option<Duration>,
    jitter: Option<Jitter>,
    key_generator: Option<Arc<dyn KeyGenerator>>,
    coordinator: Option<Coordinator>,
    pool: Option<Arc<dyn Pool>>,
    logger: Option<Arc<dyn Logger>>,
    encoding: Option<Arc<dyn Encoding>>,
    status_header: bool,
}

impl CacheConfigBuilder {
    fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            ttl: None,
            jitter: None,
            key_generator: None,
            coordinator: None,
            pool: None,
            logger: None,
            encoding: None,
            status_header: false,
        }
    }

    /// Base time-to-live. Zero stores responses without expiry.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Extra ttl drawn for each write. Defaults to none.
    pub fn jitter<F>(mut self, jitter: F) -> Self
    where
        F: Fn() -> Duration + Send + Sync + 'static,
    {
        self.jitter = Some(Arc::new(jitter));
        self
    }

    /// Key generator. Defaults to [`RequestUri`] with the default prefix.
    pub fn key_generator<K>(mut self, generator: K) -> Self
    where
        K: KeyGenerator + 'static,
    {
        self.key_generator = Some(Arc::new(generator));
        self
    }

    /// Single-flight coordinator. Pass a clone of one coordinator to several
    /// routes to deduplicate across them. Defaults to a private one.
    pub fn coordinator(mut self, coordinator: Coordinator) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    /// Response container pool. Defaults to a private [`ResponsePool`].
    pub fn pool<P>(mut self, pool: P) -> Self
    where
        P: Pool + 'static,
    {
        self.pool = Some(Arc::new(pool));
        self
    }

    /// Shares an existing pool between routes.
    pub fn shared_pool(mut self, pool: Arc<dyn Pool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Failure sink. Defaults to [`DiscardLogger`].
    pub fn logger<L>(mut self, logger: L) -> Self
    where
        L: Logger + 'static,
    {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Stored representation. Defaults to [`JsonEncoding`].
    pub fn encoding<E>(mut self, encoding: E) -> Self
    where
        E: Encoding + 'static,
    {
        self.encoding = Some(Arc::new(encoding));
        self
    }

    /// Adds the `x-cache-status` header to responses. Off by default, which
    /// keeps replayed responses identical to the original.
    pub fn status_header(mut self, enabled: bool) -> Self {
        self.status_header = enabled;
        self
    }

    /// Applies a declarative policy: ttl, jitter, key generation with the
    /// policy prefix, encoding, pool size and status header. Settings not
    /// covered by the policy, such as the logger, stay untouched.
    pub fn policy(mut self, policy: &PolicyConfig) -> Result<Self, ConfigError> {
        self = self
            .ttl(policy.ttl)
            .pool(ResponsePool::with_max_idle(policy.pool_max_idle))
            .status_header(policy.status_header);

        self = match policy.key {
            KeyPolicy::RequestUri => self.key_generator(RequestUri::new(policy.prefix.as_str())),
            KeyPolicy::RequestPath => self.key_generator(RequestPath::new(policy.prefix.as_str())),
        };

        if let Some(max) = policy.jitter {
            self = self.jitter(random_jitter(max));
        }

        self = match policy.encoding {
            EncodingPolicy::Json => self.encoding(JsonEncoding),
            #[cfg(feature = "gzip")]
            EncodingPolicy::JsonGzip => self.encoding(pagecache_backend::JsonGzipEncoding),
            #[cfg(not(feature = "gzip"))]
            EncodingPolicy::JsonGzip => {
                return Err(ConfigError::EncodingNotAvailable(
                    "JsonGzip requested but the 'gzip' feature is not enabled".to_owned(),
                ));
            }
        };

        Ok(self)
    }

    /// Finishes the configuration.
    pub fn build(self) -> Result<CacheConfig, ConfigError> {
        let ttl = self.ttl.ok_or(ConfigError::MissingTtl)?;
        Ok(self.into_config(ttl))
    }

    pub(crate) fn into_config(self, ttl: Duration) -> CacheConfig {
        CacheConfig {
            store: self.store,
            ttl,
            jitter: self.jitter.unwrap_or_else(|| Arc::new(|| Duration::ZERO)),
            key_generator: self
                .key_generator
                .unwrap_or_else(|| Arc::new(RequestUri::default())),
            coordinator: self.coordinator.unwrap_or_default(),
            pool: self
                .pool
                .unwrap_or_else(|| Arc::new(ResponsePool::default())),
            logger: self.logger.unwrap_or_else(|| Arc::new(DiscardLogger)),
            encoding: self.encoding.unwrap_or_else(|| Arc::new(JsonEncoding)),
            status_header: self.status_header,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecache_moka::MokaStore;

    #[test]
    fn test_build_requires_ttl() {
        let err = CacheConfig::builder(MokaStore::builder().build())
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingTtl);
    }

    #[test]
    fn test_defaults() {
        let config = CacheConfig::new(MokaStore::builder().build(), Duration::from_secs(10));
        assert_eq!(config.expiry(), Duration::from_secs(10));
        assert_eq!(config.encoding().name(), "json");
        assert!(!config.status_header());
    }

    #[test]
    fn test_jitter_is_added() {
        let config = CacheConfig::builder(MokaStore::builder().build())
            .ttl(Duration::from_secs(10))
            .jitter(|| Duration::from_secs(3))
            .build()
            .unwrap();
        assert_eq!(config.expiry(), Duration::from_secs(13));
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn test_from_policy() {
        let mut policy = PolicyConfig::with_ttl(Duration::from_secs(30));
        policy.encoding = EncodingPolicy::JsonGzip;
        policy.key = KeyPolicy::RequestPath;
        policy.prefix = "p:".to_owned();

        let config = CacheConfig::from_policy(MokaStore::builder().build(), &policy).unwrap();
        assert_eq!(config.encoding().name(), "json+gzip");

        let request = http::Request::get("/a?b=c").body(()).unwrap();
        let (parts, _) = request.into_parts();
        assert_eq!(
            config.key_generator().generate(&parts).unwrap().as_str(),
            "p:%2Fa"
        );
    }
}
