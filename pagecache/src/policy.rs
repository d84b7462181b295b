//! Declarative cache policy.
//!
//! [`PolicyConfig`] is the serde-friendly description of one cached route.
//! Durations use humantime notation (`"30s"`, `"5m"`, `"1h 30m"`):
//!
//! ```yaml
//! ttl: 5m
//! jitter: 30s
//! key: RequestPath
//! encoding: JsonGzip
//! ```
//!
//! Turn it into a runnable configuration with
//! [`CacheConfig::from_policy`](crate::CacheConfig::from_policy).

use std::time::Duration;

use pagecache_core::DEFAULT_MAX_IDLE;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::key::DEFAULT_PREFIX;

/// Which request component the cache key is derived from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Default)]
pub enum KeyPolicy {
    /// Path and query, see [`RequestUri`](crate::key::RequestUri).
    #[default]
    RequestUri,
    /// Path only, see [`RequestPath`](crate::key::RequestPath).
    RequestPath,
}

/// How responses are serialized in the store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Default)]
pub enum EncodingPolicy {
    /// Plain JSON.
    #[default]
    Json,
    /// JSON compressed with gzip. Requires the `gzip` feature.
    JsonGzip,
}

/// Cache policy of one route.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct PolicyConfig {
    /// Base time-to-live of stored responses. Zero stores without expiry.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    /// Upper bound of the random extra ttl added to every write.
    #[serde(default, with = "humantime_serde")]
    pub jitter: Option<Duration>,
    /// Namespace prefix of generated keys.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Key derivation.
    #[serde(default)]
    pub key: KeyPolicy,
    /// Stored representation.
    #[serde(default)]
    pub encoding: EncodingPolicy,
    /// Idle response containers kept for reuse.
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle: usize,
    /// Adds the `x-cache-status` header to responses.
    #[serde(default)]
    pub status_header: bool,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_owned()
}

fn default_pool_max_idle() -> usize {
    DEFAULT_MAX_IDLE
}

impl PolicyConfig {
    /// Policy with the given ttl and every other field at its default.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            jitter: None,
            prefix: default_prefix(),
            key: KeyPolicy::default(),
            encoding: EncodingPolicy::default(),
            pool_max_idle: default_pool_max_idle(),
            status_header: false,
        }
    }
}

/// Returns a jitter function drawing uniformly from `0..=max`.
pub fn random_jitter(max: Duration) -> impl Fn() -> Duration + Send + Sync + 'static {
    move || {
        if max.is_zero() {
            Duration::ZERO
        } else {
            rand::rng().random_range(Duration::ZERO..=max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_yaml_with_defaults() {
        let policy: PolicyConfig = serde_saphyr::from_str("ttl: 5m\n").unwrap();
        assert_eq!(policy, PolicyConfig::with_ttl(Duration::from_secs(300)));
    }

    #[test]
    fn test_yaml_full() {
        let yaml = r#"
ttl: 1h 30m
jitter: 10s
prefix: "blog:"
key: RequestPath
encoding: JsonGzip
pool_max_idle: 8
status_header: true
"#;
        let policy: PolicyConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(
            policy,
            PolicyConfig {
                ttl: Duration::from_secs(5400),
                jitter: Some(Duration::from_secs(10)),
                prefix: "blog:".to_owned(),
                key: KeyPolicy::RequestPath,
                encoding: EncodingPolicy::JsonGzip,
                pool_max_idle: 8,
                status_header: true,
            }
        );
    }

    #[test]
    fn test_missing_ttl_is_rejected() {
        assert!(serde_saphyr::from_str::<PolicyConfig>("key: RequestUri\n").is_err());
    }

    #[test]
    fn test_random_jitter_bounds() {
        let max = Duration::from_millis(20);
        let jitter = random_jitter(max);
        for _ in 0..100 {
            assert!(jitter() <= max);
        }
        assert_eq!(random_jitter(Duration::ZERO)(), Duration::ZERO);
    }
}
