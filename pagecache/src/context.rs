//! Per-request cache outcome.

use http::HeaderName;

/// Response header carrying the [`CacheStatus`] when enabled.
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache-status");

/// How a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheStatus {
    /// Replayed from the store.
    Hit,
    /// Produced by the handler, possibly for other waiters too.
    Miss,
    /// Replayed from a concurrent request's handler execution.
    Shared,
    /// The request was not cacheable.
    Bypass,
}

impl CacheStatus {
    /// Label used in headers, logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Shared => "SHARED",
            CacheStatus::Bypass => "BYPASS",
        }
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
