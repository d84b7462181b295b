//! Metrics declaration and initialization.

use std::time::Duration;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

use crate::context::CacheStatus;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of cache hit events.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "pagecache_hit_total",
            "Total number of responses replayed from the store."
        );
        "pagecache_hit_total"
    };
    /// Track number of cache miss events.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "pagecache_miss_total",
            "Total number of responses produced by the handler."
        );
        "pagecache_miss_total"
    };
    /// Track number of responses shared from a concurrent execution.
    pub static ref CACHE_SHARED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "pagecache_shared_total",
            "Total number of responses shared from a concurrent handler execution."
        );
        "pagecache_shared_total"
    };
    /// Track number of bypassed requests.
    pub static ref CACHE_BYPASS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "pagecache_bypass_total",
            "Total number of requests that were not cacheable."
        );
        "pagecache_bypass_total"
    };
    /// Track number of swallowed store failures.
    pub static ref CACHE_STORE_ERROR_COUNTER: &'static str = {
        metrics::describe_counter!(
            "pagecache_store_error_total",
            "Total number of store failures hidden from clients."
        );
        "pagecache_store_error_total"
    };
    /// Histogram of time until the response head was available.
    pub static ref CACHE_REQUEST_DURATION: &'static str = {
        metrics::describe_histogram!(
            "pagecache_request_duration_seconds",
            metrics::Unit::Seconds,
            "Duration until the response head was produced, in seconds."
        );
        "pagecache_request_duration_seconds"
    };
}

/// Records the outcome of one request.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_status(status: CacheStatus, duration: Duration) {
    let counter = match status {
        CacheStatus::Hit => *CACHE_HIT_COUNTER,
        CacheStatus::Miss => *CACHE_MISS_COUNTER,
        CacheStatus::Shared => *CACHE_SHARED_COUNTER,
        CacheStatus::Bypass => *CACHE_BYPASS_COUNTER,
    };
    metrics::counter!(counter).increment(1);
    metrics::histogram!(*CACHE_REQUEST_DURATION, "status" => status.as_str())
        .record(duration.as_secs_f64());
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_status(_status: CacheStatus, _duration: Duration) {}

/// Records a store failure that was logged and swallowed.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_store_error(operation: &'static str) {
    metrics::counter!(*CACHE_STORE_ERROR_COUNTER, "operation" => operation).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_store_error(_operation: &'static str) {}
