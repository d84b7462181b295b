//! Moka store capacity metrics.
//!
//! Enable the `metrics` feature to publish them. The background sweep updates
//! both gauges on every run:
//!
//! - `pagecache_moka_entries` - entries in the store
//! - `pagecache_moka_size_bytes` - weighted size; equals the entry count
//!   unless the store is built with a byte budget
//!
//! Both carry a `backend` label with the store name.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for the entry count gauge.
    pub static ref MOKA_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "pagecache_moka_entries",
            "Current number of entries in the Moka store."
        );
        "pagecache_moka_entries"
    };

    /// Metric name for the weighted size gauge.
    pub static ref MOKA_SIZE_BYTES: &'static str = {
        metrics::describe_gauge!(
            "pagecache_moka_size_bytes",
            "Current weighted size of the Moka store."
        );
        "pagecache_moka_size_bytes"
    };
}

/// Records the current size of the store named `backend`.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_capacity(backend: &str, entries: u64, size_bytes: u64) {
    metrics::gauge!(*MOKA_ENTRIES, "backend" => backend.to_string()).set(entries as f64);
    metrics::gauge!(*MOKA_SIZE_BYTES, "backend" => backend.to_string()).set(size_bytes as f64);
}

/// Records the current size of the store (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_capacity(_backend: &str, _entries: u64, _size_bytes: u64) {}
