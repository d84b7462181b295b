//! Store metrics.
//!
//! Enable the `metrics` feature to emit them; without it every recorder is a
//! no-op and [`Timer`] is zero-sized.
//!
//! All metrics are labelled with `backend` and follow the pattern
//! `pagecache_store_{operation}_{metric_type}`.

use std::time::Duration;

#[cfg(feature = "metrics")]
use std::time::Instant;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;
use pagecache_core::BackendLabel;

/// Timer that only measures when metrics are enabled.
pub struct Timer {
    #[cfg(feature = "metrics")]
    start: Instant,
}

impl Timer {
    /// Starts a timer.
    #[inline]
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "metrics")]
            start: Instant::now(),
        }
    }

    /// Elapsed time, or `Duration::ZERO` when metrics are disabled.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        #[cfg(feature = "metrics")]
        {
            self.start.elapsed()
        }
        #[cfg(not(feature = "metrics"))]
        {
            Duration::ZERO
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "metrics")]
lazy_static! {
    /// Read operations counter.
    pub static ref STORE_READ_TOTAL: &'static str = {
        metrics::describe_counter!(
            "pagecache_store_read_total",
            "Total number of store read operations per backend."
        );
        "pagecache_store_read_total"
    };

    /// Read errors counter.
    pub static ref STORE_READ_ERRORS: &'static str = {
        metrics::describe_counter!(
            "pagecache_store_read_errors_total",
            "Total number of failed store reads per backend."
        );
        "pagecache_store_read_errors_total"
    };

    /// Read duration histogram.
    pub static ref STORE_READ_DURATION: &'static str = {
        metrics::describe_histogram!(
            "pagecache_store_read_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of backend reads in seconds."
        );
        "pagecache_store_read_duration_seconds"
    };

    /// Bytes read counter.
    pub static ref STORE_READ_BYTES: &'static str = {
        metrics::describe_counter!(
            "pagecache_store_read_bytes_total",
            "Total encoded bytes read per backend."
        );
        "pagecache_store_read_bytes_total"
    };

    /// Write operations counter.
    pub static ref STORE_WRITE_TOTAL: &'static str = {
        metrics::describe_counter!(
            "pagecache_store_write_total",
            "Total number of store write operations per backend."
        );
        "pagecache_store_write_total"
    };

    /// Write errors counter.
    pub static ref STORE_WRITE_ERRORS: &'static str = {
        metrics::describe_counter!(
            "pagecache_store_write_errors_total",
            "Total number of failed store writes per backend."
        );
        "pagecache_store_write_errors_total"
    };

    /// Write duration histogram.
    pub static ref STORE_WRITE_DURATION: &'static str = {
        metrics::describe_histogram!(
            "pagecache_store_write_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of backend writes in seconds."
        );
        "pagecache_store_write_duration_seconds"
    };

    /// Bytes written counter.
    pub static ref STORE_WRITE_BYTES: &'static str = {
        metrics::describe_counter!(
            "pagecache_store_write_bytes_total",
            "Total encoded bytes written per backend."
        );
        "pagecache_store_write_bytes_total"
    };

    /// Delete operations counter.
    pub static ref STORE_DELETE_TOTAL: &'static str = {
        metrics::describe_counter!(
            "pagecache_store_delete_total",
            "Total number of store delete operations per backend."
        );
        "pagecache_store_delete_total"
    };

    /// Encode duration histogram.
    pub static ref STORE_ENCODE_DURATION: &'static str = {
        metrics::describe_histogram!(
            "pagecache_store_encode_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of response encoding in seconds."
        );
        "pagecache_store_encode_duration_seconds"
    };

    /// Decode duration histogram.
    pub static ref STORE_DECODE_DURATION: &'static str = {
        metrics::describe_histogram!(
            "pagecache_store_decode_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of response decoding in seconds."
        );
        "pagecache_store_decode_duration_seconds"
    };
}

/// Records a backend read.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_read(backend: &BackendLabel, bytes: usize, ok: bool, duration: Duration) {
    let backend = backend.to_string();
    metrics::counter!(*STORE_READ_TOTAL, "backend" => backend.clone()).increment(1);
    if !ok {
        metrics::counter!(*STORE_READ_ERRORS, "backend" => backend.clone()).increment(1);
    }
    metrics::counter!(*STORE_READ_BYTES, "backend" => backend.clone()).increment(bytes as u64);
    metrics::histogram!(*STORE_READ_DURATION, "backend" => backend).record(duration.as_secs_f64());
}

/// Records a backend read (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_read(_backend: &BackendLabel, _bytes: usize, _ok: bool, _duration: Duration) {}

/// Records a backend write.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_write(backend: &BackendLabel, bytes: usize, ok: bool, duration: Duration) {
    let backend = backend.to_string();
    metrics::counter!(*STORE_WRITE_TOTAL, "backend" => backend.clone()).increment(1);
    if ok {
        metrics::counter!(*STORE_WRITE_BYTES, "backend" => backend.clone())
            .increment(bytes as u64);
    } else {
        metrics::counter!(*STORE_WRITE_ERRORS, "backend" => backend.clone()).increment(1);
    }
    metrics::histogram!(*STORE_WRITE_DURATION, "backend" => backend)
        .record(duration.as_secs_f64());
}

/// Records a backend write (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_write(_backend: &BackendLabel, _bytes: usize, _ok: bool, _duration: Duration) {}

/// Records a backend delete.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_delete(backend: &BackendLabel, ok: bool) {
    let status = if ok { "ok" } else { "error" };
    metrics::counter!(*STORE_DELETE_TOTAL, "backend" => backend.to_string(), "status" => status)
        .increment(1);
}

/// Records a backend delete (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_delete(_backend: &BackendLabel, _ok: bool) {}

/// Records encoding duration.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_encode(backend: &BackendLabel, duration: Duration) {
    metrics::histogram!(*STORE_ENCODE_DURATION, "backend" => backend.to_string())
        .record(duration.as_secs_f64());
}

/// Records encoding duration (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_encode(_backend: &BackendLabel, _duration: Duration) {}

/// Records decoding duration.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_decode(backend: &BackendLabel, duration: Duration) {
    metrics::histogram!(*STORE_DECODE_DURATION, "backend" => backend.to_string())
        .record(duration.as_secs_f64());
}

/// Records decoding duration (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_decode(_backend: &BackendLabel, _duration: Duration) {}
