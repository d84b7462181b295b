//! Sink for cache-layer failures.
//!
//! Failures of the cache layer never reach the client. They are reported to
//! the configured [`Logger`] instead, which discards them unless told
//! otherwise.

use std::fmt;

/// Receives failures the cache layer swallowed.
pub trait Logger: Send + Sync {
    /// Reports an error message.
    fn error(&self, message: fmt::Arguments<'_>);
}

/// Drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardLogger;

impl Logger for DiscardLogger {
    fn error(&self, _message: fmt::Arguments<'_>) {}
}

/// Forwards messages to `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn error(&self, message: fmt::Arguments<'_>) {
        tracing::error!(target: "pagecache", "{message}");
    }
}
