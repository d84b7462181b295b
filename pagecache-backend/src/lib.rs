#![warn(missing_docs)]
//! Storage and encoding traits for pagecache.
//!
//! Storage is split in two layers:
//!
//! - [`Backend`] is the adapter contract. It only moves opaque bytes under a
//!   key with an optional time-to-live and is what the moka and Redis crates
//!   implement.
//! - [`Store`] is the typed contract the cache engine talks to. It is
//!   implemented for every [`Backend`] and turns a [`CachedResponse`] into
//!   bytes with an [`Encoding`] on the way in and back on the way out.
//!
//! If you want to implement your own storage, implementing [`Backend`] is
//! all it takes.
//!
//! [`CachedResponse`]: pagecache_core::CachedResponse
mod backend;
mod error;
pub mod format;
pub mod metrics;
mod store;

pub use backend::{Backend, BackendResult};
pub use error::{BackendError, StoreError};
#[cfg(feature = "gzip")]
pub use format::JsonGzipEncoding;
pub use format::{Encoding, EncodingError, JsonEncoding};
pub use store::{Store, StoreResult};

/// Status of deleting result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Record successfully deleted.
    Deleted(u32),
    /// Record already missing.
    Missing,
}
