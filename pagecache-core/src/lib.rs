#![warn(missing_docs)]
//! # pagecache-core
//!
//! Core types shared by every pagecache crate.
//!
//! This crate holds the value types that travel between the cache engine,
//! the storage backends and the encodings:
//!
//! - [`CachedResponse`] - the stored representation of a whole HTTP response
//! - [`CacheKey`] - the string slot a response is stored under
//! - [`Pool`] / [`ResponsePool`] - reuse of response containers on the hot path
//! - [`BackendLabel`] - the name a storage backend reports in logs and metrics
//!
//! It has no async runtime dependency; storage lives in `pagecache-backend`
//! and the request flow lives in `pagecache`.

pub mod key;
pub mod label;
pub mod pool;
pub mod response;

pub use key::CacheKey;
pub use label::BackendLabel;
pub use pool::{DEFAULT_MAX_IDLE, Pool, ResponsePool};
pub use response::CachedResponse;

/// Raw byte data type used for encoded cache values.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
