//! Encodings for stored responses.
//!
//! An [`Encoding`] turns a [`CachedResponse`] into the bytes a
//! [`Backend`](crate::Backend) persists and back. The same encoding must be
//! used to read what it wrote.
//!
//! ```
//! use http::{HeaderMap, StatusCode};
//! use pagecache_backend::{Encoding, JsonEncoding};
//! use pagecache_core::CachedResponse;
//!
//! let value = CachedResponse::new(StatusCode::OK, HeaderMap::new(), "hello");
//! let raw = JsonEncoding.encode(&value).unwrap();
//!
//! let mut out = CachedResponse::default();
//! JsonEncoding.decode(&raw, &mut out).unwrap();
//! assert_eq!(out, value);
//! ```

use std::fmt::Debug;

use pagecache_core::{CachedResponse, Raw};
use thiserror::Error;

#[cfg(feature = "gzip")]
mod gzip;
mod json;

#[cfg(feature = "gzip")]
pub use gzip::JsonGzipEncoding;
pub use json::JsonEncoding;

/// Errors produced while encoding or decoding a stored response.
#[derive(Error, Debug)]
pub enum EncodingError {
    /// The response could not be serialized.
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    /// The stored bytes could not be deserialized.
    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),

    /// Compressing or decompressing failed.
    #[error("compression error: {0}")]
    Compression(#[from] std::io::Error),
}

/// Serialization strategy for stored responses.
pub trait Encoding: Debug + Send + Sync {
    /// Serializes a response.
    fn encode(&self, value: &CachedResponse) -> Result<Raw, EncodingError>;

    /// Deserializes `data` into `out`, replacing its whole content.
    ///
    /// On error `out` is left untouched.
    fn decode(&self, data: &[u8], out: &mut CachedResponse) -> Result<(), EncodingError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
