//! Cache key type.
//!
//! A [`CacheKey`] is an opaque string: a namespace prefix followed by a
//! request-derived suffix. Backends use it verbatim as their storage key.
//!
//! ```
//! use pagecache_core::CacheKey;
//!
//! let key = CacheKey::new("page:%2Fhello");
//! assert_eq!(key.as_str(), "page:%2Fhello");
//! assert!(key.has_prefix("page:"));
//! ```

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A cache key identifying a stored response.
///
/// Backed by [`SmolStr`], so short keys are stored inline and cloning a key
/// never copies heap data.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(SmolStr);

impl CacheKey {
    /// Creates a cache key from any string-like value.
    #[inline]
    pub fn new(key: impl Into<SmolStr>) -> Self {
        Self(key.into())
    }

    /// Creates a cache key from a static string (no allocation).
    #[inline]
    pub const fn new_static(key: &'static str) -> Self {
        Self(SmolStr::new_static(key))
    }

    /// Returns the key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the key as raw bytes, as written to byte-oriented backends.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Length of the key in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the empty key.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if the key lives in the given namespace.
    #[inline]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CacheKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl From<SmolStr> for CacheKey {
    fn from(key: SmolStr) -> Self {
        Self(key)
    }
}
