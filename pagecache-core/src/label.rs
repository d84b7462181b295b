//! Backend label type for identifying storage backends.
//!
//! `BackendLabel` is a newtype wrapper around `SmolStr` used in log fields and
//! metric labels so that operators can tell which store served or failed a
//! request.

use smol_str::SmolStr;
use std::fmt;

/// A label identifying a storage backend.
///
/// # Example
/// ```
/// use pagecache_core::BackendLabel;
///
/// let label = BackendLabel::new_static("moka");
/// assert_eq!(label.as_str(), "moka");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BackendLabel(SmolStr);

impl BackendLabel {
    /// Creates a new backend label.
    #[inline]
    pub fn new(s: impl Into<SmolStr>) -> Self {
        Self(s.into())
    }

    /// Creates a backend label from a static string (no allocation).
    #[inline]
    pub const fn new_static(s: &'static str) -> Self {
        Self(SmolStr::new_static(s))
    }

    /// Returns the label as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for BackendLabel {
    fn from(s: &'static str) -> Self {
        Self::new_static(s)
    }
}

impl From<String> for BackendLabel {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
