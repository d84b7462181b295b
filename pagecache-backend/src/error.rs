//! Error types for storage operations.

use crate::format::EncodingError;
use thiserror::Error;

/// Error type for backend operations.
///
/// This enum categorizes errors that can occur while talking to a storage
/// adapter into distinct groups for appropriate handling.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Internal backend error, state or computation error.
    ///
    /// Any error not related to network interaction.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// Network interaction error.
    ///
    /// Errors occurring during communication with remote backends (e.g., Redis).
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),
}

/// Error type of the typed [`Store`](crate::Store) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No valid entry exists for the key.
    ///
    /// This is the normal miss signal, not a failure.
    #[error("cache miss")]
    CacheMiss,

    /// The adapter failed to read, write or delete.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The stored bytes could not be produced or understood.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl StoreError {
    /// Returns `true` for [`StoreError::CacheMiss`].
    pub fn is_miss(&self) -> bool {
        matches!(self, StoreError::CacheMiss)
    }
}
