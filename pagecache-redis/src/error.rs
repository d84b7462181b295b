//! Error types for Redis store operations.
//!
//! Every [`Error`] converts into a [`BackendError`], which is how it reaches
//! the cache layer.
//!
//! [`BackendError`]: pagecache_backend::BackendError

use pagecache_backend::BackendError;
use redis::RedisError;

/// Error type for Redis store operations.
///
/// You typically don't handle this error directly. It appears when:
///
/// - [`RedisStoreBuilder::build`] is given an invalid connection URL
/// - the first operation runs while Redis is unreachable (the connection is
///   established lazily)
/// - the server answers a command with an error
///
/// [`RedisStoreBuilder::build`]: crate::RedisStoreBuilder::build
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying Redis client.
    #[error("Redis store error: {0}")]
    Redis(#[from] RedisError),
}

impl Error {
    /// Whether the error comes from the network rather than from Redis itself.
    pub fn is_connection(&self) -> bool {
        match self {
            Error::Redis(error) => {
                error.is_io_error()
                    || error.is_connection_dropped()
                    || error.is_connection_refusal()
                    || error.is_timeout()
            }
        }
    }
}

impl From<Error> for BackendError {
    fn from(error: Error) -> Self {
        if error.is_connection() {
            Self::ConnectionError(Box::new(error))
        } else {
            Self::InternalError(Box::new(error))
        }
    }
}
