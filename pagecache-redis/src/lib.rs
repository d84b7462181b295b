#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! Redis response store for pagecache.
//!
//! [`RedisStore`] shares cached responses between every instance of a
//! service. Responses are plain string values: `SET key value PX ttl` on
//! write, `GET` on read and `DEL` on delete, so Redis handles expiry.
//!
//! ```no_run
//! use std::time::Duration;
//! use pagecache::Cache;
//! use pagecache_redis::RedisStore;
//!
//! let store = RedisStore::builder()
//!     .server("redis://127.0.0.1:6379/0")
//!     .name("pages")
//!     .build()
//!     .unwrap();
//! let layer = Cache::with_request_uri(store, Duration::from_secs(60));
//! ```

pub mod backend;
pub mod error;

#[doc(inline)]
pub use crate::backend::{RedisStore, RedisStoreBuilder};
#[doc(inline)]
pub use crate::error::Error;
