#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! In-memory response store backed by [Moka](https://docs.rs/moka).
//!
//! [`MokaStore`] keeps encoded responses in a bounded concurrent cache. Each
//! entry carries its own ttl: an expired entry is never returned, and a
//! background sweep (see [`MokaStoreBuilder::sweep_interval`]) reclaims
//! entries that expire without being read again.
//!
//! ```
//! use std::time::Duration;
//! use pagecache_moka::MokaStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = MokaStore::builder()
//!     .max_capacity(10_000)
//!     .sweep_interval(Duration::from_secs(30))
//!     .name("pages")
//!     .build();
//! assert_eq!(store.entry_count(), 0);
//! # }
//! ```

mod backend;
mod builder;
pub mod metrics;

pub use backend::MokaStore;
pub use builder::{DEFAULT_MAX_CAPACITY, MokaStoreBuilder};
pub use moka::policy::EvictionPolicy;
