#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! Whole-response HTTP caching for tower services.
//!
//! `pagecache` sits in front of a request handler. For every request it
//! derives a cache key, replays a stored response when one exists, and
//! otherwise runs the handler once, streams its response to the client while
//! capturing it, and stores it for the configured time-to-live.
//!
//! Concurrent requests for the same missing key are deduplicated: one of
//! them runs the handler, the others wait and replay its response. A cache
//! stampede on a cold or expired key therefore costs a single handler call.
//!
//! # Quick Start
//!
//! ```
//! use std::convert::Infallible;
//! use std::time::Duration;
//!
//! use bytes::Bytes;
//! use http::{Request, Response};
//! use http_body_util::{BodyExt, Full};
//! use pagecache::Cache;
//! use pagecache_moka::MokaStore;
//! use tower::{ServiceBuilder, ServiceExt, service_fn};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let service = ServiceBuilder::new()
//!     .layer(Cache::with_request_uri(MokaStore::builder().build(), Duration::from_secs(60)))
//!     .service(service_fn(|_req: Request<()>| async {
//!         Ok::<_, Infallible>(Response::new(Full::new(Bytes::from_static(b"hello world"))))
//!     }));
//!
//! let response = service.oneshot(Request::get("/hello").body(()).unwrap()).await.unwrap();
//! let body = response.into_body().collect().await.unwrap().to_bytes();
//! assert_eq!(body.as_ref(), b"hello world");
//! # }
//! ```
//!
//! # Request flow
//!
//! 1. The [`KeyGenerator`] maps the request head to a key. No key means the
//!    request bypasses the cache entirely.
//! 2. The [`Store`] is consulted. A hit is replayed with its original status,
//!    headers and body.
//! 3. On a miss the [`SingleFlight`] coordinator elects a leader for the key.
//!    The leader calls the handler and wraps its body in a [`CaptureBody`].
//! 4. Once the body has been fully sent, a `2xx` response is written to the
//!    store with `ttl + jitter`. Other statuses and aborted responses are never
//!    stored.
//! 5. Followers replay the leader's response. If the leader was aborted they
//!    call the handler themselves, uncached.
//!
//! Failures of the cache layer are reported to the configured
//! [`Logger`](logger::Logger) and never fail the request.
//!
//! [`KeyGenerator`]: key::KeyGenerator
//! [`SingleFlight`]: concurrency::SingleFlight
//! [`CaptureBody`]: capture::CaptureBody

mod body;
pub mod capture;
/// Per-key request deduplication.
///
/// [`SingleFlight`](concurrency::SingleFlight) lets exactly one caller per
/// key do the work while concurrent callers wait for its result.
pub mod concurrency;
pub mod config;
pub mod context;
mod future;
pub mod key;
mod layer;
pub mod logger;
/// Metrics collection for cache observability.
///
/// When the `metrics` feature is enabled, this module provides counters for
/// hits, misses, shared and bypassed responses, and swallowed store errors.
pub mod metrics;
pub mod policy;
mod service;

pub use body::CacheBody;
pub use config::{CacheConfig, CacheConfigBuilder, ConfigError};
pub use context::{CACHE_STATUS_HEADER, CacheStatus};
pub use future::CacheServiceFuture;
pub use layer::Cache;
pub use service::CacheService;

pub use pagecache_backend::{
    Backend, BackendError, DeleteStatus, Encoding, EncodingError, JsonEncoding, Store, StoreError,
};
#[cfg(feature = "gzip")]
pub use pagecache_backend::JsonGzipEncoding;
pub use pagecache_core::{CacheKey, CachedResponse, Pool, ResponsePool};
