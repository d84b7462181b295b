use std::sync::Arc;
use std::task::{Context, Poll};

use http::{Request, Response};
use http_body::Body as HttpBody;
use pagecache_backend::StoreError;
use pagecache_core::{CacheKey, CachedResponse};
use tokio::runtime::Handle;
use tower::Service;
use tracing::{debug, trace};

use crate::body::CacheBody;
use crate::capture::{CaptureBody, CaptureOutcome, OnCapture};
use crate::concurrency::{ConcurrencyError, Flight, FlightGuard};
use crate::config::{CacheConfig, SharedResponse};
use crate::context::CacheStatus;
use crate::future::CacheServiceFuture;
use crate::metrics;

/// Service created by the [`Cache`](crate::Cache) layer.
pub struct CacheService<S> {
    upstream: S,
    config: Arc<CacheConfig>,
}

impl<S> CacheService<S> {
    /// Wraps `upstream` with caching driven by `config`.
    pub fn new(upstream: S, config: Arc<CacheConfig>) -> Self {
        CacheService { upstream, config }
    }
}

impl<S> Clone for CacheService<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            upstream: self.upstream.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CacheService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: HttpBody + Send + 'static,
{
    type Response = Response<CacheBody<ResBody>>;
    type Error = S::Error;
    type Future = CacheServiceFuture<ResBody, S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.upstream.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // The ready service goes into the future; the clone waits for the
        // next `poll_ready`.
        let clone = self.upstream.clone();
        let upstream = std::mem::replace(&mut self.upstream, clone);
        let config = Arc::clone(&self.config);
        let status_header = config.status_header();

        CacheServiceFuture::new(Box::pin(serve(config, upstream, request)), status_header)
    }
}

async fn serve<S, ReqBody, ResBody>(
    config: Arc<CacheConfig>,
    mut upstream: S,
    request: Request<ReqBody>,
) -> (Result<Response<CacheBody<ResBody>>, S::Error>, CacheStatus)
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Send + 'static,
    S::Future: Send,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: HttpBody + Send + 'static,
{
    let (parts, body) = request.into_parts();
    let Some(key) = config.key_generator().generate(&parts) else {
        trace!(uri = %parts.uri, "request is not cacheable");
        let result = upstream.call(Request::from_parts(parts, body)).await;
        return (result.map(passthrough), CacheStatus::Bypass);
    };

    let mut cached = config.pool().get();
    match config
        .store()
        .get(&key, &mut cached, config.encoding())
        .await
    {
        Ok(()) => {
            debug!(%key, "cache hit");
            let response = replay(&cached);
            config.pool().put(cached);
            return (Ok(response), CacheStatus::Hit);
        }
        Err(StoreError::CacheMiss) => {
            debug!(%key, "cache miss");
        }
        Err(error) => {
            metrics::record_store_error("get");
            config.logger().error(format_args!(
                "get cache key error: {error}, cache key: {key}"
            ));
        }
    }

    match config.coordinator().acquire(&key) {
        Flight::Follower(waiter) => {
            config.pool().put(cached);
            match waiter.wait().await {
                Ok(shared) => {
                    debug!(%key, "replaying response of in-flight request");
                    let response = replay(&shared);
                    config.recycle(shared);
                    (Ok(response), CacheStatus::Shared)
                }
                Err(ConcurrencyError::Closed) => {
                    debug!(%key, "in-flight request abandoned, calling upstream directly");
                    let result = upstream.call(Request::from_parts(parts, body)).await;
                    (result.map(passthrough), CacheStatus::Miss)
                }
                Err(error) => {
                    config.logger().error(format_args!(
                        "single flight error: {error}, cache key: {key}"
                    ));
                    let result = upstream.call(Request::from_parts(parts, body)).await;
                    (result.map(passthrough), CacheStatus::Miss)
                }
            }
        }
        Flight::Leader(guard) => {
            // A previous leader may have stored the response between our
            // lookup and the acquire.
            if config
                .store()
                .get(&key, &mut cached, config.encoding())
                .await
                .is_ok()
            {
                debug!(%key, "stored while acquiring, replaying");
                let shared = Arc::new(cached);
                let response = replay(&shared);
                guard.complete(Arc::clone(&shared));
                config.recycle(shared);
                return (Ok(response), CacheStatus::Hit);
            }

            debug!(%key, "calling upstream");
            let response = match upstream.call(Request::from_parts(parts, body)).await {
                Ok(response) => response,
                Err(error) => {
                    config.pool().put(cached);
                    return (Err(error), CacheStatus::Miss);
                }
            };
            let (head, inner) = response.into_parts();
            cached.set_head(head.status, &head.headers);
            let on_finish = on_capture(Arc::clone(&config), key, guard);
            let body = CacheBody::Capture(CaptureBody::new(inner, cached, on_finish));
            (Ok(Response::from_parts(head, body)), CacheStatus::Miss)
        }
    }
}

fn passthrough<B: HttpBody>(response: Response<B>) -> Response<CacheBody<B>> {
    response.map(CacheBody::Passthrough)
}

fn replay<B: HttpBody>(cached: &CachedResponse) -> Response<CacheBody<B>> {
    cached.to_response().map(CacheBody::replay)
}

/// Decides the fate of a captured response once its body has been read.
fn on_capture(
    config: Arc<CacheConfig>,
    key: CacheKey,
    guard: FlightGuard<SharedResponse>,
) -> OnCapture {
    Box::new(move |captured, outcome| {
        if outcome == CaptureOutcome::Aborted {
            debug!(%key, "response aborted, not caching");
            drop(guard);
            config.pool().put(captured);
            return;
        }

        let shared = Arc::new(captured);
        if !shared.is_success() {
            debug!(%key, status = %shared.status(), "status is not cacheable");
            let followers = guard.complete(Arc::clone(&shared));
            trace!(%key, followers, "flight completed");
            config.recycle(shared);
            return;
        }

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(persist(config, key, shared, guard));
            }
            Err(_) => {
                config.logger().error(format_args!(
                    "set cache key error: no async runtime, cache key: {key}"
                ));
                guard.complete(Arc::clone(&shared));
                config.recycle(shared);
            }
        }
    })
}

/// Writes the response, then releases the flight so that requests arriving
/// during the write still share it.
async fn persist(
    config: Arc<CacheConfig>,
    key: CacheKey,
    response: SharedResponse,
    guard: FlightGuard<SharedResponse>,
) {
    let ttl = config.expiry();
    match config
        .store()
        .set(&key, &response, ttl, config.encoding())
        .await
    {
        Ok(()) => debug!(%key, ?ttl, "response stored"),
        Err(error) => {
            metrics::record_store_error("set");
            config.logger().error(format_args!(
                "set cache key error: {error}, cache key: {key}"
            ));
        }
    }
    let followers = guard.complete(Arc::clone(&response));
    trace!(%key, followers, "flight completed");
    config.recycle(response);
}
