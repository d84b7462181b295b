use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Instant;

use http::{HeaderValue, Response};
use http_body::Body as HttpBody;
use pin_project::pin_project;

use crate::body::CacheBody;
use crate::context::{CACHE_STATUS_HEADER, CacheStatus};
use crate::metrics;

type Outcome<B, E> = (Result<Response<CacheBody<B>>, E>, CacheStatus);

/// Boxed request flow of [`CacheService`](crate::CacheService).
pub type BoxedFlow<B, E> = Pin<Box<dyn Future<Output = Outcome<B, E>> + Send>>;

/// Future returned by [`CacheService`](crate::CacheService).
///
/// Resolves once the response head is available and records the cache
/// status, optionally exposing it as the `x-cache-status` header.
#[pin_project]
pub struct CacheServiceFuture<B, E>
where
    B: HttpBody,
{
    #[pin]
    inner: BoxedFlow<B, E>,
    status_header: bool,
    started: Instant,
}

impl<B, E> CacheServiceFuture<B, E>
where
    B: HttpBody,
{
    pub(crate) fn new(inner: BoxedFlow<B, E>, status_header: bool) -> Self {
        Self {
            inner,
            status_header,
            started: Instant::now(),
        }
    }
}

impl<B, E> Future for CacheServiceFuture<B, E>
where
    B: HttpBody,
{
    type Output = Result<Response<CacheBody<B>>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let (result, status) = ready!(this.inner.poll(cx));
        metrics::record_status(status, this.started.elapsed());

        Poll::Ready(result.map(|mut response| {
            if *this.status_header {
                response
                    .headers_mut()
                    .insert(CACHE_STATUS_HEADER, HeaderValue::from_static(status.as_str()));
            }
            response
        }))
    }
}

impl<B, E> fmt::Debug for CacheServiceFuture<B, E>
where
    B: HttpBody,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheServiceFuture")
            .field("status_header", &self.status_header)
            .finish_non_exhaustive()
    }
}
