use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes};
use http_body::{Body as HttpBody, Frame, SizeHint};
use pin_project::pin_project;

use crate::capture::CaptureBody;

/// Response body produced by [`CacheService`](crate::CacheService).
///
/// Data frames are always [`Bytes`], whatever the handler's body uses.
#[pin_project(project = CacheBodyProj)]
pub enum CacheBody<B: HttpBody> {
    /// The handler's body, forwarded as is. Used for bypassed requests and
    /// for followers whose leader was abandoned.
    Passthrough(#[pin] B),
    /// The handler's body, teed into the cache.
    Capture(#[pin] CaptureBody<B>),
    /// A stored or shared response.
    Replay(Option<Bytes>),
}

impl<B: HttpBody> CacheBody<B> {
    /// Creates a replay body, normalizing the empty body to no frames.
    pub fn replay(body: Bytes) -> Self {
        CacheBody::Replay((!body.is_empty()).then_some(body))
    }
}

impl<B> HttpBody for CacheBody<B>
where
    B: HttpBody,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            CacheBodyProj::Passthrough(inner) => inner.poll_frame(cx).map(|frame| {
                frame.map(|result| {
                    result.map(|frame| frame.map_data(|mut data| data.copy_to_bytes(data.remaining())))
                })
            }),
            CacheBodyProj::Capture(inner) => inner.poll_frame(cx),
            CacheBodyProj::Replay(body) => Poll::Ready(body.take().map(|data| Ok(Frame::data(data)))),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            CacheBody::Passthrough(inner) => inner.is_end_stream(),
            CacheBody::Capture(inner) => inner.is_end_stream(),
            CacheBody::Replay(body) => body.is_none(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            CacheBody::Passthrough(inner) => inner.size_hint(),
            CacheBody::Capture(inner) => inner.size_hint(),
            CacheBody::Replay(body) => {
                SizeHint::with_exact(body.as_ref().map_or(0, |data| data.len() as u64))
            }
        }
    }
}
