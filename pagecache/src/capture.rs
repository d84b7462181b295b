//! Response body capture.
//!
//! [`CaptureBody`] wraps the handler's body and copies every data frame into
//! a [`CachedResponse`] while forwarding the frame unchanged. Once the body
//! has been fully read, or is dropped, the capture hands the buffer to a
//! completion callback together with a [`CaptureOutcome`].

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Buf, Bytes};
use http_body::{Body as HttpBody, Frame, SizeHint};
use pagecache_core::CachedResponse;
use pin_project::{pin_project, pinned_drop};

/// How a capture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Every frame of the body was read.
    Completed,
    /// The body failed or was dropped before its end.
    Aborted,
}

/// Callback receiving the captured response.
pub type OnCapture = Box<dyn FnOnce(CachedResponse, CaptureOutcome) + Send + 'static>;

struct Capture {
    buffer: CachedResponse,
    on_finish: OnCapture,
}

/// A body that tees its data frames into a buffer.
///
/// Trailers are forwarded but not captured. The callback runs exactly once.
#[pin_project(PinnedDrop)]
pub struct CaptureBody<B: HttpBody> {
    #[pin]
    inner: B,
    capture: Option<Capture>,
}

impl<B: HttpBody> CaptureBody<B> {
    /// Wraps `inner`. `buffer` should already carry the response status and
    /// headers; body bytes are appended to it.
    pub fn new(inner: B, buffer: CachedResponse, on_finish: OnCapture) -> Self {
        Self {
            inner,
            capture: Some(Capture { buffer, on_finish }),
        }
    }

    /// Returns `true` once the callback has run.
    pub fn is_finished(&self) -> bool {
        self.capture.is_none()
    }
}

fn finish(capture: &mut Option<Capture>, outcome: CaptureOutcome) {
    if let Some(Capture { buffer, on_finish }) = capture.take() {
        on_finish(buffer, outcome);
    }
}

impl<B> HttpBody for CaptureBody<B>
where
    B: HttpBody,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();
        match ready!(this.inner.as_mut().poll_frame(cx)) {
            Some(Ok(frame)) => {
                let frame = frame.map_data(|mut data| data.copy_to_bytes(data.remaining()));
                if let (Some(data), Some(capture)) = (frame.data_ref(), this.capture.as_mut()) {
                    capture.buffer.extend_body(data);
                }
                if this.inner.is_end_stream() {
                    finish(this.capture, CaptureOutcome::Completed);
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Some(Err(error)) => {
                finish(this.capture, CaptureOutcome::Aborted);
                Poll::Ready(Some(Err(error)))
            }
            None => {
                finish(this.capture, CaptureOutcome::Completed);
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

#[pinned_drop]
impl<B: HttpBody> PinnedDrop for CaptureBody<B> {
    fn drop(self: Pin<&mut Self>) {
        let this = self.project();
        if this.capture.is_some() {
            // Hyper stops polling once the body reports its end, so a body
            // dropped in that state was delivered completely.
            let outcome = if this.inner.is_end_stream() {
                CaptureOutcome::Completed
            } else {
                CaptureOutcome::Aborted
            };
            finish(this.capture, outcome);
        }
    }
}

impl<B: HttpBody> fmt::Debug for CaptureBody<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureBody")
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}
