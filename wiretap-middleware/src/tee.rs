use bytes::{Bytes, BytesMut};
use http_body::{Body, Frame, SizeHint};
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

type OnComplete = Box<dyn FnOnce(Bytes) + Send + 'static>;

struct Capture {
    buf: BytesMut,
    on_complete: OnComplete,
}

/// Body wrapper that forwards every frame unchanged while keeping a copy of
/// the data frames.
///
/// The completion callback receives the concatenated bytes once the inner
/// body has ended normally. It never runs if the inner body yields an error
/// or the tee is dropped first, and it runs at most once.
pub struct TeeBody<B> {
    inner: B,
    capture: Option<Capture>,
}

impl<B> TeeBody<B>
where
    B: Body<Data = Bytes>,
{
    /// Tee `inner`, calling `on_complete` with the full body at end of stream.
    ///
    /// A body that is already known to be empty completes immediately.
    pub fn new(inner: B, on_complete: impl FnOnce(Bytes) + Send + 'static) -> Self {
        let mut tee = Self {
            inner,
            capture: Some(Capture {
                buf: BytesMut::new(),
                on_complete: Box::new(on_complete),
            }),
        };
        if tee.inner.is_end_stream() || tee.inner.size_hint().exact() == Some(0) {
            tee.complete();
        }
        tee
    }

    /// Forward `inner` without capturing anything.
    pub fn passthrough(inner: B) -> Self {
        Self {
            inner,
            capture: None,
        }
    }
}

impl<B> TeeBody<B> {
    /// True until the completion callback has run or the capture was dropped.
    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    fn complete(&mut self) {
        if let Some(capture) = self.capture.take() {
            (capture.on_complete)(capture.buf.freeze());
        }
    }
}

impl<B> Body for TeeBody<B>
where
    B: Body<Data = Bytes> + Unpin,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = ready!(Pin::new(&mut this.inner).poll_frame(cx));
        match &polled {
            Some(Ok(frame)) => {
                if let (Some(capture), Some(data)) = (this.capture.as_mut(), frame.data_ref()) {
                    capture.buf.extend_from_slice(data);
                }
                // hyper stops polling a length-delimited body as soon as it
                // reports end of stream, so `None` may never be observed.
                if this.inner.is_end_stream() {
                    this.complete();
                }
            }
            Some(Err(_)) => this.capture = None,
            None => this.complete(),
        }
        Poll::Ready(polled)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B: fmt::Debug> fmt::Debug for TeeBody<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeeBody")
            .field("inner", &self.inner)
            .field("capturing", &self.is_capturing())
            .field(
                "buffered",
                &self.capture.as_ref().map_or(0, |c| c.buf.len()),
            )
            .finish()
    }
}
