//! Response body type for s3static.
//!
//! [`SiteBody`] has three modes:
//!
//! - **Buffered**: listings, error texts and the health payload.
//! - **Stream**: object bodies, forwarded chunk by chunk from the store.
//! - **Empty**: no content.
//!
//! Dropping a streaming body drops the store stream, which releases the
//! upstream connection.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::StreamExt;
use http_body::Frame;
use http_body_util::Full;
use s3static_core::store::ObjectBody;

/// HTTP response body for every s3static response.
#[derive(Default)]
pub enum SiteBody {
    /// Fully buffered body.
    Buffered(Full<Bytes>),
    /// Object body streamed from the store.
    Stream(ObjectBody),
    /// No content.
    #[default]
    Empty,
}

impl SiteBody {
    /// Create a buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Create a buffered body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Buffered(Full::new(Bytes::from(s.into())))
    }

    /// Wrap a store body.
    #[must_use]
    pub fn from_stream(body: ObjectBody) -> Self {
        Self::Stream(body)
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }
}

impl fmt::Debug for SiteBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(full) => f.debug_tuple("Buffered").field(full).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Empty => f.write_str("Empty"),
        }
    }
}

impl http_body::Body for SiteBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Stream(stream) => stream
                .poll_next_unpin(cx)
                .map(|chunk| chunk.map(|res| res.map(Frame::data))),
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Stream(_) => false,
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Stream(_) => http_body::SizeHint::default(),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}
