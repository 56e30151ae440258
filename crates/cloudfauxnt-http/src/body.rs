//! Response bodies produced by the edge.
//!
//! The edge never streams. A body is either a payload relayed from an origin,
//! a small document the edge wrote itself (error XML, health JSON, CORS text),
//! or nothing at all.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use http_body_util::Full;

/// Body of every CloudFauxnt response.
#[derive(Debug, Default)]
pub enum CloudfauxntBody {
    /// Payload buffered from an origin response.
    Relayed(Full<Bytes>),
    /// Document generated by the edge.
    Generated(Full<Bytes>),
    /// No payload (preflights).
    #[default]
    Empty,
}

impl CloudfauxntBody {
    /// Wrap a buffered origin payload.
    #[must_use]
    pub fn relayed(payload: Bytes) -> Self {
        Self::Relayed(Full::new(payload))
    }

    /// Wrap a document written by the edge.
    #[must_use]
    pub fn generated(document: impl Into<Bytes>) -> Self {
        Self::Generated(Full::new(document.into()))
    }

    /// A body with no payload.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Whether the payload came from an origin.
    #[must_use]
    pub fn is_relayed(&self) -> bool {
        matches!(self, Self::Relayed(_))
    }

    fn payload(&self) -> Option<&Full<Bytes>> {
        match self {
            Self::Relayed(full) | Self::Generated(full) => Some(full),
            Self::Empty => None,
        }
    }
}

impl Body for CloudfauxntBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
        match self.get_mut() {
            Self::Relayed(full) | Self::Generated(full) => {
                Pin::new(full).poll_frame(cx).map_err(|never| match never {})
            }
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        self.payload().is_none_or(Body::is_end_stream)
    }

    fn size_hint(&self) -> SizeHint {
        self.payload()
            .map_or_else(|| SizeHint::with_exact(0), Body::size_hint)
    }
}
