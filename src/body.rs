//! Request body capture for replay across attempts.
//!
//! A request body is a single-use value: once sent it is gone. The
//! engine captures the payload bytes up front so every attempt can send
//! an independent copy.

use bytes::{Bytes, BytesMut};
use http_body_util::BodyExt;
use reqwest::Body;

/// Replayable request body: produces a fresh [`Body`] for each attempt.
#[derive(Debug, Clone)]
pub(crate) enum RewindableBody {
    /// No payload; attempts carry no body.
    Empty,
    /// Captured payload; each attempt gets an independent reader over
    /// the same bytes.
    Buffered(Bytes),
}

impl RewindableBody {
    /// A fresh body for the next attempt, or `None` for body-less
    /// requests.
    pub(crate) fn next_body(&self) -> Option<Body> {
        match self {
            RewindableBody::Empty => None,
            RewindableBody::Buffered(bytes) => Some(Body::from(bytes.clone())),
        }
    }

    #[cfg(test)]
    pub(crate) fn bytes(&self) -> Option<&[u8]> {
        match self {
            RewindableBody::Empty => None,
            RewindableBody::Buffered(b) => Some(b),
        }
    }
}

/// Result of capturing the caller's body.
pub(crate) struct Captured {
    pub(crate) body: RewindableBody,
    /// Set when the source stream failed mid-drain. Only the bytes read
    /// before the failure were captured; they can be sent once but not
    /// replayed, so the engine clamps the attempt limit to one.
    pub(crate) error: Option<reqwest::Error>,
}

/// Capture the caller's body once.
///
/// Byte-backed bodies are captured without I/O. Streaming bodies are
/// eagerly drained into memory frame by frame, so a mid-stream failure
/// still leaves the already-read bytes available for a single send.
pub(crate) async fn capture(body: Option<Body>) -> Captured {
    let mut body = match body {
        None => {
            return Captured {
                body: RewindableBody::Empty,
                error: None,
            }
        }
        Some(b) => b,
    };
    if let Some(bytes) = body.as_bytes() {
        return Captured {
            body: RewindableBody::Buffered(Bytes::copy_from_slice(bytes)),
            error: None,
        };
    }
    let mut buf = BytesMut::new();
    loop {
        match body.frame().await {
            None => {
                return Captured {
                    body: RewindableBody::Buffered(buf.freeze()),
                    error: None,
                }
            }
            Some(Ok(frame)) => {
                if let Ok(data) = frame.into_data() {
                    buf.extend_from_slice(&data);
                }
            }
            Some(Err(e)) => {
                return Captured {
                    body: RewindableBody::Buffered(buf.freeze()),
                    error: Some(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_body_stays_empty() {
        let c = capture(None).await;
        assert!(c.error.is_none());
        assert!(matches!(c.body, RewindableBody::Empty));
        assert!(c.body.next_body().is_none());
    }

    #[tokio::test]
    async fn byte_body_is_captured_without_draining() {
        let c = capture(Some(Body::from("payload"))).await;
        assert!(c.error.is_none());
        assert_eq!(c.body.bytes(), Some(&b"payload"[..]));
        // Every attempt sees the same bytes.
        let one = c.body.next_body().unwrap();
        let two = c.body.next_body().unwrap();
        assert_eq!(one.as_bytes(), two.as_bytes());
    }

    #[tokio::test]
    async fn streaming_body_is_drained_once() {
        let chunks: Vec<Result<Bytes, std::io::Error>> =
            vec![Ok(Bytes::from_static(b"pay")), Ok(Bytes::from_static(b"load"))];
        let body = Body::wrap_stream(futures::stream::iter(chunks));
        let c = capture(Some(body)).await;
        assert!(c.error.is_none());
        assert_eq!(c.body.bytes(), Some(&b"payload"[..]));
    }

    #[tokio::test]
    async fn failing_stream_keeps_the_bytes_read_so_far() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"pay")),
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone")),
        ];
        let body = Body::wrap_stream(futures::stream::iter(chunks));
        let c = capture(Some(body)).await;
        assert!(c.error.is_some());
        assert_eq!(c.body.bytes(), Some(&b"pay"[..]));
    }
}
