//! Per-attempt outcome yielded to the caller.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};

use crate::error::Error;

/// Result of one attempt: a response, an error, or both (a terminating
/// 4xx carries the response alongside the client-error termination).
///
/// Exactly one outcome is yielded per physical attempt, plus at most one
/// final synthetic outcome for the overall deadline elapsing during a
/// backoff sleep.
#[derive(Debug)]
pub struct Outcome {
    /// The response, if the transport produced one.
    pub response: Option<Response>,
    /// The error, if any. May accompany a response.
    pub error: Option<Error>,
}

impl Outcome {
    pub(crate) fn new(response: Option<Response>, error: Option<Error>) -> Self {
        Self { response, error }
    }

    pub(crate) fn from_error(error: Error) -> Self {
        Self {
            response: None,
            error: Some(error),
        }
    }

    /// Status code of the response, if one is present.
    pub fn status(&self) -> Option<StatusCode> {
        self.response.as_ref().map(|r| r.status())
    }

    /// True if this outcome carries a response and no error.
    pub fn is_ok(&self) -> bool {
        self.response.is_some() && self.error.is_none()
    }

    /// Consume the outcome, keeping only the response.
    pub fn into_response(self) -> Option<Response> {
        self.response
    }
}

/// Buffered copy of a response, handed to the termination condition so it
/// can inspect the body without consuming the response the caller will
/// receive.
#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl ResponseSnapshot {
    /// Status code of the attempt's response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The fully buffered response body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
