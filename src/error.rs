//! Error type for attempt outcomes.
//!
//! Every failure is surfaced to the caller as a value inside an
//! [`Outcome`](crate::Outcome); iteration never panics and never throws
//! past the caller.

use std::time::Duration;

use reqwest::StatusCode;

/// Boxed transport error, so custom [`HttpClient`](crate::HttpClient)
/// implementations can surface their own error types.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error attached to a single attempt's outcome.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The response status was a 4xx other than 429, which terminates the
    /// iteration. The status text is carried in the message.
    #[error("terminated with client error response: {status}")]
    ClientError {
        /// Status code of the terminating response.
        status: StatusCode,
    },

    /// The overall deadline configured on the policy elapsed. Terminal.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// A single attempt exceeded the per-attempt timeout period. The
    /// abandoned transport call may still complete in the background; its
    /// result is discarded. Retried like any transport failure.
    #[error("attempt timed out after {period:?}")]
    AttemptTimeout {
        /// The configured per-attempt timeout.
        period: Duration,
    },

    /// Network-level failure reported by the transport. Retried.
    #[error("transport: {0}")]
    Transport(#[source] BoxError),

    /// The spawned attempt task failed (panicked) before producing a result.
    #[error("attempt task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// True if this error is the distinguished "terminated with client
    /// error response" condition (a 4xx other than 429).
    pub fn is_client_error_termination(&self) -> bool {
        matches!(self, Error::ClientError { .. })
    }

    /// True if the overall deadline elapsed.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Error::DeadlineExceeded)
    }

    /// True if a single attempt ran out of its timeout period.
    pub fn is_attempt_timeout(&self) -> bool {
        matches!(self, Error::AttemptTimeout { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_error_query_and_status_text() {
        let err = Error::ClientError {
            status: StatusCode::NOT_FOUND,
        };
        assert!(err.is_client_error_termination());
        assert!(err.to_string().contains("404 Not Found"));
    }

    #[test]
    fn deadline_is_not_client_error() {
        assert!(!Error::DeadlineExceeded.is_client_error_termination());
        assert!(Error::DeadlineExceeded.is_deadline_exceeded());
    }
}
