//! Per-call policy: attempt limits, timing, headers and hooks.
//!
//! Built once via [`Policy::builder`] and immutable afterwards. The
//! zero sentinels follow the engine contract: `max_attempts == 0` means
//! unbounded, `interval == 0` means jittered exponential backoff,
//! `period == 0` means no per-attempt timeout.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::client::{Aspect, HttpClient};
use crate::error::Error;
use crate::outcome::ResponseSnapshot;

/// Caller-supplied termination condition, evaluated against a buffered
/// snapshot of the response and the prospective error for the attempt.
/// A `true` result stops the iteration.
pub type TerminationCondition =
    dyn Fn(Option<&ResponseSnapshot>, Option<&Error>) -> bool + Send + Sync;

/// Read-only options governing one logical call. Cheap to clone; the
/// same policy can drive any number of calls.
#[derive(Clone)]
pub struct Policy {
    pub(crate) client: Arc<dyn HttpClient>,
    pub(crate) content_type: Option<String>,
    pub(crate) headers: Option<HeaderMap>,
    pub(crate) max_attempts: u32,
    pub(crate) interval: Duration,
    pub(crate) period: Duration,
    pub(crate) deadline: Option<Duration>,
    pub(crate) terminate: Option<Arc<TerminationCondition>>,
    pub(crate) aspect: Option<Arc<dyn Aspect>>,
    pub(crate) buffer_response_body: bool,
}

impl Policy {
    /// Start building a policy from the defaults: a fresh default
    /// transport, unbounded attempts, backoff-derived waits, no
    /// per-attempt timeout, no overall deadline, buffered response
    /// bodies.
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    pub(crate) fn wants_buffering(&self) -> bool {
        self.buffer_response_body || self.terminate.is_some()
    }
}

impl Default for Policy {
    fn default() -> Self {
        Policy::builder().build()
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy")
            .field("content_type", &self.content_type)
            .field("headers", &self.headers)
            .field("max_attempts", &self.max_attempts)
            .field("interval", &self.interval)
            .field("period", &self.period)
            .field("deadline", &self.deadline)
            .field("has_termination_condition", &self.terminate.is_some())
            .field("has_aspect", &self.aspect.is_some())
            .field("buffer_response_body", &self.buffer_response_body)
            .finish()
    }
}

/// Builder for [`Policy`]. Last write wins; setting the same option
/// twice is equivalent to setting it once.
#[derive(Default)]
pub struct PolicyBuilder {
    client: Option<Arc<dyn HttpClient>>,
    content_type: Option<String>,
    headers: Option<HeaderMap>,
    max_attempts: u32,
    interval: Duration,
    period: Duration,
    deadline: Option<Duration>,
    terminate: Option<Arc<TerminationCondition>>,
    aspect: Option<Arc<dyn Aspect>>,
    buffer_response_body: Option<bool>,
}

impl PolicyBuilder {
    /// Use a custom transport instead of the default [`reqwest::Client`].
    pub fn client<C: HttpClient + 'static>(mut self, client: C) -> Self {
        self.client = Some(Arc::new(client));
        self
    }

    /// Content type applied to the request header, except for body-less
    /// GET/HEAD requests. See [`crate::content_type`] for common values.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Replace the request's header set entirely (no merging with
    /// defaults).
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Maximum number of physical attempts. `0` means unbounded.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Fixed wait between attempts. `Duration::ZERO` (the default) uses
    /// jittered exponential backoff instead. A 429's `Retry-After`
    /// header overrides either.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Timeout for each individual attempt. `Duration::ZERO` (the
    /// default) disables it.
    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Overall budget for the whole logical call, measured from the
    /// first pull. Once elapsed, the iteration yields a deadline error
    /// and stops. Dropping the iterator remains the immediate
    /// cancellation signal.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Custom termination condition. When configured it takes precedence
    /// over the engine's status-based rules (except for 429, which
    /// always retries): a `true` result stops the iteration, a `false`
    /// result retries — including for 4xx responses that would otherwise
    /// be terminal. Configuring a condition forces response-body
    /// buffering so the condition can read the body without starving
    /// the caller.
    pub fn terminate_when<F>(mut self, condition: F) -> Self
    where
        F: Fn(Option<&ResponseSnapshot>, Option<&Error>) -> bool + Send + Sync + 'static,
    {
        self.terminate = Some(Arc::new(condition));
        self
    }

    /// Wrapping hook composed around every physical call.
    pub fn aspect<A: Aspect + 'static>(mut self, aspect: A) -> Self {
        self.aspect = Some(Arc::new(aspect));
        self
    }

    /// Whether the engine drains each response body into memory before
    /// yielding (default `true`). Enabled, the underlying connection is
    /// released without any action from the caller and the yielded
    /// response is replayable; disabled, responses are yielded as live
    /// streams and their lifetime is the caller's responsibility.
    pub fn buffer_response_body(mut self, enabled: bool) -> Self {
        self.buffer_response_body = Some(enabled);
        self
    }

    /// Finalize the policy. A default transport is created here if none
    /// was supplied; there is no process-wide client singleton.
    pub fn build(self) -> Policy {
        Policy {
            client: self
                .client
                .unwrap_or_else(|| Arc::new(reqwest::Client::new())),
            content_type: self.content_type,
            headers: self.headers,
            max_attempts: self.max_attempts,
            interval: self.interval,
            period: self.period,
            deadline: self.deadline,
            terminate: self.terminate,
            aspect: self.aspect,
            buffer_response_body: self.buffer_response_body.unwrap_or(true),
        }
    }
}

impl fmt::Debug for PolicyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyBuilder")
            .field("max_attempts", &self.max_attempts)
            .field("interval", &self.interval)
            .field("period", &self.period)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
