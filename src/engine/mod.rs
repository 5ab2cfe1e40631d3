//! Retry-iteration engine.
//!
//! Drives one logical call through a sequence of physical attempts,
//! yielding each attempt's outcome to the caller as it is pulled.
//! Attempts are strictly sequential: the next physical call only starts
//! once the previous outcome has been consumed, and backoff sleeps run
//! at the start of the following pull, so a caller that stops pulling
//! never pays for work it did not ask for. Dropping the iterator is the
//! cancellation signal and releases everything immediately.

mod attempt;
mod backoff;

use std::time::Duration;

use futures::Stream;
use reqwest::header::{self, HeaderValue};
use reqwest::{Body, Method, Request, Response, Url};
use tokio::time::Instant;

use crate::body::{self, RewindableBody};
use crate::error::Error;
use crate::outcome::{Outcome, ResponseSnapshot};
use crate::policy::Policy;

use backoff::{AttemptView, Verdict};

/// Lazy sequence of attempt outcomes for one logical call.
///
/// Pull with [`Attempts::next`] until it returns `None` (the iteration
/// reached a stopping condition) or simply stop pulling / drop the
/// value to end the call early.
#[must_use = "attempts do nothing until pulled"]
pub struct Attempts {
    driver: Option<Driver>,
}

impl Attempts {
    pub(crate) fn new(method: Method, url: Url, body: Option<Body>, policy: Policy) -> Self {
        Self {
            driver: Some(Driver {
                limit: policy.max_attempts,
                policy,
                method,
                url,
                pending_body: body,
                body: RewindableBody::Empty,
                state: State::Init,
                made: 0,
                deadline: None,
            }),
        }
    }

    /// A sequence that yields nothing, used when the request could not
    /// be constructed at all.
    pub(crate) fn empty() -> Self {
        Self { driver: None }
    }

    /// The next attempt's outcome, or `None` once the iteration has
    /// terminated.
    pub async fn next(&mut self) -> Option<Outcome> {
        self.driver.as_mut()?.advance().await
    }

    /// Adapt the pull iterator into a [`futures::Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Outcome> {
        futures::stream::unfold(self, |mut attempts| async move {
            let outcome = attempts.next().await?;
            Some((outcome, attempts))
        })
    }
}

enum State {
    /// First pull: capture the body, then attempt.
    Init,
    /// A retry is scheduled after `wait`.
    Wait { wait: Duration },
    /// The iteration has terminated.
    Done,
}

struct Driver {
    policy: Policy,
    method: Method,
    url: Url,
    pending_body: Option<Body>,
    body: RewindableBody,
    state: State,
    /// Physical calls performed so far.
    made: u32,
    /// Effective attempt limit: the policy's `max_attempts`, clamped to
    /// one when the request body could not be fully captured.
    limit: u32,
    /// Overall deadline, fixed at the first pull.
    deadline: Option<Instant>,
}

impl Driver {
    async fn advance(&mut self) -> Option<Outcome> {
        // Unless a retry is scheduled below, the iteration is over.
        match std::mem::replace(&mut self.state, State::Done) {
            State::Done => None,
            State::Init => {
                self.deadline = self.policy.deadline.map(|d| Instant::now() + d);
                let captured = body::capture(self.pending_body.take()).await;
                if let Some(e) = captured.error {
                    tracing::warn!(
                        error = %e,
                        "request body could not be captured for replay; the request is performed only once"
                    );
                    self.limit = 1;
                }
                self.body = captured.body;
                self.run_attempt().await
            }
            State::Wait { wait } => {
                let wake = Instant::now() + wait;
                if let Some(deadline) = self.deadline {
                    if deadline <= wake {
                        tokio::time::sleep_until(deadline).await;
                        return Some(Outcome::from_error(Error::DeadlineExceeded));
                    }
                }
                tokio::time::sleep_until(wake).await;
                self.run_attempt().await
            }
        }
    }

    async fn run_attempt(&mut self) -> Option<Outcome> {
        let req = self.build_request();
        let (response, mut error) = attempt::run(&self.policy, req, self.deadline).await;
        self.made += 1;

        if error.as_ref().is_some_and(Error::is_deadline_exceeded) {
            return Some(Outcome::new(None, error));
        }

        // With buffering on (or a termination condition configured), the
        // body is drained once; the condition reads the snapshot and the
        // caller receives a replayable response over the same bytes.
        let mut snapshot = None;
        let response = match response {
            Some(live) if self.policy.wants_buffering() => {
                match buffer_response(live).await {
                    Ok((rebuilt, snap)) => {
                        snapshot = Some(snap);
                        Some(rebuilt)
                    }
                    Err(e) => {
                        error = Some(e);
                        None
                    }
                }
            }
            other => other,
        };

        let verdict = {
            let view = AttemptView {
                status: response.as_ref().map(|r| r.status()),
                headers: response.as_ref().map(|r| r.headers()),
                snapshot: snapshot.as_ref(),
                error: error.as_ref(),
            };
            backoff::decide(&self.policy, view, self.made - 1)
        };

        match verdict {
            Verdict::Success => Some(Outcome::new(response, error)),
            Verdict::ClientError { status } => {
                Some(Outcome::new(response, Some(Error::ClientError { status })))
            }
            Verdict::Retry { wait } => {
                let max = self.limit;
                if max == 0 || self.made < max {
                    tracing::debug!(
                        attempt = self.made,
                        wait_ms = wait.as_millis() as u64,
                        "scheduling retry"
                    );
                    self.state = State::Wait { wait };
                }
                Some(Outcome::new(response, error))
            }
        }
    }

    fn build_request(&self) -> Request {
        let mut req = Request::new(self.method.clone(), self.url.clone());
        if let Some(headers) = &self.policy.headers {
            *req.headers_mut() = headers.clone();
        }
        if let Some(content_type) = &self.policy.content_type {
            if self.method != Method::GET && self.method != Method::HEAD {
                match HeaderValue::from_str(content_type) {
                    Ok(value) => {
                        req.headers_mut().insert(header::CONTENT_TYPE, value);
                    }
                    Err(_) => {
                        tracing::warn!(
                            content_type = %content_type,
                            "content type is not a valid header value; not set"
                        );
                    }
                }
            }
        }
        *req.body_mut() = self.body.next_body();
        req
    }
}

/// Drain a live response into memory and rebuild it over the captured
/// bytes, keeping status, headers, version and URL intact.
async fn buffer_response(response: Response) -> Result<(Response, ResponseSnapshot), Error> {
    use reqwest::ResponseBuilderExt;

    let status = response.status();
    let version = response.version();
    let url = response.url().clone();
    let headers = response.headers().clone();
    let body = response.bytes().await.map_err(Error::from)?;

    let snapshot = ResponseSnapshot {
        status,
        headers: headers.clone(),
        body: body.clone(),
    };

    let mut builder = http::Response::builder()
        .status(status)
        .version(version)
        .url(url);
    if let Some(h) = builder.headers_mut() {
        *h = headers;
    }
    let rebuilt = builder
        .body(body)
        .map_err(|e| Error::Transport(Box::new(e)))?;
    Ok((Response::from(rebuilt), snapshot))
}
