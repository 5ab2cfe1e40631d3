//! Retry decision and wait computation.
//!
//! Given one attempt's result, classify it as terminal or retryable and,
//! when retrying, compute how long to wait: the policy's fixed interval,
//! a 429's `Retry-After` header, or jittered exponential backoff.

use std::time::{Duration, SystemTime};

use rand::Rng;
use reqwest::header::{self, HeaderMap};
use reqwest::StatusCode;

use crate::error::Error;
use crate::outcome::ResponseSnapshot;
use crate::policy::Policy;

/// Caps the backoff ceiling at `2^16` seconds (~18 hours).
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// What one attempt's result looks like to the decision engine. The
/// snapshot is present whenever a termination condition is configured.
pub(crate) struct AttemptView<'a> {
    pub status: Option<StatusCode>,
    pub headers: Option<&'a HeaderMap>,
    pub snapshot: Option<&'a ResponseSnapshot>,
    pub error: Option<&'a Error>,
}

/// Decision for one attempt.
#[derive(Debug)]
pub(crate) enum Verdict {
    /// Terminal; the outcome is yielded as-is and the sequence ends.
    Success,
    /// Terminal 4xx (other than 429); the outcome carries the
    /// client-error termination.
    ClientError { status: StatusCode },
    /// Not terminal; wait, rewind and go again (attempt limit
    /// permitting).
    Retry { wait: Duration },
}

/// Classify one attempt and compute the wait for a retry.
///
/// `attempt_index` is the zero-based index of the attempt just made;
/// backoff grows with it.
///
/// Precedence: 429 always retries, `Retry-After` controlling the wait
/// when parsable. A configured termination condition otherwise has the
/// final word, including the power to veto the default "4xx is
/// terminal" rule. Without one, anything below 400 ends the iteration
/// and 5xx retries.
pub(crate) fn decide(policy: &Policy, view: AttemptView<'_>, attempt_index: u32) -> Verdict {
    let mut wait = policy.interval;

    if let Some(status) = view.status {
        if status == StatusCode::TOO_MANY_REQUESTS {
            if let Some(from_header) = view.headers.and_then(retry_after) {
                wait = from_header;
            }
        } else if status.is_client_error() {
            match &policy.terminate {
                None => return Verdict::ClientError { status },
                Some(condition) => {
                    let prospective = Error::ClientError { status };
                    if condition(view.snapshot, Some(&prospective)) {
                        return Verdict::ClientError { status };
                    }
                    // Vetoed: the 4xx is retried like a server error.
                }
            }
        } else if let Some(condition) = &policy.terminate {
            if condition(view.snapshot, view.error) {
                return Verdict::Success;
            }
        } else if status.as_u16() < 400 {
            return Verdict::Success;
        }
    }

    if wait.is_zero() {
        wait = backoff(attempt_index);
    }
    Verdict::Retry { wait }
}

/// Jittered exponential backoff: uniform over `[0, 2^(attempt_index+1))`
/// seconds, capped.
pub(crate) fn backoff(attempt_index: u32) -> Duration {
    let exp = attempt_index.saturating_add(1).min(MAX_BACKOFF_EXPONENT);
    let ceiling = Duration::from_secs(1u64 << exp);
    let nanos = rand::rng().random_range(0..ceiling.as_nanos() as u64);
    Duration::from_nanos(nanos)
}

/// Wait requested by a `Retry-After` header: delta-seconds, a duration
/// string such as `7s` or `1m30s`, or an HTTP-date. A malformed value
/// is logged and ignored (default backoff applies).
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(header::RETRY_AFTER)?;
    let raw = match value.to_str() {
        Ok(s) => s.trim(),
        Err(_) => {
            tracing::error!("server returned a non-ASCII Retry-After header");
            return None;
        }
    };
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    if let Some(wait) = parse_duration(raw) {
        return Some(wait);
    }
    match httpdate::parse_http_date(raw) {
        Ok(when) => Some(
            when.duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO),
        ),
        Err(_) => {
            tracing::error!(retry_after = raw, "server returned an unparsable Retry-After header");
            None
        }
    }
}

/// Duration string: one or more integer/unit terms (`ns`, `us`, `ms`,
/// `s`, `m`, `h`), e.g. `7s`, `500ms`, `1m30s`.
fn parse_duration(raw: &str) -> Option<Duration> {
    if raw.is_empty() {
        return None;
    }
    let mut rest = raw;
    let mut nanos: u128 = 0;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 || digits == rest.len() {
            return None;
        }
        let value: u128 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];
        let per_unit: u128 = if let Some(t) = rest.strip_prefix("ns") {
            rest = t;
            1
        } else if let Some(t) = rest.strip_prefix("us") {
            rest = t;
            1_000
        } else if let Some(t) = rest.strip_prefix("ms") {
            rest = t;
            1_000_000
        } else if let Some(t) = rest.strip_prefix('s') {
            rest = t;
            1_000_000_000
        } else if let Some(t) = rest.strip_prefix('m') {
            rest = t;
            60 * 1_000_000_000
        } else if let Some(t) = rest.strip_prefix('h') {
            rest = t;
            3_600 * 1_000_000_000
        } else {
            return None;
        };
        nanos = nanos.checked_add(value.checked_mul(per_unit)?)?;
    }
    Some(Duration::from_nanos(u64::try_from(nanos).ok()?))
}
