//! Resilient HTTP request iteration.
//!
//! `encore` turns one logical HTTP call into a policy-governed sequence
//! of physical attempts. Each attempt's outcome is yielded lazily to
//! the caller; the iteration stops when a request succeeds, a 4xx
//! (other than 429) terminates it, a caller-supplied condition fires,
//! the attempt limit or overall deadline is reached, or the caller
//! simply stops pulling.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! # async fn demo() {
//! let policy = encore::Policy::builder()
//!     .max_attempts(5)
//!     .period(Duration::from_secs(10))
//!     .build();
//!
//! let mut attempts = encore::get("https://example.com/health", policy);
//! while let Some(outcome) = attempts.next().await {
//!     match (outcome.response, outcome.error) {
//!         (Some(res), None) => println!("got {}", res.status()),
//!         (_, Some(err)) => eprintln!("attempt failed: {err}"),
//!         _ => {}
//!     }
//! }
//! # }
//! ```
//!
//! Waits between attempts use jittered exponential backoff unless a
//! fixed interval is configured; a 429's `Retry-After` header (delta
//! seconds, a duration string such as `7s`, or an HTTP-date) overrides
//! either. The transport is pluggable
//! via [`HttpClient`], and an [`Aspect`] can be wrapped around every
//! physical call.

pub mod content_type;

mod body;
mod client;
mod engine;
mod error;
mod outcome;
mod policy;

pub use client::{Aspect, HttpClient, Next};
pub use engine::Attempts;
pub use error::{BoxError, Error};
pub use outcome::{Outcome, ResponseSnapshot};
pub use policy::{Policy, PolicyBuilder, TerminationCondition};

// The transport's request/response vocabulary is part of this crate's API.
pub use reqwest;

use reqwest::{Body, Method, Url};
use url::form_urlencoded;

/// Send HTTP HEAD requests until a stopping condition fires.
pub fn head(url: &str, policy: Policy) -> Attempts {
    request(Method::HEAD, url, None, policy)
}

/// Send HTTP GET requests until a stopping condition fires.
pub fn get(url: &str, policy: Policy) -> Attempts {
    request(Method::GET, url, None, policy)
}

/// Send HTTP POST requests with the given body until a stopping
/// condition fires. The body is captured once and replayed on every
/// attempt.
pub fn post(url: &str, body: impl Into<Body>, policy: Policy) -> Attempts {
    request(Method::POST, url, Some(body.into()), policy)
}

/// Send HTTP PUT requests with the given body until a stopping
/// condition fires.
pub fn put(url: &str, body: impl Into<Body>, policy: Policy) -> Attempts {
    request(Method::PUT, url, Some(body.into()), policy)
}

/// Send HTTP PATCH requests with the given body until a stopping
/// condition fires.
pub fn patch(url: &str, body: impl Into<Body>, policy: Policy) -> Attempts {
    request(Method::PATCH, url, Some(body.into()), policy)
}

/// Send HTTP DELETE requests with the given body until a stopping
/// condition fires.
pub fn delete(url: &str, body: impl Into<Body>, policy: Policy) -> Attempts {
    request(Method::DELETE, url, Some(body.into()), policy)
}

/// Send form-encoded HTTP POST requests until a stopping condition
/// fires. The pairs are URL-encoded into the body (repeat a key for
/// multi-value fields) and the content type is forced to
/// `application/x-www-form-urlencoded`, overriding any value on the
/// policy.
pub fn post_form<'a, I>(url: &str, form: I, mut policy: Policy) -> Attempts
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let encoded = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form)
        .finish();
    policy.content_type = Some(content_type::APPLICATION_FORM_URL_ENCODED.to_string());
    request(Method::POST, url, Some(encoded.into()), policy)
}

/// General form of the per-verb helpers. An unparsable URL yields an
/// empty sequence: no attempts are made.
pub fn request(method: Method, url: &str, body: Option<Body>, policy: Policy) -> Attempts {
    match Url::parse(url) {
        Ok(url) => Attempts::new(method, url, body, policy),
        Err(e) => {
            tracing::error!(url, error = %e, "request could not be constructed");
            Attempts::empty()
        }
    }
}
