//! Transport seam and wrapping hook.
//!
//! The engine never talks to the network directly: every physical call
//! goes through an [`HttpClient`], optionally wrapped by an [`Aspect`]
//! the caller composes around it.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Request, Response};

use crate::error::Error;

/// Abstraction over the HTTP transport. The default implementation is
/// [`reqwest::Client`]; tests and callers may supply their own.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform one physical request/response exchange.
    async fn execute(&self, req: Request) -> Result<Response, Error>;
}

#[async_trait]
impl HttpClient for reqwest::Client {
    async fn execute(&self, req: Request) -> Result<Response, Error> {
        reqwest::Client::execute(self, req).await.map_err(Error::from)
    }
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn execute(&self, req: Request) -> Result<Response, Error> {
        (**self).execute(req).await
    }
}

/// Continuation handed to an [`Aspect`]: calling [`Next::run`] performs
/// the actual transport call for the current attempt.
pub struct Next {
    client: Arc<dyn HttpClient>,
}

impl Next {
    pub(crate) fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    /// Forward the request to the underlying transport.
    pub async fn run(self, req: Request) -> Result<Response, Error> {
        self.client.execute(req).await
    }
}

/// Wrapping hook composed around each physical call. It may rewrite the
/// request, inspect or replace the response, or short-circuit without
/// calling [`Next::run`] at all. The engine invokes it exactly once per
/// attempt; identity passthrough when none is configured.
#[async_trait]
pub trait Aspect: Send + Sync {
    async fn around(&self, req: Request, next: Next) -> Result<Response, Error>;
}
