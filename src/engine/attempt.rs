//! Single-attempt execution under a time budget.
//!
//! Each attempt runs on its own task so a deadline can pre-empt a
//! hanging transport call. On timeout the stale task is abandoned, not
//! joined: the transport call may keep running in the background and
//! its eventual result is discarded.

use std::sync::Arc;

use reqwest::{Request, Response};
use tokio::time::Instant;

use crate::client::Next;
use crate::error::Error;
use crate::policy::Policy;

/// Perform one physical call through the configured aspect, bounded by
/// the per-attempt period and the overall deadline.
pub(crate) async fn run(
    policy: &Policy,
    req: Request,
    overall_deadline: Option<Instant>,
) -> (Option<Response>, Option<Error>) {
    let client = Arc::clone(&policy.client);
    let aspect = policy.aspect.clone();
    let mut call = tokio::spawn(async move {
        let next = Next::new(client);
        match aspect {
            Some(aspect) => aspect.around(req, next).await,
            None => next.run(req).await,
        }
    });

    let period = policy.period;
    let attempt_deadline = (!period.is_zero()).then(|| Instant::now() + period);

    tokio::select! {
        biased;
        _ = sleep_until_opt(overall_deadline), if overall_deadline.is_some() => {
            (None, Some(Error::DeadlineExceeded))
        }
        _ = sleep_until_opt(attempt_deadline), if attempt_deadline.is_some() => {
            (None, Some(Error::AttemptTimeout { period }))
        }
        joined = &mut call => match joined {
            Ok(Ok(response)) => (Some(response), None),
            Ok(Err(error)) => (None, Some(error)),
            Err(join_error) => (None, Some(Error::Task(join_error))),
        },
    }
}

async fn sleep_until_opt(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
