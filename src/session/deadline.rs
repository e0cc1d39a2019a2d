//! # Deadlines for session-boundary calls.
//!
//! Every call into a [`SessionProvider`](crate::SessionProvider) goes through
//! one of these helpers, so a provider that never answers cannot hang the
//! supervisor.
//!
//! ```text
//! call ──► time::timeout(dur, fut)
//!            ├─ Ok(Ok(v))   → Ok(v)
//!            ├─ Ok(Err(e))  → Err(map(e))
//!            └─ Err(elapsed)→ Err(on_timeout)
//! ```
//!
//! A zero duration disables the deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time;

use crate::error::{ProbeError, ProviderError, SessionError};

/// Runs a lifecycle call with a deadline, mapping provider errors with `map`.
pub(crate) async fn lifecycle_call<T, F>(
    op: &'static str,
    timeout: Duration,
    fut: F,
    map: impl FnOnce(ProviderError) -> SessionError,
) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match bounded(timeout, fut).await {
        Some(res) => res.map_err(map),
        None => Err(SessionError::Deadline { op, timeout }),
    }
}

/// Runs a probe call with a deadline.
pub(crate) async fn probe_call<T, F>(timeout: Duration, fut: F) -> Result<T, ProbeError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match bounded(timeout, fut).await {
        Some(res) => res.map_err(ProbeError::from),
        None => Err(ProbeError::Timeout { timeout }),
    }
}

async fn bounded<F: Future>(timeout: Duration, fut: F) -> Option<F::Output> {
    if timeout.is_zero() {
        return Some(fut.await);
    }
    time::timeout(timeout, fut).await.ok()
}
