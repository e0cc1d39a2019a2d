//! Error types used by the drawwatch runtime and its session boundary.
//!
//! This module defines the error kinds that cross component boundaries:
//!
//! - [`ProviderError`] — raw failures reported by a [`SessionProvider`](crate::SessionProvider).
//! - [`SessionError`] — lifecycle failures (create, load, teardown deadlines).
//! - [`ProbeError`] — failures of a single health/validation/draw probe.
//! - [`CycleError`] — unexpected faults caught at the cycle boundary.
//! - [`WatchdogError`] — the two fatal conditions that stop the watchdog.
//!
//! Every session-boundary failure is translated into one of these at the call
//! site, so the supervisor never sees an untyped error. All types provide
//! `as_label` for logs.

use std::time::Duration;
use thiserror::Error;

/// # Errors reported by a session provider.
///
/// Providers translate their transport/protocol failures into these variants.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider could not be reached (connection refused, I/O error).
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with an error payload.
    #[error("provider rejected request ({code}): {message}")]
    Rejected {
        /// Provider-specific error code (e.g. WebDriver `"no such window"`).
        code: String,
        /// Human-readable message from the provider.
        message: String,
    },

    /// The session id is not (or no longer) known to the provider.
    #[error("unknown session {0}")]
    UnknownSession(String),

    /// The provider answered, but the payload did not have the expected shape.
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProviderError::Transport(_) => "provider_transport",
            ProviderError::Rejected { .. } => "provider_rejected",
            ProviderError::UnknownSession(_) => "provider_unknown_session",
            ProviderError::Malformed(_) => "provider_malformed",
        }
    }
}

/// # Errors produced by the session lifecycle.
///
/// `CreateFailed` and `LoadTimeout` are fatal during initialization and after a
/// failed restart; the supervisor decides, this type only describes.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The provider could not create a session.
    #[error("session create failed: {reason}")]
    CreateFailed {
        /// Underlying failure message.
        reason: String,
    },

    /// The session never reported readiness within the bounded wait.
    #[error("session did not become ready within {timeout:?}")]
    LoadTimeout {
        /// The load timeout that elapsed.
        timeout: Duration,
    },

    /// Navigating the session to its target failed.
    #[error("session load failed: {reason}")]
    LoadFailed {
        /// Underlying failure message.
        reason: String,
    },

    /// A boundary call did not return before its deadline.
    #[error("{op} did not return within {timeout:?}")]
    Deadline {
        /// Name of the boundary operation.
        op: &'static str,
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// Terminating a session failed (logged and swallowed by the manager).
    #[error("session release failed: {reason}")]
    ReleaseFailed {
        /// Underlying failure message.
        reason: String,
    },

    /// An operation needed a session but none is held.
    #[error("no session is currently held")]
    NoSession,
}

impl SessionError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use drawwatch::SessionError;
    /// use std::time::Duration;
    ///
    /// let err = SessionError::LoadTimeout { timeout: Duration::from_secs(30) };
    /// assert_eq!(err.as_label(), "session_load_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SessionError::CreateFailed { .. } => "session_create_failed",
            SessionError::LoadTimeout { .. } => "session_load_timeout",
            SessionError::LoadFailed { .. } => "session_load_failed",
            SessionError::Deadline { .. } => "session_deadline",
            SessionError::ReleaseFailed { .. } => "session_release_failed",
            SessionError::NoSession => "session_missing",
        }
    }
}

/// # Errors produced by one probe against the session.
///
/// Always recoverable. Health probes fold these into
/// [`UnhealthyReason::Probe`](crate::UnhealthyReason::Probe).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The provider reported a failure while running the probe.
    #[error("probe failed: {0}")]
    Provider(#[from] ProviderError),

    /// The probe did not return before its deadline.
    #[error("probe timed out after {timeout:?}")]
    Timeout {
        /// The probe deadline that elapsed.
        timeout: Duration,
    },

    /// The probe returned data that could not be interpreted.
    #[error("malformed probe result: {0}")]
    Malformed(String),
}

impl ProbeError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProbeError::Provider(_) => "probe_provider",
            ProbeError::Timeout { .. } => "probe_timeout",
            ProbeError::Malformed(_) => "probe_malformed",
        }
    }
}

/// # Unexpected faults caught at the cycle boundary.
///
/// A cycle that ends with one of these is treated as transient: the supervisor
/// backs off and re-enters monitoring with the same session and counters.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CycleError {
    /// A probe failed somewhere no recovery action is defined (draw fetch).
    #[error("probe fault: {0}")]
    Probe(#[from] ProbeError),

    /// The cycle panicked.
    #[error("cycle panicked: {info}")]
    Panicked {
        /// Panic payload rendered to text.
        info: String,
    },
}

impl CycleError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CycleError::Probe(_) => "cycle_probe_fault",
            CycleError::Panicked { .. } => "cycle_panicked",
        }
    }
}

/// # Fatal errors that terminate the watchdog.
///
/// These are the only conditions under which the process exits non-zero.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WatchdogError {
    /// No session could be acquired at startup.
    #[error("initial session acquisition failed: {source}")]
    InitialAcquire {
        /// The lifecycle failure.
        #[source]
        source: SessionError,
    },

    /// A restart failed; no further automatic retry is attempted.
    #[error("session restart failed, giving up: {source}")]
    RestartExhausted {
        /// The lifecycle failure.
        #[source]
        source: SessionError,
    },
}

impl WatchdogError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use drawwatch::{SessionError, WatchdogError};
    ///
    /// let err = WatchdogError::RestartExhausted { source: SessionError::NoSession };
    /// assert_eq!(err.as_label(), "watchdog_restart_exhausted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WatchdogError::InitialAcquire { .. } => "watchdog_initial_acquire",
            WatchdogError::RestartExhausted { .. } => "watchdog_restart_exhausted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_error_wraps_provider_error() {
        let err: ProbeError = ProviderError::Transport("refused".into()).into();
        assert_eq!(err.as_label(), "probe_provider");
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn cycle_error_wraps_probe_error() {
        let err: CycleError = ProbeError::Timeout {
            timeout: Duration::from_secs(1),
        }
        .into();
        assert_eq!(err.as_label(), "cycle_probe_fault");
    }
}
