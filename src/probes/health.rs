//! # Health monitor.
//!
//! [`HealthMonitor`] runs the lightweight liveness probe against a session.
//!
//! ## Rules
//! - Healthy requires the current address to start with the expected scheme
//!   **and** `document.readyState == "complete"`.
//! - Any probe failure (provider error, timeout, malformed payload) is
//!   `Unhealthy(Probe)`; nothing is propagated.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::WatchdogConfig;
use crate::error::ProbeError;
use crate::probes::scripts;
use crate::session::{SessionHandle, SessionProvider, deadline::probe_call};

/// Result of one health probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HealthStatus {
    /// The session is showing a page and reports it fully loaded.
    Healthy,
    /// The session is not usable as-is.
    Unhealthy(UnhealthyReason),
}

impl HealthStatus {
    /// Whether the session is healthy.
    #[inline]
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// Why a session was classified unhealthy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnhealthyReason {
    /// The session shows an address outside the expected scheme (e.g. `about:blank`).
    UnexpectedAddress {
        /// The address the session reported.
        address: String,
    },
    /// The page has not finished loading.
    NotReady {
        /// Reported `document.readyState` (or `"missing"`).
        ready_state: String,
    },
    /// The probe itself failed.
    Probe(ProbeError),
}

impl UnhealthyReason {
    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            UnhealthyReason::UnexpectedAddress { .. } => "unexpected_address",
            UnhealthyReason::NotReady { .. } => "not_ready",
            UnhealthyReason::Probe(_) => "probe_error",
        }
    }
}

impl fmt::Display for UnhealthyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnhealthyReason::UnexpectedAddress { address } => {
                write!(f, "page appears unloaded (address {address:?})")
            }
            UnhealthyReason::NotReady { ready_state } => {
                write!(f, "document not ready: {ready_state}")
            }
            UnhealthyReason::Probe(e) => write!(f, "{e}"),
        }
    }
}

/// Runs liveness probes against a session.
pub struct HealthMonitor {
    provider: Arc<dyn SessionProvider>,
    expected_scheme: String,
    timeout: Duration,
}

impl HealthMonitor {
    /// Creates a monitor using `cfg.expected_scheme` and `cfg.probe_timeout`.
    pub fn new(provider: Arc<dyn SessionProvider>, cfg: &WatchdogConfig) -> Self {
        Self {
            provider,
            expected_scheme: cfg.expected_scheme.to_ascii_lowercase(),
            timeout: cfg.probe_timeout,
        }
    }

    /// Probes `handle` once and classifies it.
    pub async fn probe(&self, handle: &SessionHandle) -> HealthStatus {
        let address = match probe_call(self.timeout, self.provider.current_address(&handle.id)).await {
            Ok(address) => address,
            Err(e) => return HealthStatus::Unhealthy(UnhealthyReason::Probe(e)),
        };
        if !self.scheme_matches(&address) {
            return HealthStatus::Unhealthy(UnhealthyReason::UnexpectedAddress { address });
        }

        match probe_call(self.timeout, self.provider.evaluate(&handle.id, &scripts::HEALTH)).await {
            Ok(value) => classify(&value),
            Err(e) => HealthStatus::Unhealthy(UnhealthyReason::Probe(e)),
        }
    }

    fn scheme_matches(&self, address: &str) -> bool {
        address
            .get(..self.expected_scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(&self.expected_scheme))
    }
}

fn classify(value: &Value) -> HealthStatus {
    if !value.is_object() {
        return HealthStatus::Unhealthy(UnhealthyReason::Probe(ProbeError::Malformed(format!(
            "health probe returned {value}"
        ))));
    }
    match value.get("readyState").and_then(Value::as_str) {
        Some("complete") => HealthStatus::Healthy,
        other => HealthStatus::Unhealthy(UnhealthyReason::NotReady {
            ready_state: other.unwrap_or("missing").to_string(),
        }),
    }
}
