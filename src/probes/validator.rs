//! # Subsystem validator.
//!
//! [`SystemValidator`] asks the display which of the expected named
//! subsystems exist and reports the missing ones. The supervisor runs it only
//! on every `validation_stride`-th cycle.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::WatchdogConfig;
use crate::error::ProbeError;
use crate::probes::{SubsystemStatus, scripts};
use crate::session::{ProbeExpr, SessionHandle, SessionProvider, deadline::probe_call};

/// Outcome of one validation probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationResult {
    /// Presence flag per expected subsystem.
    pub statuses: SubsystemStatus,
    /// True iff every expected subsystem is present.
    pub all_present: bool,
}

impl ValidationResult {
    /// Names of the subsystems reported absent.
    pub fn missing(&self) -> Vec<String> {
        self.statuses.missing()
    }
}

/// Checks presence of the configured subsystems.
pub struct SystemValidator {
    provider: Arc<dyn SessionProvider>,
    subsystems: Vec<String>,
    probe: ProbeExpr,
    timeout: Duration,
}

impl SystemValidator {
    /// Creates a validator for `cfg.subsystems`.
    pub fn new(provider: Arc<dyn SessionProvider>, cfg: &WatchdogConfig) -> Self {
        Self {
            provider,
            probe: scripts::validation(&cfg.subsystems),
            subsystems: cfg.subsystems.clone(),
            timeout: cfg.probe_timeout,
        }
    }

    /// Runs the validation probe once.
    pub async fn validate(&self, handle: &SessionHandle) -> Result<ValidationResult, ProbeError> {
        let value = probe_call(self.timeout, self.provider.evaluate(&handle.id, &self.probe)).await?;
        let systems = value
            .get("systems")
            .filter(|v| v.is_object())
            .ok_or_else(|| ProbeError::Malformed(format!("validation probe returned {value}")))?;

        Ok(self.interpret(systems))
    }

    fn interpret(&self, systems: &Value) -> ValidationResult {
        let mut statuses = SubsystemStatus::absent(self.subsystems.iter().cloned());
        statuses.apply_json(systems);
        ValidationResult {
            all_present: statuses.all_present(),
            statuses,
        }
    }
}
