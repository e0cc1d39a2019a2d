//! # Draw state fetch.
//!
//! [`DrawProbe`] reads the display's current draw number together with the
//! details logged in each cycle's status line.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;

use crate::config::WatchdogConfig;
use crate::error::ProbeError;
use crate::probes::{SubsystemStatus, scripts};
use crate::sequence::{DrawNumber, DrawObservation};
use crate::session::{ProbeExpr, SessionHandle, SessionProvider, deadline::probe_call};

/// Everything one draw fetch reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawState {
    /// The draw counter reading.
    pub observation: DrawObservation,
    /// Number of spins rendered so far.
    pub rolled_count: u64,
    /// Whether the display believes its tab is visible (`None` = unknown).
    pub tab_visible: Option<bool>,
    /// Subsystem presence reported alongside the draw, if any.
    pub systems: Option<SubsystemStatus>,
}

impl DrawState {
    /// Interprets a draw-state probe payload.
    ///
    /// Missing fields degrade to `unknown`/`0`; only a non-object payload is an error.
    pub fn from_json(value: &Value, subsystems: &[String]) -> Result<Self, ProbeError> {
        if !value.is_object() {
            return Err(ProbeError::Malformed(format!("draw probe returned {value}")));
        }

        let draw_number = value
            .get("currentDrawNumber")
            .map(DrawNumber::from_json)
            .unwrap_or(DrawNumber::Unknown);

        let systems = value.get("systems").filter(|v| v.is_object()).map(|obj| {
            let mut status = SubsystemStatus::absent(subsystems.iter().cloned());
            status.apply_json(obj);
            status
        });

        Ok(Self {
            observation: DrawObservation {
                draw_number,
                observed_at: Utc::now(),
            },
            rolled_count: value
                .get("rolledNumbersCount")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            tab_visible: value.get("tabVisibilityState").and_then(Value::as_bool),
            systems,
        })
    }
}

/// Fetches the current draw state from a session.
pub struct DrawProbe {
    provider: Arc<dyn SessionProvider>,
    probe: ProbeExpr,
    subsystems: Vec<String>,
    timeout: Duration,
}

impl DrawProbe {
    /// Creates a probe that also reports `cfg.subsystems` presence.
    pub fn new(provider: Arc<dyn SessionProvider>, cfg: &WatchdogConfig) -> Self {
        Self {
            provider,
            probe: scripts::draw_state(&cfg.subsystems),
            subsystems: cfg.subsystems.clone(),
            timeout: cfg.probe_timeout,
        }
    }

    /// Runs the draw-state probe once.
    pub async fn fetch(&self, handle: &SessionHandle) -> Result<DrawState, ProbeError> {
        let value = probe_call(self.timeout, self.provider.evaluate(&handle.id, &self.probe)).await?;
        DrawState::from_json(&value, &self.subsystems)
    }
}
