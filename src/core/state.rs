//! Supervisor phases, restart reasons and per-cycle state.

use std::fmt;

use tokio::time::Instant;

use crate::probes::SubsystemStatus;
use crate::sequence::{DrawNumber, SequenceGapDetector};

/// Phase of the supervisor state machine.
///
/// ```text
/// Initializing ─► Monitoring ⇄ Degraded
///                    │  ▲          │
///                    ▼  │          ▼
///                  Restarting ◄────┘
///
/// any ─► ShuttingDown ─► Stopped
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Acquiring the first session.
    Initializing,
    /// Running probes against a healthy session.
    Monitoring,
    /// The session failed a health probe; reload in progress.
    Degraded,
    /// The session is being replaced.
    Restarting,
    /// Cancellation observed; releasing the session.
    ShuttingDown,
    /// Terminal.
    Stopped,
}

impl Phase {
    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Phase::Initializing => "initializing",
            Phase::Monitoring => "monitoring",
            Phase::Degraded => "degraded",
            Phase::Restarting => "restarting",
            Phase::ShuttingDown => "shutting_down",
            Phase::Stopped => "stopped",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Why the session was replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestartReason {
    /// The proactive restart interval elapsed.
    Planned,
    /// Unhealthy, and a reload did not help.
    Unhealthy,
    /// Subsystems missing, or the validation probe failed.
    ValidationFailed,
    /// A sequence gap with emergency restart enabled.
    SequenceGap,
    /// No session was held at cycle start (an earlier replace was cut short).
    SessionLost,
}

impl RestartReason {
    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RestartReason::Planned => "planned",
            RestartReason::Unhealthy => "unhealthy",
            RestartReason::ValidationFailed => "validation_failed",
            RestartReason::SequenceGap => "sequence_gap",
            RestartReason::SessionLost => "session_lost",
        }
    }
}

impl fmt::Display for RestartReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Status line of one completed cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleReport {
    /// Cycle number (1-based).
    pub cycle: u64,
    /// Draw number read this cycle (`Unknown` if not fetched).
    pub draw: DrawNumber,
    /// Spins rendered so far.
    pub spins: u64,
    /// Subsystems currently present.
    pub present: usize,
    /// Subsystems tracked.
    pub total: usize,
    /// Tab visibility reported by the display.
    pub tab_visible: Option<bool>,
}

/// Everything the supervisor mutates between cycles.
pub(crate) struct SupervisorState {
    pub(crate) phase: Phase,
    pub(crate) cycle: u64,
    pub(crate) detector: SequenceGapDetector,
    pub(crate) subsystems: SubsystemStatus,
    pub(crate) started: Instant,
    pub(crate) last_restart: Instant,
    pub(crate) restarts: u64,
    pub(crate) consecutive_faults: u32,
}

impl SupervisorState {
    pub(crate) fn new(retention: usize, subsystems: &[String]) -> Self {
        let now = Instant::now();
        Self {
            phase: Phase::Initializing,
            cycle: 0,
            detector: SequenceGapDetector::new(retention),
            subsystems: SubsystemStatus::absent(subsystems.iter().cloned()),
            started: now,
            last_restart: now,
            restarts: 0,
            consecutive_faults: 0,
        }
    }
}
