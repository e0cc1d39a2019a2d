//! # Runtime events emitted by the watchdog.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Session events**: acquire, reload, release of the supervised session
//! - **Probe events**: health, validation and draw-sequence findings
//! - **Recovery events**: restarts, cycle faults, backoff
//! - **Shutdown events**: shutdown request, grace, final summary
//!
//! The [`Event`] struct carries optional metadata (session id, cycle number,
//! draw number, reasons, delays) depending on the kind.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use drawwatch::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::HealthUnhealthy)
//!     .with_session("abc123")
//!     .with_cycle(12)
//!     .with_reason("document not ready: loading");
//!
//! assert_eq!(ev.kind, EventKind::HealthUnhealthy);
//! assert_eq!(ev.session.as_deref(), Some("abc123"));
//! assert_eq!(ev.cycle, Some(12));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::{CycleReport, RestartReason, SessionSummary};
use crate::sequence::SequenceGap;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Session events ===
    /// A session was created and reported readiness.
    ///
    /// Sets: `session`, `reason` (target address)
    SessionAcquired,

    /// A session could not be created or did not become ready.
    ///
    /// Sets: `session` (if one was created), `reason`
    SessionLoadFailed,

    /// The current session was re-navigated and is ready again.
    ///
    /// Sets: `session`
    SessionReloaded,

    /// The session was terminated.
    ///
    /// Sets: `session`
    SessionReleased,

    /// Terminating the session failed; the failure was swallowed.
    ///
    /// Sets: `session`, `reason`
    SessionReleaseFailed,

    // === Probe events ===
    /// The health probe classified the session as unhealthy.
    ///
    /// Sets: `session`, `cycle`, `reason`
    HealthUnhealthy,

    /// Every expected subsystem is present.
    ///
    /// Sets: `session`, `cycle`
    ValidationPassed,

    /// One or more subsystems are missing, or the probe failed.
    ///
    /// Sets: `session`, `cycle`, `reason` (missing names or probe error)
    ValidationFailed,

    /// The draw counter moved backwards (informational).
    ///
    /// Sets: `cycle`, `draw` (new value), `reason`
    DrawRegressed,

    /// A forward jump in the draw counter was detected.
    ///
    /// Sets: `cycle`, `draw`, `gap`
    SequenceGapDetected,

    // === Recovery events ===
    /// The session is about to be replaced.
    ///
    /// Sets: `session`, `cycle`, `restart`
    RestartRequested,

    /// The session was replaced; the proactive timer was reset.
    ///
    /// Sets: `session` (new), `restart`
    RestartSucceeded,

    /// Replacing the session failed; the watchdog will stop.
    ///
    /// Sets: `restart`, `reason`
    RestartFailed,

    /// A cycle ended in an unexpected fault.
    ///
    /// Sets: `cycle`, `reason`
    CycleFault,

    /// The loop pauses before the next cycle because of a fault.
    ///
    /// Sets: `cycle`, `delay_ms`
    BackoffScheduled,

    /// A cycle finished; carries the status line.
    ///
    /// Sets: `cycle`, `session`, `draw`, `report`
    CycleCompleted,

    // === Shutdown events ===
    /// Shutdown requested (signal or token cancellation).
    ShutdownRequested,

    /// The in-flight cycle did not finish within the grace period and was abandoned.
    ///
    /// Sets: `timeout_ms` (grace)
    GraceExceeded,

    /// Final session summary.
    ///
    /// Sets: `summary`
    SummaryReported,

    /// The watchdog reached its terminal state.
    Stopped,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Session identifier, if applicable.
    pub session: Option<Arc<str>>,
    /// Monitoring cycle number (1-based).
    pub cycle: Option<u64>,
    /// Draw number, if applicable.
    pub draw: Option<i64>,
    /// Delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
    /// Why a restart happened.
    pub restart: Option<RestartReason>,
    /// Per-cycle status (for `CycleCompleted`).
    pub report: Option<Arc<CycleReport>>,
    /// Gap record (for `SequenceGapDetected`).
    pub gap: Option<Arc<SequenceGap>>,
    /// Final summary (for `SummaryReported`).
    pub summary: Option<Arc<SessionSummary>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            session: None,
            cycle: None,
            draw: None,
            delay_ms: None,
            timeout_ms: None,
            reason: None,
            restart: None,
            report: None,
            gap: None,
            summary: None,
        }
    }

    /// Attaches a session identifier.
    #[inline]
    pub fn with_session(mut self, id: impl AsRef<str>) -> Self {
        self.session = Some(Arc::from(id.as_ref()));
        self
    }

    /// Attaches a cycle number.
    #[inline]
    pub fn with_cycle(mut self, cycle: u64) -> Self {
        self.cycle = Some(cycle);
        self
    }

    /// Attaches a draw number.
    #[inline]
    pub fn with_draw(mut self, draw: i64) -> Self {
        self.draw = Some(draw);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a timeout (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a restart reason.
    #[inline]
    pub fn with_restart(mut self, reason: RestartReason) -> Self {
        self.restart = Some(reason);
        self
    }

    /// Attaches a cycle report.
    #[inline]
    pub fn with_report(mut self, report: CycleReport) -> Self {
        self.report = Some(Arc::new(report));
        self
    }

    /// Attaches a gap record.
    #[inline]
    pub fn with_gap(mut self, gap: SequenceGap) -> Self {
        self.gap = Some(Arc::new(gap));
        self
    }

    /// Attaches the final summary.
    #[inline]
    pub fn with_summary(mut self, summary: SessionSummary) -> Self {
        self.summary = Some(Arc::new(summary));
        self
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::ShutdownRequested);
        let b = Event::new(EventKind::Stopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_are_compacted() {
        let ev = Event::new(EventKind::BackoffScheduled).with_delay(Duration::from_secs(10));
        assert_eq!(ev.delay_ms, Some(10_000));

        let huge = Event::new(EventKind::GraceExceeded).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(huge.timeout_ms, Some(u32::MAX));
    }
}
