//! # Tracing subscriber for runtime events.
//!
//! [`LogWriter`] turns every runtime [`Event`] into one `tracing` record under
//! the `drawwatch::events` target, so the binary's `tracing-subscriber` setup
//! decides where status lines end up.
//!
//! ## Output (fmt layer)
//! ```text
//! INFO  session acquired session=4f1c.. address=http://localhost/slipp/tvdisplay/index.html
//! INFO  cycle status cycle=12 draw=1042 spins=37 systems=4/4 tab_visible=true
//! ERROR sequence gap detected from=1042 to=1045 missing=[1043, 1044]
//! WARN  restart requested reason=sequence_gap cycle=13
//! INFO  session summary summary={"uptime_secs":...}
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Writes runtime events as structured `tracing` records.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Creates the writer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let session = e.session.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::SessionAcquired => {
                info!(target: "drawwatch::events", session, address = reason, "session acquired");
            }
            EventKind::SessionLoadFailed => {
                error!(target: "drawwatch::events", session, reason, "session failed to load");
            }
            EventKind::SessionReloaded => {
                info!(target: "drawwatch::events", session, "session reloaded");
            }
            EventKind::SessionReleased => {
                info!(target: "drawwatch::events", session, "session released");
            }
            EventKind::SessionReleaseFailed => {
                warn!(target: "drawwatch::events", session, reason, "session release failed");
            }
            EventKind::HealthUnhealthy => {
                warn!(target: "drawwatch::events", session, cycle = ?e.cycle, reason, "health check failed");
            }
            EventKind::ValidationPassed => {
                info!(target: "drawwatch::events", cycle = ?e.cycle, "all subsystems validated");
            }
            EventKind::ValidationFailed => {
                warn!(target: "drawwatch::events", cycle = ?e.cycle, reason, "subsystem validation failed");
            }
            EventKind::DrawRegressed => {
                info!(target: "drawwatch::events", draw = ?e.draw, reason, "draw number moved backwards");
            }
            EventKind::SequenceGapDetected => match e.gap.as_deref() {
                Some(gap) => error!(
                    target: "drawwatch::events",
                    from = gap.from,
                    to = gap.to,
                    gap_size = gap.gap_size,
                    missing = ?gap.missing,
                    truncated = gap.truncated,
                    "sequence gap detected"
                ),
                None => error!(target: "drawwatch::events", draw = ?e.draw, "sequence gap detected"),
            },
            EventKind::RestartRequested => {
                let why = e.restart.map(|r| r.as_label()).unwrap_or("-");
                warn!(target: "drawwatch::events", session, cycle = ?e.cycle, reason = why, "restart requested");
            }
            EventKind::RestartSucceeded => {
                info!(target: "drawwatch::events", session, "session restarted");
            }
            EventKind::RestartFailed => {
                error!(target: "drawwatch::events", reason, "session restart failed");
            }
            EventKind::CycleFault => {
                error!(target: "drawwatch::events", cycle = ?e.cycle, reason, "unexpected cycle fault");
            }
            EventKind::BackoffScheduled => {
                debug!(target: "drawwatch::events", cycle = ?e.cycle, delay_ms = ?e.delay_ms, "backing off");
            }
            EventKind::CycleCompleted => {
                if let Some(r) = e.report.as_deref() {
                    let systems = format!("{}/{}", r.present, r.total);
                    info!(
                        target: "drawwatch::events",
                        cycle = r.cycle,
                        draw = %r.draw,
                        spins = r.spins,
                        systems = %systems,
                        tab_visible = ?r.tab_visible,
                        "cycle status"
                    );
                }
            }
            EventKind::ShutdownRequested => {
                info!(target: "drawwatch::events", "shutdown requested");
            }
            EventKind::GraceExceeded => {
                warn!(target: "drawwatch::events", grace_ms = ?e.timeout_ms, "in-flight cycle abandoned after grace");
            }
            EventKind::SummaryReported => {
                if let Some(summary) = e.summary.as_deref() {
                    match serde_json::to_string(summary) {
                        Ok(json) => info!(target: "drawwatch::events", summary = %json, "session summary"),
                        Err(err) => warn!(target: "drawwatch::events", error = %err, "summary not serializable"),
                    }
                    if !summary.gaps.is_empty() {
                        warn!(
                            target: "drawwatch::events",
                            gaps = summary.gaps.len(),
                            missing_draws = summary.missing_draws(),
                            "gaps detected during session"
                        );
                    }
                }
            }
            EventKind::Stopped => {
                info!(target: "drawwatch::events", "watchdog stopped");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
