//! # Final session summary.
//!
//! Produced once when the watchdog stops, gracefully or not.

use serde::Serialize;

use crate::probes::SubsystemStatus;
use crate::sequence::SequenceGap;

/// What the watchdog saw over its lifetime.
///
/// # Example
/// ```
/// use drawwatch::SessionSummary;
///
/// let summary = SessionSummary::default();
/// let json = serde_json::to_value(&summary).unwrap();
/// assert_eq!(json["draws_observed"], 0);
/// assert!(json["last_draw_number"].is_null());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Seconds since the watchdog started.
    pub uptime_secs: u64,
    /// Monitoring cycles started.
    pub cycles: u64,
    /// Last known draw number.
    pub last_draw_number: Option<i64>,
    /// Known draw numbers observed.
    pub draws_observed: u64,
    /// Observations currently retained in history.
    pub history_len: usize,
    /// Sessions replaced after the initial acquire.
    pub restarts: u64,
    /// Every gap detected, oldest first.
    pub gaps: Vec<SequenceGap>,
    /// Last known subsystem presence.
    pub subsystems: SubsystemStatus,
}

impl SessionSummary {
    /// Total number of draws reported missing across all gaps.
    pub fn missing_draws(&self) -> u64 {
        self.gaps.iter().map(|g| g.gap_size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn serializes_gap_log() {
        let summary = SessionSummary {
            uptime_secs: 3600,
            cycles: 240,
            last_draw_number: Some(105),
            draws_observed: 12,
            history_len: 12,
            restarts: 1,
            gaps: SequenceGap::between(100, 104, Utc::now()).into_iter().collect(),
            subsystems: SubsystemStatus::absent(["DrawSync"]),
        };
        assert_eq!(summary.missing_draws(), 3);

        let json = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(json["gaps"][0]["missing"], serde_json::json!([101, 102, 103]));
        assert_eq!(json["subsystems"]["DrawSync"], false);
        assert_eq!(json["last_draw_number"], 105);
    }
}
