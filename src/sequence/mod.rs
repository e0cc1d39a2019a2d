//! Draw-number sequence tracking.
//!
//! ## Contents
//! - [`DrawNumber`], [`DrawObservation`] one reading of the display's draw counter
//! - [`SequenceGap`] an immutable record of a forward, non-contiguous jump
//! - [`SequenceGapDetector`], [`GapOutcome`] the stateful detector and its verdicts
//!
//! ## Quick reference
//! ```text
//! DrawProbe::fetch() ──► DrawObservation ──► SequenceGapDetector::observe()
//!                                                 ├─ Ignored      (unknown value, no state change)
//!                                                 ├─ First        (no previous value)
//!                                                 ├─ Advanced     (+1)
//!                                                 ├─ Repeated     (+0)
//!                                                 ├─ Regressed    (< 0, informational)
//!                                                 └─ Gap(gap)     (> +1, appended to gap log)
//! ```
//!
//! The detector only detects. Whether a gap restarts the session is decided
//! by the supervisor from [`WatchdogConfig::emergency_restart_on_gap`](crate::WatchdogConfig).

mod detector;
mod gap;
mod observation;

pub use detector::{GapOutcome, SequenceGapDetector};
pub use gap::{MAX_MISSING_LISTED, SequenceGap};
pub use observation::{DrawNumber, DrawObservation};
