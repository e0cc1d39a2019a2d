//! # Sequence gap detector.
//!
//! [`SequenceGapDetector`] consumes one [`DrawObservation`] per cycle and
//! reports forward jumps in the draw counter.
//!
//! ## Rules
//! - `Unknown` observations are ignored: no state changes, never a gap.
//! - The first known observation only seeds `last_draw_number`; never a gap.
//! - `delta > 1` records a [`SequenceGap`] in the append-only gap log.
//! - `delta <= 1` (repeat, step, regression) is never a gap.
//! - Every known observation updates `last_draw_number` and history; history
//!   keeps the most recent `retention` entries, oldest dropped first.
//!
//! ## Example
//! ```
//! use drawwatch::{DrawObservation, SequenceGapDetector};
//!
//! let mut det = SequenceGapDetector::new(20);
//! for n in [1, 2, 3] {
//!     assert!(!det.observe(&DrawObservation::now(n)).gap_detected());
//! }
//! let outcome = det.observe(&DrawObservation::now(5));
//! assert!(outcome.gap_detected());
//! assert_eq!(outcome.gap().map(|g| g.missing.clone()), Some(vec![4]));
//! assert_eq!(det.gap_log().len(), 1);
//! ```

use std::collections::VecDeque;

use super::{DrawNumber, DrawObservation, SequenceGap};

/// Verdict for a single observation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GapOutcome {
    /// The value was unknown; nothing changed.
    Ignored,
    /// First known value since the detector was created.
    First(i64),
    /// The counter moved forward by exactly one.
    Advanced(i64),
    /// The counter did not move.
    Repeated(i64),
    /// The counter moved backwards. Informational only.
    Regressed {
        /// Previous value.
        from: i64,
        /// New, lower value.
        to: i64,
    },
    /// The counter skipped one or more numbers.
    Gap(SequenceGap),
}

impl GapOutcome {
    /// Whether this observation revealed a sequence gap.
    #[inline]
    pub fn gap_detected(&self) -> bool {
        matches!(self, GapOutcome::Gap(_))
    }

    /// The gap record, if one was detected.
    #[inline]
    pub fn gap(&self) -> Option<&SequenceGap> {
        match self {
            GapOutcome::Gap(gap) => Some(gap),
            _ => None,
        }
    }

    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            GapOutcome::Ignored => "ignored",
            GapOutcome::First(_) => "first",
            GapOutcome::Advanced(_) => "advanced",
            GapOutcome::Repeated(_) => "repeated",
            GapOutcome::Regressed { .. } => "regressed",
            GapOutcome::Gap(_) => "gap",
        }
    }
}

/// Stateful detector of forward jumps in the draw counter.
///
/// Owned by the supervisor; no interior locking.
#[derive(Debug)]
pub struct SequenceGapDetector {
    last: Option<i64>,
    history: VecDeque<DrawObservation>,
    retention: usize,
    gap_log: Vec<SequenceGap>,
    observed: u64,
}

impl SequenceGapDetector {
    /// Creates an empty detector keeping at most `retention` observations
    /// (minimum 1).
    pub fn new(retention: usize) -> Self {
        let retention = retention.max(1);
        Self {
            last: None,
            history: VecDeque::with_capacity(retention),
            retention,
            gap_log: Vec::new(),
            observed: 0,
        }
    }

    /// Feeds one observation and classifies it.
    pub fn observe(&mut self, obs: &DrawObservation) -> GapOutcome {
        let DrawNumber::Known(current) = obs.draw_number else {
            return GapOutcome::Ignored;
        };

        let outcome = match self.last {
            None => GapOutcome::First(current),
            Some(last) => {
                let delta = i128::from(current) - i128::from(last);
                match delta {
                    d if d > 1 => match SequenceGap::between(last, current, obs.observed_at) {
                        Some(gap) => {
                            self.gap_log.push(gap.clone());
                            GapOutcome::Gap(gap)
                        }
                        None => GapOutcome::Advanced(current),
                    },
                    1 => GapOutcome::Advanced(current),
                    0 => GapOutcome::Repeated(current),
                    _ => GapOutcome::Regressed {
                        from: last,
                        to: current,
                    },
                }
            }
        };

        self.record(obs);
        self.last = Some(current);
        outcome
    }

    fn record(&mut self, obs: &DrawObservation) {
        self.observed += 1;
        self.history.push_back(obs.clone());
        while self.history.len() > self.retention {
            self.history.pop_front();
        }
    }

    /// Most recent known draw number.
    #[inline]
    pub fn last_draw_number(&self) -> Option<i64> {
        self.last
    }

    /// Retained observations, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &DrawObservation> {
        self.history.iter()
    }

    /// Number of retained observations.
    #[inline]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Every gap detected so far, in detection order.
    #[inline]
    pub fn gap_log(&self) -> &[SequenceGap] {
        &self.gap_log
    }

    /// Count of known observations processed (ignored ones excluded).
    #[inline]
    pub fn draws_observed(&self) -> u64 {
        self.observed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn feed(det: &mut SequenceGapDetector, values: &[i64]) -> Vec<GapOutcome> {
        values
            .iter()
            .map(|n| det.observe(&DrawObservation::now(*n)))
            .collect()
    }

    #[test]
    fn contiguous_sequence_has_no_gaps() {
        let mut det = SequenceGapDetector::new(20);
        let outcomes = feed(&mut det, &[1, 2, 3, 4]);
        assert!(outcomes.iter().all(|o| !o.gap_detected()));
        assert!(det.gap_log().is_empty());
        assert_eq!(det.last_draw_number(), Some(4));
    }

    #[test]
    fn single_skip_is_one_gap() {
        let mut det = SequenceGapDetector::new(20);
        feed(&mut det, &[1, 2, 3, 5]);

        assert_eq!(det.gap_log().len(), 1);
        let gap = &det.gap_log()[0];
        assert_eq!((gap.from, gap.to), (3, 5));
        assert_eq!(gap.missing, vec![4]);
        assert_eq!(gap.gap_size, 1);
    }

    #[test]
    fn gap_is_reported_once_and_advances_last() {
        let mut det = SequenceGapDetector::new(20);
        let outcomes = feed(&mut det, &[10, 14, 14, 15]);
        assert_eq!(outcomes.iter().filter(|o| o.gap_detected()).count(), 1);
        assert_eq!(det.last_draw_number(), Some(15));
        assert_eq!(det.gap_log()[0].missing, vec![11, 12, 13]);
    }

    #[test]
    fn unknown_never_mutates_state() {
        let mut det = SequenceGapDetector::new(20);
        assert_eq!(det.observe(&DrawObservation::unknown()), GapOutcome::Ignored);
        assert_eq!(det.last_draw_number(), None);
        assert_eq!(det.history_len(), 0);

        det.observe(&DrawObservation::now(7));
        assert_eq!(det.observe(&DrawObservation::unknown()), GapOutcome::Ignored);
        assert_eq!(det.last_draw_number(), Some(7));
        assert_eq!(det.history_len(), 1);
        assert_eq!(det.draws_observed(), 1);
    }

    #[test]
    fn regression_and_repeat_are_not_gaps() {
        let mut det = SequenceGapDetector::new(20);
        let outcomes = feed(&mut det, &[50, 50, 40]);
        assert_eq!(outcomes[1], GapOutcome::Repeated(50));
        assert_eq!(outcomes[2], GapOutcome::Regressed { from: 50, to: 40 });
        assert!(det.gap_log().is_empty());
        // regression still updates state
        assert_eq!(det.last_draw_number(), Some(40));
        assert_eq!(det.history_len(), 3);
        // and the next step is measured from the regressed value
        assert_eq!(det.observe(&DrawObservation::now(41)), GapOutcome::Advanced(41));
    }

    #[test]
    fn history_is_bounded_to_most_recent() {
        let mut det = SequenceGapDetector::new(20);
        let values: Vec<i64> = (1..=25).collect();
        feed(&mut det, &values);

        assert_eq!(det.history_len(), 20);
        let kept: Vec<i64> = det
            .history()
            .filter_map(|o| o.draw_number.known())
            .collect();
        assert_eq!(kept, (6..=25).collect::<Vec<_>>());
        assert_eq!(det.draws_observed(), 25);
    }

    #[test]
    fn zero_retention_keeps_one() {
        let mut det = SequenceGapDetector::new(0);
        feed(&mut det, &[1, 2, 3]);
        assert_eq!(det.history_len(), 1);
    }

    #[test]
    fn extreme_values_do_not_overflow() {
        let mut det = SequenceGapDetector::new(5);
        feed(&mut det, &[i64::MAX, i64::MIN]);
        assert!(det.gap_log().is_empty());
        assert_eq!(det.last_draw_number(), Some(i64::MIN));
    }

    #[test]
    fn implausible_jump_is_one_bounded_gap() {
        let mut det = SequenceGapDetector::new(20);
        let outcomes = feed(&mut det, &[1, 1 << 40, (1 << 40) + 1]);

        assert!(outcomes[1].gap_detected());
        assert_eq!(outcomes[2], GapOutcome::Advanced((1 << 40) + 1));
        let gap = &det.gap_log()[0];
        assert_eq!(gap.gap_size, (1u64 << 40) - 2);
        assert_eq!(gap.missing.len(), crate::sequence::MAX_MISSING_LISTED);
        assert!(gap.truncated);
    }

    proptest! {
        #[test]
        fn first_observation_is_never_a_gap(n in any::<i64>()) {
            let mut det = SequenceGapDetector::new(20);
            prop_assert_eq!(det.observe(&DrawObservation::now(n)), GapOutcome::First(n));
        }

        #[test]
        fn gap_iff_jump_past_successor(values in prop::collection::vec(-1_000i64..1_000, 1..60)) {
            let mut det = SequenceGapDetector::new(20);
            let mut last: Option<i64> = None;
            for v in values {
                let outcome = det.observe(&DrawObservation::now(v));
                let expected = matches!(last, Some(l) if v > l + 1);
                prop_assert_eq!(outcome.gap_detected(), expected);
                if let Some(gap) = outcome.gap() {
                    prop_assert_eq!(gap.gap_size as i64, v - last.unwrap_or_default() - 1);
                }
                last = Some(v);
                prop_assert!(det.history_len() <= 20);
            }
        }
    }
}
