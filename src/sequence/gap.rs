//! # Sequence gap records.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Upper bound on the skipped numbers a single gap lists explicitly.
///
/// Larger jumps keep exact `from`, `to` and `gap_size` but list only the
/// first `MAX_MISSING_LISTED` numbers and set `truncated`.
pub const MAX_MISSING_LISTED: usize = 1000;

/// A forward, non-contiguous jump in the draw sequence.
///
/// Created only when `to > from + 1`; never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SequenceGap {
    /// Last draw number seen before the jump.
    pub from: i64,
    /// Draw number that revealed the jump.
    pub to: i64,
    /// The skipped draw numbers, ascending (`from+1 ..= to-1`), at most
    /// [`MAX_MISSING_LISTED`] of them.
    pub missing: Vec<i64>,
    /// Number of skipped draws (`to - from - 1`), exact even when `missing` is cut short.
    pub gap_size: u64,
    /// True if `missing` lists fewer numbers than `gap_size`.
    pub truncated: bool,
    /// When the jump was observed.
    pub detected_at: DateTime<Utc>,
}

impl SequenceGap {
    /// Builds a gap record, or `None` if `to` does not jump past `from + 1`.
    ///
    /// # Example
    /// ```
    /// use chrono::Utc;
    /// use drawwatch::SequenceGap;
    ///
    /// let gap = SequenceGap::between(3, 6, Utc::now()).expect("jump");
    /// assert_eq!(gap.missing, vec![4, 5]);
    /// assert_eq!(gap.gap_size, 2);
    ///
    /// assert!(SequenceGap::between(3, 4, Utc::now()).is_none());
    /// assert!(SequenceGap::between(3, 1, Utc::now()).is_none());
    /// ```
    pub fn between(from: i64, to: i64, detected_at: DateTime<Utc>) -> Option<Self> {
        let first_missing = from.checked_add(1)?;
        if to <= first_missing {
            return None;
        }
        let gap_size = (i128::from(to) - i128::from(first_missing)) as u64;
        let missing: Vec<i64> = (first_missing..to).take(MAX_MISSING_LISTED).collect();
        Some(Self {
            from,
            to,
            truncated: (missing.len() as u64) < gap_size,
            gap_size,
            missing,
            detected_at,
        })
    }
}
