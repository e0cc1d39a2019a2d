//! # Backoff after unexpected cycle faults.
//!
//! When a monitoring cycle ends in an unexpected fault the supervisor keeps
//! its session and counters, pauses, and tries again. [`BackoffPolicy`]
//! decides how long that pause is, based on how many faults happened in a row:
//! - [`BackoffPolicy::first`] the pause after the first fault;
//! - [`BackoffPolicy::factor`] the growth per additional consecutive fault;
//! - [`BackoffPolicy::max`] the cap.
//!
//! The base pause for fault `n` (0-indexed) is `first × factor^n`, clamped to
//! `max`, then jitter is applied. Jitter never feeds back into the next base.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use drawwatch::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_secs(10),
//!     max: Duration::from_secs(60),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_secs(10));
//! assert_eq!(backoff.next(1), Duration::from_secs(20));
//! assert_eq!(backoff.next(5), Duration::from_secs(60));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Fault backoff policy.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Pause after the first fault in a row.
    pub first: Duration,
    /// Maximum pause.
    pub max: Duration,
    /// Multiplicative growth per consecutive fault (`1.0` = constant).
    pub factor: f64,
    /// Randomization applied to the clamped base.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns a policy with:
    /// - `factor = 1.0` (constant delay);
    /// - `first = 100ms`;
    /// - `max = 30s`.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            jitter: JitterPolicy::None,
            factor: 1.0,
        }
    }
}

impl BackoffPolicy {
    /// Computes the pause for the given fault index (0 = first fault in a row).
    ///
    /// Non-finite or negative intermediate values collapse to [`BackoffPolicy::max`].
    pub fn next(&self, fault: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = fault.min(i32::MAX as u32) as i32;
        let raw = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !raw.is_finite() || raw < 0.0 || raw > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(raw)
        };

        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), base, self.max)
            }
            _ => self.jitter.apply(base),
        }
    }

    /// Pause to apply after `consecutive` faults in a row (1-based).
    ///
    /// `0` is treated as the first fault.
    #[inline]
    pub fn after_faults(&self, consecutive: u32) -> Duration {
        self.next(consecutive.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(first_ms: u64, max_ms: u64, factor: f64) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max: Duration::from_millis(max_ms),
            factor,
            jitter: JitterPolicy::None,
        }
    }

    #[test]
    fn constant_policy_never_grows() {
        let policy = fixed(10_000, 60_000, 1.0);
        for fault in 0..20 {
            assert_eq!(policy.next(fault), Duration::from_secs(10));
        }
    }

    #[test]
    fn growth_is_capped() {
        let policy = fixed(1_000, 8_000, 2.0);
        let delays: Vec<u64> = (0..6).map(|n| policy.next(n).as_millis() as u64).collect();
        assert_eq!(delays, vec![1_000, 2_000, 4_000, 8_000, 8_000, 8_000]);
    }

    #[test]
    fn first_above_max_is_clamped() {
        let policy = fixed(90_000, 60_000, 1.0);
        assert_eq!(policy.next(0), Duration::from_secs(60));
    }

    #[test]
    fn overflowing_exponent_clamps_to_max() {
        let policy = fixed(100, 10_000, 2.0);
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn after_faults_is_one_based() {
        let policy = fixed(1_000, 60_000, 3.0);
        assert_eq!(policy.after_faults(0), Duration::from_secs(1));
        assert_eq!(policy.after_faults(1), Duration::from_secs(1));
        assert_eq!(policy.after_faults(2), Duration::from_secs(3));
    }

    #[test]
    fn equal_jitter_stays_within_half_and_base() {
        let policy = BackoffPolicy {
            jitter: JitterPolicy::Equal,
            ..fixed(10_000, 60_000, 1.0)
        };
        for fault in 0..50 {
            let delay = policy.next(fault);
            assert!(delay >= Duration::from_secs(5), "{delay:?} below half");
            assert!(delay <= Duration::from_secs(10), "{delay:?} above base");
        }
    }

    #[test]
    fn decorrelated_jitter_respects_floor_and_cap() {
        let policy = BackoffPolicy {
            jitter: JitterPolicy::Decorrelated,
            ..fixed(1_000, 30_000, 2.0)
        };
        for _ in 0..100 {
            let delay = policy.next(6);
            assert!(delay >= Duration::from_secs(1));
            assert!(delay <= Duration::from_secs(30));
        }
    }
}
