//! Delay policies for fault recovery.
//!
//! ## Contents
//! - [`BackoffPolicy`] how the pause after an unexpected cycle fault evolves (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization applied on top of the base delay
//!
//! ## Quick wiring
//! ```text
//! WatchdogConfig { fault_backoff: BackoffPolicy, .. }
//!      └─► core::supervisor uses fault_backoff.next(consecutive_faults - 1)
//!          after a cycle ends in CycleError, then re-enters Monitoring
//! ```
//!
//! ## Defaults
//! - `WatchdogConfig::default().fault_backoff` → first=10s, factor=1.0 (constant), max=60s, jitter=None.
//! - `BackoffPolicy::default()` → first=100ms, factor=1.0, max=30s, jitter=None.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
