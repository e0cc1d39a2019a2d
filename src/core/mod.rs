//! Runtime core: the supervisor state machine and its lifecycle.
//!
//! - [`supervisor`]: runs cycles, escalates to reload/restart, handles faults and shutdown;
//! - [`builder`]: wires config, provider, bus and subscribers into a [`Supervisor`];
//! - [`state`]: phases, restart reasons, per-cycle report and mutable counters;
//! - [`summary`]: the final [`SessionSummary`];
//! - [`shutdown`]: OS signal handling for the binary.

mod builder;
mod shutdown;
mod state;
mod summary;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use shutdown::{cancel_on_shutdown_signal, wait_for_shutdown_signal};
pub use state::{CycleReport, Phase, RestartReason};
pub use summary::SessionSummary;
pub use supervisor::Supervisor;
