//! Probes against the supervised session.
//!
//! Each probe runs one read-only script through the
//! [`SessionProvider`](crate::SessionProvider) under a deadline and returns a
//! typed result instead of raising.
//!
//! ## Contents
//! - [`HealthMonitor`] → [`HealthStatus`] (`Healthy` / `Unhealthy(reason)`)
//! - [`SystemValidator`] → [`ValidationResult`] over a [`SubsystemStatus`] map
//! - [`DrawProbe`] → [`DrawState`] (draw observation plus display details)
//! - [`scripts`] the probe expressions themselves

mod draw;
mod health;
pub mod scripts;
mod status;
mod validator;

pub use draw::{DrawProbe, DrawState};
pub use health::{HealthMonitor, HealthStatus, UnhealthyReason};
pub use status::SubsystemStatus;
pub use validator::{SystemValidator, ValidationResult};
