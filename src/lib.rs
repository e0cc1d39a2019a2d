//! # drawwatch
//!
//! **drawwatch** keeps an unattended draw-feed display alive. It supervises
//! one headless rendering session, probes it on a fixed cadence, watches the
//! display's draw counter for skipped numbers, and replaces the session when
//! it goes bad or simply gets old.
//!
//! ## Architecture
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │  Supervisor (state machine, one cycle/tick)  │
//!                         │  - SupervisorState (counters, subsystems)    │
//!                         │  - SequenceGapDetector                       │
//!                         └───┬──────────┬──────────┬──────────┬─────────┘
//!                             ▼          ▼          ▼          ▼
//!                     ┌────────────┐ ┌────────┐ ┌─────────┐ ┌─────────┐
//!                     │ Lifecycle  │ │ Health │ │ System  │ │  Draw   │
//!                     │  Manager   │ │Monitor │ │Validator│ │  Probe  │
//!                     └─────┬──────┘ └───┬────┘ └────┬────┘ └────┬────┘
//!                           └────────────┴─────┬─────┴───────────┘
//!                                              ▼   (every call under a deadline)
//!                                   ┌─────────────────────┐
//!                                   │  dyn SessionProvider │ ── WebDriverProvider
//!                                   └─────────────────────┘
//!
//!  Supervisor / LifecycleManager ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                              └─► LogWriter (tracing)
//! ```
//!
//! ### Cycle
//! ```text
//! Initializing ─► acquire ──(fail)──► fatal
//!      │
//!      ▼
//! Monitoring ── no session ─────────────────────────► Restarting (SessionLost)
//!      ├─ too old ─────────────────────────────────► Restarting (Planned)
//!      ├─ unhealthy ─► Degraded: reload + re-probe ─► Restarting (Unhealthy)
//!      ├─ subsystems missing (every Nth cycle) ────► Restarting (ValidationFailed)
//!      │     (each of the above continues the cycle on the new session)
//!      ├─ draw gap + emergency restart ────────────► Restarting (SequenceGap), next cycle at once
//!      └─ sleep(probe_interval), cancellable
//!
//! Restarting ─► replace ─┬─ ok  ─► Monitoring (timer reset)
//!                        └─ err ─► fatal
//!
//! cancel ─► ShuttingDown ─► release ─► summary ─► Stopped
//! ```
//!
//! ## Features
//! | Area            | Description                                               | Key types                                   |
//! |-----------------|-----------------------------------------------------------|---------------------------------------------|
//! | **Supervision** | Cycle loop, escalation, fault backoff, graceful shutdown  | [`Supervisor`], [`SessionSummary`]          |
//! | **Session**     | Provider boundary and single-session lifecycle            | [`SessionProvider`], [`SessionLifecycleManager`] |
//! | **Probes**      | Health, subsystem validation, draw state                  | [`HealthMonitor`], [`SystemValidator`], [`DrawProbe`] |
//! | **Sequence**    | Draw gap detection with bounded history                   | [`SequenceGapDetector`], [`SequenceGap`]    |
//! | **Events**      | Runtime events and subscriber fan-out                     | [`Event`], [`Subscribe`], [`LogWriter`]     |
//! | **Config**      | Defaults, TOML overlay                                    | [`WatchdogConfig`]                          |
//!
//! ## Optional features
//! - `webdriver` (default): [`WebDriverProvider`], a W3C WebDriver client, and the `drawwatch` binary.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use drawwatch::{LogWriter, Supervisor, WatchdogConfig, WebDriverProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = WatchdogConfig::default();
//!     let provider = Arc::new(WebDriverProvider::new(&cfg.webdriver)?);
//!
//!     let sup = Supervisor::builder(cfg, provider)
//!         .with_subscribers(vec![Arc::new(LogWriter::new())])
//!         .build();
//!
//!     let token = CancellationToken::new();
//!     drawwatch::cancel_on_shutdown_signal(token.clone());
//!
//!     let summary = sup.run(token).await?;
//!     println!("{} gaps", summary.gaps.len());
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod policies;
mod probes;
mod sequence;
mod session;
mod subscribers;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use config::{ConfigError, DEFAULT_SUBSYSTEMS, WatchdogConfig, WebDriverConfig};
pub use core::{
    CycleReport, Phase, RestartReason, SessionSummary, Supervisor, SupervisorBuilder,
    cancel_on_shutdown_signal, wait_for_shutdown_signal,
};
pub use error::{CycleError, ProbeError, ProviderError, SessionError, WatchdogError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use probes::{
    DrawProbe, DrawState, HealthMonitor, HealthStatus, SubsystemStatus, SystemValidator,
    UnhealthyReason, ValidationResult, scripts,
};
pub use sequence::{
    DrawNumber, DrawObservation, GapOutcome, MAX_MISSING_LISTED, SequenceGap, SequenceGapDetector,
};
pub use session::{
    ProbeExpr, ProbeKind, SessionHandle, SessionId, SessionLifecycleManager, SessionProvider,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};

#[cfg(feature = "webdriver")]
pub use session::WebDriverProvider;
