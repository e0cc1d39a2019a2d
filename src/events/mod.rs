//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the supervisor and the session
//! lifecycle manager.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor` (cycle, probe and restart events),
//!   `SessionLifecycleManager` (acquire/reload/release events).
//! - **Consumers**: the supervisor's subscriber listener, which fans out to
//!   [`SubscriberSet`](crate::SubscriberSet) (e.g. [`LogWriter`](crate::LogWriter)).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
