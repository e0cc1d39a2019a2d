//! # Event subscribers.
//!
//! Runtime events published on the [`Bus`](crate::Bus) are fanned out by the
//! supervisor's listener to a [`SubscriberSet`]; each [`Subscribe`]
//! implementation runs on its own worker with its own bounded queue.
//!
//! ```text
//! Supervisor / LifecycleManager ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                   ┌──────┴──────┐
//!                                                                   ▼             ▼
//!                                                               LogWriter      custom ...
//! ```
//!
//! ## Implementing a subscriber
//! ```no_run
//! use async_trait::async_trait;
//! use drawwatch::{Event, EventKind, Subscribe};
//!
//! struct Pager;
//!
//! #[async_trait]
//! impl Subscribe for Pager {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::SequenceGapDetected {
//!             // page someone
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "pager"
//!     }
//! }
//! ```

mod log;
mod set;
mod subscriber;

pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
