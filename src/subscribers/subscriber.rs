//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for reacting to runtime events
//! (status lines, alerting, metrics export).
//!
//! Each subscriber gets a dedicated worker task and a bounded queue sized by
//! [`Subscribe::queue_capacity`]. A slow subscriber only fills its own queue;
//! on overflow the event is dropped for that subscriber and a warning is logged.
//! Panics are caught and logged.

use async_trait::async_trait;

use crate::events::Event;

/// Receiver of runtime events.
///
/// Use async I/O and handle errors internally; the supervisor never waits on
/// a subscriber.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes one event. Events arrive in publish order.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic warnings.
    ///
    /// The default is `type_name::<Self>()`; override it with something short.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity (clamped to a minimum of 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
