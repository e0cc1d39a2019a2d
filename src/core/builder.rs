use std::sync::Arc;

use crate::{
    config::WatchdogConfig,
    core::supervisor::Supervisor,
    events::Bus,
    session::SessionProvider,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for a [`Supervisor`].
///
/// ```no_run
/// # use std::sync::Arc;
/// # use drawwatch::{LogWriter, SessionProvider, Supervisor, WatchdogConfig};
/// # async fn demo(provider: Arc<dyn SessionProvider>) {
/// let sup = Supervisor::builder(WatchdogConfig::default(), provider)
///     .with_subscribers(vec![Arc::new(LogWriter::new())])
///     .build();
/// # }
/// ```
pub struct SupervisorBuilder {
    cfg: WatchdogConfig,
    provider: Arc<dyn SessionProvider>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Starts a builder for the given configuration and session provider.
    pub fn new(cfg: WatchdogConfig, provider: Arc<dyn SessionProvider>) -> Self {
        Self {
            cfg,
            provider,
            subscribers: Vec::new(),
        }
    }

    /// Sets the event subscribers.
    ///
    /// Each subscriber gets its own worker and bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the supervisor: event bus, subscriber workers, lifecycle manager and probes.
    ///
    /// Must be called inside a Tokio runtime (subscriber workers are spawned here).
    pub fn build(self) -> Supervisor {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers);
        Supervisor::new_internal(self.cfg, self.provider, bus, subs)
    }
}
