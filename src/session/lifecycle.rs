//! # Session lifecycle manager.
//!
//! [`SessionLifecycleManager`] owns the single current [`SessionHandle`] and is
//! the only component that creates or terminates sessions.
//!
//! ```text
//! acquire():  release(current) ─► create (create_timeout) ─► pending
//!                                   └─► poll READINESS every load_poll_interval
//!                                         ├─ ready within load_timeout ─► settle ─► SessionAcquired
//!                                         └─ timeout ─► terminate ─► SessionLoadFailed ─► Err(LoadTimeout)
//!
//! reload():   navigate(target) ─► poll READINESS ─► settle ─► SessionReloaded
//! release():  terminate (release_timeout), errors swallowed
//! replace():  acquire() (which releases first)
//! ```
//!
//! ## Rules
//! - At most one session is held at a time.
//! - A session that never became ready is terminated before the error is returned.
//! - A created session is tracked from the moment `create` returns, so `release`
//!   reaches it even if the acquiring future was dropped before readiness.
//! - `release` never fails and never blocks longer than the release timeout.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time;
use tracing::{debug, warn};

use crate::config::WatchdogConfig;
use crate::error::SessionError;
use crate::events::{Bus, Event, EventKind};
use crate::probes::scripts;
use crate::session::deadline::{lifecycle_call, probe_call};
use crate::session::{SessionHandle, SessionProvider};

/// Floor for the readiness poll interval, so a zero setting cannot spin.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Owns the supervised session and its create/reload/teardown.
pub struct SessionLifecycleManager {
    provider: Arc<dyn SessionProvider>,
    bus: Bus,
    target: Arc<str>,

    create_timeout: Duration,
    load_timeout: Duration,
    poll_interval: Duration,
    settle_delay: Duration,
    probe_timeout: Duration,
    release_timeout: Duration,

    current: Option<SessionHandle>,
    pending: Option<SessionHandle>,
}

impl SessionLifecycleManager {
    /// Creates a manager that holds no session yet.
    pub fn new(provider: Arc<dyn SessionProvider>, cfg: &WatchdogConfig, bus: Bus) -> Self {
        Self {
            provider,
            bus,
            target: Arc::from(cfg.target_address.as_str()),
            create_timeout: cfg.create_timeout,
            load_timeout: cfg.load_timeout,
            poll_interval: cfg.load_poll_interval.max(MIN_POLL_INTERVAL),
            settle_delay: cfg.settle_delay,
            probe_timeout: cfg.probe_timeout,
            release_timeout: cfg.release_timeout,
            current: None,
            pending: None,
        }
    }

    /// The session currently held, if any.
    #[inline]
    pub fn current(&self) -> Option<&SessionHandle> {
        self.current.as_ref()
    }

    /// Address every session is directed to.
    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Creates a session, directs it to the target and waits until it is ready.
    ///
    /// Any session held before the call is released first. No retry happens
    /// inside this call.
    pub async fn acquire(&mut self) -> Result<SessionHandle, SessionError> {
        self.release().await;
        debug!(provider = self.provider.name(), address = %self.target, "creating session");

        let created = lifecycle_call(
            "create",
            self.create_timeout,
            self.provider.create(&self.target),
            |e| SessionError::CreateFailed {
                reason: e.to_string(),
            },
        )
        .await;
        let id = match created {
            Ok(id) => id,
            Err(e) => {
                self.bus
                    .publish(Event::new(EventKind::SessionLoadFailed).with_reason(e.to_string()));
                return Err(e);
            }
        };

        let handle = SessionHandle::new(id, Arc::clone(&self.target));
        self.pending = Some(handle.clone());
        if let Err(e) = self.await_ready(&handle).await {
            self.bus.publish(
                Event::new(EventKind::SessionLoadFailed)
                    .with_session(handle.id.as_str())
                    .with_reason(e.to_string()),
            );
            self.pending = None;
            let _ = self.terminate(&handle).await;
            return Err(e);
        }
        self.settle().await;

        self.bus.publish(
            Event::new(EventKind::SessionAcquired)
                .with_session(handle.id.as_str())
                .with_reason(&*self.target),
        );
        self.current = self.pending.take();
        Ok(handle)
    }

    /// Re-navigates the current session to the target and waits for readiness again.
    ///
    /// Lighter than [`replace`](Self::replace): the session itself is kept.
    pub async fn reload(&mut self) -> Result<(), SessionError> {
        let handle = self.current.clone().ok_or(SessionError::NoSession)?;

        let res = async {
            lifecycle_call(
                "navigate",
                self.load_timeout,
                self.provider.navigate(&handle.id, &self.target),
                |e| SessionError::LoadFailed {
                    reason: e.to_string(),
                },
            )
            .await?;
            self.await_ready(&handle).await
        }
        .await;

        match res {
            Ok(()) => {
                self.settle().await;
                self.bus
                    .publish(Event::new(EventKind::SessionReloaded).with_session(handle.id.as_str()));
                Ok(())
            }
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::SessionLoadFailed)
                        .with_session(handle.id.as_str())
                        .with_reason(e.to_string()),
                );
                Err(e)
            }
        }
    }

    /// Terminates the current session and any half-acquired one. Best effort:
    /// failures are published and swallowed.
    pub async fn release(&mut self) {
        for handle in [self.current.take(), self.pending.take()].into_iter().flatten() {
            let _ = self.terminate(&handle).await;
        }
    }

    /// Replaces the current session with a fresh one.
    ///
    /// The old session is released by [`acquire`](Self::acquire) before the new
    /// one is created, so it is gone even when the new acquisition fails.
    pub async fn replace(&mut self) -> Result<SessionHandle, SessionError> {
        self.acquire().await
    }

    async fn terminate(&self, handle: &SessionHandle) -> Result<(), SessionError> {
        let res = lifecycle_call(
            "terminate",
            self.release_timeout,
            self.provider.terminate(&handle.id),
            |e| SessionError::ReleaseFailed {
                reason: e.to_string(),
            },
        )
        .await;

        match &res {
            Ok(()) => self
                .bus
                .publish(Event::new(EventKind::SessionReleased).with_session(handle.id.as_str())),
            Err(e) => {
                warn!(session = %handle.id, error = %e, "session release failed");
                self.bus.publish(
                    Event::new(EventKind::SessionReleaseFailed)
                        .with_session(handle.id.as_str())
                        .with_reason(e.to_string()),
                );
            }
        }
        res
    }

    /// Polls the readiness probe until it reports a loaded document or the load timeout elapses.
    async fn await_ready(&self, handle: &SessionHandle) -> Result<(), SessionError> {
        let poll = async {
            loop {
                match probe_call(
                    self.probe_timeout,
                    self.provider.evaluate(&handle.id, &scripts::READINESS),
                )
                .await
                {
                    Ok(value) if is_ready(&value) => return,
                    Ok(value) => debug!(session = %handle.id, state = %value, "session not ready yet"),
                    Err(e) => debug!(session = %handle.id, error = %e, "readiness probe failed"),
                }
                time::sleep(self.poll_interval).await;
            }
        };

        time::timeout(self.load_timeout, poll)
            .await
            .map_err(|_| SessionError::LoadTimeout {
                timeout: self.load_timeout,
            })
    }

    async fn settle(&self) {
        if !self.settle_delay.is_zero() {
            time::sleep(self.settle_delay).await;
        }
    }
}

fn is_ready(value: &Value) -> bool {
    value.get("readyState").and_then(Value::as_str) == Some("complete")
        && value.get("hasBody").and_then(Value::as_bool).unwrap_or(false)
}
