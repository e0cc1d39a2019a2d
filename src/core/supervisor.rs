//! # Supervisor: the watchdog state machine.
//!
//! The [`Supervisor`] owns the session lifecycle, the probes, the sequence gap
//! detector and the event bus, and runs monitoring cycles until cancelled or
//! until a fatal session failure.
//!
//! ## One cycle
//! ```text
//!  0. no session held (a replace was cut short)? ─────────────► restart(SessionLost)
//!  1. session older than restart_interval? ───────────────────► restart(Planned)
//!  2. health probe ── Unhealthy ─► [Degraded] reload + re-probe
//!                                     └─ still failing ─────────► restart(Unhealthy)
//!  3. every Nth cycle: validate subsystems ── missing/error ────► restart(ValidationFailed)
//!  4. fetch draw state ─► gap detector
//!                            └─ gap && emergency_restart_on_gap ─► restart(SequenceGap), end cycle
//!  5. publish CycleCompleted (status line)
//!
//!  restart = [Restarting] replace session ─┬─ ok ─► reset timer, [Monitoring]
//!                                          └─ err ─► fatal, stop
//! ```
//! Restarts in steps 0-3 continue the cycle against the new session. A gap
//! restart ends the cycle and the next one starts without sleeping. Every
//! other cycle ends with the interruptible `probe_interval` sleep; a faulted
//! cycle sleeps the fault backoff instead.
//!
//! ## Faults
//! A panic or a draw-fetch error inside a cycle is caught at the cycle
//! boundary (`catch_unwind`), published as `CycleFault`, and followed by a
//! backoff pause. Session and counters are kept.
//!
//! ## Shutdown
//! ```text
//! token.cancel()
//!   ├─ during a cycle ─► ShutdownRequested ─► wait ≤ grace ─┬─ finished
//!   │                                                       └─ GraceExceeded (cycle abandoned)
//!   └─ during the sleep ─► ShutdownRequested
//! then: [ShuttingDown] release session ─► SummaryReported ─► Stopped
//! ```
//! The same sequence runs after a fatal error, before the error is returned.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::WatchdogConfig;
use crate::core::builder::SupervisorBuilder;
use crate::core::state::{CycleReport, Phase, RestartReason, SupervisorState};
use crate::core::summary::SessionSummary;
use crate::error::{CycleError, SessionError, WatchdogError};
use crate::events::{Bus, Event, EventKind};
use crate::probes::{DrawProbe, HealthMonitor, HealthStatus, SystemValidator};
use crate::sequence::{DrawNumber, GapOutcome};
use crate::session::{SessionHandle, SessionLifecycleManager, SessionProvider};
use crate::subscribers::{SubscriberSet, panic_message};

/// Upper bound on waiting for subscribers to drain after stopping.
const LISTENER_DRAIN: Duration = Duration::from_secs(5);

/// How a cycle ended when it did not fault.
enum CycleOutcome {
    Completed,
    /// Emergency restart after a gap; the next cycle runs immediately.
    GapRestarted,
    Fatal(SessionError),
}

/// Result of a future raced against cancellation.
enum Guarded<T> {
    /// Finished before cancellation.
    Done(T),
    /// Cancelled; `Some` if it still finished within the grace period.
    Cancelled(Option<T>),
}

/// Watchdog over one rendering session.
pub struct Supervisor {
    cfg: WatchdogConfig,
    bus: Bus,
    subs: Option<SubscriberSet>,
    lifecycle: SessionLifecycleManager,
    health: HealthMonitor,
    validator: SystemValidator,
    draws: DrawProbe,
    state: SupervisorState,
}

impl Supervisor {
    /// Starts building a supervisor for `cfg` over `provider`.
    pub fn builder(cfg: WatchdogConfig, provider: Arc<dyn SessionProvider>) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg, provider)
    }

    pub(crate) fn new_internal(
        cfg: WatchdogConfig,
        provider: Arc<dyn SessionProvider>,
        bus: Bus,
        subs: SubscriberSet,
    ) -> Self {
        Self {
            lifecycle: SessionLifecycleManager::new(Arc::clone(&provider), &cfg, bus.clone()),
            health: HealthMonitor::new(Arc::clone(&provider), &cfg),
            validator: SystemValidator::new(Arc::clone(&provider), &cfg),
            draws: DrawProbe::new(provider, &cfg),
            state: SupervisorState::new(cfg.history_retention_clamped(), &cfg.subsystems),
            subs: Some(subs),
            bus,
            cfg,
        }
    }

    /// Receiver for runtime events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Runs until `token` is cancelled or a fatal error occurs.
    ///
    /// Returns the session summary after a graceful shutdown. On
    /// [`WatchdogError`] the shutdown sequence has already run (session
    /// released, summary published).
    pub async fn run(mut self, token: CancellationToken) -> Result<SessionSummary, WatchdogError> {
        let listener = self.spawn_listener();
        self.state.started = Instant::now();

        let result = self.supervise(&token).await;
        if let Err(e) = &result {
            warn!(error = %e, label = e.as_label(), "watchdog stopping on fatal error");
        }
        let summary = self.shutdown().await;

        // closes the bus, which ends the listener once it has drained
        drop(self);
        if let Some(listener) = listener {
            if time::timeout(LISTENER_DRAIN, listener).await.is_err() {
                warn!("subscribers did not drain in time");
            }
        }

        result.map(|()| summary)
    }

    /// Forwards bus events to the subscriber set until the bus closes.
    fn spawn_listener(&mut self) -> Option<JoinHandle<()>> {
        let set = self.subs.take()?;
        let mut rx = self.bus.subscribe();
        Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            set.shutdown().await;
        }))
    }

    async fn supervise(&mut self, token: &CancellationToken) -> Result<(), WatchdogError> {
        self.set_phase(Phase::Initializing);
        let bus = self.bus.clone();

        match guarded(self.lifecycle.acquire(), token, self.cfg.grace, &bus).await {
            Guarded::Done(Ok(handle)) => {
                info!(session = %handle.id, address = %handle.target_address, "initial session acquired");
            }
            Guarded::Done(Err(source)) => return Err(WatchdogError::InitialAcquire { source }),
            Guarded::Cancelled(_) => return Ok(()),
        }
        self.state.last_restart = Instant::now();
        self.set_phase(Phase::Monitoring);

        self.monitor(token).await
    }

    async fn monitor(&mut self, token: &CancellationToken) -> Result<(), WatchdogError> {
        let bus = self.bus.clone();
        let grace = self.cfg.grace;

        loop {
            if token.is_cancelled() {
                bus.publish(Event::new(EventKind::ShutdownRequested));
                return Ok(());
            }

            let cycle = AssertUnwindSafe(self.run_cycle()).catch_unwind();
            let (finished, cancelled) = match guarded(cycle, token, grace, &bus).await {
                Guarded::Done(res) => (Some(res), false),
                Guarded::Cancelled(res) => (res, true),
            };

            let pause = match finished {
                Some(Ok(Ok(CycleOutcome::Fatal(source)))) => {
                    return Err(WatchdogError::RestartExhausted { source });
                }
                Some(Ok(Ok(CycleOutcome::Completed))) => {
                    self.state.consecutive_faults = 0;
                    self.cfg.probe_interval
                }
                Some(Ok(Ok(CycleOutcome::GapRestarted))) => {
                    self.state.consecutive_faults = 0;
                    Duration::ZERO
                }
                Some(Ok(Err(fault))) => self.on_fault(fault),
                Some(Err(panic)) => self.on_fault(CycleError::Panicked {
                    info: panic_message(panic.as_ref()),
                }),
                None => Duration::ZERO,
            };
            if cancelled {
                return Ok(());
            }

            tokio::select! {
                _ = time::sleep(pause) => {}
                _ = token.cancelled() => {
                    bus.publish(Event::new(EventKind::ShutdownRequested));
                    return Ok(());
                }
            }
        }
    }

    /// One monitoring cycle, steps 0-5.
    async fn run_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        self.state.cycle += 1;
        let cycle = self.state.cycle;

        let mut handle = match self.lifecycle.current().cloned() {
            Some(handle) => handle,
            None => match self.restart(RestartReason::SessionLost, cycle).await {
                Ok(handle) => handle,
                Err(e) => return Ok(CycleOutcome::Fatal(e)),
            },
        };
        self.set_phase(Phase::Monitoring);

        if self.state.last_restart.elapsed() >= self.cfg.restart_interval {
            handle = match self.restart(RestartReason::Planned, cycle).await {
                Ok(handle) => handle,
                Err(e) => return Ok(CycleOutcome::Fatal(e)),
            };
        }

        if let HealthStatus::Unhealthy(reason) = self.health.probe(&handle).await {
            self.publish_unhealthy(&handle, cycle, &reason.to_string());
            if !self.recover(&handle, cycle).await {
                handle = match self.restart(RestartReason::Unhealthy, cycle).await {
                    Ok(handle) => handle,
                    Err(e) => return Ok(CycleOutcome::Fatal(e)),
                };
            }
        }

        if self.cfg.is_validation_cycle(cycle) && !self.validate(&handle, cycle).await {
            handle = match self.restart(RestartReason::ValidationFailed, cycle).await {
                Ok(handle) => handle,
                Err(e) => return Ok(CycleOutcome::Fatal(e)),
            };
        }

        let mut report = CycleReport {
            cycle,
            draw: DrawNumber::Unknown,
            spins: 0,
            present: 0,
            total: 0,
            tab_visible: None,
        };

        if self.cfg.monitor_draw_numbers {
            let state = self.draws.fetch(&handle).await?;
            if let Some(systems) = &state.systems {
                self.state.subsystems.merge(systems);
            }
            report.draw = state.observation.draw_number;
            report.spins = state.rolled_count;
            report.tab_visible = state.tab_visible;

            if self.cfg.detect_sequence_gaps {
                match self.state.detector.observe(&state.observation) {
                    GapOutcome::Gap(gap) => {
                        self.bus.publish(
                            Event::new(EventKind::SequenceGapDetected)
                                .with_cycle(cycle)
                                .with_draw(gap.to)
                                .with_gap(gap),
                        );
                        if self.cfg.emergency_restart_on_gap {
                            return Ok(match self.restart(RestartReason::SequenceGap, cycle).await {
                                Ok(_) => CycleOutcome::GapRestarted,
                                Err(e) => CycleOutcome::Fatal(e),
                            });
                        }
                    }
                    GapOutcome::Regressed { from, to } => {
                        self.bus.publish(
                            Event::new(EventKind::DrawRegressed)
                                .with_cycle(cycle)
                                .with_draw(to)
                                .with_reason(format!("{from} -> {to}")),
                        );
                    }
                    other => debug!(cycle, outcome = other.as_label(), "draw observed"),
                }
            }
        }

        report.present = self.state.subsystems.present_count();
        report.total = self.state.subsystems.len();
        self.bus.publish(
            Event::new(EventKind::CycleCompleted)
                .with_cycle(cycle)
                .with_session(handle.id.as_str())
                .with_report(report),
        );
        Ok(CycleOutcome::Completed)
    }

    /// Reloads an unhealthy session and probes it again. `false` means restart.
    async fn recover(&mut self, handle: &SessionHandle, cycle: u64) -> bool {
        self.set_phase(Phase::Degraded);

        if let Err(e) = self.lifecycle.reload().await {
            debug!(cycle, error = %e, "reload failed");
            return false;
        }
        match self.health.probe(handle).await {
            HealthStatus::Healthy => {
                self.set_phase(Phase::Monitoring);
                true
            }
            HealthStatus::Unhealthy(reason) => {
                self.publish_unhealthy(handle, cycle, &format!("after reload: {reason}"));
                false
            }
        }
    }

    /// Runs the subsystem validator. `false` means restart.
    async fn validate(&mut self, handle: &SessionHandle, cycle: u64) -> bool {
        match self.validator.validate(handle).await {
            Ok(result) => {
                self.state.subsystems.merge(&result.statuses);
                if result.all_present {
                    self.bus.publish(
                        Event::new(EventKind::ValidationPassed)
                            .with_session(handle.id.as_str())
                            .with_cycle(cycle),
                    );
                    return true;
                }
                self.bus.publish(
                    Event::new(EventKind::ValidationFailed)
                        .with_session(handle.id.as_str())
                        .with_cycle(cycle)
                        .with_reason(format!("missing: {}", result.missing().join(", "))),
                );
                false
            }
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::ValidationFailed)
                        .with_session(handle.id.as_str())
                        .with_cycle(cycle)
                        .with_reason(e.to_string()),
                );
                false
            }
        }
    }

    /// Replaces the session (or acquires one if none is held). A failure here is fatal.
    async fn restart(&mut self, reason: RestartReason, cycle: u64) -> Result<SessionHandle, SessionError> {
        self.set_phase(Phase::Restarting);
        let mut requested = Event::new(EventKind::RestartRequested)
            .with_cycle(cycle)
            .with_restart(reason);
        if let Some(old) = self.lifecycle.current() {
            requested = requested.with_session(old.id.as_str());
        }
        self.bus.publish(requested);

        match self.lifecycle.replace().await {
            Ok(handle) => {
                self.state.last_restart = Instant::now();
                self.state.restarts += 1;
                self.bus.publish(
                    Event::new(EventKind::RestartSucceeded)
                        .with_session(handle.id.as_str())
                        .with_restart(reason),
                );
                self.set_phase(Phase::Monitoring);
                Ok(handle)
            }
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::RestartFailed)
                        .with_restart(reason)
                        .with_reason(e.to_string()),
                );
                Err(e)
            }
        }
    }

    /// Records a cycle fault and returns the backoff pause.
    fn on_fault(&mut self, fault: CycleError) -> Duration {
        self.state.consecutive_faults = self.state.consecutive_faults.saturating_add(1);
        let delay = self.cfg.fault_backoff.after_faults(self.state.consecutive_faults);
        let cycle = self.state.cycle;
        debug!(cycle, label = fault.as_label(), consecutive = self.state.consecutive_faults, "cycle fault");

        self.bus.publish(
            Event::new(EventKind::CycleFault)
                .with_cycle(cycle)
                .with_reason(fault.to_string()),
        );
        self.bus.publish(
            Event::new(EventKind::BackoffScheduled)
                .with_cycle(cycle)
                .with_delay(delay),
        );
        delay
    }

    /// Releases the session and publishes the summary.
    async fn shutdown(&mut self) -> SessionSummary {
        self.set_phase(Phase::ShuttingDown);
        self.lifecycle.release().await;

        let summary = self.summary();
        self.bus
            .publish(Event::new(EventKind::SummaryReported).with_summary(summary.clone()));
        self.set_phase(Phase::Stopped);
        self.bus.publish(Event::new(EventKind::Stopped));
        summary
    }

    fn summary(&self) -> SessionSummary {
        let detector = &self.state.detector;
        SessionSummary {
            uptime_secs: self.state.started.elapsed().as_secs(),
            cycles: self.state.cycle,
            last_draw_number: detector.last_draw_number(),
            draws_observed: detector.draws_observed(),
            history_len: detector.history_len(),
            restarts: self.state.restarts,
            gaps: detector.gap_log().to_vec(),
            subsystems: self.state.subsystems.clone(),
        }
    }

    fn publish_unhealthy(&self, handle: &SessionHandle, cycle: u64, reason: &str) {
        self.bus.publish(
            Event::new(EventKind::HealthUnhealthy)
                .with_session(handle.id.as_str())
                .with_cycle(cycle)
                .with_reason(reason),
        );
    }

    fn set_phase(&mut self, next: Phase) {
        if self.state.phase != next {
            debug!(from = %self.state.phase, to = %next, "phase transition");
            self.state.phase = next;
        }
    }
}

/// Races `fut` against cancellation; once cancelled, lets it run for at most `grace`.
async fn guarded<F: Future>(
    fut: F,
    token: &CancellationToken,
    grace: Duration,
    bus: &Bus,
) -> Guarded<F::Output> {
    tokio::pin!(fut);
    tokio::select! {
        biased;
        out = &mut fut => Guarded::Done(out),
        _ = token.cancelled() => {
            bus.publish(Event::new(EventKind::ShutdownRequested));
            match time::timeout(grace, &mut fut).await {
                Ok(out) => Guarded::Cancelled(Some(out)),
                Err(_) => {
                    bus.publish(Event::new(EventKind::GraceExceeded).with_timeout(grace));
                    Guarded::Cancelled(None)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscribers::Subscribe;
    use crate::testing::FakeProvider;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Event>>);

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().expect("recorder lock").push(ev.clone());
        }
    }

    impl Recorder {
        fn kinds(&self) -> Vec<EventKind> {
            self.0.lock().expect("recorder lock").iter().map(|e| e.kind).collect()
        }

        fn count(&self, kind: EventKind) -> usize {
            self.kinds().into_iter().filter(|k| *k == kind).count()
        }

        fn restarts(&self) -> Vec<(u64, RestartReason)> {
            self.0
                .lock()
                .expect("recorder lock")
                .iter()
                .filter(|e| e.kind == EventKind::RestartRequested)
                .filter_map(|e| Some((e.cycle?, e.restart?)))
                .collect()
        }

        fn delays(&self) -> Vec<u32> {
            self.0
                .lock()
                .expect("recorder lock")
                .iter()
                .filter(|e| e.kind == EventKind::BackoffScheduled)
                .filter_map(|e| e.delay_ms)
                .collect()
        }
    }

    fn cfg() -> WatchdogConfig {
        WatchdogConfig {
            settle_delay: Duration::ZERO,
            ..WatchdogConfig::default()
        }
    }

    /// Runs a supervisor and cancels it after `stop_after` of (paused) time.
    async fn run_for(
        cfg: WatchdogConfig,
        fake: &Arc<FakeProvider>,
        stop_after: Duration,
    ) -> (Result<SessionSummary, WatchdogError>, Arc<Recorder>) {
        let rec = Arc::new(Recorder::default());
        let sup = Supervisor::builder(cfg, fake.clone())
            .with_subscriber(rec.clone())
            .build();

        let token = CancellationToken::new();
        let stopper = token.clone();
        tokio::spawn(async move {
            time::sleep(stop_after).await;
            stopper.cancel();
        });

        (sup.run(token).await, rec)
    }

    #[tokio::test(start_paused = true)]
    async fn gap_without_emergency_restart_is_only_recorded() {
        let fake = FakeProvider::new();
        fake.push_draws([1, 2, 3, 5]);
        let cfg = WatchdogConfig {
            emergency_restart_on_gap: false,
            ..cfg()
        };

        let (res, rec) = run_for(cfg, &fake, Duration::from_secs(50)).await;
        let summary = res.expect("graceful stop");

        assert_eq!(summary.cycles, 4);
        assert_eq!(summary.gaps.len(), 1);
        assert_eq!(summary.gaps[0].missing, vec![4]);
        assert_eq!(summary.last_draw_number, Some(5));
        assert_eq!(summary.draws_observed, 4);
        assert_eq!(summary.restarts, 0);
        assert_eq!(fake.created(), 1);
        assert_eq!(rec.count(EventKind::SequenceGapDetected), 1);
        assert!(rec.restarts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn gap_with_emergency_restart_replaces_session() {
        let fake = FakeProvider::new();
        fake.push_draws([1, 2, 3, 5]);

        let (res, rec) = run_for(cfg(), &fake, Duration::from_secs(50)).await;
        let summary = res.expect("graceful stop");

        assert_eq!(rec.restarts(), vec![(4, RestartReason::SequenceGap)]);
        assert_eq!(summary.restarts, 1);
        assert_eq!(summary.gaps.len(), 1);
        assert_eq!(fake.created(), 2);
        assert_eq!(fake.live_sessions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unhealthy_after_reload_restarts_once_and_resets_timer() {
        let fake = FakeProvider::new();
        // cycles 1-2 healthy; cycle 3 unhealthy before and after the reload
        fake.push_health_states(["complete", "complete", "loading", "loading"]);
        let cfg = WatchdogConfig {
            restart_interval: Duration::from_secs(60),
            ..cfg()
        };

        let (res, rec) = run_for(cfg, &fake, Duration::from_secs(100)).await;
        res.expect("graceful stop");

        // cycles run at t=0,15,..,90; the planned restart lands 60s after the
        // unhealthy one (cycle 7), not 60s after start (cycle 5)
        assert_eq!(
            rec.restarts(),
            vec![(3, RestartReason::Unhealthy), (7, RestartReason::Planned)]
        );
        assert_eq!(fake.navigations(), 1);
        assert_eq!(rec.count(EventKind::HealthUnhealthy), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_reload_keeps_session() {
        let fake = FakeProvider::new();
        fake.push_health_states(["loading"]);

        let (res, rec) = run_for(cfg(), &fake, Duration::from_secs(20)).await;
        assert_eq!(res.expect("graceful stop").restarts, 0);
        assert_eq!(fake.navigations(), 1);
        assert_eq!(fake.created(), 1);
        assert_eq!(rec.count(EventKind::SessionReloaded), 1);
        assert_eq!(rec.count(EventKind::CycleCompleted), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_restart_interval_restarts_every_cycle_and_still_observes_draws() {
        let fake = FakeProvider::new();
        fake.push_draws([1, 2, 3, 4]);
        let cfg = WatchdogConfig {
            restart_interval: Duration::ZERO,
            ..cfg()
        };

        let (res, rec) = run_for(cfg, &fake, Duration::from_secs(50)).await;
        let summary = res.expect("graceful stop");

        assert_eq!(summary.cycles, 4);
        assert_eq!(summary.restarts, 4);
        assert_eq!(fake.created(), 5);
        assert!(rec.restarts().iter().all(|(_, r)| *r == RestartReason::Planned));
        assert_eq!(rec.count(EventKind::CycleCompleted), 4);
        assert_eq!(summary.draws_observed, 4);
        assert_eq!(summary.last_draw_number, Some(4));
        assert!(summary.gaps.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn gap_restart_rechecks_without_sleeping() {
        let fake = FakeProvider::new();
        fake.push_draws([1, 3, 4]);

        let (res, rec) = run_for(cfg(), &fake, Duration::from_secs(20)).await;
        let summary = res.expect("graceful stop");

        // t=0 draw 1; t=15 draw 3 (gap, restart); t=15 again draw 4
        assert_eq!(summary.cycles, 3);
        assert_eq!(summary.last_draw_number, Some(4));
        assert_eq!(rec.restarts(), vec![(2, RestartReason::SequenceGap)]);
        assert_eq!(rec.count(EventKind::CycleCompleted), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_continues_the_cycle_on_the_new_session() {
        let fake = FakeProvider::new();
        fake.set_subsystem("DrawSync", false);
        fake.push_draws([9]);
        let cfg = WatchdogConfig {
            validation_stride: 1,
            ..cfg()
        };

        let (res, rec) = run_for(cfg, &fake, Duration::from_secs(5)).await;
        let summary = res.expect("graceful stop");

        assert_eq!(rec.restarts(), vec![(1, RestartReason::ValidationFailed)]);
        assert_eq!(summary.last_draw_number, Some(9));
        assert_eq!(rec.count(EventKind::CycleCompleted), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn panic_during_replace_reacquires_next_cycle() {
        let fake = FakeProvider::new();
        let cfg = WatchdogConfig {
            restart_interval: Duration::from_secs(60),
            ..cfg()
        };
        // the first create after the initial one panics
        let arm = {
            let fake = fake.clone();
            tokio::spawn(async move {
                time::sleep(Duration::from_secs(50)).await;
                fake.panic_on_next_create();
            })
        };

        let (res, rec) = run_for(cfg, &fake, Duration::from_secs(75)).await;
        let summary = res.expect("graceful stop");
        arm.await.expect("arm task");

        // t=60 planned restart panics in create; t=70 finds no session and reacquires
        assert_eq!(
            rec.restarts(),
            vec![(5, RestartReason::Planned), (6, RestartReason::SessionLost)]
        );
        assert_eq!(rec.count(EventKind::CycleFault), 1);
        assert_eq!(summary.cycles, 6);
        assert_eq!(summary.restarts, 1);
        assert_eq!(fake.created(), 2);
        assert_eq!(fake.live_sessions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_subsystem_triggers_restart() {
        let fake = FakeProvider::new();
        fake.set_subsystem("DrawSync", false);
        let cfg = WatchdogConfig {
            validation_stride: 1,
            ..cfg()
        };

        let (res, rec) = run_for(cfg, &fake, Duration::from_secs(20)).await;
        let summary = res.expect("graceful stop");

        assert_eq!(
            rec.restarts(),
            vec![
                (1, RestartReason::ValidationFailed),
                (2, RestartReason::ValidationFailed)
            ]
        );
        assert_eq!(summary.subsystems.get("DrawSync"), Some(false));
        assert_eq!(summary.subsystems.get("DataPersistence"), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn validation_probe_error_triggers_restart() {
        let fake = FakeProvider::new();
        fake.set_validation_payload(serde_json::json!({ "error": "not loaded" }));
        let cfg = WatchdogConfig {
            validation_stride: 1,
            ..cfg()
        };

        let (res, rec) = run_for(cfg, &fake, Duration::from_secs(5)).await;
        res.expect("graceful stop");
        assert_eq!(rec.restarts(), vec![(1, RestartReason::ValidationFailed)]);
        assert_eq!(rec.count(EventKind::ValidationFailed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn panic_in_cycle_does_not_stop_the_loop() {
        let fake = FakeProvider::new();
        fake.panic_on_next_draw();

        let (res, rec) = run_for(cfg(), &fake, Duration::from_secs(30)).await;
        let summary = res.expect("graceful stop");

        // t=0 panics, backoff 10s; t=10 and t=25 complete
        assert_eq!(summary.cycles, 3);
        assert_eq!(rec.count(EventKind::CycleFault), 1);
        assert_eq!(rec.count(EventKind::CycleCompleted), 2);
        assert_eq!(rec.delays(), vec![10_000]);
        assert_eq!(fake.created(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn draw_fetch_errors_back_off_progressively() {
        let fake = FakeProvider::new();
        fake.fail_next_draws(2);
        let mut cfg = cfg();
        cfg.fault_backoff.factor = 2.0;

        let (res, rec) = run_for(cfg, &fake, Duration::from_secs(35)).await;
        res.expect("graceful stop");

        // t=0 fault, t=10 fault, t=30 clean
        assert_eq!(rec.delays(), vec![10_000, 20_000]);
        assert_eq!(rec.count(EventKind::CycleCompleted), 1);
        assert_eq!(fake.created(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn initial_acquire_failure_is_fatal() {
        let fake = FakeProvider::new();
        fake.fail_creates(1);

        let (res, rec) = run_for(cfg(), &fake, Duration::from_secs(3600)).await;
        let err = res.unwrap_err();
        assert_eq!(err.as_label(), "watchdog_initial_acquire");

        let kinds = rec.kinds();
        assert_eq!(
            &kinds[kinds.len() - 2..],
            &[EventKind::SummaryReported, EventKind::Stopped]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_restart_is_fatal_and_releases() {
        let fake = FakeProvider::new();
        fake.fail_creates_from(2);
        let cfg = WatchdogConfig {
            restart_interval: Duration::ZERO,
            ..cfg()
        };

        let (res, rec) = run_for(cfg, &fake, Duration::from_secs(3600)).await;
        assert!(matches!(res, Err(WatchdogError::RestartExhausted { .. })));
        assert_eq!(fake.live_sessions(), 0);
        assert_eq!(rec.count(EventKind::RestartFailed), 1);
        assert_eq!(rec.count(EventKind::SummaryReported), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_releases_session_and_reports_summary() {
        let fake = FakeProvider::new();
        fake.push_draws([7, 8]);

        let (res, rec) = run_for(cfg(), &fake, Duration::from_secs(20)).await;
        let summary = res.expect("graceful stop");

        assert_eq!(summary.last_draw_number, Some(8));
        assert_eq!(fake.live_sessions(), 0);
        let kinds = rec.kinds();
        assert_eq!(
            &kinds[kinds.len() - 4..],
            &[
                EventKind::ShutdownRequested,
                EventKind::SessionReleased,
                EventKind::SummaryReported,
                EventKind::Stopped
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_during_initial_load_releases_the_created_session() {
        let fake = FakeProvider::new();
        fake.never_ready();

        let (res, rec) = run_for(cfg(), &fake, Duration::from_secs(5)).await;
        res.expect("graceful stop");

        assert_eq!(rec.count(EventKind::GraceExceeded), 1);
        assert_eq!(fake.created(), 1);
        assert_eq!(fake.live_sessions(), 0);
        assert_eq!(rec.count(EventKind::SessionReleased), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_cycle_is_abandoned_after_grace() {
        let fake = FakeProvider::new();
        fake.set_evaluate_delay(Duration::from_secs(3600));
        let cfg = WatchdogConfig {
            probe_timeout: Duration::ZERO,
            grace: Duration::from_secs(10),
            ..cfg()
        };

        let start = Instant::now();
        let (res, rec) = run_for(cfg, &fake, Duration::from_secs(5)).await;
        res.expect("graceful stop");

        assert!(start.elapsed() < Duration::from_secs(60));
        assert_eq!(rec.count(EventKind::GraceExceeded), 1);
        assert_eq!(fake.live_sessions(), 0);
    }
}
