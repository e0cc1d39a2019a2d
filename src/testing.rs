//! Scripted in-memory [`SessionProvider`] for unit tests.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::time;

use crate::config::DEFAULT_SUBSYSTEMS;
use crate::error::ProviderError;
use crate::session::{ProbeExpr, ProbeKind, SessionId, SessionProvider};

#[derive(Default)]
struct Script {
    next_id: u64,
    live: HashSet<String>,
    created: u32,
    navigations: u32,
    last_target: String,

    create_failures: u32,
    fail_creates_from: Option<u32>,
    not_ready_polls: u32,
    never_ready: bool,
    address: Option<String>,
    health_states: VecDeque<String>,
    subsystems: BTreeMap<String, bool>,
    validation_payload: Option<Value>,
    draws: VecDeque<Value>,
    last_draw: Option<Value>,
    draw_failures: u32,
    draw_panics: u32,
    create_panics: u32,
    spins: u64,

    evaluate_error: Option<ProviderError>,
    evaluate_delay: Duration,
    navigate_error: Option<ProviderError>,
    terminate_error: Option<ProviderError>,
}

/// Provider whose behaviour is scripted by the test.
///
/// Sessions always come up ready, healthy and with every default subsystem
/// present unless the test says otherwise.
pub(crate) struct FakeProvider {
    script: Mutex<Script>,
}

impl FakeProvider {
    pub(crate) fn new() -> Arc<Self> {
        let subsystems = DEFAULT_SUBSYSTEMS
            .iter()
            .map(|name| (name.to_string(), true))
            .collect();
        Arc::new(Self {
            script: Mutex::new(Script {
                subsystems,
                ..Script::default()
            }),
        })
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn set_address(&self, address: &str) {
        self.script().address = Some(address.to_string());
    }

    /// Upcoming health probes report these ready states, then `complete`.
    pub(crate) fn push_health_states<'a>(&self, states: impl IntoIterator<Item = &'a str>) {
        self.script()
            .health_states
            .extend(states.into_iter().map(String::from));
    }

    pub(crate) fn set_subsystem(&self, name: &str, present: bool) {
        self.script().subsystems.insert(name.to_string(), present);
    }

    pub(crate) fn set_validation_payload(&self, payload: Value) {
        self.script().validation_payload = Some(payload);
    }

    /// Upcoming draw fetches report these numbers; the last one then repeats.
    pub(crate) fn push_draws(&self, draws: impl IntoIterator<Item = i64>) {
        self.script().draws.extend(draws.into_iter().map(Value::from));
    }

    pub(crate) fn fail_next_draws(&self, n: u32) {
        self.script().draw_failures += n;
    }

    pub(crate) fn panic_on_next_draw(&self) {
        self.script().draw_panics += 1;
    }

    pub(crate) fn panic_on_next_create(&self) {
        self.script().create_panics += 1;
    }

    pub(crate) fn fail_creates(&self, n: u32) {
        self.script().create_failures += n;
    }

    /// Every create from the `nth` (1-based, counting successes) on fails.
    pub(crate) fn fail_creates_from(&self, nth: u32) {
        self.script().fail_creates_from = Some(nth);
    }

    /// The next `n` readiness polls report a loading document.
    pub(crate) fn delay_readiness(&self, n: u32) {
        self.script().not_ready_polls += n;
    }

    pub(crate) fn never_ready(&self) {
        self.script().never_ready = true;
    }

    pub(crate) fn fail_evaluate(&self, err: ProviderError) {
        self.script().evaluate_error = Some(err);
    }

    /// Delays every probe except readiness.
    pub(crate) fn set_evaluate_delay(&self, delay: Duration) {
        self.script().evaluate_delay = delay;
    }

    pub(crate) fn fail_navigate(&self, err: ProviderError) {
        self.script().navigate_error = Some(err);
    }

    pub(crate) fn fail_terminate(&self, err: ProviderError) {
        self.script().terminate_error = Some(err);
    }

    pub(crate) fn created(&self) -> u32 {
        self.script().created
    }

    pub(crate) fn navigations(&self) -> u32 {
        self.script().navigations
    }

    pub(crate) fn live_sessions(&self) -> usize {
        self.script().live.len()
    }

    fn check_live(script: &Script, id: &SessionId) -> Result<(), ProviderError> {
        if script.live.contains(id.as_str()) {
            Ok(())
        } else {
            Err(ProviderError::UnknownSession(id.to_string()))
        }
    }

    fn readiness(script: &mut Script) -> Value {
        let ready = if script.never_ready {
            false
        } else if script.not_ready_polls > 0 {
            script.not_ready_polls -= 1;
            false
        } else {
            true
        };
        json!({
            "readyState": if ready { "complete" } else { "loading" },
            "hasBody": ready,
            "title": "TV Display",
            "url": script.last_target,
        })
    }

    fn draw_state(script: &mut Script) -> Result<Value, ProviderError> {
        if script.draw_failures > 0 {
            script.draw_failures -= 1;
            return Err(ProviderError::Rejected {
                code: "javascript error".into(),
                message: "draw manager not initialised".into(),
            });
        }
        if let Some(next) = script.draws.pop_front() {
            script.last_draw = Some(next);
            script.spins += 1;
        }
        Ok(json!({
            "currentDrawNumber": script.last_draw.clone().unwrap_or_else(|| json!("unknown")),
            "rolledNumbersCount": script.spins,
            "lastUpdate": "2026-01-01T00:00:00Z",
            "tabVisibilityState": true,
            "systems": script.subsystems,
        }))
    }
}

#[async_trait]
impl SessionProvider for FakeProvider {
    async fn create(&self, target: &str) -> Result<SessionId, ProviderError> {
        let panic_now = {
            let mut script = self.script();
            let due = script.create_panics > 0;
            script.create_panics = script.create_panics.saturating_sub(1);
            due
        };
        if panic_now {
            panic!("scripted panic inside create");
        }

        let mut script = self.script();
        let failing_from = script
            .fail_creates_from
            .is_some_and(|nth| script.created + 1 >= nth);
        if script.create_failures > 0 || failing_from {
            script.create_failures = script.create_failures.saturating_sub(1);
            return Err(ProviderError::Transport("connection refused".into()));
        }
        script.next_id += 1;
        script.created += 1;
        let id = format!("fake-{}", script.next_id);
        script.live.insert(id.clone());
        script.last_target = target.to_string();
        Ok(SessionId::new(id))
    }

    async fn navigate(&self, id: &SessionId, address: &str) -> Result<(), ProviderError> {
        let mut script = self.script();
        Self::check_live(&script, id)?;
        if let Some(err) = script.navigate_error.clone() {
            return Err(err);
        }
        script.navigations += 1;
        script.last_target = address.to_string();
        Ok(())
    }

    async fn evaluate(&self, id: &SessionId, probe: &ProbeExpr) -> Result<Value, ProviderError> {
        let delay = self.script().evaluate_delay;
        if !delay.is_zero() && probe.kind != ProbeKind::Readiness {
            time::sleep(delay).await;
        }

        {
            let mut script = self.script();
            Self::check_live(&script, id)?;
            if let Some(err) = script.evaluate_error.clone() {
                return Err(err);
            }
            match probe.kind {
                ProbeKind::Readiness => return Ok(Self::readiness(&mut script)),
                ProbeKind::Health => {
                    let state = script
                        .health_states
                        .pop_front()
                        .unwrap_or_else(|| "complete".to_string());
                    return Ok(json!({
                        "url": script.last_target,
                        "title": "TV Display",
                        "readyState": state,
                        "timestamp": 0,
                    }));
                }
                ProbeKind::Validation => {
                    let payload = script
                        .validation_payload
                        .clone()
                        .unwrap_or_else(|| json!({ "systems": script.subsystems }));
                    return Ok(payload);
                }
                ProbeKind::DrawState if script.draw_panics > 0 => {
                    script.draw_panics -= 1;
                }
                ProbeKind::DrawState => return Self::draw_state(&mut script),
            }
        }

        panic!("scripted panic inside draw probe");
    }

    async fn current_address(&self, id: &SessionId) -> Result<String, ProviderError> {
        let script = self.script();
        Self::check_live(&script, id)?;
        Ok(script
            .address
            .clone()
            .unwrap_or_else(|| script.last_target.clone()))
    }

    async fn terminate(&self, id: &SessionId) -> Result<(), ProviderError> {
        let mut script = self.script();
        let removed = script.live.remove(id.as_str());
        if let Some(err) = script.terminate_error.clone() {
            return Err(err);
        }
        if removed {
            Ok(())
        } else {
            Err(ProviderError::UnknownSession(id.to_string()))
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
