//! # Session provider boundary.
//!
//! Provides [`SessionProvider`], the minimal capability the watchdog needs from
//! a rendering backend. Anything that can create a session, point it at an
//! address, run a read-only script in it, report its current address and tear
//! it down can be supervised.
//!
//! ## Contract
//! - Calls may block for a long time; callers wrap every call in a deadline.
//! - `evaluate` runs **read-only** probes and returns JSON.
//! - `terminate` is best-effort; callers log and swallow its errors.
//!
//! ## Example
//! ```no_run
//! use async_trait::async_trait;
//! use serde_json::{Value, json};
//! use drawwatch::{ProbeExpr, ProviderError, SessionId, SessionProvider};
//!
//! struct Static;
//!
//! #[async_trait]
//! impl SessionProvider for Static {
//!     async fn create(&self, _target: &str) -> Result<SessionId, ProviderError> {
//!         Ok(SessionId::new("static-1"))
//!     }
//!     async fn navigate(&self, _id: &SessionId, _address: &str) -> Result<(), ProviderError> {
//!         Ok(())
//!     }
//!     async fn evaluate(&self, _id: &SessionId, _probe: &ProbeExpr) -> Result<Value, ProviderError> {
//!         Ok(json!({ "readyState": "complete", "hasBody": true }))
//!     }
//!     async fn current_address(&self, _id: &SessionId) -> Result<String, ProviderError> {
//!         Ok("http://localhost/tv".into())
//!     }
//!     async fn terminate(&self, _id: &SessionId) -> Result<(), ProviderError> {
//!         Ok(())
//!     }
//! }
//! ```

use std::borrow::Cow;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;
use crate::session::SessionId;

/// What a probe expression is for.
///
/// Real providers only need [`ProbeExpr::source`]; the kind lets test doubles
/// and logs tell probes apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    /// Page load readiness (used while acquiring/reloading).
    Readiness,
    /// Lightweight liveness check.
    Health,
    /// Subsystem presence enumeration.
    Validation,
    /// Current draw state fetch.
    DrawState,
}

impl ProbeKind {
    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProbeKind::Readiness => "readiness",
            ProbeKind::Health => "health",
            ProbeKind::Validation => "validation",
            ProbeKind::DrawState => "draw_state",
        }
    }
}

/// A read-only script to run inside the rendered resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeExpr {
    /// Purpose of the probe.
    pub kind: ProbeKind,
    /// Script body; must `return` a JSON-serializable value.
    pub source: Cow<'static, str>,
}

impl ProbeExpr {
    /// Creates a probe from a static script.
    pub const fn new(kind: ProbeKind, source: &'static str) -> Self {
        Self {
            kind,
            source: Cow::Borrowed(source),
        }
    }

    /// Creates a probe from a generated script.
    pub fn owned(kind: ProbeKind, source: String) -> Self {
        Self {
            kind,
            source: Cow::Owned(source),
        }
    }
}

/// Rendering backend capable of hosting supervised sessions.
#[async_trait]
pub trait SessionProvider: Send + Sync + 'static {
    /// Creates a session and directs it to `target`.
    async fn create(&self, target: &str) -> Result<SessionId, ProviderError>;

    /// Directs an existing session to `address`.
    async fn navigate(&self, id: &SessionId, address: &str) -> Result<(), ProviderError>;

    /// Runs a read-only probe and returns its JSON result.
    async fn evaluate(&self, id: &SessionId, probe: &ProbeExpr) -> Result<Value, ProviderError>;

    /// Returns the address the session currently shows.
    async fn current_address(&self, id: &SessionId) -> Result<String, ProviderError>;

    /// Destroys the session.
    async fn terminate(&self, id: &SessionId) -> Result<(), ProviderError>;

    /// Returns the provider name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
