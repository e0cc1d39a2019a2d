//! # Session handles.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Provider-assigned identifier of one session.
///
/// Cheap to clone (`Arc<str>`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(Arc<str>);

impl SessionId {
    /// Wraps a provider identifier.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// The identifier as text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to one rendering session and the address it was directed to.
///
/// Created by [`SessionLifecycleManager`](crate::SessionLifecycleManager) and
/// never mutated; a restart destroys it and creates a new one. Clones are
/// non-owning views used for one lifecycle epoch; only the manager terminates
/// the underlying session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionHandle {
    /// Provider-assigned identifier.
    pub id: SessionId,
    /// Address the session was directed to.
    pub target_address: Arc<str>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl SessionHandle {
    /// Creates a handle stamped with the current time.
    pub fn new(id: SessionId, target_address: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            target_address: target_address.into(),
            created_at: Utc::now(),
        }
    }
}
