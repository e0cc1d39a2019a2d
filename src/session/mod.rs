//! The supervised rendering session.
//!
//! - [`SessionProvider`] is the boundary to whatever actually renders the page;
//! - [`SessionHandle`]/[`SessionId`] identify one session;
//! - [`SessionLifecycleManager`] owns the one current session and performs
//!   acquire/reload/release/replace under deadlines;
//! - `WebDriverProvider` (feature `webdriver`) drives a real browser.

pub(crate) mod deadline;
mod handle;
mod lifecycle;
mod provider;
#[cfg(feature = "webdriver")]
mod webdriver;

pub use handle::{SessionHandle, SessionId};
pub use lifecycle::SessionLifecycleManager;
pub use provider::{ProbeExpr, ProbeKind, SessionProvider};
#[cfg(feature = "webdriver")]
pub use webdriver::WebDriverProvider;
