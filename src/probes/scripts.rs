//! Probe scripts executed inside the rendered display.
//!
//! All scripts are read-only and `return` a plain JSON object.

use crate::session::{ProbeExpr, ProbeKind};

/// Page load readiness: `{ readyState, hasBody, title, url }`.
pub static READINESS: ProbeExpr = ProbeExpr::new(
    ProbeKind::Readiness,
    r#"return {
    readyState: document.readyState,
    hasBody: !!document.body,
    title: document.title,
    url: window.location.href
};"#,
);

/// Liveness: `{ url, title, readyState, timestamp }`.
pub static HEALTH: ProbeExpr = ProbeExpr::new(
    ProbeKind::Health,
    r#"return {
    url: window.location.href,
    title: document.title,
    readyState: document.readyState,
    timestamp: new Date().toISOString()
};"#,
);

/// Draw state: `{ currentDrawNumber, rolledNumbersCount, tabVisibilityState, systems }`.
pub fn draw_state(subsystems: &[String]) -> ProbeExpr {
    ProbeExpr::owned(
        ProbeKind::DrawState,
        format!(
            r#"return {{
    currentDrawNumber: window.currentDrawNumber || 'unknown',
    rolledNumbersCount: window.rolledNumbersArray ? window.rolledNumbersArray.length : 0,
    lastUpdate: new Date().toISOString(),
    tabVisibilityState: (window.TabVisibilityManager && typeof window.TabVisibilityManager.isVisible === 'function')
        ? window.TabVisibilityManager.isVisible() : 'unknown',
    systems: {}
}};"#,
            presence_map(subsystems)
        ),
    )
}

/// Subsystem presence: `{ systems: { name: bool, .. } }`.
pub fn validation(subsystems: &[String]) -> ProbeExpr {
    ProbeExpr::owned(
        ProbeKind::Validation,
        format!("return {{ systems: {} }};", presence_map(subsystems)),
    )
}

/// Renders `{ "A": typeof window["A"] !== 'undefined', .. }`.
fn presence_map(subsystems: &[String]) -> String {
    let entries: Vec<String> = subsystems
        .iter()
        .map(|name| {
            let key = serde_json::Value::String(name.clone()).to_string();
            format!("{key}: typeof window[{key}] !== 'undefined'")
        })
        .collect();
    format!("{{ {} }}", entries.join(", "))
}
