//! # W3C WebDriver session provider.
//!
//! [`WebDriverProvider`] drives a browser through a running WebDriver server
//! (chromedriver or compatible) over its HTTP protocol.
//!
//! | operation         | request                                  |
//! |-------------------|------------------------------------------|
//! | `create`          | `POST /session`, `POST .../timeouts`, `POST .../url` |
//! | `navigate`        | `POST /session/{id}/url`                 |
//! | `evaluate`        | `POST /session/{id}/execute/sync`        |
//! | `current_address` | `GET /session/{id}/url`                  |
//! | `terminate`       | `DELETE /session/{id}`                   |
//!
//! Error payloads (`{"value": {"error": .., "message": ..}}`) become
//! [`ProviderError`]s; `invalid session id` maps to
//! [`ProviderError::UnknownSession`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::WebDriverConfig;
use crate::error::ProviderError;
use crate::session::{ProbeExpr, SessionId, SessionProvider};

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(60);
const SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Session provider backed by a WebDriver server.
pub struct WebDriverProvider {
    client: Client,
    endpoint: String,
    capabilities: Value,
}

impl WebDriverProvider {
    /// Creates a provider for the server at `cfg.endpoint`.
    ///
    /// No connection is made until the first session is created.
    pub fn new(cfg: &WebDriverConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            capabilities: capabilities(cfg),
        })
    }

    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ProviderError> {
        let url = format!("{}{path}", self.endpoint);
        let mut req = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        let status = resp.status();
        let payload: Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("{method} {path}: {e}")))?;

        debug!(%method, path, status = status.as_u16(), "webdriver call");
        unwrap_value(status.is_success(), status.as_u16(), payload)
    }

    async fn navigate_raw(&self, id: &SessionId, address: &str) -> Result<(), ProviderError> {
        self.call(
            Method::POST,
            &format!("/session/{id}/url"),
            Some(json!({ "url": address })),
        )
        .await
        .map(drop)
    }
}

#[async_trait]
impl SessionProvider for WebDriverProvider {
    async fn create(&self, target: &str) -> Result<SessionId, ProviderError> {
        let value = self
            .call(
                Method::POST,
                "/session",
                Some(json!({ "capabilities": { "alwaysMatch": self.capabilities } })),
            )
            .await?;
        let id = session_id(&value)?;

        let setup = async {
            self.call(
                Method::POST,
                &format!("/session/{id}/timeouts"),
                Some(json!({
                    "pageLoad": PAGE_LOAD_TIMEOUT.as_millis() as u64,
                    "script": SCRIPT_TIMEOUT.as_millis() as u64,
                })),
            )
            .await?;
            self.navigate_raw(&id, target).await
        }
        .await;

        if let Err(e) = setup {
            if let Err(cleanup) = self.terminate(&id).await {
                warn!(session = %id, error = %cleanup, "failed to delete half-created session");
            }
            return Err(e);
        }
        Ok(id)
    }

    async fn navigate(&self, id: &SessionId, address: &str) -> Result<(), ProviderError> {
        self.navigate_raw(id, address).await
    }

    async fn evaluate(&self, id: &SessionId, probe: &ProbeExpr) -> Result<Value, ProviderError> {
        self.call(
            Method::POST,
            &format!("/session/{id}/execute/sync"),
            Some(json!({ "script": probe.source, "args": [] })),
        )
        .await
    }

    async fn current_address(&self, id: &SessionId) -> Result<String, ProviderError> {
        match self.call(Method::GET, &format!("/session/{id}/url"), None).await? {
            Value::String(url) => Ok(url),
            other => Err(ProviderError::Malformed(format!("expected url string, got {other}"))),
        }
    }

    async fn terminate(&self, id: &SessionId) -> Result<(), ProviderError> {
        self.call(Method::DELETE, &format!("/session/{id}"), None)
            .await
            .map(drop)
    }

    fn name(&self) -> &'static str {
        "webdriver"
    }
}

/// Chrome capabilities for an unattended display.
fn capabilities(cfg: &WebDriverConfig) -> Value {
    let mut args: Vec<String> = Vec::new();
    if cfg.headless {
        args.push("--headless".into());
    }
    args.extend(
        [
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-gpu",
            "--disable-extensions",
            "--log-level=3",
        ]
        .map(String::from),
    );
    let (w, h) = cfg.window_size;
    args.push(format!("--window-size={w},{h}"));
    args.push(format!("--user-agent={}", cfg.user_agent));
    args.extend(cfg.extra_args.iter().cloned());

    json!({
        "browserName": "chrome",
        "goog:chromeOptions": { "args": args },
    })
}

/// Extracts `value` from a WebDriver response, or the error it carries.
fn unwrap_value(success: bool, status: u16, payload: Value) -> Result<Value, ProviderError> {
    let mut body = match payload {
        Value::Object(body) => body,
        other => {
            return Err(ProviderError::Malformed(format!(
                "response is not an object: {other}"
            )));
        }
    };
    let value = body.remove("value").unwrap_or(Value::Null);

    if let Some(code) = value.get("error").and_then(Value::as_str) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(match code {
            "invalid session id" => ProviderError::UnknownSession(message),
            _ => ProviderError::Rejected {
                code: code.to_string(),
                message,
            },
        });
    }
    if !success {
        return Err(ProviderError::Rejected {
            code: format!("http {status}"),
            message: value.to_string(),
        });
    }
    Ok(value)
}

/// Session id from a new-session response (`value.sessionId`).
fn session_id(value: &Value) -> Result<SessionId, ProviderError> {
    value
        .get("sessionId")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(SessionId::new)
        .ok_or_else(|| ProviderError::Malformed(format!("new session response without id: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_carry_display_flags() {
        let cfg = WebDriverConfig {
            extra_args: vec!["--kiosk".into()],
            ..WebDriverConfig::default()
        };
        let caps = capabilities(&cfg);
        let args: Vec<&str> = caps["goog:chromeOptions"]["args"]
            .as_array()
            .expect("args")
            .iter()
            .filter_map(Value::as_str)
            .collect();

        assert_eq!(caps["browserName"], "chrome");
        assert!(args.contains(&"--headless"));
        assert!(args.contains(&"--window-size=1920,1080"));
        assert!(args.contains(&"--user-agent=DrawWatch/1.0"));
        assert_eq!(args.last(), Some(&"--kiosk"));
    }

    #[test]
    fn headful_omits_headless_flag() {
        let cfg = WebDriverConfig {
            headless: false,
            ..WebDriverConfig::default()
        };
        let caps = capabilities(&cfg);
        assert!(!caps.to_string().contains("--headless"));
    }

    #[test]
    fn successful_payload_yields_value() {
        let v = unwrap_value(true, 200, json!({ "value": "http://localhost/tv" })).expect("ok");
        assert_eq!(v, json!("http://localhost/tv"));

        let null = unwrap_value(true, 200, json!({ "value": null })).expect("ok");
        assert!(null.is_null());
    }

    #[test]
    fn error_payloads_are_mapped() {
        let gone = unwrap_value(
            false,
            404,
            json!({ "value": { "error": "invalid session id", "message": "session deleted" } }),
        );
        assert_eq!(gone, Err(ProviderError::UnknownSession("session deleted".into())));

        let script = unwrap_value(
            false,
            500,
            json!({ "value": { "error": "javascript error", "message": "x is undefined" } }),
        );
        assert!(matches!(
            script,
            Err(ProviderError::Rejected { ref code, .. }) if code == "javascript error"
        ));
    }

    #[test]
    fn non_success_without_error_field_is_rejected() {
        let err = unwrap_value(false, 502, json!({ "value": "bad gateway" })).unwrap_err();
        assert_eq!(err.as_label(), "provider_rejected");
    }

    #[test]
    fn session_id_is_read_from_value() {
        let id = session_id(&json!({ "sessionId": "abc", "capabilities": {} })).expect("id");
        assert_eq!(id.as_str(), "abc");
        assert!(session_id(&json!({ "capabilities": {} })).is_err());
    }
}
