//! # Watchdog configuration.
//!
//! Provides [`WatchdogConfig`], the immutable settings resolved once at startup.
//!
//! Resolution order (later wins):
//! 1. [`WatchdogConfig::default`]
//! 2. an optional TOML file ([`WatchdogConfig::from_toml_str`] / [`WatchdogConfig::load`])
//! 3. command-line overrides applied by the binary
//!
//! ## Sentinel values
//! - `validation_stride = 0` → treated as `1` (validate every cycle)
//! - `history_retention = 0` → treated as `1`
//! - `bus_capacity = 0` → treated as `1`
//!
//! ## File format
//! ```toml
//! target_address = "http://localhost/slipp/tvdisplay/index.html"
//! probe_interval_secs = 15
//! restart_interval_secs = 7200
//! emergency_restart_on_gap = true
//! subsystems = ["DrawSync", "DataPersistence"]
//!
//! [webdriver]
//! endpoint = "http://localhost:9515"
//! headless = true
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::policies::{BackoffPolicy, JitterPolicy};

/// Subsystems expected inside the rendered display by default.
pub const DEFAULT_SUBSYSTEMS: [&str; 4] = [
    "TabVisibilityManager",
    "DrawNumberManager",
    "DataPersistence",
    "DrawSync",
];

/// Errors raised while loading a configuration file.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config {path}: {source}")]
    Read {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings of the bundled WebDriver session provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebDriverConfig {
    /// Base URL of the WebDriver server (e.g. chromedriver).
    pub endpoint: String,
    /// Run the browser without a visible window.
    pub headless: bool,
    /// Browser window size in pixels (width, height).
    pub window_size: (u32, u32),
    /// User agent presented by the browser.
    pub user_agent: String,
    /// Additional browser command-line arguments.
    pub extra_args: Vec<String>,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9515".to_string(),
            headless: true,
            window_size: (1920, 1080),
            user_agent: "DrawWatch/1.0".to_string(),
            extra_args: Vec::new(),
        }
    }
}

/// Configuration for the watchdog runtime.
///
/// Defines:
/// - **Target**: the address the display session renders
/// - **Cadence**: probe interval, proactive restart interval, validation stride
/// - **Escalation**: which anomalies trigger a restart
/// - **Deadlines**: bounds on every call into the session boundary
/// - **Shutdown**: grace period for an in-flight cycle
///
/// All fields are public. Prefer the helper accessors over reading sentinel
/// fields directly.
#[derive(Clone, Debug)]
pub struct WatchdogConfig {
    /// Address the session is directed to on every acquire/reload.
    pub target_address: String,

    /// Delay between monitoring cycles.
    pub probe_interval: Duration,

    /// Age after which a healthy session is replaced anyway.
    ///
    /// `Duration::ZERO` restarts on every cycle.
    pub restart_interval: Duration,

    /// Run the subsystem validator on every Nth cycle (`0` is treated as `1`).
    pub validation_stride: u32,

    /// Whether the subsystem validator runs at all.
    pub validate_systems: bool,

    /// Whether draw state is fetched each cycle.
    pub monitor_draw_numbers: bool,

    /// Whether fetched draw numbers are fed to the gap detector.
    pub detect_sequence_gaps: bool,

    /// Replace the session when a sequence gap is detected.
    pub emergency_restart_on_gap: bool,

    /// Number of draw observations kept in history (`0` is treated as `1`).
    pub history_retention: usize,

    /// Names of the subsystems the validator expects to be present.
    pub subsystems: Vec<String>,

    /// URL scheme the session's current address must start with to be healthy.
    pub expected_scheme: String,

    /// Deadline for creating a session.
    pub create_timeout: Duration,

    /// Bounded wait for the readiness signal after create/reload.
    pub load_timeout: Duration,

    /// Interval between readiness polls during a load.
    pub load_poll_interval: Duration,

    /// Pause after readiness so the page's own scripts can initialise.
    pub settle_delay: Duration,

    /// Deadline for a single probe (health, validation, draw fetch).
    pub probe_timeout: Duration,

    /// Deadline for terminating a session.
    pub release_timeout: Duration,

    /// Backoff applied after an unexpected cycle fault.
    pub fault_backoff: BackoffPolicy,

    /// Time an in-flight cycle may keep running after shutdown is requested.
    pub grace: Duration,

    /// Capacity of the event bus ring buffer.
    pub bus_capacity: usize,

    /// Settings of the bundled WebDriver provider.
    pub webdriver: WebDriverConfig,
}

impl WatchdogConfig {
    /// Returns the validation stride clamped to a minimum of 1.
    #[inline]
    pub fn validation_stride_clamped(&self) -> u64 {
        u64::from(self.validation_stride.max(1))
    }

    /// Returns the history retention clamped to a minimum of 1.
    #[inline]
    pub fn history_retention_clamped(&self) -> usize {
        self.history_retention.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Whether cycle number `cycle` (1-based) is a validation cycle.
    #[inline]
    pub fn is_validation_cycle(&self, cycle: u64) -> bool {
        self.validate_systems && cycle % self.validation_stride_clamped() == 0
    }

    /// Parses a TOML document and overlays it onto the defaults.
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(src)?;
        let mut cfg = Self::default();
        file.apply(&mut cfg);
        Ok(cfg)
    }

    /// Reads a TOML file and overlays it onto the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&src)
    }
}

impl Default for WatchdogConfig {
    /// Default configuration:
    ///
    /// - probe every 15s, proactive restart every 2h
    /// - validate subsystems every 5th cycle
    /// - emergency restart on sequence gaps, 20 draws of history
    /// - 60s create, 30s load, 10s settle, 10s probe/release deadlines
    /// - 10s constant fault backoff, 10s shutdown grace
    fn default() -> Self {
        Self {
            target_address: "http://localhost/slipp/tvdisplay/index.html".to_string(),
            probe_interval: Duration::from_secs(15),
            restart_interval: Duration::from_secs(7200),
            validation_stride: 5,
            validate_systems: true,
            monitor_draw_numbers: true,
            detect_sequence_gaps: true,
            emergency_restart_on_gap: true,
            history_retention: 20,
            subsystems: DEFAULT_SUBSYSTEMS.iter().map(|s| s.to_string()).collect(),
            expected_scheme: "http".to_string(),
            create_timeout: Duration::from_secs(60),
            load_timeout: Duration::from_secs(30),
            load_poll_interval: Duration::from_millis(500),
            settle_delay: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(10),
            release_timeout: Duration::from_secs(10),
            fault_backoff: BackoffPolicy {
                first: Duration::from_secs(10),
                max: Duration::from_secs(60),
                factor: 1.0,
                jitter: JitterPolicy::None,
            },
            grace: Duration::from_secs(10),
            bus_capacity: 1024,
            webdriver: WebDriverConfig::default(),
        }
    }
}

/// On-disk shape of the configuration: every key optional, seconds as integers.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    target_address: Option<String>,
    probe_interval_secs: Option<u64>,
    restart_interval_secs: Option<u64>,
    validation_stride: Option<u32>,
    validate_systems: Option<bool>,
    monitor_draw_numbers: Option<bool>,
    detect_sequence_gaps: Option<bool>,
    emergency_restart_on_gap: Option<bool>,
    history_retention: Option<usize>,
    subsystems: Option<Vec<String>>,
    expected_scheme: Option<String>,
    create_timeout_secs: Option<u64>,
    load_timeout_secs: Option<u64>,
    settle_delay_secs: Option<u64>,
    probe_timeout_secs: Option<u64>,
    release_timeout_secs: Option<u64>,
    fault_backoff_secs: Option<u64>,
    grace_secs: Option<u64>,
    bus_capacity: Option<usize>,
    webdriver: Option<WebDriverFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct WebDriverFile {
    endpoint: Option<String>,
    headless: Option<bool>,
    window_size: Option<(u32, u32)>,
    user_agent: Option<String>,
    extra_args: Option<Vec<String>>,
}

impl ConfigFile {
    fn apply(self, cfg: &mut WatchdogConfig) {
        let secs = Duration::from_secs;

        if let Some(v) = self.target_address {
            cfg.target_address = v;
        }
        if let Some(v) = self.probe_interval_secs {
            cfg.probe_interval = secs(v);
        }
        if let Some(v) = self.restart_interval_secs {
            cfg.restart_interval = secs(v);
        }
        if let Some(v) = self.validation_stride {
            cfg.validation_stride = v;
        }
        if let Some(v) = self.validate_systems {
            cfg.validate_systems = v;
        }
        if let Some(v) = self.monitor_draw_numbers {
            cfg.monitor_draw_numbers = v;
        }
        if let Some(v) = self.detect_sequence_gaps {
            cfg.detect_sequence_gaps = v;
        }
        if let Some(v) = self.emergency_restart_on_gap {
            cfg.emergency_restart_on_gap = v;
        }
        if let Some(v) = self.history_retention {
            cfg.history_retention = v;
        }
        if let Some(v) = self.subsystems {
            cfg.subsystems = v;
        }
        if let Some(v) = self.expected_scheme {
            cfg.expected_scheme = v;
        }
        if let Some(v) = self.create_timeout_secs {
            cfg.create_timeout = secs(v);
        }
        if let Some(v) = self.load_timeout_secs {
            cfg.load_timeout = secs(v);
        }
        if let Some(v) = self.settle_delay_secs {
            cfg.settle_delay = secs(v);
        }
        if let Some(v) = self.probe_timeout_secs {
            cfg.probe_timeout = secs(v);
        }
        if let Some(v) = self.release_timeout_secs {
            cfg.release_timeout = secs(v);
        }
        if let Some(v) = self.fault_backoff_secs {
            cfg.fault_backoff.first = secs(v);
            cfg.fault_backoff.max = cfg.fault_backoff.max.max(secs(v));
        }
        if let Some(v) = self.grace_secs {
            cfg.grace = secs(v);
        }
        if let Some(v) = self.bus_capacity {
            cfg.bus_capacity = v;
        }
        if let Some(wd) = self.webdriver {
            if let Some(v) = wd.endpoint {
                cfg.webdriver.endpoint = v;
            }
            if let Some(v) = wd.headless {
                cfg.webdriver.headless = v;
            }
            if let Some(v) = wd.window_size {
                cfg.webdriver.window_size = v;
            }
            if let Some(v) = wd.user_agent {
                cfg.webdriver.user_agent = v;
            }
            if let Some(v) = wd.extra_args {
                cfg.webdriver.extra_args = v;
            }
        }
    }
}
