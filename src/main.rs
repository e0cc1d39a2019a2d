//! `drawwatch` binary: keeps a headless draw-feed display alive through a
//! WebDriver server.
//!
//! ```text
//! drawwatch [--config FILE] [--url URL] [--interval SECS] [--restart-interval SECS]
//!           [--no-emergency-restart] [--webdriver URL] [--log-file FILE]
//! ```
//!
//! Log verbosity comes from `RUST_LOG` (default `info`). Exit status is
//! non-zero only when the configuration is invalid, no session could be
//! acquired at startup, or a restart failed.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use drawwatch::{LogWriter, Supervisor, WatchdogConfig, WebDriverProvider, cancel_on_shutdown_signal};

#[derive(Debug, Parser)]
#[command(name = "drawwatch", version, about = "Watchdog for a headless draw-feed display")]
struct Cli {
    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address the display session renders
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Seconds between monitoring cycles
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Seconds after which a healthy session is replaced anyway
    #[arg(long, value_name = "SECS")]
    restart_interval: Option<u64>,

    /// Record sequence gaps without restarting the session
    #[arg(long)]
    no_emergency_restart: bool,

    /// WebDriver server endpoint
    #[arg(long, value_name = "URL")]
    webdriver: Option<String>,

    /// Also append logs to this file
    #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = "drawwatch.log")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn resolve(&self) -> anyhow::Result<WatchdogConfig> {
        let mut cfg = match &self.config {
            Some(path) => WatchdogConfig::load(path)?,
            None => WatchdogConfig::default(),
        };

        if let Some(url) = &self.url {
            cfg.target_address = url.clone();
        }
        if let Some(secs) = self.interval {
            cfg.probe_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.restart_interval {
            cfg.restart_interval = Duration::from_secs(secs);
        }
        if self.no_emergency_restart {
            cfg.emergency_restart_on_gap = false;
        }
        if let Some(endpoint) = &self.webdriver {
            cfg.webdriver.endpoint = endpoint.clone();
        }
        Ok(cfg)
    }
}

fn init_tracing(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .context("cannot install tracing subscriber")?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.log_file.as_ref()) {
        eprintln!("drawwatch: {e:#}");
        return ExitCode::FAILURE;
    }

    let cfg = match cli.resolve() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %format!("{e:#}"), "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let provider = match WebDriverProvider::new(&cfg.webdriver) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            error!(error = %e, "cannot set up webdriver client");
            return ExitCode::FAILURE;
        }
    };

    info!(
        target_address = %cfg.target_address,
        interval_secs = cfg.probe_interval.as_secs(),
        restart_interval_secs = cfg.restart_interval.as_secs(),
        emergency_restart_on_gap = cfg.emergency_restart_on_gap,
        webdriver = %cfg.webdriver.endpoint,
        "starting drawwatch"
    );

    let sup = Supervisor::builder(cfg, provider)
        .with_subscriber(Arc::new(LogWriter::new()))
        .build();

    let token = CancellationToken::new();
    let signals = cancel_on_shutdown_signal(token.clone());

    let result = sup.run(token.clone()).await;
    token.cancel();
    let _ = signals.await;

    match result {
        Ok(summary) => {
            info!(cycles = summary.cycles, gaps = summary.gaps.len(), "drawwatch stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, label = e.as_label(), "drawwatch failed");
            ExitCode::FAILURE
        }
    }
}
