//! anapadd - Anapad device daemon
//!
//! Brings up the touchscreen, haptics board and load surface, runs force
//! feedback until interrupted, then shuts everything down in order.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod bridge;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anapad_core::prelude::*;
use anapad_i2c::LinuxBusProvider;
use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::CliError;

const BRIDGE_STOP_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "anapadd")]
#[command(about = "Anapad daemon - touch, force sensing and haptic feedback")]
#[command(version)]
struct Cli {
    /// Configuration file (.yaml, .yml or .json); defaults apply when omitted
    #[arg(short, long, env = "ANAPAD_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Feedback mode, overriding the configuration file
    #[arg(long)]
    mode: Option<FeedbackMode>,

    /// Validate the configuration, print it as JSON and exit
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("anapad={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn load_config(cli: &Cli) -> Result<AnapadConfig> {
    let mut config = match &cli.config {
        Some(path) => AnapadConfig::load(path)
            .map_err(CliError::InvalidConfiguration)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AnapadConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config.feedback.mode = mode;
    }
    Ok(config)
}

async fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    if cli.dry_run {
        println!("{}", serde_json::to_string_pretty(&config).map_err(CliError::from)?);
        return Ok(());
    }

    let mut anapad = Anapad::new(config, Arc::new(LinuxBusProvider));
    let touches = anapad.touchscreen().subscribe_touches();
    let failures = anapad.subscribe_failures();
    anapad.start().map_err(CliError::StartFailed)?;
    info!("anapad started, press Ctrl-C to stop");

    let anapad = Arc::new(Mutex::new(anapad));
    let (failed_tx, mut failed_rx) = mpsc::unbounded_channel();
    let bridge = bridge::spawn(Arc::clone(&anapad), touches, failures, failed_tx);

    let outcome: Result<()> = match &bridge {
        Ok(_) => {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    info!("interrupted");
                    signal.context("waiting for Ctrl-C")
                }
                Some(failure) = failed_rx.recv() => Err(CliError::SubsystemFailed(failure).into()),
            }
        }
        Err(e) => Err(anyhow::anyhow!("feedback bridge: {e}")),
    };

    if let Ok(bridge) = bridge {
        if bridge.stop(BRIDGE_STOP_TIMEOUT).is_none() {
            warn!("feedback bridge did not stop in time");
        }
    }
    if let Err(e) = anapad.lock().stop() {
        warn!(error = %e, "shutdown incomplete");
    }
    outcome
}
