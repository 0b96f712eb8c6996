//! hazardd - traffic hazard proximity tracker daemon
//!
//! ## Commands
//!
//! - `run`: check the API key, then refresh on the configured interval until
//!   Ctrl-C
//! - `once`: run a single cycle
//! - `check-config`: validate the configuration and print it
//!
//! Events and summaries are written to stdout as JSON lines; logs go to
//! stderr.

mod config;
mod sink;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hazard_core::{
    FileStateStore, HazardStateStore, HazardTracker, MemoryStateStore, Scheduler, StaticLocations,
};
use hazard_feed::{FeedClient, API_KEY_ENV};
use tracing::{info, Level};

use crate::config::DaemonConfig;
use crate::sink::JsonLinesConsumer;

#[derive(Parser)]
#[command(name = "hazardd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tracks live traffic hazards near your home and devices", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, default_value = "hazardd.toml")]
    config: PathBuf,

    /// Feed API key, overriding the configuration file
    #[arg(long, global = true, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the periodic tracker until interrupted
    Run,

    /// Run one cycle and exit
    Once,

    /// Validate the configuration and print it (API key omitted)
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    hazard_core::telemetry::init_tracing(cli.json, level);

    let config = DaemonConfig::load(&cli.config, cli.api_key.clone())
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    match cli.command {
        Commands::Run => cmd_run(&config).await,
        Commands::Once => cmd_once(&config).await,
        Commands::CheckConfig => cmd_check_config(&config),
    }
}

fn build_tracker(config: &DaemonConfig) -> Result<Arc<HazardTracker>> {
    let fetcher = Arc::new(FeedClient::new(config.feed_config()).context("Failed to build feed client")?);
    let locations = Arc::new(StaticLocations::from_config(&config.tracker));
    let store: Arc<dyn HazardStateStore> = match &config.state_file {
        Some(path) => Arc::new(
            FileStateStore::new(path)
                .with_context(|| format!("Failed to open state file {}", path.display()))?,
        ),
        None => Arc::new(MemoryStateStore::new()),
    };
    let consumer = Arc::new(JsonLinesConsumer::stdout());

    let tracker = HazardTracker::new(config.tracker.clone(), fetcher, locations, store, consumer)?;
    Ok(Arc::new(tracker))
}

async fn cmd_run(config: &DaemonConfig) -> Result<()> {
    let tracker = build_tracker(config)?;
    tracker
        .validate_credentials()
        .await
        .context("The hazards feed rejected the API key")?;

    let (scheduler, handle) = Scheduler::for_tracker(tracker.clone()).await;
    let mut task = tokio::spawn(scheduler.run());
    info!(instance_id = %config.tracker.instance_id, "hazardd running");

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!("interrupt received, shutting down");
            handle.shutdown();
            task.await.context("Scheduler task panicked")?;
        }
        joined = &mut task => {
            joined.context("Scheduler task panicked")?;
        }
    }

    // A state file keeps its baseline for the next start.
    tracker.shutdown(false).await?;
    Ok(())
}

async fn cmd_once(config: &DaemonConfig) -> Result<()> {
    let tracker = build_tracker(config)?;
    let report = tracker.run_cycle().await.context("Cycle failed")?;
    info!(
        cycle_id = %report.cycle_id,
        fetched = report.fetched,
        nearby = report.nearby,
        events = report.events.len(),
        "cycle complete"
    );
    tracker.shutdown(false).await?;
    Ok(())
}

fn cmd_check_config(config: &DaemonConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    eprintln!(
        "configuration OK: {} feed path(s), {} device tracker(s)",
        config.tracker.feed_paths().len(),
        config.tracker.device_trackers.len()
    );
    Ok(())
}
