//! Call attendant service
//!
//! Reads caller-ID reports from standard input (one field per line, as a
//! voice modem prints them) and screens/answers each call on a simulated
//! line.

use anyhow::{Context, Result};
use call_attendant::logging::{log_welcome, setup_logging, LoggingConfig};
use call_attendant::prelude::*;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "call-attendant", version, about = "Screens and answers calls on a telephone line")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level, overrides the configuration file
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Validate the configuration (including greeting files) and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AttendantConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => AttendantConfig::default(),
    };

    let mut logging = LoggingConfig::from_settings(&config.logging)?;
    if let Some(level) = &args.log_level {
        logging.level = call_attendant::logging::parse_log_level(level)?;
    }
    if args.json_logs {
        logging = logging.with_json();
    }
    setup_logging(&logging)?;
    log_welcome(&logging, env!("CARGO_PKG_VERSION"));

    if args.check_config {
        config.validate()?;
        config.check_greeting_files()?;
        info!("Configuration is valid");
        return Ok(());
    }
    if let Err(e) = config.check_greeting_files() {
        warn!(error = %e, "Greeting playback will fail for some categories");
    }

    let (sender, queue) = caller_queue();
    let ring_signal = RingSignal::new();
    let lists = ListScreener::from_config(&config.screening)?;

    let engine = CallProcessingEngine::builder(config)
        .with_queue(queue)
        .with_ring_signal(ring_signal.clone())
        .with_membership_checker(Arc::new(lists))
        .with_call_logger(Arc::new(MemoryCallLog::new()))
        .with_line(Arc::new(SimulatedLine::new()))
        .with_recorder(Arc::new(LoggingRecorder::new()))
        .with_approved_indicator(Arc::new(LogIndicator::new("approved")))
        .with_blocked_indicator(Arc::new(LogIndicator::new("blocked")))
        .build()?;
    let stats = engine.stats();

    let feed = tokio::spawn(CallerIdFeed::new(sender, ring_signal).run(BufReader::new(tokio::io::stdin())));

    match engine.run().await {
        Err(AttendantError::IngestionClosed) => {
            let queued = feed.await.context("caller-ID feed task")??;
            info!(queued, stats = ?stats.snapshot(), "Line feed closed; shutting down");
            Ok(())
        }
        Err(e) => Err(e.into()),
        Ok(()) => Ok(()),
    }
}
