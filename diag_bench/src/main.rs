//! # Diagnostic Bench Binary
//!
//! Runs the diagnostic engine against the devices wired in a TOML file.
//!
//! # Usage
//!
//! ```bash
//! # Run until Ctrl-C, operating StartTest/Enable from the dashboard
//! diag_bench --config config/diag.toml
//!
//! # Enable two devices, start a run, exit when it completes
//! diag_bench -c config/diag.toml -e ShooterMotor -e IntakeMotor --start --exit-on-complete
//!
//! # Verbose JSON logs, dump the final dashboard
//! diag_bench -v --json --ticks 500 --dump dashboard.json
//! ```

use clap::Parser;
use diag_bench::config::BenchConfig;
use diag_bench::core::BenchCore;
use diag_bench::driver_registry::DriverRegistry;
use diag_common::config::{ConfigLoader, LogLevel};
use diag_common::consts::DEFAULT_CONFIG_PATH;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Diagnostic bench - drives device self-tests and terminators
#[derive(Parser, Debug)]
#[command(name = "diag_bench")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Diagnostic bench with pluggable simulation drivers")]
#[command(long_about = None)]
struct Args {
    /// Path to the bench configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable a device before the loop starts (can be specified multiple times)
    #[arg(short, long = "enable", action = clap::ArgAction::Append)]
    enable: Vec<String>,

    /// Press StartTest on the first tick
    #[arg(short, long)]
    start: bool,

    /// Stop after this many ticks (overrides engine.max_ticks)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Exit once a run completes or is aborted
    #[arg(long)]
    exit_on_complete: bool,

    /// Write the final dashboard as JSON to this file
    #[arg(long, value_name = "FILE")]
    dump: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("Bench failed: {}", e);
        eprintln!("diag_bench: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = BenchConfig::load(&args.config)?;
    setup_tracing(&args, config.shared.log_level);

    info!(
        "Diagnostic bench v{} starting ({})",
        env!("CARGO_PKG_VERSION"),
        args.config.display()
    );

    let registry = DriverRegistry::with_builtins();
    let mut core = BenchCore::new(&config, &registry)?;

    if let Some(ticks) = args.ticks {
        core.set_max_ticks(ticks);
    }
    if args.exit_on_complete {
        core.set_exit_on_complete(true);
    }
    for name in &args.enable {
        core.set_enabled(name, true)?;
    }
    if args.start {
        core.press_start();
    }

    let running = core.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    if let Err(e) = core.run() {
        error!("Bench loop error: {}", e);
    }
    core.shutdown();

    match &args.dump {
        Some(path) => core.dump(path)?,
        None => println!("{}", core.dashboard_json()?),
    }

    info!("Diagnostic bench shutdown complete");
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        level
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
