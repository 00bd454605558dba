//! Headless Fix-It Factory runner.
//!
//! # Usage
//!
//! ```bash
//! # Play the built-in scenario with the autopilot
//! cargo run -p fixit_headless -- run
//!
//! # Play a scenario file at 60 Hz for at most two minutes of game time
//! cargo run -p fixit_headless -- run --scenario floor.ron --tick-rate 60 --ticks 7200
//!
//! # Validate a scenario file
//! cargo run -p fixit_headless -- validate --scenario floor.ron
//! ```
//!
//! Logs go to stderr and honour `RUST_LOG`; stdout carries JSON only.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fixit_core::config::TICK_RATE;
use fixit_headless::{scenario, HeadlessRunner, RunConfig};

#[derive(Parser)]
#[command(name = "fixit_headless")]
#[command(about = "Headless Fix-It Factory runner for CI and balance checks")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one session with the autopilot
    Run {
        /// Scenario file to load (defaults to the built-in factory floor)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Maximum number of ticks to simulate
        #[arg(short, long, default_value = "6000")]
        ticks: u64,

        /// Fixed steps per simulated second
        #[arg(long, default_value_t = TICK_RATE)]
        tick_rate: u32,

        /// Print every presentation event as a JSON line
        #[arg(long)]
        trace: bool,
    },

    /// Check that a scenario file loads and can start a session
    Validate {
        /// Scenario file to check
        #[arg(short, long)]
        scenario: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for JSON
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            ticks,
            tick_rate,
            trace,
        } => cmd_run(scenario, ticks, tick_rate, trace),
        Commands::Validate { scenario } => cmd_validate(&scenario),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            ExitCode::FAILURE
        }
    }
}

/// Play a session and print its summary.
fn cmd_run(
    path: Option<PathBuf>,
    ticks: u64,
    tick_rate: u32,
    trace: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = scenario::load_or_builtin(path.as_deref())?;
    let config = RunConfig {
        max_ticks: ticks,
        tick_rate,
        trace,
    };

    let mut runner = HeadlessRunner::new(&scenario, config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = runner.run(&mut out)?;

    serde_json::to_writer_pretty(&mut out, &summary)?;
    writeln!(out)?;
    Ok(())
}

/// Load a scenario and report what it contains.
fn cmd_validate(path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = scenario::load(path)?;
    tracing::info!(
        name = %scenario.name,
        machines = scenario.layout.machines.len(),
        entry_points = scenario.layout.entry_points.len(),
        population_cap = scenario.session.population_cap,
        "Scenario is valid"
    );
    Ok(())
}
