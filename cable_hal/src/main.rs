//! # Cable Simulator Binary
//!
//! Drives one simulated cable axis through enable → homing → retract into
//! the soft limits → velocity approach → jog up/down → shutdown, in real
//! time.
//!
//! # Usage
//!
//! ```bash
//! # Run the sample configuration
//! cable_sim --config cable_hal/config/sim.toml
//!
//! # Verbose JSON logs, leave the axis enabled at the end
//! cable_sim --config sim.toml -v --json --skip-shutdown
//!
//! # Print the effective configuration (defaults filled in) and exit
//! cable_sim --config sim.toml --dump-config
//! ```
//!
//! Ctrl-C between steps e-stops every axis and exits with an error.

#![deny(warnings)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cable_common::clock::{Clock, SystemClock};
use cable_common::config::{ConfigError, ConfigLoader, LogLevel};
use cable_control_unit::{AxisGroup, CableRobotController};
use cable_hal::{SimConfig, SimulatedMotor, run_scenario};
use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Cable robot simulator - one simulated winch driven by the control core
#[derive(Parser, Debug)]
#[command(name = "cable_sim")]
#[command(version)]
#[command(about = "Drive a simulated cable axis through homing, moves, jogs and shutdown")]
#[command(long_about = None)]
struct Args {
    /// Path to the simulator configuration file.
    #[arg(short, long, default_value = "config/sim.toml")]
    config: PathBuf,

    /// Enable verbose logging (overrides the configured log level)
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    /// Leave the axis enabled instead of running the shutdown sequence
    #[arg(long)]
    skip_shutdown: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("cable_sim failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            setup_tracing(&args, LogLevel::Info);
            return Err(e.into());
        }
    };
    setup_tracing(&args, config.shared.log_level);

    if args.dump_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    info!(
        service = %config.shared.service_name,
        "cable_sim v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let motor = SimulatedMotor::new(
        format!("sim-{}", config.axis.name),
        config.axis.geometry.counts_per_rev,
        &config.simulation,
        Arc::clone(&clock),
    );
    let axis = CableRobotController::from_config(motor, &config.axis, Arc::clone(&clock))?;
    let mut group = AxisGroup::new();
    group.push(axis)?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            running.store(false, Ordering::SeqCst);
        })?;
    }

    let report = run_scenario(
        &mut group,
        &config.control,
        clock.as_ref(),
        &running,
        args.skip_shutdown,
    )?;

    for snapshot in &report.snapshots {
        info!(snapshot = %serde_json::to_string(snapshot)?, "final axis state");
    }
    info!(
        cycles = report.approach.cycle_count,
        overruns = report.approach.overruns,
        "cable_sim finished"
    );
    Ok(())
}

/// Load and validate the simulator configuration.
fn load_config(path: &Path) -> Result<SimConfig, ConfigError> {
    let config = SimConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        configured.as_tracing()
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
