//! # Volley Control
//!
//! Runs one simulated shot: spin the flywheels up to the target, wait the
//! settle period, feed, and spin down.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: 3000 RPM, feed completes 4 s after settling
//! volley_control
//!
//! # Custom config, target surface speed, real-time pacing
//! volley_control --config config/volley.toml --target-speed 16 --realtime
//!
//! # JSON logs with a telemetry line every 10 ticks
//! volley_control --json --telemetry-every 10
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use volley_common::config::{ConfigLoader, VolleyConfig};
use volley_common::shooter::config::seconds;
use volley_common::shooter::io::Side;
use volley_common::shooter::units::WheelGeometry;
use volley_control::cycle::{Pacing, TickRunner};
use volley_control::sequence::task::{Wait, WaitUntil};
use volley_control::sequence::{ShootSequencer, Task};
use volley_control::telemetry::{Dashboard, Fanout, JsonLogSink};
use volley_control::DualActuatorShooter;

/// Volley Control - dual flywheel shooter simulation
#[derive(Parser, Debug)]
#[command(name = "volley_control")]
#[command(version)]
#[command(about = "Closed-loop dual flywheel control and shot sequencing")]
struct Args {
    /// Path to configuration TOML. Defaults apply when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Target flywheel velocity [RPM].
    #[arg(long, default_value_t = 3000.0)]
    target_rpm: f64,

    /// Target wheel surface speed [m/s]; overrides --target-rpm.
    #[arg(long)]
    target_speed: Option<f64>,

    /// Seconds after the settle period at which the feed completes.
    #[arg(long, default_value = "4.0", value_parser = parse_seconds)]
    feed_after: Duration,

    /// Feed never completes (exercise the deadline).
    #[arg(long)]
    no_feed: bool,

    /// Sleep to real tick boundaries instead of running as fast as possible.
    #[arg(long)]
    realtime: bool,

    /// Upper bound on executed ticks.
    #[arg(long, default_value_t = 2000)]
    max_ticks: u64,

    /// Log a JSON telemetry snapshot every N ticks (0 disables).
    #[arg(long, default_value_t = 0)]
    telemetry_every: u64,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let config = match load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("volley_control: {e}");
            process::exit(2);
        }
    };
    setup_tracing(&args, &config);

    info!("Volley Control v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, &config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Volley Control shutdown complete");
}

fn parse_seconds(arg: &str) -> Result<Duration, String> {
    let value: f64 = arg.parse().map_err(|e| format!("{e}"))?;
    seconds("--feed-after", value).map_err(|e| e.to_string())
}

fn load(args: &Args) -> Result<VolleyConfig, Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => VolleyConfig::load(path)?,
        None => VolleyConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run(args: &Args, config: &VolleyConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Service '{}'", config.shared.service_name);

    let mut shooter = DualActuatorShooter::new(&config.shooter, &config.simulation, None)?;

    let dashboard = Dashboard::new();
    let mut sinks = Fanout::new().with(Box::new(dashboard.clone()));
    if args.telemetry_every > 0 {
        sinks = sinks.with(Box::new(JsonLogSink::new(args.telemetry_every)));
    }
    shooter.set_telemetry_sink(Box::new(sinks));

    let target_rpm = match args.target_speed {
        Some(speed) => WheelGeometry::new(config.shooter.wheel_radius_m).linear_to_angular(speed),
        None => args.target_rpm,
    };

    let feed: Box<dyn Task<DualActuatorShooter>> = if args.no_feed {
        Box::new(WaitUntil::new(|_: &DualActuatorShooter| false))
    } else {
        Box::new(Wait::new(args.feed_after))
    };
    let mut sequencer = ShootSequencer::new(&config.sequence, target_rpm, feed)?;

    let pacing = if args.realtime {
        Pacing::Realtime
    } else {
        Pacing::Unpaced
    };
    let mut runner = TickRunner::new(config.tick.period(), pacing);

    if args.realtime {
        let running = runner.running_flag();
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            running.store(false, Ordering::SeqCst);
        })?;
    }

    let report = runner.run_shot(&mut shooter, &mut sequencer, args.max_ticks);

    for (phase, at) in sequencer.transitions() {
        info!("  {phase:<12} at {at:?}");
    }
    match &report.result {
        Some(Ok(outcome)) => info!("Outcome: {outcome:?} in {} ticks", report.ticks),
        Some(Err(e)) => warn!("Shot failed: {e}"),
        None => warn!("Tick budget of {} exhausted before the shot finished", args.max_ticks),
    }
    info!(
        "Final: L {:.1} RPM ({:.2} m/s), R {:.1} RPM ({:.2} m/s), at setpoint: {}, spin-down: {}",
        shooter.velocity(Side::Left),
        shooter.surface_speed(Side::Left),
        shooter.velocity(Side::Right),
        shooter.surface_speed(Side::Right),
        report.snapshot.at_setpoint,
        sequencer.spin_down_issued()
    );

    let stats = runner.stats();
    info!(
        "Ticks: {} (mean {:?}, min {:?}, max {:?}, σ {:?}, worst wake {:?}), overruns {}, actuation faults {}, dashboard {} snapshots, publish failures {}",
        stats.ticks(),
        stats.mean(),
        stats.fastest(),
        stats.slowest(),
        stats.std_dev(),
        stats.worst_wake_latency(),
        stats.overruns(),
        report.actuation_faults,
        dashboard.len(),
        shooter.publish_failures()
    );

    shooter.close_resources();
    Ok(())
}

/// Setup tracing subscriber from CLI arguments and the configured log level.
fn setup_tracing(args: &Args, config: &VolleyConfig) {
    let level = if args.verbose {
        "debug"
    } else {
        config.shared.log_level.as_directive()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
