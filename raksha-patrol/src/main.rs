//! RakshaPatrol - dry-run driver for the patrol controller
//!
//! Runs the smart patrol against the mock motor driver and a random
//! obstacle sensor, logging every decision. Stops after `--duration`
//! seconds or on Ctrl+C.
//!
//! ```bash
//! RUST_LOG=raksha_patrol=debug cargo run -- --duration 30 --seed 7
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::Parser;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use raksha_patrol::devices::{MockMotorDriver, RandomSensorReader};
use raksha_patrol::{PatrolConfig, PatrolController, Result};

#[derive(Parser)]
#[command(name = "raksha-patrol")]
#[command(about = "Run the smart patrol against a simulated robot")]
struct Args {
    /// TOML configuration file (defaults to raksha.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds to patrol before stopping (0 = until Ctrl+C)
    #[arg(short, long, default_value = "20")]
    duration: f32,

    /// Random seed for decisions and simulated obstacles (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Probability that each simulated sensor reports an obstacle
    #[arg(long, default_value = "0.25")]
    obstacle_rate: f32,
}

/// Log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_DIRECTIVE: &str = "raksha_patrol=info";

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = load_config(args)?;
    if let Some(seed) = args.seed {
        config.policy.seed = seed;
    }

    info!("RakshaPatrol v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Timing: backup {:.1}s, turn {:.1}s, escape {:.1}s/{:.1}s, poll {:.0}ms",
        config.timing.backup,
        config.timing.turn,
        config.timing.escape_backup,
        config.timing.escape_turn,
        config.timing.poll_interval * 1000.0
    );

    let motor = Arc::new(MockMotorDriver::realtime());
    let sensors = Arc::new(RandomSensorReader::new(
        args.obstacle_rate,
        config.policy.seed,
    ));
    let controller = PatrolController::new(config, motor.clone(), sensors)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handler(Arc::clone(&shutdown))?;

    if !controller.start_patrol() {
        warn!("Patrol did not start");
        return Ok(());
    }

    let run_limit = Duration::try_from_secs_f32(args.duration)
        .ok()
        .filter(|limit| !limit.is_zero());
    let started = Instant::now();
    let check_interval = Duration::from_millis(500);
    let status_interval = Duration::from_secs(3);
    let mut last_status = Instant::now();

    loop {
        std::thread::sleep(check_interval);

        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        if run_limit.is_some_and(|limit| started.elapsed() >= limit) {
            info!("Patrol duration elapsed");
            break;
        }

        if !controller.is_patrolling() {
            warn!("Patrol went idle on its own");
            break;
        }

        if last_status.elapsed() >= status_interval {
            let status = controller.status();
            info!(
                "Patrolling: phase={}, last_turn={}, blocks={}, iterations={}, escapes={}, faults={}",
                status.phase.as_str(),
                status
                    .last_turn
                    .map(|t| t.as_str())
                    .unwrap_or("none"),
                status.consecutive_blocks,
                status.iterations,
                status.escapes,
                status.faults
            );
            last_status = Instant::now();
        }
    }

    controller.stop_patrol();

    let status = controller.status();
    info!(
        "Patrol finished: {} iterations, {} escapes, {} faults, {} motor commands",
        status.iterations,
        status.escapes,
        status.faults,
        motor.commands().len()
    );
    Ok(())
}

/// Explicit `--config` path, else `raksha.toml` in the working directory,
/// else defaults.
fn load_config(args: &Args) -> Result<PatrolConfig> {
    if let Some(path) = &args.config {
        info!("Loading configuration from {:?}", path);
        return PatrolConfig::load(path);
    }

    let local = PathBuf::from("raksha.toml");
    if local.exists() {
        info!("Loading configuration from raksha.toml");
        PatrolConfig::load(&local)
    } else {
        info!("Using default configuration");
        Ok(PatrolConfig::default())
    }
}

/// `RUST_LOG` directives when set and valid, else the crate default.
fn log_filter(from_env: Option<String>) -> EnvFilter {
    from_env
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}

fn setup_signal_handler(shutdown: Arc<AtomicBool>) -> Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;

    std::thread::Builder::new()
        .name("signal-handler".to_string())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                info!("Received signal {:?}, stopping patrol...", sig);
                shutdown.store(true, Ordering::Relaxed);
            }
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_overrides_default_level() {
        let filter = log_filter(Some("raksha_patrol=debug".to_string())).to_string();

        assert!(filter.contains("raksha_patrol=debug"));
        assert!(!filter.contains("raksha_patrol=info"));
    }

    #[test]
    fn test_unset_or_blank_rust_log_uses_default() {
        assert_eq!(log_filter(None).to_string(), DEFAULT_LOG_DIRECTIVE);
        assert_eq!(
            log_filter(Some("  ".to_string())).to_string(),
            DEFAULT_LOG_DIRECTIVE
        );
    }
}
