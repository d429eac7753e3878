//! Engine binary for the RoboRanch robot farm.
//!
//! Wires together configuration, the farm (fresh or resumed), the starting
//! fleet, operator controls, and autosave, then runs the tick loop until a
//! termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `roboranch-config.yaml` (or the path in
//!    `ROBORANCH_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Resume from the save file, or build a new farm and deploy the
//!    starting fleet
//! 4. Create operator state from simulation bounds; Ctrl-C requests a stop
//! 5. Run the simulation loop with autosave
//! 6. Write a final save and log the result

mod autosave;
mod error;
mod spawner;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use roboranch_core::config::{LoggingConfig, SimulationConfig};
use roboranch_core::operator::OperatorState;
use roboranch_core::runner;
use roboranch_core::snapshot;
use roboranch_core::tick::SimulationState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::autosave::AutosaveCallback;
use crate::error::EngineError;

/// Environment variable naming an alternative config file.
const CONFIG_PATH_ENV: &str = "ROBORANCH_CONFIG";

/// Config file used when `ROBORANCH_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "roboranch-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step, the simulation, or the
/// final save fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config_path = std::env::var(CONFIG_PATH_ENV)
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = SimulationConfig::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        config = %config_path.display(),
        farm = config.world.name,
        seed = config.world.seed,
        ticks_per_second = config.time.ticks_per_second,
        "roboranch-engine starting"
    );

    // 3. Resume or build the farm.
    let save_path = PathBuf::from(&config.persistence.save_path);
    let autosave_every = config.persistence.autosave_every_ticks;
    let bounds = config.simulation;
    let mut state = open_farm(config, &save_path).context("opening the farm")?;

    // 4. Operator state.
    let operator = Arc::new(OperatorState::new(&bounds));
    let robots = u32::try_from(state.fleet.len()).unwrap_or(u32::MAX);
    let status = operator.status(state.clock.tick(), robots);
    info!(
        max_ticks = ?status.max_ticks,
        max_real_time_seconds = ?status.max_real_time_seconds,
        tick_interval_ms = status.tick_interval_ms,
        robots = status.robots,
        "Operator controls ready"
    );
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping after the current tick");
                operator.request_stop();
            }
        });
    }

    // 5. Run the simulation.
    let mut callback = AutosaveCallback::new(save_path.clone(), autosave_every);
    let result = runner::run_simulation(&mut state, &operator, &mut callback).await?;

    // 6. Final save and results.
    callback
        .save_now(&state)
        .with_context(|| format!("writing final save to {}", save_path.display()))?;
    info!(path = %save_path.display(), tick = state.clock.tick(), "Final save written");
    runner::log_simulation_end(&result);

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        saves = callback.saves(),
        "roboranch-engine shutdown complete"
    );
    Ok(())
}

/// Set up the tracing subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Resume from `save_path` when allowed and present, otherwise build a
/// fresh farm.
fn open_farm(config: SimulationConfig, save_path: &Path) -> Result<SimulationState, EngineError> {
    if config.persistence.resume && save_path.exists() {
        let saved = snapshot::load(save_path)?;
        info!(
            path = %save_path.display(),
            tick = saved.clock.tick,
            saved_at = %saved.saved_at,
            "Resuming saved farm"
        );
        return Ok(snapshot::restore(saved, config)?);
    }
    if save_path.exists() {
        warn!(path = %save_path.display(), "Save file ignored, resume is disabled");
    }
    let farm = spawner::build_new_farm(config)?;
    info!(
        robots = farm.robots.len(),
        plot_x = farm.landmarks.plot_origin.x,
        plot_y = farm.landmarks.plot_origin.y,
        "New farm ready"
    );
    Ok(farm.state)
}
