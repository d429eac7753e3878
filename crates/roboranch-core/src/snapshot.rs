//! Save and resume a farm.
//!
//! [`capture`] turns a running [`SimulationState`] into a
//! [`SimulationSnapshot`]; [`restore`] rebuilds a state from one. Robot
//! stats are not stored: a restored robot picks up its model's current
//! stats from the config, and its script is recompiled from source.
//!
//! On disk a snapshot is pretty-printed JSON. [`save`] writes to a
//! sibling temp file and renames it over the target so a crash mid-write
//! never leaves a truncated save.

use std::path::{Path, PathBuf};

use chrono::Utc;
use roboranch_agents::{Fleet, Robot, SharedStock};
use roboranch_types::{SNAPSHOT_VERSION, SimulationSnapshot};
use roboranch_world::{FarmGrid, WorldError};
use tracing::{info, warn};

use crate::clock::{ClockError, FarmClock};
use crate::config::SimulationConfig;
use crate::tick::SimulationState;

/// Errors that can occur when saving or restoring a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Reading or writing the save file failed.
    #[error("save file I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The save file is not valid snapshot JSON.
    #[error("save file JSON error: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The stored grid is inconsistent.
    #[error("saved world is invalid: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The stored clock does not fit the configured calendar.
    #[error("saved clock is invalid: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A saved robot's model is missing from the configured catalog.
    #[error("saved robot {robot} uses unknown model {model}")]
    UnknownModel {
        /// Robot display name.
        robot: String,
        /// The missing model key.
        model: String,
    },

    /// The snapshot was written by an incompatible format version.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },
}

/// Capture the durable state of a running farm.
pub fn capture(state: &SimulationState) -> SimulationSnapshot {
    SimulationSnapshot {
        version: SNAPSHOT_VERSION,
        saved_at: Utc::now(),
        clock: state.clock.snapshot(),
        stock: state.stock.snapshot(),
        world: state.grid.snapshot(),
        robots: state.fleet.iter().map(Robot::snapshot).collect(),
        next_robot_number: state.fleet.next_number(),
    }
}

/// Rebuild a farm from a snapshot under `config`.
///
/// Paths, pending actions, and work timers are not stored, so every
/// robot resumes idle. Scripts that no longer compile are kept with their
/// error recorded.
///
/// # Errors
///
/// Returns a [`SnapshotError`] if the version is unsupported, the grid or
/// clock is inconsistent, or a robot's model is no longer configured.
pub fn restore(
    snapshot: SimulationSnapshot,
    config: SimulationConfig,
) -> Result<SimulationState, SnapshotError> {
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: snapshot.version,
            expected: SNAPSHOT_VERSION,
        });
    }

    let clock = FarmClock::restore(snapshot.clock, &config.time)?;
    let grid = FarmGrid::from_snapshot(snapshot.world)?;
    let stock = SharedStock::from_snapshot(snapshot.stock);

    // Scripts compile against the configured limits, so build the host
    // first and move the robots in afterwards.
    let mut state = SimulationState::from_parts(config, clock, grid, stock, Fleet::new(0));

    let mut robots = Vec::with_capacity(snapshot.robots.len());
    for saved in snapshot.robots {
        let Some(spec) = state.config.robots.models.get(&saved.model).cloned() else {
            return Err(SnapshotError::UnknownModel {
                robot: saved.name,
                model: saved.model,
            });
        };
        let robot = Robot::from_snapshot(saved, spec, &state.host);
        if let Some(error) = &robot.last_error {
            warn!(robot = %robot.name, error = %error, "Restored script does not compile");
        }
        robots.push(robot);
    }
    state.fleet = Fleet::from_parts(
        robots,
        snapshot.next_robot_number,
        state.config.fleet.max_robots,
    );

    info!(
        tick = state.clock.tick(),
        robots = state.fleet.len(),
        "Farm restored"
    );
    Ok(state)
}

/// Write a snapshot to `path` as JSON.
///
/// # Errors
///
/// Returns [`SnapshotError::Io`] or [`SnapshotError::Json`] on failure.
pub fn save(snapshot: &SimulationSnapshot, path: &Path) -> Result<(), SnapshotError> {
    let json = serde_json::to_string_pretty(snapshot)?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Read a snapshot from `path`.
///
/// # Errors
///
/// Returns [`SnapshotError::Io`] if the file cannot be read, or
/// [`SnapshotError::Json`] if it does not parse.
pub fn load(path: &Path) -> Result<SimulationSnapshot, SnapshotError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
