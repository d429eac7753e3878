//! Persistence snapshot structures.
//!
//! A [`SimulationSnapshot`] captures everything needed to resume a farm:
//! the clock, the shared stockpile, every tile, and every robot's durable
//! state. Transient robot state (paths, action timers, work timers) is
//! deliberately absent and is reset on restore.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::BuiltinBehavior;
use crate::ids::RobotId;
use crate::memory::MemoryValue;
use crate::structs::{Position, Tile, WorkArea};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 2;

/// Seeds and crops held by a robot or the shared stockpile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// Seed counts by species.
    pub seeds: BTreeMap<String, u32>,
    /// Crop counts by species.
    pub crops: BTreeMap<String, u32>,
}

/// Durable state of one robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotSnapshot {
    /// Robot identifier.
    pub id: RobotId,
    /// Display name.
    pub name: String,
    /// Model key used to look up the robot's stats.
    pub model: String,
    /// Current tile.
    pub position: Position,
    /// Charging and drop-off tile.
    pub home: Position,
    /// Battery level in milli-units.
    pub battery_milli: u32,
    /// Carried seeds and crops.
    pub inventory: InventorySnapshot,
    /// Selected built-in behavior.
    pub behavior: BuiltinBehavior,
    /// Species planted by built-ins.
    pub assigned_crop: String,
    /// Optional work area.
    pub work_area: Option<WorkArea>,
    /// Custom script source, recompiled on restore.
    pub script: Option<String>,
    /// Persistent script memory.
    pub memory: BTreeMap<String, MemoryValue>,
}

/// Every tile of the grid, in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Grid width in tiles.
    pub width: u32,
    /// Grid height in tiles.
    pub height: u32,
    /// Row-major tiles, `width * height` entries.
    pub tiles: Vec<Tile>,
}

/// Clock position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    /// Absolute tick count.
    pub tick: u64,
    /// Whether the current day is a rain day.
    pub rain_day: bool,
}

/// A complete, resumable farm snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    /// Format version, see [`SNAPSHOT_VERSION`].
    pub version: u32,
    /// Wall-clock time the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    /// Clock position.
    pub clock: ClockSnapshot,
    /// Shared stockpile.
    pub stock: InventorySnapshot,
    /// Grid contents.
    pub world: WorldSnapshot,
    /// Robots in fleet order.
    pub robots: Vec<RobotSnapshot>,
    /// Counter used to name the next deployed robot.
    pub next_robot_number: u32,
}
