//! Core value structs shared across the workspace.
//!
//! Grid coordinates, tiles and crops, the economic events robots emit, and
//! the read-only status view handed to operators.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActionKind, BuiltinBehavior, RobotState, TileKind};
use crate::ids::RobotId;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A tile coordinate on the farm grid. `x` grows east, `y` grows south.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Position {
    /// Create a position from a column and row.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan (4-connected) distance to another position.
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
    }

    /// Chebyshev (8-connected) distance to another position.
    pub const fn chebyshev(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }

    /// Whether `other` is this tile or one of its eight neighbours.
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.chebyshev(other) <= 1
    }

    /// Offset this position by `(dx, dy)`. Returns `None` on overflow.
    pub const fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        let Some(x) = self.x.checked_add(dx) else {
            return None;
        };
        let Some(y) = self.y.checked_add(dy) else {
            return None;
        };
        Some(Self { x, y })
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A square work area a robot is confined to when searching for tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorkArea {
    /// Centre tile of the search square.
    pub center: Position,
    /// Half-width of the search square in tiles.
    pub radius: u32,
}

// ---------------------------------------------------------------------------
// Tiles and crops
// ---------------------------------------------------------------------------

/// A planted crop living on a tilled tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Crop {
    /// Species key (e.g. `"wheat"`).
    pub species: String,
    /// Current growth stage, `0..stages`.
    pub stage: u8,
    /// Number of growth stages for this species, copied at planting.
    pub stages: u8,
    /// Growth ticks accumulated so far.
    pub grow_accum: u64,
    /// Waterings the growth pass has drawn on so far.
    pub water_count: u32,
    /// Whether the soil currently holds water.
    pub is_watered: bool,
}

impl Crop {
    /// A freshly planted, unwatered crop at stage 0.
    pub const fn seedling(species: String, stages: u8) -> Self {
        Self {
            species,
            stage: 0,
            stages,
            grow_accum: 0,
            water_count: 0,
            is_watered: false,
        }
    }

    /// Whether the crop has reached its final stage.
    pub const fn is_ready(&self) -> bool {
        self.stage.saturating_add(1) >= self.stages
    }

    /// Whether a water action would have any effect.
    pub const fn needs_water(&self) -> bool {
        !self.is_watered
    }
}

/// A single grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Tile {
    /// Terrain kind.
    pub kind: TileKind,
    /// The crop growing here, if any. Only tilled tiles hold one.
    pub crop: Option<Crop>,
}

impl Tile {
    /// An empty tile of the given kind.
    pub const fn new(kind: TileKind) -> Self {
        Self { kind, crop: None }
    }

    /// Whether robots may stand on this tile.
    pub const fn is_walkable(&self) -> bool {
        self.kind.is_walkable()
    }

    /// Whether this is tilled soil with nothing growing on it.
    pub const fn is_empty_soil(&self) -> bool {
        matches!(self.kind, TileKind::Tilled) && self.crop.is_none()
    }
}

// ---------------------------------------------------------------------------
// Economic events
// ---------------------------------------------------------------------------

/// Emitted whenever a robot completes a harvest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HarvestEvent {
    /// Tick on which the harvest completed.
    pub tick: u64,
    /// The harvesting robot.
    pub robot_id: RobotId,
    /// Species harvested.
    pub species: String,
    /// Units added to the robot's inventory.
    pub quantity: u32,
    /// Tile the crop was taken from.
    pub position: Position,
}

/// Emitted when a robot unloads carried crops into the shared stockpile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Delivery {
    /// Tick on which the delivery happened.
    pub tick: u64,
    /// The delivering robot.
    pub robot_id: RobotId,
    /// Species delivered.
    pub species: String,
    /// Units moved into the stockpile.
    pub quantity: u32,
}

// ---------------------------------------------------------------------------
// Operator view
// ---------------------------------------------------------------------------

/// Read-only status of one robot, as shown in the operator panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RobotStatus {
    /// Robot identifier.
    pub id: RobotId,
    /// Display name.
    pub name: String,
    /// Model key (e.g. `"basic"`).
    pub model: String,
    /// Derived display state.
    pub state: RobotState,
    /// Current tile.
    pub position: Position,
    /// Charging and drop-off tile.
    pub home: Position,
    /// Battery level as a whole percentage of capacity.
    pub battery_pct: u32,
    /// Selected built-in behavior.
    pub behavior: BuiltinBehavior,
    /// Species used when planting.
    pub assigned_crop: String,
    /// Work area, if one is set.
    pub work_area: Option<WorkArea>,
    /// Whether a custom script is installed.
    pub has_script: bool,
    /// Last compile or runtime error from the custom script.
    pub last_error: Option<String>,
    /// Action currently counting down, if any.
    pub pending_action: Option<ActionKind>,
    /// Total crop units carried.
    pub carried_crops: u32,
}
