//! Enumeration types for the RoboRanch robot engine.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// The terrain kind of a single grid tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TileKind {
    /// Open grass. Walkable and tillable.
    Grass,
    /// Wildflowers. Walkable and tillable.
    Flower,
    /// Tilled soil. Walkable, the only kind that can hold a crop.
    Tilled,
    /// Open water. Blocks movement.
    Water,
    /// A tree. Blocks movement.
    Tree,
    /// A boulder. Blocks movement.
    Rock,
}

impl TileKind {
    /// Whether robots may stand on or pass through this kind of tile.
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Water | Self::Tree | Self::Rock)
    }

    /// Whether a till action can turn this tile into soil.
    pub const fn is_tillable(self) -> bool {
        matches!(self, Self::Grass | Self::Flower)
    }

    /// Lowercase name used by scripts and configuration.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Grass => "grass",
            Self::Flower => "flower",
            Self::Tilled => "tilled",
            Self::Water => "water",
            Self::Tree => "tree",
            Self::Rock => "rock",
        }
    }

    /// Parse a lowercase tile name. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "grass" => Some(Self::Grass),
            "flower" => Some(Self::Flower),
            "tilled" => Some(Self::Tilled),
            "water" => Some(Self::Water),
            "tree" => Some(Self::Tree),
            "rock" => Some(Self::Rock),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Robot state
// ---------------------------------------------------------------------------

/// Display state of a robot, derived each tick from what it is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RobotState {
    /// Nothing queued; eligible for dispatch.
    Idle,
    /// Following a path.
    Moving,
    /// An action timer is counting down.
    Working,
    /// Idle with a critically low battery.
    Charging,
}

/// The farm actions a robot can perform on an adjacent tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionKind {
    /// Turn grass or flowers into tilled soil.
    Till,
    /// Put a seed into empty tilled soil.
    Plant,
    /// Water an unwatered crop.
    Water,
    /// Collect a ready crop.
    Harvest,
}

impl ActionKind {
    /// Lowercase name used in logs and scripts.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Till => "till",
            Self::Plant => "plant",
            Self::Water => "water",
            Self::Harvest => "harvest",
        }
    }
}

/// A built-in automation routine that robots run when they have no script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum BuiltinBehavior {
    /// Do nothing.
    Idle,
    /// Harvest, water, plant, and till in priority order.
    AutoFarm,
    /// Harvest, water, and plant (never tills).
    FullCycle,
    /// Harvest only.
    Harvester,
    /// Water only.
    WaterArea,
    /// Water and plant.
    Planter,
    /// Like full cycle, but bound to the tile where it first ran.
    AreaFarm,
}

impl BuiltinBehavior {
    /// Every built-in, in menu order.
    pub const ALL: [Self; 7] = [
        Self::Idle,
        Self::AutoFarm,
        Self::FullCycle,
        Self::Harvester,
        Self::WaterArea,
        Self::Planter,
        Self::AreaFarm,
    ];

    /// Snake-case name used in configuration and operator commands.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AutoFarm => "auto_farm",
            Self::FullCycle => "full_cycle",
            Self::Harvester => "harvester",
            Self::WaterArea => "water_area",
            Self::Planter => "planter",
            Self::AreaFarm => "area_farm",
        }
    }

    /// Parse a behavior name. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }
}

// ---------------------------------------------------------------------------
// Seasons
// ---------------------------------------------------------------------------

/// A season in the farm's annual cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Season {
    /// Highest rain chance.
    Spring,
    /// Driest growing season.
    Summer,
    /// Wet and mild.
    Autumn,
    /// Crops stop growing when winter dormancy is enabled.
    Winter,
}
