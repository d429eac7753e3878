//! Shared type definitions for the RoboRanch robot engine.
//!
//! This crate is the single source of truth for the values that cross crate
//! boundaries: grid coordinates, tiles and crops, robot identifiers, operator
//! commands, economic events, and persistence snapshots. UI-facing types flow
//! downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for robot identifiers
//! - [`enums`] -- Terrain, robot state, action, behavior, and season enums
//! - [`structs`] -- Positions, tiles, crops, events, and the robot status view
//! - [`memory`] -- Plain-data values stored in robot memory
//! - [`commands`] -- Operator commands addressed to robots and the fleet
//! - [`snapshot`] -- Resumable persistence snapshot

pub mod commands;
pub mod enums;
pub mod ids;
pub mod memory;
pub mod snapshot;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use commands::{FleetCommand, RobotCommand};
pub use enums::{ActionKind, BuiltinBehavior, RobotState, Season, TileKind};
pub use ids::RobotId;
pub use memory::MemoryValue;
pub use snapshot::{
    ClockSnapshot, InventorySnapshot, RobotSnapshot, SNAPSHOT_VERSION, SimulationSnapshot,
    WorldSnapshot,
};
pub use structs::{Crop, Delivery, HarvestEvent, Position, RobotStatus, Tile, WorkArea};
