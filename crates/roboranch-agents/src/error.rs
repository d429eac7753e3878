//! Error types for the `roboranch-agents` crate.
//!
//! Only fleet management and inventory bookkeeping can fail. Action and
//! movement requests that cannot proceed are ordinary outcomes and are
//! reported through return values instead.

use roboranch_types::RobotId;

/// Errors that can occur during robot and fleet operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// No robot model with this key exists.
    #[error("unknown robot model: {0}")]
    UnknownModel(String),

    /// The fleet is at its robot limit.
    #[error("fleet is full ({max} robots)")]
    FleetFull {
        /// The limit in effect.
        max: u32,
    },

    /// No robot with this ID is in the fleet.
    #[error("robot not found: {0}")]
    RobotNotFound(RobotId),

    /// Adding crops would exceed the carry capacity.
    #[error("inventory full: adding {attempted} {species} to a load of {load} exceeds capacity {capacity}")]
    InventoryFull {
        /// Species being added.
        species: String,
        /// Units being added.
        attempted: u32,
        /// Units already carried.
        load: u32,
        /// Carry capacity.
        capacity: u32,
    },

    /// Adding a new species would exceed the slot count.
    #[error("no free slot for {species} ({slots} slots in use)")]
    NoFreeSlot {
        /// Species being added.
        species: String,
        /// Slot count.
        slots: u32,
    },

    /// A home tile is outside the grid or not walkable.
    #[error("invalid home tile {0}")]
    InvalidHome(roboranch_types::Position),
}
