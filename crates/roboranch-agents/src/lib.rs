//! Robot state, battery, movement, and farm actions for the RoboRanch robot
//! engine.
//!
//! This crate is the logic layer for individual robots. It sits between
//! `roboranch-world` (the farm) and `roboranch-core` (the scheduler): every
//! function here works on one robot plus explicitly passed world state and
//! never touches I/O.
//!
//! # Modules
//!
//! - [`actions`] -- Request-time checks, countdown, and application of farm
//!   actions.
//! - [`api`] -- [`RobotApi`], the closed operation set used by behaviors and
//!   replayed script requests.
//! - [`battery`] -- [`Battery`] with a clamped level.
//! - [`config`] -- Robot models and battery/action tunables.
//! - [`error`] -- [`AgentError`] for fleet and inventory failures.
//! - [`fleet`] -- [`Fleet`], the ordered robot list.
//! - [`inventory`] -- Carried seeds and capacity-bounded crops.
//! - [`movement`] -- Path following with sub-tile progress.
//! - [`multipliers`] -- Externally supplied per-mille performance modifiers.
//! - [`robot`] -- [`Robot`], one machine's full state.
//! - [`stockpile`] -- [`SharedStock`], the owner's shared seeds and crops.

pub mod actions;
pub mod api;
pub mod battery;
pub mod config;
pub mod error;
pub mod fleet;
pub mod inventory;
pub mod movement;
pub mod multipliers;
pub mod robot;
pub mod stockpile;

// Re-export primary types at crate root for convenience.
pub use actions::{
    ActionEffect, ExecutionContext, PendingAction, RefuseReason, RequestContext, RequestOutcome,
};
pub use api::RobotApi;
pub use battery::Battery;
pub use config::{ActionTuning, BatteryTuning, RobotCatalog, RobotSpec};
pub use error::AgentError;
pub use fleet::{DeployDefaults, Fleet};
pub use inventory::RobotInventory;
pub use movement::{Movement, effective_work_delay, step_drain, tick_advance};
pub use multipliers::{Multipliers, PERMILLE, scale};
pub use robot::Robot;
pub use stockpile::SharedStock;
