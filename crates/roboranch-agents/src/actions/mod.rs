//! Farm actions: request-time checks, countdown, and application.
//!
//! An action is requested against a target tile. If the robot is not next
//! to the target the request turns into a walk toward it and no timer
//! starts. Otherwise the request-time checks run and, if they pass, a
//! [`PendingAction`] starts counting down. When the count reaches zero the
//! executor re-checks the tile and either applies the effect or does
//! nothing.
//!
//! # Submodules
//!
//! - [`request`] -- Adjacency and precondition checks, seed pulls.
//! - [`executor`] -- Countdown and application at expiry.

pub mod executor;
pub mod request;

use roboranch_types::{ActionKind, Position};

pub use executor::{ActionEffect, ExecutionContext, execute, tick_pending};
pub use request::{RefuseReason, RequestContext, RequestOutcome, request};

/// An action whose timer is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    /// What will happen.
    pub kind: ActionKind,
    /// The tile it will happen to.
    pub target: Position,
    /// Species to plant, for plant actions.
    pub species: Option<String>,
    /// Ticks left before the action applies.
    pub ticks_remaining: u32,
}
