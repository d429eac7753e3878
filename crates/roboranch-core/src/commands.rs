//! Operator commands applied between ticks.
//!
//! Commands come from outside the tick loop and are queued on the
//! [`OperatorState`](crate::operator::OperatorState). The runner drains the
//! queue before each tick and applies each command here, so a command never
//! lands in the middle of a robot's update.

use roboranch_agents::AgentError;
use roboranch_types::{FleetCommand, Position, RobotCommand, RobotId};
use tracing::{info, warn};

use crate::tick::SimulationState;

/// Errors that can occur when applying an operator command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The fleet refused the change.
    #[error("fleet error: {source}")]
    Fleet {
        /// The underlying fleet error.
        #[from]
        source: AgentError,
    },

    /// The command named a robot that is not deployed.
    #[error("robot not found: {0}")]
    RobotNotFound(RobotId),

    /// The command named a species missing from the catalog.
    #[error("unknown crop species: {0}")]
    UnknownSpecies(String),

    /// A work area centre lies off the grid.
    #[error("work area centre {0} is off the farm")]
    OutOfBounds(Position),
}

/// What an applied command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A robot was deployed.
    Deployed(RobotId),
    /// A robot was removed. `model` is returned so the economy can credit
    /// the owner's robot pool.
    Removed {
        /// The removed robot.
        robot_id: RobotId,
        /// Model key of the removed robot.
        model: String,
    },
    /// A robot's configuration changed.
    Updated(RobotId),
    /// A script was stored but does not compile; the robot will not run
    /// any automation until it is fixed.
    ScriptRejected {
        /// The robot the script was given to.
        robot_id: RobotId,
        /// The compile error.
        error: String,
    },
}

/// Apply one fleet command to the simulation.
pub fn apply_command(
    state: &mut SimulationState,
    command: FleetCommand,
) -> Result<CommandOutcome, CommandError> {
    match command {
        FleetCommand::Deploy { model, home } => {
            let defaults = state.config.fleet.deploy_defaults();
            let id = state.fleet.deploy(
                &model,
                home,
                &state.config.robots.models,
                &state.grid,
                &defaults,
                state.multipliers.extra_robot_slots,
            )?;
            Ok(CommandOutcome::Deployed(id))
        }
        FleetCommand::Robot { robot_id, command } => apply_robot_command(state, robot_id, command),
    }
}

fn apply_robot_command(
    state: &mut SimulationState,
    robot_id: RobotId,
    command: RobotCommand,
) -> Result<CommandOutcome, CommandError> {
    if let RobotCommand::Remove = command {
        let robot = state.fleet.remove(robot_id)?;
        return Ok(CommandOutcome::Removed {
            robot_id,
            model: robot.model,
        });
    }

    let robot = state
        .fleet
        .get_mut(robot_id)
        .ok_or(CommandError::RobotNotFound(robot_id))?;
    match command {
        RobotCommand::AssignBehavior { behavior } => {
            robot.assign_behavior(behavior);
            info!(robot = %robot.name, behavior = behavior.name(), "Behavior assigned");
        }
        RobotCommand::AssignCrop { species } => {
            if !state.config.crops.contains(&species) {
                return Err(CommandError::UnknownSpecies(species));
            }
            robot.assigned_crop = species;
        }
        RobotCommand::SetWorkArea { area } => {
            if !state.grid.in_bounds(area.center) {
                return Err(CommandError::OutOfBounds(area.center));
            }
            robot.work_area = Some(area);
        }
        RobotCommand::ClearWorkArea => robot.work_area = None,
        RobotCommand::SetScript { source } => {
            if let Err(err) = robot.set_script(&state.host, &source) {
                warn!(robot = %robot.name, error = %err, "Script failed to compile");
                return Ok(CommandOutcome::ScriptRejected {
                    robot_id,
                    error: err.to_string(),
                });
            }
            info!(robot = %robot.name, "Script updated");
        }
        RobotCommand::ClearScript => robot.clear_script(),
        RobotCommand::GoIdle => robot.cancel(),
        RobotCommand::Remove => {}
    }
    Ok(CommandOutcome::Updated(robot_id))
}
