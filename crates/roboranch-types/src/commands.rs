//! Operator commands addressed to the fleet.
//!
//! Commands arrive from outside the tick loop (UI, operator API, tests),
//! are queued, and are applied between ticks.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::BuiltinBehavior;
use crate::ids::RobotId;
use crate::structs::{Position, WorkArea};

/// A command that changes one robot's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RobotCommand {
    /// Switch the built-in behavior. Cancels the current path and action.
    AssignBehavior {
        /// The behavior to run.
        behavior: BuiltinBehavior,
    },
    /// Change the species planted by built-in behaviors.
    AssignCrop {
        /// Species key.
        species: String,
    },
    /// Confine task searches to a square area.
    SetWorkArea {
        /// The area.
        area: WorkArea,
    },
    /// Remove the work area restriction.
    ClearWorkArea,
    /// Install a custom script. Compiles immediately; errors are recorded.
    SetScript {
        /// Script source text.
        source: String,
    },
    /// Remove the custom script and return to the built-in behavior.
    ClearScript,
    /// Drop the current path and action.
    GoIdle,
    /// Take the robot out of the fleet.
    Remove,
}

/// A command addressed to the fleet as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum FleetCommand {
    /// Deploy a new robot of the given model with its home at `home`.
    Deploy {
        /// Model key (e.g. `"basic"`).
        model: String,
        /// Home tile.
        home: Position,
    },
    /// Apply a command to one robot.
    Robot {
        /// Target robot.
        robot_id: RobotId,
        /// The command.
        command: RobotCommand,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_json_is_tagged() {
        let cmd = FleetCommand::Robot {
            robot_id: RobotId::new(),
            command: RobotCommand::AssignBehavior {
                behavior: BuiltinBehavior::Harvester,
            },
        };
        let json = serde_json::to_value(&cmd).unwrap_or_default();
        assert_eq!(json["type"], "robot");
        assert_eq!(json["command"]["type"], "assign_behavior");
        assert_eq!(json["command"]["behavior"], "harvester");
    }
}
