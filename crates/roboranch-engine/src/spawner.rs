//! Fresh farm setup.
//!
//! When there is no save to resume, the engine builds the starting farm,
//! fills the shared stockpile with the configured starting seeds, and
//! deploys the starting fleet in a row just inside the clearing.

use roboranch_agents::SharedStock;
use roboranch_core::commands::{CommandOutcome, apply_command};
use roboranch_core::config::SimulationConfig;
use roboranch_core::tick::SimulationState;
use roboranch_types::{FleetCommand, Position, RobotId};
use roboranch_world::{FarmLandmarks, create_starting_farm};
use tracing::info;

use crate::error::EngineError;

/// Column offset of the first starting robot from the clearing centre.
const START_OFFSET_X: i32 = 2;
/// Row offset of the starting robots from the clearing centre.
const START_OFFSET_Y: i32 = 2;

/// A newly built farm and where its landmarks ended up.
#[derive(Debug)]
pub struct NewFarm {
    /// Simulation state at tick 0 with the starting fleet deployed.
    pub state: SimulationState,
    /// Landmarks of the generated farm.
    pub landmarks: FarmLandmarks,
    /// IDs of the starting robots, in deploy order.
    pub robots: Vec<RobotId>,
}

/// Build the starting farm described by `config`.
///
/// # Errors
///
/// Returns [`EngineError::World`] if the layout is invalid,
/// [`EngineError::Clock`] if the calendar is invalid, or
/// [`EngineError::Spawner`] if a starting robot cannot be deployed.
pub fn build_new_farm(config: SimulationConfig) -> Result<NewFarm, EngineError> {
    let (grid, landmarks) = create_starting_farm(&config.world.layout())?;
    let stock = SharedStock::with_seeds(config.fleet.starting_seeds.clone());
    let mut state = SimulationState::new(config, grid, stock)?;
    let robots = deploy_starting_fleet(&mut state, landmarks.center)?;

    info!(
        farm = %state.config.world.name,
        width = state.grid.width(),
        height = state.grid.height(),
        center_x = landmarks.center.x,
        center_y = landmarks.center.y,
        robots = robots.len(),
        "Starting farm created"
    );
    Ok(NewFarm {
        state,
        landmarks,
        robots,
    })
}

/// Deploy `fleet.starting_robots` robots of `fleet.starting_model` in a
/// row starting two tiles right of and below `center`.
///
/// # Errors
///
/// Returns [`EngineError::Spawner`] if a home tile is off the grid or the
/// fleet refuses the robot.
pub fn deploy_starting_fleet(
    state: &mut SimulationState,
    center: Position,
) -> Result<Vec<RobotId>, EngineError> {
    let count = state.config.fleet.starting_robots;
    let model = state.config.fleet.starting_model.clone();
    let mut robots = Vec::new();

    for i in 0..count {
        let dx = i32::try_from(i)
            .ok()
            .and_then(|n| n.checked_add(START_OFFSET_X))
            .ok_or_else(|| EngineError::Spawner {
                message: format!("starting robot {i} is too far from the centre"),
            })?;
        let home = center
            .offset(dx, START_OFFSET_Y)
            .ok_or_else(|| EngineError::Spawner {
                message: format!("starting robot {i} home overflows the grid"),
            })?;
        let outcome = apply_command(
            state,
            FleetCommand::Deploy {
                model: model.clone(),
                home,
            },
        )
        .map_err(|e| EngineError::Spawner {
            message: format!("failed to deploy starting robot {i}: {e}"),
        })?;
        if let CommandOutcome::Deployed(id) = outcome {
            robots.push(id);
        }
    }
    Ok(robots)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_farm_has_one_robot_and_seeds() {
        let farm = build_new_farm(SimulationConfig::default()).unwrap();
        assert_eq!(farm.robots.len(), 1);
        assert_eq!(farm.state.fleet.len(), 1);
        assert_eq!(farm.state.stock.seed_count("wheat"), 10);
        assert_eq!(farm.state.stock.seed_count("carrot"), 5);
        assert_eq!(farm.state.clock.tick(), 0);

        let robot = farm.state.fleet.iter().next().unwrap();
        assert_eq!(robot.model, "basic");
        assert_eq!(robot.home, farm.landmarks.center.offset(2, 2).unwrap());
        assert!(robot.is_home());
    }

    #[test]
    fn starting_robots_line_up() {
        let mut config = SimulationConfig::default();
        config.fleet.starting_robots = 3;
        let farm = build_new_farm(config).unwrap();
        let homes: Vec<Position> = farm.state.fleet.iter().map(|r| r.home).collect();
        let center = farm.landmarks.center;
        assert_eq!(
            homes,
            vec![
                center.offset(2, 2).unwrap(),
                center.offset(3, 2).unwrap(),
                center.offset(4, 2).unwrap(),
            ]
        );
        let names: Vec<&str> = farm.state.fleet.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Farm-1", "Farm-2", "Farm-3"]);
    }

    #[test]
    fn zero_starting_robots_is_empty() {
        let mut config = SimulationConfig::default();
        config.fleet.starting_robots = 0;
        let farm = build_new_farm(config).unwrap();
        assert!(farm.robots.is_empty());
        assert!(farm.state.fleet.is_empty());
    }

    #[test]
    fn fleet_limit_is_a_spawner_error() {
        let mut config = SimulationConfig::default();
        config.fleet.starting_robots = 3;
        config.fleet.max_robots = 2;
        let err = build_new_farm(config).unwrap_err();
        assert!(matches!(err, EngineError::Spawner { .. }));
    }
}
