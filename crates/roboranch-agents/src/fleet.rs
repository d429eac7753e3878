//! The ordered list of deployed robots.
//!
//! Fleet order is processing order: the scheduler updates robots front to
//! back, so a robot deployed earlier sees the farm before later robots do
//! on every tick.

use roboranch_types::{BuiltinBehavior, Position, RobotId};
use roboranch_world::FarmGrid;
use tracing::info;

use crate::config::RobotCatalog;
use crate::error::AgentError;
use crate::robot::Robot;

/// Settings applied to every newly deployed robot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployDefaults {
    /// Built-in behavior a new robot starts with.
    pub behavior: BuiltinBehavior,
    /// Species a new robot plants.
    pub assigned_crop: String,
}

impl Default for DeployDefaults {
    fn default() -> Self {
        Self {
            behavior: BuiltinBehavior::AutoFarm,
            assigned_crop: crate::robot::DEFAULT_ASSIGNED_CROP.to_owned(),
        }
    }
}

/// Every robot on the farm, in processing order.
#[derive(Debug, Clone)]
pub struct Fleet {
    robots: Vec<Robot>,
    next_number: u32,
    max_robots: u32,
}

impl Fleet {
    /// An empty fleet with a base limit of `max_robots`.
    pub const fn new(max_robots: u32) -> Self {
        Self {
            robots: Vec::new(),
            next_number: 1,
            max_robots,
        }
    }

    /// Rebuild a fleet from restored robots.
    pub fn from_parts(robots: Vec<Robot>, next_number: u32, max_robots: u32) -> Self {
        Self {
            robots,
            next_number: next_number.max(1),
            max_robots,
        }
    }

    /// Number used to name the next robot.
    pub const fn next_number(&self) -> u32 {
        self.next_number
    }

    /// Robot limit after adding `extra_slots`.
    pub const fn limit(&self, extra_slots: u32) -> u32 {
        self.max_robots.saturating_add(extra_slots)
    }

    /// Deploy a robot of `model` at `home`.
    ///
    /// # Errors
    ///
    /// Fails if the model is unknown, the fleet is at its limit, or `home`
    /// is off the grid or not walkable.
    pub fn deploy(
        &mut self,
        model: &str,
        home: Position,
        catalog: &RobotCatalog,
        grid: &FarmGrid,
        defaults: &DeployDefaults,
        extra_slots: u32,
    ) -> Result<RobotId, AgentError> {
        let spec = catalog
            .get(model)
            .ok_or_else(|| AgentError::UnknownModel(model.to_owned()))?;
        let max = self.limit(extra_slots);
        if u32::try_from(self.robots.len()).unwrap_or(u32::MAX) >= max {
            return Err(AgentError::FleetFull { max });
        }
        if !grid.is_walkable(home) {
            return Err(AgentError::InvalidHome(home));
        }

        let name = format!("{}-{}", spec.name_prefix(), self.next_number);
        self.next_number = self.next_number.saturating_add(1);
        let mut robot = Robot::new(name, model.to_owned(), spec.clone(), home);
        robot.behavior = defaults.behavior;
        robot.assigned_crop.clone_from(&defaults.assigned_crop);
        let id = robot.id;
        info!(robot = %robot.name, model, x = home.x, y = home.y, "Robot deployed");
        self.robots.push(robot);
        Ok(id)
    }

    /// Take a robot out of the fleet. Its cargo and battery go with it;
    /// the returned robot's `model` tells the economy what to credit.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::RobotNotFound`] for an unknown ID.
    pub fn remove(&mut self, id: RobotId) -> Result<Robot, AgentError> {
        let index = self
            .robots
            .iter()
            .position(|r| r.id == id)
            .ok_or(AgentError::RobotNotFound(id))?;
        let robot = self.robots.remove(index);
        info!(robot = %robot.name, model = %robot.model, "Robot removed");
        Ok(robot)
    }

    /// Look up a robot.
    pub fn get(&self, id: RobotId) -> Option<&Robot> {
        self.robots.iter().find(|r| r.id == id)
    }

    /// Look up a robot mutably.
    pub fn get_mut(&mut self, id: RobotId) -> Option<&mut Robot> {
        self.robots.iter_mut().find(|r| r.id == id)
    }

    /// Robots in processing order.
    pub fn iter(&self) -> impl Iterator<Item = &Robot> {
        self.robots.iter()
    }

    /// Robots in processing order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Robot> {
        self.robots.iter_mut()
    }

    /// Number of deployed robots.
    pub fn len(&self) -> usize {
        self.robots.len()
    }

    /// Whether no robots are deployed.
    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }
}
