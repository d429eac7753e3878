//! The closed set of operations a robot's controller may use.
//!
//! Built-in behaviors call [`RobotApi`] directly. Custom scripts record
//! [`ScriptCommand`]s against a read-only view and the dispatcher replays
//! the decisive one through [`RobotApi::apply_script_command`], so both
//! kinds of controller go through the same checks.

use roboranch_script::ScriptCommand;
use roboranch_types::{ActionKind, Crop, MemoryValue, Position, Tile};
use roboranch_world::{
    CropFilter, FarmGrid, SpeciesCatalog, TileFilter, find_crop, find_path, find_tile,
};
use tracing::debug;

use crate::actions::{RequestContext, RequestOutcome, request};
use crate::config::ActionTuning;
use crate::robot::Robot;
use crate::stockpile::SharedStock;

/// One robot's handle on the world for a single dispatch.
#[derive(Debug)]
pub struct RobotApi<'a> {
    robot: &'a mut Robot,
    grid: &'a FarmGrid,
    stock: &'a mut SharedStock,
    catalog: &'a SpeciesCatalog,
    tuning: &'a ActionTuning,
    max_expansions: usize,
}

impl<'a> RobotApi<'a> {
    /// Bind the API to `robot` for one dispatch.
    pub const fn new(
        robot: &'a mut Robot,
        grid: &'a FarmGrid,
        stock: &'a mut SharedStock,
        catalog: &'a SpeciesCatalog,
        tuning: &'a ActionTuning,
        max_expansions: usize,
    ) -> Self {
        Self {
            robot,
            grid,
            stock,
            catalog,
            tuning,
            max_expansions,
        }
    }

    /// The robot being driven.
    pub const fn robot(&self) -> &Robot {
        &*self.robot
    }

    /// The shared stockpile.
    pub const fn stock(&self) -> &SharedStock {
        &*self.stock
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Current tile.
    pub const fn pos(&self) -> Position {
        self.robot.position
    }

    /// Nearest crop matching `filter`.
    pub fn find_crop(&self, filter: &CropFilter) -> Option<(Position, &'a Crop)> {
        find_crop(self.grid, self.robot.position, filter)
    }

    /// Nearest tile matching `filter`.
    pub fn find_tile(&self, filter: &TileFilter) -> Option<(Position, &'a Tile)> {
        find_tile(self.grid, self.robot.position, filter)
    }

    /// Whether a harvest of `species` would fit in the robot's inventory.
    pub fn can_carry_harvest(&self, species: &str) -> bool {
        self.robot
            .has_room_for(species, self.catalog.harvest_yield(species))
    }

    /// Manhattan distance from the robot to `target`.
    pub const fn distance_to(&self, target: Position) -> u32 {
        self.robot.position.manhattan(target)
    }

    /// Read a memory value.
    pub fn mem(&self, key: &str) -> Option<&MemoryValue> {
        self.robot.memory.get(key)
    }

    /// Write a memory value. Writes that break the memory bounds are
    /// dropped and logged.
    pub fn set_mem(&mut self, key: &str, value: MemoryValue) {
        if let Err(err) = self.robot.memory.set(key, value) {
            debug!(robot = %self.robot.name, key, error = %err, "Memory write dropped");
        }
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Walk to `target`. If the target cannot be stood on the robot stops
    /// next to it. Returns `false` when no path exists.
    pub fn move_to(&mut self, target: Position) -> bool {
        if self.robot.position == target {
            return true;
        }
        let Some(mut path) = find_path(self.grid, self.robot.position, target, self.max_expansions)
        else {
            debug!(robot = %self.robot.name, x = target.x, y = target.y, "No path");
            return false;
        };
        if !self.grid.is_walkable(target) {
            path.pop();
        }
        self.robot.pending = None;
        self.robot.movement.set_path(path);
        true
    }

    /// Request `kind` on `target`.
    pub fn act(&mut self, kind: ActionKind, target: Position, species: Option<&str>) -> RequestOutcome {
        let mut ctx = RequestContext {
            grid: self.grid,
            stock: &mut *self.stock,
            catalog: self.catalog,
            tuning: self.tuning,
            max_expansions: self.max_expansions,
        };
        request(&mut *self.robot, kind, target, species, &mut ctx)
    }

    /// Till `target`. Returns whether the timer started.
    pub fn till(&mut self, target: Position) -> bool {
        self.act(ActionKind::Till, target, None).started()
    }

    /// Water `target`. Returns whether the timer started.
    pub fn water(&mut self, target: Position) -> bool {
        self.act(ActionKind::Water, target, None).started()
    }

    /// Harvest `target`. Returns whether the timer started.
    pub fn harvest(&mut self, target: Position) -> bool {
        self.act(ActionKind::Harvest, target, None).started()
    }

    /// Plant `species` on `target`. Returns whether the timer started.
    pub fn plant(&mut self, target: Position, species: &str) -> bool {
        self.act(ActionKind::Plant, target, Some(species)).started()
    }

    /// Drop the path and any pending action.
    pub fn idle(&mut self) {
        self.robot.cancel();
    }

    /// Carry out a request recorded by a script.
    pub fn apply_script_command(&mut self, command: &ScriptCommand) -> bool {
        match command {
            ScriptCommand::MoveTo(target) => self.move_to(*target),
            ScriptCommand::Act {
                kind,
                target,
                species,
            } => !matches!(
                self.act(*kind, *target, species.as_deref()),
                RequestOutcome::Refused(_)
            ),
            ScriptCommand::Idle => {
                self.idle();
                true
            }
        }
    }
}
