//! Countdown and application of pending actions.
//!
//! The target tile may have changed while the timer ran (another robot
//! harvested it, rain watered it, the player replanted it). Every action
//! re-checks its tile at expiry and becomes a silent no-op when the check
//! fails.

use roboranch_types::{ActionKind, HarvestEvent, Position, RobotState};
use roboranch_world::{FarmGrid, SpeciesCatalog, farming};
use tracing::debug;

use crate::robot::Robot;
use crate::stockpile::SharedStock;

use super::PendingAction;

/// What the caller needs to apply an action.
#[derive(Debug)]
pub struct ExecutionContext<'a> {
    /// The farm.
    pub grid: &'a mut FarmGrid,
    /// Shared stockpile; the fallback seed source for planting.
    pub stock: &'a mut SharedStock,
    /// Species stats, for stage counts and harvest yields.
    pub catalog: &'a SpeciesCatalog,
    /// Current tick, stamped on harvest events.
    pub tick: u64,
}

/// What an applied action changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEffect {
    /// Grass or flowers became soil.
    Tilled,
    /// A seedling was planted.
    Planted {
        /// Species planted.
        species: String,
    },
    /// A crop was watered.
    Watered,
    /// A crop was harvested into the robot's inventory.
    Harvested(HarvestEvent),
    /// The tile no longer allowed the action.
    NoOp,
}

/// Count down the robot's pending action by one tick and apply it when the
/// timer runs out. Returns the effect on the tick it applies.
pub fn tick_pending(robot: &mut Robot, ctx: &mut ExecutionContext<'_>) -> Option<ActionEffect> {
    let pending = robot.pending.as_mut()?;
    pending.ticks_remaining = pending.ticks_remaining.saturating_sub(1);
    if pending.ticks_remaining > 0 {
        return None;
    }
    let action = robot.pending.take()?;
    robot.state = RobotState::Idle;
    Some(execute(robot, action, ctx))
}

/// Apply `action` now.
pub fn execute(robot: &mut Robot, action: PendingAction, ctx: &mut ExecutionContext<'_>) -> ActionEffect {
    let target = action.target;
    let effect = match action.kind {
        ActionKind::Till => {
            if farming::till(ctx.grid, target) {
                ActionEffect::Tilled
            } else {
                ActionEffect::NoOp
            }
        }
        ActionKind::Water => {
            if farming::water(ctx.grid, target) {
                ActionEffect::Watered
            } else {
                ActionEffect::NoOp
            }
        }
        ActionKind::Plant => {
            let species = action.species.unwrap_or_else(|| robot.assigned_crop.clone());
            plant(robot, species, action.target, ctx)
        }
        ActionKind::Harvest => harvest(robot, action.target, ctx),
    };
    debug!(
        robot = %robot.name,
        action = action.kind.name(),
        x = target.x,
        y = target.y,
        applied = effect != ActionEffect::NoOp,
        "Action finished"
    );
    effect
}

/// Plant one seed, taken from the robot first and the stockpile second.
fn plant(
    robot: &mut Robot,
    species: String,
    target: Position,
    ctx: &mut ExecutionContext<'_>,
) -> ActionEffect {
    if !farming::can_plant(ctx.grid, target) || !ctx.catalog.contains(&species) {
        return ActionEffect::NoOp;
    }
    let has_seed = robot.inventory.take_seed(&species) || ctx.stock.take_seeds(&species, 1) == 1;
    if !has_seed {
        return ActionEffect::NoOp;
    }
    if farming::plant(ctx.grid, target, &species, ctx.catalog) {
        ActionEffect::Planted { species }
    } else {
        ActionEffect::NoOp
    }
}

/// Move a ready crop's full yield into the robot, or leave the crop in
/// place if the yield does not fit.
fn harvest(
    robot: &mut Robot,
    target: Position,
    ctx: &mut ExecutionContext<'_>,
) -> ActionEffect {
    let Some(species) = ctx
        .grid
        .get(target)
        .and_then(|t| t.crop.as_ref())
        .filter(|c| c.is_ready())
        .map(|c| c.species.clone())
    else {
        return ActionEffect::NoOp;
    };
    let quantity = ctx.catalog.harvest_yield(&species);

    if let Err(err) = robot.inventory.add_crops(
        &species,
        quantity,
        robot.spec.inventory_capacity,
        robot.spec.inventory_slots,
    ) {
        debug!(robot = %robot.name, error = %err, "Harvest skipped");
        return ActionEffect::NoOp;
    }
    if farming::take_ready_crop(ctx.grid, target).is_none() {
        return ActionEffect::NoOp;
    }

    ActionEffect::Harvested(HarvestEvent {
        tick: ctx.tick,
        robot_id: robot.id,
        species,
        quantity,
        position: target,
    })
}
