//! Request-time handling of farm actions.
//!
//! A request either starts a timer, sends the robot toward the target, or
//! is refused. Refusals are ordinary outcomes: the dispatcher simply tries
//! again on a later interval.

use roboranch_types::{ActionKind, Position, RobotState};
use roboranch_world::{FarmGrid, SpeciesCatalog, farming, find_path_adjacent};
use tracing::debug;

use crate::config::ActionTuning;
use crate::robot::Robot;
use crate::stockpile::SharedStock;

use super::PendingAction;

/// What the caller needs to evaluate a request.
#[derive(Debug)]
pub struct RequestContext<'a> {
    /// The farm. Requests only read it.
    pub grid: &'a FarmGrid,
    /// Shared stockpile, drawn on when a robot has no seeds.
    pub stock: &'a mut SharedStock,
    /// Species stats, for harvest yields.
    pub catalog: &'a SpeciesCatalog,
    /// Durations and seed pull size.
    pub tuning: &'a ActionTuning,
    /// Pathfinding budget for the walk toward a distant target.
    pub max_expansions: usize,
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefuseReason {
    /// The target is off the grid.
    OutOfBounds,
    /// No path leads next to the target.
    Unreachable,
    /// The target tile is not in a state the action can work on.
    NotApplicable,
    /// Neither the robot nor the stockpile has a seed of the species.
    NoSeed,
    /// The harvest would not fit in the robot's inventory.
    NoRoom,
}

/// Result of an action request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The timer started.
    Started,
    /// The robot is walking toward the target instead.
    Approaching,
    /// Nothing happened.
    Refused(RefuseReason),
}

impl RequestOutcome {
    /// Whether an action timer started.
    pub const fn started(self) -> bool {
        matches!(self, Self::Started)
    }
}

/// Request `kind` on `target` for `robot`.
///
/// `species` is only read for plant requests and falls back to the
/// robot's assigned crop.
pub fn request(
    robot: &mut Robot,
    kind: ActionKind,
    target: Position,
    species: Option<&str>,
    ctx: &mut RequestContext<'_>,
) -> RequestOutcome {
    if kind == ActionKind::Harvest && !harvest_fits(robot, target, ctx) {
        return RequestOutcome::Refused(RefuseReason::NoRoom);
    }
    if !robot.position.is_adjacent(target) {
        return approach(robot, target, ctx);
    }
    if !ctx.grid.in_bounds(target) {
        return RequestOutcome::Refused(RefuseReason::OutOfBounds);
    }

    let plant_species = match kind {
        ActionKind::Till if !farming::can_till(ctx.grid, target) => {
            return RequestOutcome::Refused(RefuseReason::NotApplicable);
        }
        ActionKind::Water if !farming::can_water(ctx.grid, target) => {
            return RequestOutcome::Refused(RefuseReason::NotApplicable);
        }
        ActionKind::Harvest if !farming::can_harvest(ctx.grid, target) => {
            return RequestOutcome::Refused(RefuseReason::NotApplicable);
        }
        ActionKind::Plant => {
            if !farming::can_plant(ctx.grid, target) {
                return RequestOutcome::Refused(RefuseReason::NotApplicable);
            }
            let species = species.unwrap_or(&robot.assigned_crop).to_owned();
            if !ensure_seed(robot, &species, ctx) {
                return RequestOutcome::Refused(RefuseReason::NoSeed);
            }
            Some(species)
        }
        ActionKind::Till | ActionKind::Water | ActionKind::Harvest => None,
    };

    robot.movement.clear();
    robot.pending = Some(PendingAction {
        kind,
        target,
        species: plant_species,
        ticks_remaining: ctx.tuning.duration(kind),
    });
    robot.state = RobotState::Working;
    debug!(
        robot = %robot.name,
        action = kind.name(),
        x = target.x,
        y = target.y,
        "Action started"
    );
    RequestOutcome::Started
}

/// Whether the crop on `target`, if any, would fit once harvested.
fn harvest_fits(robot: &Robot, target: Position, ctx: &RequestContext<'_>) -> bool {
    ctx.grid
        .get(target)
        .and_then(|t| t.crop.as_ref())
        .is_none_or(|crop| {
            robot.has_room_for(&crop.species, ctx.catalog.harvest_yield(&crop.species))
        })
}

/// Walk to the first tile next to `target`.
fn approach(robot: &mut Robot, target: Position, ctx: &RequestContext<'_>) -> RequestOutcome {
    match find_path_adjacent(ctx.grid, robot.position, target, ctx.max_expansions) {
        Some(path) if !path.is_empty() => {
            robot.movement.set_path(path);
            RequestOutcome::Approaching
        }
        _ => RequestOutcome::Refused(RefuseReason::Unreachable),
    }
}

/// Make sure the robot carries a seed of `species`, pulling a batch from
/// the stockpile if it has none.
fn ensure_seed(robot: &mut Robot, species: &str, ctx: &mut RequestContext<'_>) -> bool {
    if robot.inventory.seed_count(species) > 0 {
        return true;
    }
    let pulled = ctx.stock.take_seeds(species, ctx.tuning.seed_pull);
    if pulled == 0 {
        return false;
    }
    robot.inventory.add_seeds(species, pulled);
    debug!(robot = %robot.name, species, pulled, "Pulled seeds from stockpile");
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use roboranch_types::TileKind;

    use super::*;
    use crate::config::RobotCatalog;

    fn robot_at(x: i32, y: i32) -> Robot {
        let spec = RobotCatalog::default().get("basic").unwrap().clone();
        Robot::new("Farm-1".to_owned(), "basic".to_owned(), spec, Position::new(x, y))
    }

    fn field() -> FarmGrid {
        let mut grid = FarmGrid::new(16, 16, TileKind::Grass).unwrap();
        grid.set_kind(Position::new(5, 5), TileKind::Tilled).unwrap();
        grid.set_kind(Position::new(6, 5), TileKind::Tilled).unwrap();
        let catalog = SpeciesCatalog::default();
        assert!(farming::plant(&mut grid, Position::new(6, 5), "wheat", &catalog));
        grid
    }

    #[test]
    fn distant_target_becomes_a_walk() {
        let grid = field();
        let mut stock = SharedStock::default();
        let tuning = ActionTuning::default();
        let mut robot = robot_at(1, 5);
        let catalog = SpeciesCatalog::default();
        let mut ctx = RequestContext {
            grid: &grid,
            stock: &mut stock,
            catalog: &catalog,
            tuning: &tuning,
            max_expansions: 2000,
        };
        let outcome = request(&mut robot, ActionKind::Water, Position::new(6, 5), None, &mut ctx);
        assert_eq!(outcome, RequestOutcome::Approaching);
        assert!(robot.pending.is_none());
        assert_eq!(robot.movement.destination(), Some(Position::new(5, 5)));
    }

    #[test]
    fn adjacent_water_starts_timer() {
        let grid = field();
        let mut stock = SharedStock::default();
        let tuning = ActionTuning::default();
        let mut robot = robot_at(7, 6);
        let catalog = SpeciesCatalog::default();
        let mut ctx = RequestContext {
            grid: &grid,
            stock: &mut stock,
            catalog: &catalog,
            tuning: &tuning,
            max_expansions: 2000,
        };
        let outcome = request(&mut robot, ActionKind::Water, Position::new(6, 5), None, &mut ctx);
        assert!(outcome.started());
        let pending = robot.pending.as_ref().unwrap();
        assert_eq!(pending.ticks_remaining, 20);
        assert_eq!(robot.state, RobotState::Working);
    }

    #[test]
    fn preconditions_refuse() {
        let grid = field();
        let mut stock = SharedStock::default();
        let tuning = ActionTuning::default();
        let mut robot = robot_at(6, 6);
        let catalog = SpeciesCatalog::default();
        let mut ctx = RequestContext {
            grid: &grid,
            stock: &mut stock,
            catalog: &catalog,
            tuning: &tuning,
            max_expansions: 2000,
        };
        // Seedling is not ready and tilled soil cannot be tilled again.
        assert_eq!(
            request(&mut robot, ActionKind::Harvest, Position::new(6, 5), None, &mut ctx),
            RequestOutcome::Refused(RefuseReason::NotApplicable)
        );
        assert_eq!(
            request(&mut robot, ActionKind::Till, Position::new(5, 5), None, &mut ctx),
            RequestOutcome::Refused(RefuseReason::NotApplicable)
        );
        assert_eq!(
            request(&mut robot, ActionKind::Plant, Position::new(5, 5), None, &mut ctx),
            RequestOutcome::Refused(RefuseReason::NoSeed)
        );
        assert!(robot.pending.is_none());
    }

    #[test]
    fn plant_pulls_a_batch_of_seeds() {
        let grid = field();
        let mut stock = SharedStock::default();
        stock.add_seeds("wheat", 25);
        let tuning = ActionTuning::default();
        let mut robot = robot_at(5, 6);
        let catalog = SpeciesCatalog::default();
        let mut ctx = RequestContext {
            grid: &grid,
            stock: &mut stock,
            catalog: &catalog,
            tuning: &tuning,
            max_expansions: 2000,
        };
        let outcome = request(&mut robot, ActionKind::Plant, Position::new(5, 5), None, &mut ctx);
        assert!(outcome.started());
        assert_eq!(robot.inventory.seed_count("wheat"), 10);
        assert_eq!(stock.seed_count("wheat"), 15);
        assert_eq!(
            robot.pending.as_ref().unwrap().species.as_deref(),
            Some("wheat")
        );
    }

    #[test]
    fn walled_off_target_is_unreachable() {
        let mut grid = field();
        for x in 0..16 {
            grid.set_kind(Position::new(x, 3), TileKind::Rock).unwrap();
        }
        let mut stock = SharedStock::default();
        let tuning = ActionTuning::default();
        let mut robot = robot_at(1, 1);
        let catalog = SpeciesCatalog::default();
        let mut ctx = RequestContext {
            grid: &grid,
            stock: &mut stock,
            catalog: &catalog,
            tuning: &tuning,
            max_expansions: 2000,
        };
        assert_eq!(
            request(&mut robot, ActionKind::Water, Position::new(6, 5), None, &mut ctx),
            RequestOutcome::Refused(RefuseReason::Unreachable)
        );
    }

    fn ripen(grid: &mut FarmGrid, pos: Position) {
        let crop = grid.get_mut(pos).unwrap().crop.as_mut().unwrap();
        crop.stage = crop.stages.saturating_sub(1);
    }

    #[test]
    fn harvest_that_cannot_fit_is_refused_up_front() {
        let mut grid = field();
        ripen(&mut grid, Position::new(6, 5));
        let mut stock = SharedStock::default();
        let catalog = SpeciesCatalog::default();
        let tuning = ActionTuning::default();
        let mut ctx = RequestContext {
            grid: &grid,
            stock: &mut stock,
            catalog: &catalog,
            tuning: &tuning,
            max_expansions: 2000,
        };

        // 30 of 32 units carried; a wheat harvest yields 3.
        let mut near = robot_at(6, 6);
        near.inventory.add_crops("wheat", 30, 32, 3).unwrap();
        assert_eq!(
            request(&mut near, ActionKind::Harvest, Position::new(6, 5), None, &mut ctx),
            RequestOutcome::Refused(RefuseReason::NoRoom)
        );
        assert!(near.pending.is_none());

        // A distant robot is not sent walking toward a crop it cannot carry.
        let mut far = robot_at(1, 5);
        far.inventory.add_crops("wheat", 30, 32, 3).unwrap();
        assert_eq!(
            request(&mut far, ActionKind::Harvest, Position::new(6, 5), None, &mut ctx),
            RequestOutcome::Refused(RefuseReason::NoRoom)
        );
        assert!(!far.movement.is_moving());
    }

    #[test]
    fn harvest_needs_a_free_slot_for_a_new_species() {
        let mut grid = field();
        ripen(&mut grid, Position::new(6, 5));
        let mut stock = SharedStock::default();
        let catalog = SpeciesCatalog::default();
        let tuning = ActionTuning::default();
        let mut ctx = RequestContext {
            grid: &grid,
            stock: &mut stock,
            catalog: &catalog,
            tuning: &tuning,
            max_expansions: 2000,
        };
        let mut robot = robot_at(6, 6);
        for species in ["carrot", "tomato", "blueberry"] {
            robot.inventory.add_crops(species, 1, 32, 3).unwrap();
        }
        assert_eq!(
            request(&mut robot, ActionKind::Harvest, Position::new(6, 5), None, &mut ctx),
            RequestOutcome::Refused(RefuseReason::NoRoom)
        );

        let mut empty = robot_at(6, 6);
        assert!(request(&mut empty, ActionKind::Harvest, Position::new(6, 5), None, &mut ctx).started());
    }
}
