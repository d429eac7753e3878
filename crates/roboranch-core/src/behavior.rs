//! Built-in robot behaviors.
//!
//! Every built-in is a priority chain over the same small set of steps.
//! The first step that finds work issues a request through [`RobotApi`]
//! and the chain stops; if no step finds work the robot idles. A request
//! that is refused outright (unreachable target, missing seed) lets the
//! chain fall through to the next step.
//!
//! `collect` sends a loaded robot home when its inventory is full or when
//! the nearest ready crop would not fit.
//!
//! | Behavior     | Chain                                   |
//! |--------------|-----------------------------------------|
//! | `idle`       | idle                                    |
//! | `auto_farm`  | collect, harvest, water, plant, till    |
//! | `full_cycle` | collect, harvest, water, plant          |
//! | `harvester`  | collect, harvest                        |
//! | `water_area` | water                                   |
//! | `planter`    | water, plant                            |
//! | `area_farm`  | collect, harvest, water, plant (anchored) |

use roboranch_agents::{RequestOutcome, RobotApi};
use roboranch_types::{ActionKind, BuiltinBehavior, MemoryValue, Position, TileKind};
use roboranch_world::{CropFilter, TileFilter};

/// Search radius of most built-ins when no work area is set.
pub const DEFAULT_BEHAVIOR_RADIUS: u32 = 12;

/// Search radius of `water_area` when no work area is set.
pub const WATER_AREA_RADIUS: u32 = 10;

/// Territory radius of `area_farm` around its anchor.
pub const AREA_FARM_RADIUS: u32 = 8;

/// Memory key holding the `area_farm` anchor column.
pub const ANCHOR_X_KEY: &str = "home_x";

/// Memory key holding the `area_farm` anchor row.
pub const ANCHOR_Y_KEY: &str = "home_y";

/// What a built-in decided to do this dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Heading home to unload a full inventory.
    Unload,
    /// Working on (or walking to) a tile.
    Work {
        /// The action requested.
        kind: ActionKind,
        /// Target tile.
        target: Position,
        /// Whether the action timer started; `false` means the robot is
        /// walking over first.
        started: bool,
    },
    /// Nothing to do.
    Idle,
}

/// One link of a behavior chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Collect,
    Harvest,
    Water,
    Plant,
    Till,
}

/// The chain run by `behavior`.
const fn chain(behavior: BuiltinBehavior) -> &'static [Step] {
    match behavior {
        BuiltinBehavior::Idle => &[],
        BuiltinBehavior::AutoFarm => &[
            Step::Collect,
            Step::Harvest,
            Step::Water,
            Step::Plant,
            Step::Till,
        ],
        BuiltinBehavior::FullCycle | BuiltinBehavior::AreaFarm => {
            &[Step::Collect, Step::Harvest, Step::Water, Step::Plant]
        }
        BuiltinBehavior::Harvester => &[Step::Collect, Step::Harvest],
        BuiltinBehavior::WaterArea => &[Step::Water],
        BuiltinBehavior::Planter => &[Step::Water, Step::Plant],
    }
}

/// Where a chain searches for work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SearchArea {
    center: Position,
    radius: u32,
}

impl SearchArea {
    fn crops(self) -> CropFilter {
        CropFilter {
            center: Some(self.center),
            max_dist: self.radius,
            ..CropFilter::default()
        }
    }

    fn ready_crops(self) -> CropFilter {
        CropFilter {
            ready: true,
            ..self.crops()
        }
    }

    fn tiles(self, kind: TileKind) -> TileFilter {
        TileFilter {
            kind: Some(kind),
            center: Some(self.center),
            max_dist: self.radius,
            ..TileFilter::default()
        }
    }
}

/// Run `behavior` for the robot bound to `api`.
pub fn run_builtin(api: &mut RobotApi<'_>, behavior: BuiltinBehavior) -> Task {
    let area = search_area(api, behavior);
    for step in chain(behavior) {
        if let Some(task) = try_step(api, *step, area) {
            return task;
        }
    }
    api.idle();
    Task::Idle
}

/// Work-area centre and radius, or the behavior's own territory.
fn search_area(api: &mut RobotApi<'_>, behavior: BuiltinBehavior) -> SearchArea {
    if behavior == BuiltinBehavior::AreaFarm {
        return SearchArea {
            center: anchor(api),
            radius: AREA_FARM_RADIUS,
        };
    }
    let default = if behavior == BuiltinBehavior::WaterArea {
        WATER_AREA_RADIUS
    } else {
        DEFAULT_BEHAVIOR_RADIUS
    };
    let robot = api.robot();
    SearchArea {
        center: robot.search_center(),
        radius: robot.search_radius(default),
    }
}

/// The `area_farm` anchor, remembered from the first dispatch.
fn anchor(api: &mut RobotApi<'_>) -> Position {
    let x = api.mem(ANCHOR_X_KEY).and_then(MemoryValue::as_int);
    let y = api.mem(ANCHOR_Y_KEY).and_then(MemoryValue::as_int);
    if let (Some(Ok(x)), Some(Ok(y))) = (x.map(i32::try_from), y.map(i32::try_from)) {
        return Position::new(x, y);
    }
    let here = api.pos();
    api.set_mem(ANCHOR_X_KEY, MemoryValue::Int(i64::from(here.x)));
    api.set_mem(ANCHOR_Y_KEY, MemoryValue::Int(i64::from(here.y)));
    here
}

fn try_step(api: &mut RobotApi<'_>, step: Step, area: SearchArea) -> Option<Task> {
    match step {
        Step::Collect => {
            let robot = api.robot();
            let load = robot.inventory.crop_load();
            if load == 0 {
                return None;
            }
            let full = load >= robot.spec.inventory_capacity;
            let home = robot.home;
            // Nearest ready crop would not fit: unload before taking it on.
            let blocked = || {
                api.find_crop(&area.ready_crops())
                    .is_some_and(|(_, crop)| !api.can_carry_harvest(&crop.species))
            };
            if !full && !blocked() {
                return None;
            }
            api.move_to(home).then_some(Task::Unload)
        }
        Step::Harvest => {
            let (target, _) = api.find_crop(&area.ready_crops())?;
            work(api, ActionKind::Harvest, target, None)
        }
        Step::Water => {
            let filter = CropFilter {
                needs_water: true,
                ..area.crops()
            };
            let (target, _) = api.find_crop(&filter)?;
            work(api, ActionKind::Water, target, None)
        }
        Step::Plant => {
            let species = api.robot().assigned_crop.clone();
            let has_seed = api.robot().inventory.seed_count(&species) > 0
                || api.stock().seed_count(&species) > 0;
            if !has_seed {
                return None;
            }
            let filter = TileFilter {
                empty: true,
                ..area.tiles(TileKind::Tilled)
            };
            let (target, _) = api.find_tile(&filter)?;
            work(api, ActionKind::Plant, target, Some(&species))
        }
        Step::Till => {
            let (target, _) = api
                .find_tile(&area.tiles(TileKind::Grass))
                .or_else(|| api.find_tile(&area.tiles(TileKind::Flower)))?;
            work(api, ActionKind::Till, target, None)
        }
    }
}

fn work(
    api: &mut RobotApi<'_>,
    kind: ActionKind,
    target: Position,
    species: Option<&str>,
) -> Option<Task> {
    match api.act(kind, target, species) {
        RequestOutcome::Started => Some(Task::Work {
            kind,
            target,
            started: true,
        }),
        RequestOutcome::Approaching => Some(Task::Work {
            kind,
            target,
            started: false,
        }),
        RequestOutcome::Refused(_) => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use roboranch_agents::{ActionTuning, Robot, RobotCatalog, SharedStock};
    use roboranch_types::WorkArea;
    use roboranch_world::{FarmGrid, SpeciesCatalog, farming};

    use super::*;

    fn robot_at(pos: Position) -> Robot {
        let spec = RobotCatalog::default().get("basic").unwrap().clone();
        Robot::new("Farm-1".to_owned(), "basic".to_owned(), spec, pos)
    }

    fn plant(grid: &mut FarmGrid, pos: Position, ready: bool) {
        grid.set_kind(pos, TileKind::Tilled).unwrap();
        assert!(farming::plant(grid, pos, "wheat", &SpeciesCatalog::default()));
        let crop = grid.get_mut(pos).unwrap().crop.as_mut().unwrap();
        crop.is_watered = true;
        if ready {
            crop.stage = crop.stages.saturating_sub(1);
        }
    }

    fn dispatch(
        robot: &mut Robot,
        grid: &FarmGrid,
        stock: &mut SharedStock,
        behavior: BuiltinBehavior,
    ) -> Task {
        let catalog = SpeciesCatalog::default();
        let tuning = ActionTuning::default();
        let mut api = RobotApi::new(robot, grid, stock, &catalog, &tuning, 2000);
        run_builtin(&mut api, behavior)
    }

    #[test]
    fn harvest_comes_before_water() {
        let mut grid = FarmGrid::new(20, 20, TileKind::Grass).unwrap();
        let ready = Position::new(8, 5);
        plant(&mut grid, ready, true);
        let thirsty = Position::new(6, 5);
        plant(&mut grid, thirsty, false);
        grid.get_mut(thirsty).unwrap().crop.as_mut().unwrap().is_watered = false;
        let mut stock = SharedStock::default();
        let mut robot = robot_at(Position::new(5, 5));

        let task = dispatch(&mut robot, &grid, &mut stock, BuiltinBehavior::AutoFarm);
        assert_eq!(
            task,
            Task::Work {
                kind: ActionKind::Harvest,
                target: ready,
                started: false
            }
        );
        assert!(robot.movement.is_moving());
    }

    #[test]
    fn adjacent_work_starts_immediately() {
        let mut grid = FarmGrid::new(20, 20, TileKind::Grass).unwrap();
        let target = Position::new(6, 5);
        plant(&mut grid, target, true);
        let mut stock = SharedStock::default();
        let mut robot = robot_at(Position::new(5, 5));
        let task = dispatch(&mut robot, &grid, &mut stock, BuiltinBehavior::Harvester);
        assert_eq!(
            task,
            Task::Work {
                kind: ActionKind::Harvest,
                target,
                started: true
            }
        );
        assert!(robot.pending.is_some());
    }

    #[test]
    fn full_robot_goes_home() {
        let grid = FarmGrid::new(20, 20, TileKind::Grass).unwrap();
        let mut stock = SharedStock::default();
        let mut robot = robot_at(Position::new(2, 2));
        robot.position = Position::new(9, 2);
        robot.inventory.add_crops("wheat", 32, 32, 3).unwrap();
        let task = dispatch(&mut robot, &grid, &mut stock, BuiltinBehavior::FullCycle);
        assert_eq!(task, Task::Unload);
        assert_eq!(robot.movement.destination(), Some(Position::new(2, 2)));
    }

    #[test]
    fn near_full_robot_unloads_instead_of_harvesting() {
        let mut grid = FarmGrid::new(20, 20, TileKind::Grass).unwrap();
        let mut stock = SharedStock::default();
        let mut robot = robot_at(Position::new(2, 2));
        robot.position = Position::new(9, 2);
        plant(&mut grid, Position::new(10, 2), true);
        robot.inventory.add_crops("wheat", 30, 32, 3).unwrap();

        let task = dispatch(&mut robot, &grid, &mut stock, BuiltinBehavior::Harvester);
        assert_eq!(task, Task::Unload);
        assert!(robot.pending.is_none());
        assert_eq!(robot.movement.destination(), Some(Position::new(2, 2)));
    }

    #[test]
    fn robot_with_no_free_slot_unloads() {
        let mut grid = FarmGrid::new(20, 20, TileKind::Grass).unwrap();
        let mut stock = SharedStock::default();
        let mut robot = robot_at(Position::new(2, 2));
        robot.position = Position::new(9, 2);
        plant(&mut grid, Position::new(10, 2), true);
        for species in ["carrot", "tomato", "blueberry"] {
            robot.inventory.add_crops(species, 1, 32, 3).unwrap();
        }

        let task = dispatch(&mut robot, &grid, &mut stock, BuiltinBehavior::AutoFarm);
        assert_eq!(task, Task::Unload);
    }

    #[test]
    fn partly_loaded_robot_keeps_harvesting_what_fits() {
        let mut grid = FarmGrid::new(20, 20, TileKind::Grass).unwrap();
        let mut stock = SharedStock::default();
        let mut robot = robot_at(Position::new(2, 2));
        robot.position = Position::new(9, 2);
        plant(&mut grid, Position::new(10, 2), true);
        robot.inventory.add_crops("wheat", 20, 32, 3).unwrap();

        let task = dispatch(&mut robot, &grid, &mut stock, BuiltinBehavior::Harvester);
        assert_eq!(
            task,
            Task::Work {
                kind: ActionKind::Harvest,
                target: Position::new(10, 2),
                started: true
            }
        );
    }

    #[test]
    fn planting_needs_a_seed_somewhere() {
        let mut grid = FarmGrid::new(20, 20, TileKind::Water).unwrap();
        grid.set_kind(Position::new(5, 5), TileKind::Tilled).unwrap();
        grid.set_kind(Position::new(6, 5), TileKind::Tilled).unwrap();
        let mut stock = SharedStock::default();
        let mut robot = robot_at(Position::new(5, 5));

        let task = dispatch(&mut robot, &grid, &mut stock, BuiltinBehavior::Planter);
        assert_eq!(task, Task::Idle);

        stock.add_seeds("wheat", 3);
        let task = dispatch(&mut robot, &grid, &mut stock, BuiltinBehavior::Planter);
        assert!(matches!(
            task,
            Task::Work {
                kind: ActionKind::Plant,
                started: true,
                ..
            }
        ));
        // The robot pulled its own supply from the stockpile.
        assert_eq!(stock.seed_count("wheat"), 0);
        assert_eq!(robot.inventory.seed_count("wheat"), 3);
    }

    #[test]
    fn only_auto_farm_tills() {
        let grid = FarmGrid::new(10, 10, TileKind::Grass).unwrap();
        let mut stock = SharedStock::default();
        let mut robot = robot_at(Position::new(5, 5));
        let task = dispatch(&mut robot, &grid, &mut stock, BuiltinBehavior::FullCycle);
        assert_eq!(task, Task::Idle);
        let task = dispatch(&mut robot, &grid, &mut stock, BuiltinBehavior::AutoFarm);
        assert!(matches!(
            task,
            Task::Work {
                kind: ActionKind::Till,
                ..
            }
        ));
    }

    #[test]
    fn work_area_limits_the_search() {
        let mut grid = FarmGrid::new(40, 10, TileKind::Grass).unwrap();
        plant(&mut grid, Position::new(30, 5), true);
        let mut stock = SharedStock::default();
        let mut robot = robot_at(Position::new(5, 5));
        robot.work_area = Some(WorkArea {
            center: Position::new(5, 5),
            radius: 4,
        });
        let task = dispatch(&mut robot, &grid, &mut stock, BuiltinBehavior::Harvester);
        assert_eq!(task, Task::Idle);
    }

    #[test]
    fn area_farm_remembers_its_anchor() {
        let mut grid = FarmGrid::new(40, 10, TileKind::Grass).unwrap();
        let mut stock = SharedStock::default();
        let mut robot = robot_at(Position::new(5, 5));
        assert_eq!(
            dispatch(&mut robot, &grid, &mut stock, BuiltinBehavior::AreaFarm),
            Task::Idle
        );
        assert_eq!(robot.memory.get(ANCHOR_X_KEY), Some(&MemoryValue::Int(5)));

        // Wandering off does not move the territory.
        robot.position = Position::new(25, 5);
        plant(&mut grid, Position::new(26, 5), true);
        assert_eq!(
            dispatch(&mut robot, &grid, &mut stock, BuiltinBehavior::AreaFarm),
            Task::Idle
        );
        plant(&mut grid, Position::new(9, 5), true);
        assert!(matches!(
            dispatch(&mut robot, &grid, &mut stock, BuiltinBehavior::AreaFarm),
            Task::Work {
                kind: ActionKind::Harvest,
                ..
            }
        ));
    }

    #[test]
    fn idle_behavior_does_nothing() {
        let mut grid = FarmGrid::new(10, 10, TileKind::Grass).unwrap();
        plant(&mut grid, Position::new(6, 5), true);
        let mut stock = SharedStock::default();
        let mut robot = robot_at(Position::new(5, 5));
        assert_eq!(
            dispatch(&mut robot, &grid, &mut stock, BuiltinBehavior::Idle),
            Task::Idle
        );
        assert!(robot.is_idle());
    }
}
