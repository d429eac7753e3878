//! The capability surface a robot program can see.
//!
//! A script receives two bindings and nothing else: `robot`, a read-only
//! object map describing the robot, and `api`, a handle whose methods form
//! the closed set of things a program may do. Queries read the live grid.
//! Requests (move, till, plant, water, harvest, idle) are only recorded
//! here; the agent layer replays them through its own request path after
//! the script returns.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, Map};
use roboranch_types::{ActionKind, Position, TileKind, WorkArea};
use roboranch_world::{
    CropFilter, FarmGrid, MAX_SEARCH_RADIUS, TileFilter, farming, find_crop, find_tile, nearby,
};

use crate::convert;
use crate::memory::ScriptMemory;

/// Largest radius `api.nearby` will enumerate.
pub const MAX_NEARBY_RADIUS: u32 = 10;

/// Longest log line kept, in characters.
const MAX_LOG_CHARS: usize = 200;

/// A request recorded by a script for the agent layer to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    /// Walk to a tile.
    MoveTo(Position),
    /// Start an action on a tile, or walk next to it first.
    Act {
        /// What to do.
        kind: ActionKind,
        /// Target tile.
        target: Position,
        /// Species for `plant`.
        species: Option<String>,
    },
    /// Drop any path and pending action.
    Idle,
}

/// Read-only facts about the robot a script runs for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptRobot {
    /// Robot identifier, rendered as a string.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Model key.
    pub model: String,
    /// Current tile.
    pub position: Position,
    /// Home tile.
    pub home: Position,
    /// Battery level in milli-units.
    pub battery_milli: u32,
    /// Battery capacity in milli-units.
    pub battery_max_milli: u32,
    /// Crop units the robot can carry.
    pub capacity: u32,
    /// Distinct crop species the robot can carry.
    pub slots: u32,
    /// Species planted by default.
    pub assigned_crop: String,
    /// Work area, if set.
    pub work_area: Option<WorkArea>,
    /// Seeds carried, by species.
    pub seeds: BTreeMap<String, u32>,
    /// Crops carried, by species.
    pub crops: BTreeMap<String, u32>,
    /// Seeds in the shared stockpile, by species.
    pub shared_seeds: BTreeMap<String, u32>,
}

impl ScriptRobot {
    /// Whether a seed of `species` is available to this robot.
    pub fn has_seed(&self, species: &str) -> bool {
        let own = self.seeds.get(species).copied().unwrap_or(0);
        let shared = self.shared_seeds.get(species).copied().unwrap_or(0);
        own > 0 || shared > 0
    }

    /// Total crop units carried.
    pub fn crop_load(&self) -> u32 {
        self.crops.values().fold(0_u32, |acc, v| acc.saturating_add(*v))
    }

    /// The `robot` binding seen by scripts.
    pub fn to_map(&self) -> Map {
        let mut map = Map::new();
        map.insert("id".into(), Dynamic::from(self.id.clone()));
        map.insert("name".into(), Dynamic::from(self.name.clone()));
        map.insert("model".into(), Dynamic::from(self.model.clone()));
        map.insert("x".into(), Dynamic::from_int(i64::from(self.position.x)));
        map.insert("y".into(), Dynamic::from_int(i64::from(self.position.y)));
        map.insert("home_x".into(), Dynamic::from_int(i64::from(self.home.x)));
        map.insert("home_y".into(), Dynamic::from_int(i64::from(self.home.y)));
        map.insert("battery".into(), Dynamic::from_float(f64::from(self.battery_milli) / 1000.0));
        map.insert(
            "battery_max".into(),
            Dynamic::from_float(f64::from(self.battery_max_milli) / 1000.0),
        );
        map.insert("capacity".into(), Dynamic::from_int(i64::from(self.capacity)));
        map.insert("slots".into(), Dynamic::from_int(i64::from(self.slots)));
        map.insert("assigned_crop".into(), Dynamic::from(self.assigned_crop.clone()));
        let area = self.work_area.map_or(Dynamic::UNIT, |a| {
            let mut m = convert::position_map(a.center);
            m.insert("radius".into(), Dynamic::from_int(i64::from(a.radius)));
            Dynamic::from_map(m)
        });
        map.insert("work_area".into(), area);
        map
    }
}

/// State shared between the host and every `api` call in one run.
#[derive(Debug, Clone)]
pub struct ScriptContext {
    /// The farm, moved in for the duration of the run.
    pub grid: FarmGrid,
    /// The robot being driven.
    pub robot: ScriptRobot,
    /// The robot's memory, moved in for the duration of the run.
    pub memory: ScriptMemory,
    /// Requests in call order.
    pub commands: Vec<ScriptCommand>,
    /// Lines passed to `api.log`.
    pub logs: Vec<String>,
    /// Cap on `logs`.
    pub max_log_lines: usize,
}

/// The `api` binding. Cheap to clone; every clone shares one context.
#[derive(Debug, Clone)]
pub struct ScriptApi {
    ctx: Rc<RefCell<ScriptContext>>,
}

type ApiResult<T> = Result<T, Box<EvalAltResult>>;

impl ScriptApi {
    /// Wrap a shared context.
    pub const fn new(ctx: Rc<RefCell<ScriptContext>>) -> Self {
        Self { ctx }
    }

    fn pos(&self) -> Map {
        convert::position_map(self.ctx.borrow().robot.position)
    }

    fn find_crop(&self, filter: &Map) -> ApiResult<Dynamic> {
        let ctx = self.ctx.borrow();
        let crop_filter = CropFilter {
            ready: convert::flag(filter, "ready")?,
            needs_water: convert::flag(filter, "needs_water")?,
            species: convert::text(filter, "species")?,
            center: center(filter, ctx.robot.position)?,
            max_dist: max_dist(filter)?,
        };
        Ok(find_crop(&ctx.grid, ctx.robot.position, &crop_filter).map_or(Dynamic::UNIT, |(pos, crop)| {
            let mut map = convert::position_map(pos);
            map.insert("crop".into(), Dynamic::from_map(convert::crop_map(crop)));
            Dynamic::from_map(map)
        }))
    }

    fn find_tile(&self, filter: &Map) -> ApiResult<Dynamic> {
        let ctx = self.ctx.borrow();
        let kind = convert::text(filter, "kind")?
            .map(|name| TileKind::from_name(&name).ok_or_else(|| format!("unknown tile kind `{name}`")))
            .transpose()?;
        let tile_filter = TileFilter {
            kind,
            empty: convert::flag(filter, "empty")?,
            center: center(filter, ctx.robot.position)?,
            max_dist: max_dist(filter)?,
        };
        Ok(find_tile(&ctx.grid, ctx.robot.position, &tile_filter)
            .map_or(Dynamic::UNIT, |(pos, tile)| Dynamic::from_map(convert::tile_map(pos, tile))))
    }

    fn move_to(&self, x: i64, y: i64) -> ApiResult<()> {
        let target = position(x, y)?;
        let mut ctx = self.ctx.borrow_mut();
        if ctx.robot.position != target {
            ctx.commands.push(ScriptCommand::MoveTo(target));
        }
        Ok(())
    }

    /// Record an action request. Returns whether the action would start
    /// now: the robot must be next to the target and the target must pass
    /// the request-time check. A far target is still recorded so the robot
    /// walks over.
    fn act(&self, kind: ActionKind, x: i64, y: i64, species: Option<String>) -> ApiResult<bool> {
        let target = position(x, y)?;
        let mut ctx = self.ctx.borrow_mut();
        let command = ScriptCommand::Act {
            kind,
            target,
            species: species.clone(),
        };
        if !ctx.robot.position.is_adjacent(target) {
            ctx.commands.push(command);
            return Ok(false);
        }
        let ready = match kind {
            ActionKind::Till => farming::can_till(&ctx.grid, target),
            ActionKind::Water => farming::can_water(&ctx.grid, target),
            ActionKind::Harvest => farming::can_harvest(&ctx.grid, target),
            ActionKind::Plant => {
                farming::can_plant(&ctx.grid, target)
                    && species.as_deref().is_some_and(|s| ctx.robot.has_seed(s))
            }
        };
        if ready {
            ctx.commands.push(command);
        }
        Ok(ready)
    }

    fn idle(&self) {
        self.ctx.borrow_mut().commands.push(ScriptCommand::Idle);
    }

    fn mem_get(&self, key: &str) -> Dynamic {
        self.ctx
            .borrow()
            .memory
            .get(key)
            .map_or(Dynamic::UNIT, convert::from_memory)
    }

    fn mem_set(&self, key: &str, value: Dynamic) -> ApiResult<Dynamic> {
        let stored = convert::to_memory(value.clone())?;
        self.ctx
            .borrow_mut()
            .memory
            .set(key, stored)
            .map_err(|err| err.to_string())?;
        Ok(value)
    }

    fn inventory(&self) -> Map {
        let ctx = self.ctx.borrow();
        let robot = &ctx.robot;
        let mut map = Map::new();
        map.insert("seeds".into(), Dynamic::from_map(convert::count_map(robot.seeds.iter())));
        map.insert("crops".into(), Dynamic::from_map(convert::count_map(robot.crops.iter())));
        map.insert("load".into(), Dynamic::from_int(i64::from(robot.crop_load())));
        map.insert("capacity".into(), Dynamic::from_int(i64::from(robot.capacity)));
        map.insert("slots".into(), Dynamic::from_int(i64::from(robot.slots)));
        map
    }

    fn nearby(&self, radius: i64) -> Array {
        let ctx = self.ctx.borrow();
        let r = u32::try_from(radius.max(0)).unwrap_or(MAX_NEARBY_RADIUS).min(MAX_NEARBY_RADIUS);
        nearby(&ctx.grid, ctx.robot.position, r)
            .into_iter()
            .map(|(pos, tile)| Dynamic::from_map(convert::tile_map(pos, tile)))
            .collect()
    }

    fn distance_to(&self, x: i64, y: i64) -> i64 {
        let pos = self.ctx.borrow().robot.position;
        let dx = i64::from(pos.x).saturating_sub(x).saturating_abs();
        let dy = i64::from(pos.y).saturating_sub(y).saturating_abs();
        dx.saturating_add(dy)
    }

    fn log(&self, message: &str) {
        let mut ctx = self.ctx.borrow_mut();
        if ctx.logs.len() >= ctx.max_log_lines {
            return;
        }
        let line: String = message.chars().take(MAX_LOG_CHARS).collect();
        tracing::debug!(robot = %ctx.robot.name, line = %line, "Script log");
        ctx.logs.push(line);
    }
}

/// Convert script coordinates to a grid position.
fn position(x: i64, y: i64) -> ApiResult<Position> {
    match (i32::try_from(x), i32::try_from(y)) {
        (Ok(x), Ok(y)) => Ok(Position::new(x, y)),
        _ => Err(format!("coordinates ({x}, {y}) out of range").into()),
    }
}

/// Search centre from the `cx`/`cy` filter fields. A missing field falls
/// back to the robot's own coordinate.
fn center(filter: &Map, robot: Position) -> ApiResult<Option<Position>> {
    let cx = convert::int(filter, "cx")?;
    let cy = convert::int(filter, "cy")?;
    if cx.is_none() && cy.is_none() {
        return Ok(None);
    }
    let x = cx.unwrap_or_else(|| i64::from(robot.x));
    let y = cy.unwrap_or_else(|| i64::from(robot.y));
    position(x, y).map(Some)
}

/// Search radius from the `max_dist` filter field, clamped to the
/// supported range.
fn max_dist(filter: &Map) -> ApiResult<u32> {
    Ok(convert::int(filter, "max_dist")?.map_or(roboranch_world::DEFAULT_SEARCH_RADIUS, |d| {
        u32::try_from(d.max(0)).unwrap_or(MAX_SEARCH_RADIUS).min(MAX_SEARCH_RADIUS)
    }))
}

/// Register the `api` type and its methods on `engine`.
pub fn register_api(engine: &mut Engine) {
    engine.register_type_with_name::<ScriptApi>("Api");
    engine.register_fn("pos", |api: ScriptApi| api.pos());
    engine.register_fn("find_crop", |api: ScriptApi| api.find_crop(&Map::new()));
    engine.register_fn("find_crop", |api: ScriptApi, filter: Map| api.find_crop(&filter));
    engine.register_fn("find_tile", |api: ScriptApi| api.find_tile(&Map::new()));
    engine.register_fn("find_tile", |api: ScriptApi, filter: Map| api.find_tile(&filter));
    engine.register_fn("move_to", |api: ScriptApi, x: i64, y: i64| api.move_to(x, y));
    engine.register_fn("till", |api: ScriptApi, x: i64, y: i64| {
        api.act(ActionKind::Till, x, y, None)
    });
    engine.register_fn("water", |api: ScriptApi, x: i64, y: i64| {
        api.act(ActionKind::Water, x, y, None)
    });
    engine.register_fn("harvest", |api: ScriptApi, x: i64, y: i64| {
        api.act(ActionKind::Harvest, x, y, None)
    });
    engine.register_fn("plant", |api: ScriptApi, x: i64, y: i64, species: ImmutableString| {
        api.act(ActionKind::Plant, x, y, Some(species.to_string()))
    });
    engine.register_fn("plant", |api: ScriptApi, x: i64, y: i64| {
        let species = api.ctx.borrow().robot.assigned_crop.clone();
        api.act(ActionKind::Plant, x, y, Some(species))
    });
    engine.register_fn("idle", |api: ScriptApi| api.idle());
    engine.register_fn("mem", |api: ScriptApi, key: ImmutableString| api.mem_get(&key));
    engine.register_fn("mem", |api: ScriptApi, key: ImmutableString, value: Dynamic| {
        api.mem_set(&key, value)
    });
    engine.register_fn("inventory", |api: ScriptApi| api.inventory());
    engine.register_fn("nearby", |api: ScriptApi, radius: i64| api.nearby(radius));
    engine.register_fn("distance_to", |api: ScriptApi, x: i64, y: i64| {
        api.distance_to(x, y)
    });
    engine.register_fn("log", |api: ScriptApi, message: ImmutableString| api.log(&message));
}
