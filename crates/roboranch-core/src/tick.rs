//! Tick cycle: the fixed-step loop that drives the RoboRanch simulation.
//!
//! Each tick runs through these phases:
//!
//! 1. **Clock** -- advance the clock; on a new day, roll the day's rain.
//!
//! 2. **Growth** -- every `growth_pass_interval` ticks, grow watered crops.
//!
//! 3. **Robots** -- update every robot in fleet order. Each robot's update
//!    runs to completion before the next one starts, so a tile changed by
//!    one robot is already changed when the next robot looks at it:
//!    - an action timer counts down (draining the battery) and nothing
//!      else happens to the robot this tick;
//!    - on the home tile the battery charges and carried crops go to the
//!      shared stockpile;
//!    - a low scavenger eats a nearby ready crop;
//!    - a robot with a path moves along it;
//!    - an idle robot counts up its work timer and is dispatched when the
//!      timer comes due.
//!
//! The tick cycle is deterministic given the same initial state and the
//! same commands.

use roboranch_agents::actions::tick_pending;
use roboranch_agents::{
    ActionEffect, ExecutionContext, Fleet, Multipliers, Robot, SharedStock, effective_work_delay,
    scale, step_drain, tick_advance,
};
use roboranch_script::ScriptHost;
use roboranch_types::{Delivery, HarvestEvent, RobotId, RobotState, RobotStatus, Season};
use roboranch_world::{FarmGrid, GrowthReport, RainSystem, farming, growth_pass, search};
use tracing::{debug, info};

use crate::clock::{ClockError, FarmClock};
use crate::config::SimulationConfig;
use crate::dispatch::{DispatchContext, DispatchOutcome, dispatch};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Day number during this tick.
    pub day: u64,
    /// The season during this tick.
    pub season: Season,
    /// Whether today is a rain day.
    pub rain_day: bool,
    /// Whether this tick started a new day.
    pub new_day: bool,
    /// Growth pass results, on ticks that ran one.
    pub growth: Option<GrowthReport>,
    /// Crops harvested into robot inventories.
    pub harvests: Vec<HarvestEvent>,
    /// Crops moved from robots into the shared stockpile.
    pub deliveries: Vec<Delivery>,
    /// Ready crops eaten by scavengers for power.
    pub scavenged: u32,
    /// Robots whose custom script failed this tick, with the error.
    pub script_errors: Vec<(RobotId, String)>,
    /// Robots deployed at end of tick.
    pub robots: u32,
}

/// The mutable simulation state passed through the tick cycle.
#[derive(Debug)]
pub struct SimulationState {
    /// The farm clock.
    pub clock: FarmClock,
    /// The farm.
    pub grid: FarmGrid,
    /// The owner's shared seeds and crops.
    pub stock: SharedStock,
    /// Every deployed robot, in processing order.
    pub fleet: Fleet,
    /// Configuration the simulation was started with.
    pub config: SimulationConfig,
    /// Daily rain roll.
    pub rain: RainSystem,
    /// Sandbox for custom scripts.
    pub host: ScriptHost,
    /// Performance modifiers granted by the economy.
    pub multipliers: Multipliers,
}

impl SimulationState {
    /// Assemble a simulation at tick 0 around an existing farm and
    /// stockpile, with no robots.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the calendar settings are
    /// invalid.
    pub fn new(
        config: SimulationConfig,
        grid: FarmGrid,
        stock: SharedStock,
    ) -> Result<Self, ClockError> {
        let clock = FarmClock::new(&config.time)?;
        let fleet = Fleet::new(config.fleet.max_robots);
        Ok(Self::from_parts(config, clock, grid, stock, fleet))
    }

    /// Assemble a simulation from already-built parts.
    pub fn from_parts(
        config: SimulationConfig,
        clock: FarmClock,
        grid: FarmGrid,
        stock: SharedStock,
        fleet: Fleet,
    ) -> Self {
        let rain = RainSystem::new(config.world.seed, config.time.rain);
        let host = ScriptHost::new(config.scripting);
        Self {
            clock,
            grid,
            stock,
            fleet,
            config,
            rain,
            host,
            multipliers: Multipliers::default(),
        }
    }

    /// Operator-facing status of every robot, in fleet order.
    pub fn robot_statuses(&self) -> Vec<RobotStatus> {
        self.fleet.iter().map(Robot::status).collect()
    }
}

/// Per-tick values shared by every robot update.
struct RobotTick<'a> {
    tick: u64,
    grid: &'a mut FarmGrid,
    stock: &'a mut SharedStock,
    config: &'a SimulationConfig,
    host: &'a ScriptHost,
    multipliers: Multipliers,
}

/// Execute a single tick of the simulation.
pub fn run_tick(state: &mut SimulationState) -> Result<TickSummary, TickError> {
    // --- Phase 1: Clock ---
    let new_day = state.clock.advance()?;
    let tick = state.clock.tick();
    let season = state.clock.season();
    if new_day {
        let rain_day = state.rain.is_rain_day(state.clock.day(), season);
        state.clock.set_rain_day(rain_day);
        info!(
            tick,
            day = state.clock.day(),
            season = ?season,
            rain_day,
            "New day"
        );
    }
    let rain_day = state.clock.is_rain_day();

    // --- Phase 2: Growth ---
    let settings = state.config.time.growth_settings();
    let growth = if tick.checked_rem(settings.pass_interval) == Some(0) {
        Some(growth_pass(
            &mut state.grid,
            &state.config.crops,
            settings,
            season,
            rain_day,
        ))
    } else {
        None
    };

    // --- Phase 3: Robots ---
    let mut summary = TickSummary {
        tick,
        day: state.clock.day(),
        season,
        rain_day,
        new_day,
        growth,
        harvests: Vec::new(),
        deliveries: Vec::new(),
        scavenged: 0,
        script_errors: Vec::new(),
        robots: 0,
    };
    let mut ctx = RobotTick {
        tick,
        grid: &mut state.grid,
        stock: &mut state.stock,
        config: &state.config,
        host: &state.host,
        multipliers: state.multipliers,
    };
    for robot in state.fleet.iter_mut() {
        update_robot(robot, &mut ctx, &mut summary);
    }
    summary.robots = u32::try_from(state.fleet.len()).unwrap_or(u32::MAX);

    let every = state.config.logging.summary_every_ticks;
    if every > 0 && tick.checked_rem(every) == Some(0) {
        info!(
            tick,
            day = summary.day,
            season = ?summary.season,
            robots = summary.robots,
            crops = state.grid.crop_count(),
            "Tick summary"
        );
    }

    Ok(summary)
}

/// Advance one robot by one tick.
fn update_robot(robot: &mut Robot, ctx: &mut RobotTick<'_>, summary: &mut TickSummary) {
    let battery = ctx.config.robots.battery;
    let drain_permille = ctx.multipliers.battery_drain_permille;

    // Action timer.
    if robot.pending.is_some() {
        robot.battery.drain(scale(robot.spec.drain_milli, drain_permille));
        let mut exec = ExecutionContext {
            grid: &mut *ctx.grid,
            stock: &mut *ctx.stock,
            catalog: &ctx.config.crops,
            tick: ctx.tick,
        };
        if let Some(ActionEffect::Harvested(event)) = tick_pending(robot, &mut exec) {
            debug!(
                robot = %robot.name,
                species = %event.species,
                quantity = event.quantity,
                "Crop harvested"
            );
            summary.harvests.push(event);
        }
        return;
    }

    // Charging.
    if robot.is_home() {
        let per_tick = robot
            .spec
            .charge_milli
            .checked_div(ctx.config.time.ticks_per_second)
            .unwrap_or(0);
        robot.battery.charge(per_tick);
    }
    if robot.needs_recharge
        && (robot.battery.is_full() || !robot.battery.at_or_below_pct(battery.resume_pct))
    {
        robot.needs_recharge = false;
        debug!(robot = %robot.name, battery_pct = robot.battery.pct(), "Robot recharged");
    }

    // Scavenging.
    if robot.spec.can_scavenge && robot.battery.at_or_below_pct(battery.scavenge_threshold_pct) {
        let radius = robot.search_radius(robot.spec.default_radius);
        let eaten = search::first_ready_crop(ctx.grid, robot.position, radius)
            .and_then(|pos| farming::take_ready_crop(ctx.grid, pos).map(|_| pos));
        if let Some(pos) = eaten {
            robot.battery.restore_pct(battery.scavenge_restore_pct);
            summary.scavenged = summary.scavenged.saturating_add(1);
            debug!(robot = %robot.name, x = pos.x, y = pos.y, "Crop eaten for power");
        }
    }

    // Delivery.
    if robot.is_home() {
        for (species, quantity) in robot.inventory.take_all_crops() {
            if quantity == 0 {
                continue;
            }
            ctx.stock.add_crops(&species, quantity);
            debug!(robot = %robot.name, species = %species, quantity, "Crops delivered");
            summary.deliveries.push(Delivery {
                tick: ctx.tick,
                robot_id: robot.id,
                species,
                quantity,
            });
        }
    }

    // Movement.
    if robot.movement.is_moving() {
        let advance = tick_advance(
            robot.spec.speed_milli,
            ctx.multipliers.speed_permille,
            ctx.config.time.ticks_per_second,
        );
        if let Some(pos) = robot.movement.advance(advance) {
            robot.position = pos;
            robot.battery.drain(step_drain(
                robot.spec.drain_milli,
                battery.step_drain_permille,
                drain_permille,
            ));
        }
        robot.state = RobotState::Moving;
        return;
    }

    // Dispatch.
    robot.settle_idle_state(battery.charging_label_pct);
    robot.work_timer = robot.work_timer.saturating_add(1);
    let delay = effective_work_delay(
        ctx.config.robots.work_delay,
        ctx.multipliers.work_delay_permille,
    );
    if robot.work_timer < delay {
        return;
    }
    robot.work_timer = 0;

    let mut dispatch_ctx = DispatchContext {
        grid: &mut *ctx.grid,
        stock: &mut *ctx.stock,
        host: ctx.host,
        catalog: &ctx.config.crops,
        tuning: &ctx.config.robots.actions,
        max_expansions: ctx.config.robots.max_path_expansions,
    };
    if let DispatchOutcome::ScriptFailed { error } = dispatch(robot, &mut dispatch_ctx) {
        summary.script_errors.push((robot.id, error));
    }
    if robot.pending.is_some() {
        robot.state = RobotState::Working;
    } else if robot.movement.is_moving() {
        robot.state = RobotState::Moving;
    }
}
