//! Behavior dispatch for idle robots.
//!
//! When a robot's work timer comes due, the dispatcher decides who
//! controls it for this interval:
//!
//! 1. A robot with an empty battery (or still recovering from one) does
//!    not work. Scavengers wait in place; everything else heads home.
//! 2. A compiled custom script runs in the sandbox. Its decisive request
//!    is replayed through [`RobotApi`]. A runtime error is recorded on the
//!    robot and the robot idles; a clean run clears the last error.
//! 3. A script that failed to compile means no automation at all.
//! 4. Otherwise the robot's built-in behavior runs.

use roboranch_agents::{ActionTuning, Robot, RobotApi, SharedStock};
use roboranch_script::ScriptHost;
use roboranch_world::{FarmGrid, SpeciesCatalog};
use tracing::{debug, warn};

use crate::behavior::{Task, run_builtin};

/// Everything a dispatch may read or change besides the robot.
#[derive(Debug)]
pub struct DispatchContext<'a> {
    /// The farm. Scripts borrow it for their queries.
    pub grid: &'a mut FarmGrid,
    /// The owner's shared stockpile.
    pub stock: &'a mut SharedStock,
    /// Sandbox that runs custom scripts.
    pub host: &'a ScriptHost,
    /// Species stats, for harvest yields.
    pub catalog: &'a SpeciesCatalog,
    /// Action durations and seed handling.
    pub tuning: &'a ActionTuning,
    /// Pathfinder expansion budget.
    pub max_expansions: usize,
}

/// Who controlled the robot this interval, and what came of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Battery exhausted; the robot is heading home to recharge.
    Recharging,
    /// Battery exhausted; a scavenger waits for a crop to eat.
    Stalled,
    /// The custom script ran. `applied` is whether its decisive request
    /// was carried out.
    Script {
        /// Whether the replayed request was accepted.
        applied: bool,
    },
    /// The custom script threw; the robot idles until the next interval.
    ScriptFailed {
        /// The runtime error text.
        error: String,
    },
    /// The custom script does not compile; the robot does nothing.
    ScriptBroken,
    /// The built-in behavior ran.
    Builtin(Task),
}

/// Run one dispatch for `robot`.
pub fn dispatch(robot: &mut Robot, ctx: &mut DispatchContext<'_>) -> DispatchOutcome {
    if robot.battery.is_empty() || robot.needs_recharge {
        return exhausted(robot, ctx);
    }

    if robot.script.is_some() {
        return run_script(robot, ctx);
    }
    if robot.script_source.is_some() {
        robot.cancel();
        return DispatchOutcome::ScriptBroken;
    }

    let behavior = robot.behavior;
    let mut api = RobotApi::new(
        robot,
        ctx.grid,
        ctx.stock,
        ctx.catalog,
        ctx.tuning,
        ctx.max_expansions,
    );
    DispatchOutcome::Builtin(run_builtin(&mut api, behavior))
}

/// Empty battery handling.
fn exhausted(robot: &mut Robot, ctx: &mut DispatchContext<'_>) -> DispatchOutcome {
    let mut api = RobotApi::new(
        robot,
        ctx.grid,
        ctx.stock,
        ctx.catalog,
        ctx.tuning,
        ctx.max_expansions,
    );
    if api.robot().spec.can_scavenge {
        api.idle();
        return DispatchOutcome::Stalled;
    }
    let home = api.robot().home;
    if !api.move_to(home) {
        api.idle();
    }
    if !robot.needs_recharge {
        debug!(robot = %robot.name, "Battery empty, returning home");
    }
    robot.needs_recharge = true;
    DispatchOutcome::Recharging
}

fn run_script(robot: &mut Robot, ctx: &mut DispatchContext<'_>) -> DispatchOutcome {
    let view = robot.script_view(ctx.stock);
    let Some(compiled) = robot.script.as_ref() else {
        return DispatchOutcome::ScriptBroken;
    };
    match ctx.host.run(compiled, view, &mut robot.memory, ctx.grid) {
        Ok(outcome) => {
            robot.last_error = None;
            for line in &outcome.logs {
                debug!(robot = %robot.name, message = %line, "Script log");
            }
            let command = outcome.final_command().cloned();
            let mut api = RobotApi::new(
                robot,
                ctx.grid,
                ctx.stock,
                ctx.catalog,
                ctx.tuning,
                ctx.max_expansions,
            );
            let applied = match command {
                Some(command) => api.apply_script_command(&command),
                None => {
                    api.idle();
                    true
                }
            };
            DispatchOutcome::Script { applied }
        }
        Err(err) => {
            let error = err.to_string();
            warn!(robot = %robot.name, error = %error, "Script error recorded");
            robot.last_error = Some(error.clone());
            robot.cancel();
            DispatchOutcome::ScriptFailed { error }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use roboranch_agents::RobotCatalog;
    use roboranch_types::{ActionKind, BuiltinBehavior, Position, TileKind};
    use roboranch_world::farming;

    use super::*;

    fn robot(model: &str, pos: Position) -> Robot {
        let spec = RobotCatalog::default().get(model).unwrap().clone();
        Robot::new("Bot-1".to_owned(), model.to_owned(), spec, pos)
    }

    fn run(robot: &mut Robot, grid: &mut FarmGrid, host: &ScriptHost) -> DispatchOutcome {
        let mut stock = SharedStock::default();
        let catalog = SpeciesCatalog::default();
        let tuning = ActionTuning::default();
        let mut ctx = DispatchContext {
            grid,
            stock: &mut stock,
            host,
            catalog: &catalog,
            tuning: &tuning,
            max_expansions: 2000,
        };
        dispatch(robot, &mut ctx)
    }

    #[test]
    fn script_takes_precedence_over_builtin() {
        let mut grid = FarmGrid::new(10, 10, TileKind::Grass).unwrap();
        let host = ScriptHost::default();
        let mut bot = robot("basic", Position::new(2, 2));
        bot.set_script(&host, "api.move_to(6, 2);").unwrap();
        let outcome = run(&mut bot, &mut grid, &host);
        assert_eq!(outcome, DispatchOutcome::Script { applied: true });
        assert_eq!(bot.movement.destination(), Some(Position::new(6, 2)));
        // The built-in would have started tilling instead.
        assert!(bot.pending.is_none());
    }

    #[test]
    fn runtime_error_is_recorded_and_cleared() {
        let mut grid = FarmGrid::new(10, 10, TileKind::Grass).unwrap();
        let host = ScriptHost::default();
        let mut bot = robot("basic", Position::new(2, 2));
        bot.set_script(&host, "api.mem(\"runs\", 1); throw \"boom\";").unwrap();
        let outcome = run(&mut bot, &mut grid, &host);
        assert!(matches!(outcome, DispatchOutcome::ScriptFailed { .. }));
        assert!(bot.last_error.as_deref().unwrap().contains("boom"));
        assert!(bot.is_idle());
        // Memory written before the throw survives.
        assert!(bot.memory.get("runs").is_some());

        bot.set_script(&host, "api.idle();").unwrap();
        bot.last_error = Some("stale".to_owned());
        run(&mut bot, &mut grid, &host);
        assert!(bot.last_error.is_none());
    }

    #[test]
    fn broken_script_means_no_automation() {
        let mut grid = FarmGrid::new(10, 10, TileKind::Grass).unwrap();
        let host = ScriptHost::default();
        let mut bot = robot("basic", Position::new(2, 2));
        assert!(bot.set_script(&host, "api.till(").is_err());
        let outcome = run(&mut bot, &mut grid, &host);
        assert_eq!(outcome, DispatchOutcome::ScriptBroken);
        assert!(bot.is_idle());
        assert_eq!(grid.get(Position::new(2, 2)).unwrap().kind, TileKind::Grass);
    }

    #[test]
    fn builtin_runs_without_script() {
        let mut grid = FarmGrid::new(10, 10, TileKind::Grass).unwrap();
        let host = ScriptHost::default();
        let mut bot = robot("basic", Position::new(2, 2));
        bot.behavior = BuiltinBehavior::AutoFarm;
        let outcome = run(&mut bot, &mut grid, &host);
        assert!(matches!(
            outcome,
            DispatchOutcome::Builtin(Task::Work {
                kind: ActionKind::Till,
                ..
            })
        ));
    }

    #[test]
    fn empty_battery_sends_robot_home() {
        let mut grid = FarmGrid::new(10, 10, TileKind::Grass).unwrap();
        let host = ScriptHost::default();
        let mut bot = robot("basic", Position::new(2, 2));
        bot.position = Position::new(7, 2);
        bot.battery.drain(u32::MAX);
        assert_eq!(run(&mut bot, &mut grid, &host), DispatchOutcome::Recharging);
        assert!(bot.needs_recharge);
        assert_eq!(bot.movement.destination(), Some(Position::new(2, 2)));
    }

    #[test]
    fn empty_scavenger_waits() {
        let mut grid = FarmGrid::new(10, 10, TileKind::Grass).unwrap();
        grid.set_kind(Position::new(5, 5), TileKind::Tilled).unwrap();
        assert!(farming::plant(
            &mut grid,
            Position::new(5, 5),
            "wheat",
            &SpeciesCatalog::default()
        ));
        let host = ScriptHost::default();
        let mut bot = robot("rust", Position::new(2, 2));
        bot.position = Position::new(7, 2);
        bot.battery.drain(u32::MAX);
        assert_eq!(run(&mut bot, &mut grid, &host), DispatchOutcome::Stalled);
        assert!(!bot.needs_recharge);
        assert!(bot.is_idle());
    }
}
