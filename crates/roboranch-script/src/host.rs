//! Compiling and running robot programs.
//!
//! The engine is assembled from nothing: [`Engine::new_raw`] plus the
//! pure language packages (arithmetic, logic, strings, iteration, math,
//! arrays, maps). Nothing that reaches the host is ever registered, so
//! names like `timestamp`, `sleep`, or `open` simply do not resolve.
//! `eval`, `import`, `export`, `print`, and `debug` are disabled at the
//! parser so programs using them fail to compile.
//!
//! Each run gets a fresh [`Scope`] holding exactly two constants, `robot`
//! and `api`. Globals never survive between runs; only memory written
//! through `api.mem` does.

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use rhai::packages::{
    ArithmeticPackage, BasicArrayPackage, BasicIteratorPackage, BasicMapPackage, BasicMathPackage,
    BasicStringPackage, LogicPackage, MoreStringPackage, Package,
};
use rhai::{AST, Engine, Scope};
use roboranch_world::FarmGrid;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::{ScriptApi, ScriptCommand, ScriptContext, ScriptRobot, register_api};
use crate::error::ScriptError;
use crate::memory::ScriptMemory;

/// Words removed from the language.
const DISABLED_SYMBOLS: [&str; 5] = ["eval", "import", "export", "print", "debug"];

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Resource bounds applied to every script run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLimits {
    /// Operations before a run is aborted.
    #[serde(default = "default_max_operations")]
    pub max_operations: u64,
    /// Maximum function call depth.
    #[serde(default = "default_max_call_levels")]
    pub max_call_levels: usize,
    /// Maximum expression nesting at global level.
    #[serde(default = "default_max_expr_depth")]
    pub max_expr_depth: usize,
    /// Maximum expression nesting inside functions.
    #[serde(default = "default_max_function_expr_depth")]
    pub max_function_expr_depth: usize,
    /// Longest string a script may build.
    #[serde(default = "default_max_string_size")]
    pub max_string_size: usize,
    /// Largest array a script may build.
    #[serde(default = "default_max_array_size")]
    pub max_array_size: usize,
    /// Largest object map a script may build.
    #[serde(default = "default_max_map_size")]
    pub max_map_size: usize,
    /// `api.log` lines kept per run.
    #[serde(default = "default_max_log_lines")]
    pub max_log_lines: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_operations: default_max_operations(),
            max_call_levels: default_max_call_levels(),
            max_expr_depth: default_max_expr_depth(),
            max_function_expr_depth: default_max_function_expr_depth(),
            max_string_size: default_max_string_size(),
            max_array_size: default_max_array_size(),
            max_map_size: default_max_map_size(),
            max_log_lines: default_max_log_lines(),
        }
    }
}

const fn default_max_operations() -> u64 {
    50_000
}

const fn default_max_call_levels() -> usize {
    32
}

const fn default_max_expr_depth() -> usize {
    64
}

const fn default_max_function_expr_depth() -> usize {
    32
}

const fn default_max_string_size() -> usize {
    4096
}

const fn default_max_array_size() -> usize {
    1024
}

const fn default_max_map_size() -> usize {
    256
}

const fn default_max_log_lines() -> usize {
    16
}

// ---------------------------------------------------------------------------
// Compiled scripts and outcomes
// ---------------------------------------------------------------------------

/// A parsed robot program, ready to run.
#[derive(Debug, Clone)]
pub struct CompiledScript {
    source: String,
    ast: AST,
}

impl CompiledScript {
    /// The source text this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOutcome {
    /// Requests in the order the script made them.
    pub commands: Vec<ScriptCommand>,
    /// Lines the script logged.
    pub logs: Vec<String>,
}

impl ScriptOutcome {
    /// The request that decides what the robot does: the last one made.
    pub fn final_command(&self) -> Option<&ScriptCommand> {
        self.commands.last()
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// Owns the sandboxed engine. One host serves every robot.
#[derive(Debug)]
pub struct ScriptHost {
    engine: Engine,
    limits: ScriptLimits,
}

impl ScriptHost {
    /// Build a sandboxed engine with the given limits.
    pub fn new(limits: ScriptLimits) -> Self {
        let mut engine = Engine::new_raw();
        engine.register_global_module(ArithmeticPackage::new().as_shared_module());
        engine.register_global_module(LogicPackage::new().as_shared_module());
        engine.register_global_module(BasicStringPackage::new().as_shared_module());
        engine.register_global_module(BasicIteratorPackage::new().as_shared_module());
        engine.register_global_module(BasicMathPackage::new().as_shared_module());
        engine.register_global_module(BasicArrayPackage::new().as_shared_module());
        engine.register_global_module(BasicMapPackage::new().as_shared_module());
        engine.register_global_module(MoreStringPackage::new().as_shared_module());

        for symbol in DISABLED_SYMBOLS {
            engine.disable_symbol(symbol);
        }

        engine.set_max_operations(limits.max_operations);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_function_expr_depth);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_map_size(limits.max_map_size);
        engine.set_max_modules(0);

        register_api(&mut engine);

        Self { engine, limits }
    }

    /// The limits this host enforces.
    pub const fn limits(&self) -> ScriptLimits {
        self.limits
    }

    /// Parse `source` into a runnable script.
    pub fn compile(&self, source: &str) -> Result<CompiledScript, ScriptError> {
        match self.engine.compile(source) {
            Ok(ast) => Ok(CompiledScript {
                source: source.to_owned(),
                ast,
            }),
            Err(err) => {
                let message = err.to_string();
                warn!(error = %message, "Robot script failed to compile");
                Err(ScriptError::Compile { message })
            }
        }
    }

    /// Run `script` once for `robot`.
    ///
    /// The grid and memory are lent to the script for the duration of the
    /// run and handed back before this returns, whether or not the script
    /// succeeded. Memory writes made before a runtime error are kept.
    pub fn run(
        &self,
        script: &CompiledScript,
        robot: ScriptRobot,
        memory: &mut ScriptMemory,
        grid: &mut FarmGrid,
    ) -> Result<ScriptOutcome, ScriptError> {
        let robot_view = robot.to_map();
        let name = robot.name.clone();
        let ctx = Rc::new(RefCell::new(ScriptContext {
            grid: mem::take(grid),
            robot,
            memory: mem::take(memory),
            commands: Vec::new(),
            logs: Vec::new(),
            max_log_lines: self.limits.max_log_lines,
        }));

        let result = {
            let mut scope = Scope::new();
            scope.push_constant("robot", robot_view);
            scope.push_constant("api", ScriptApi::new(Rc::clone(&ctx)));
            self.engine.run_ast_with_scope(&mut scope, &script.ast)
        };

        let ctx = Rc::unwrap_or_clone(ctx).into_inner();
        *grid = ctx.grid;
        *memory = ctx.memory;

        match result {
            Ok(()) => {
                debug!(robot = %name, commands = ctx.commands.len(), "Robot script ran");
                Ok(ScriptOutcome {
                    commands: ctx.commands,
                    logs: ctx.logs,
                })
            }
            Err(err) => {
                let message = err.to_string();
                warn!(robot = %name, error = %message, "Robot script failed");
                Err(ScriptError::Runtime { message })
            }
        }
    }
}

impl Default for ScriptHost {
    fn default() -> Self {
        Self::new(ScriptLimits::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use roboranch_types::{ActionKind, MemoryValue, Position, TileKind};
    use roboranch_world::{SpeciesCatalog, farming};

    use super::*;

    fn farm() -> FarmGrid {
        let mut grid = FarmGrid::new(16, 16, TileKind::Grass).unwrap();
        let catalog = SpeciesCatalog::default();
        for x in 4..10 {
            grid.set_kind(Position::new(x, 5), TileKind::Tilled).unwrap();
        }
        assert!(farming::plant(&mut grid, Position::new(6, 5), "wheat", &catalog));
        let crop = grid.get_mut(Position::new(6, 5)).unwrap().crop.as_mut().unwrap();
        crop.stage = crop.stages - 1;
        grid
    }

    fn robot_at(x: i32, y: i32) -> ScriptRobot {
        let mut robot = ScriptRobot {
            id: "r-1".to_owned(),
            name: "Farm-1".to_owned(),
            model: "basic".to_owned(),
            position: Position::new(x, y),
            home: Position::new(1, 1),
            battery_milli: 100_000,
            battery_max_milli: 100_000,
            capacity: 32,
            slots: 3,
            assigned_crop: "wheat".to_owned(),
            ..ScriptRobot::default()
        };
        robot.shared_seeds.insert("wheat".to_owned(), 3);
        robot
    }

    fn run(source: &str, robot: ScriptRobot) -> (Result<ScriptOutcome, ScriptError>, ScriptMemory, FarmGrid) {
        let host = ScriptHost::default();
        let mut grid = farm();
        let mut memory = ScriptMemory::new();
        let result = host
            .compile(source)
            .and_then(|script| host.run(&script, robot, &mut memory, &mut grid));
        (result, memory, grid)
    }

    #[test]
    fn finds_and_harvests_ready_crop() {
        let source = r"
            let c = api.find_crop(#{ ready: true });
            if c != () {
                api.move_to(c.x, c.y);
                api.harvest(c.x, c.y);
            }
        ";
        let (result, _, grid) = run(source, robot_at(2, 5));
        let outcome = result.unwrap();
        assert_eq!(
            outcome.final_command(),
            Some(&ScriptCommand::Act {
                kind: ActionKind::Harvest,
                target: Position::new(6, 5),
                species: None,
            })
        );
        // The grid comes back untouched.
        assert!(grid.get(Position::new(6, 5)).unwrap().crop.is_some());
    }

    #[test]
    fn adjacent_action_reports_success() {
        let source = r#"
            if !api.harvest(6, 5) { throw "expected to start harvest"; }
            if !api.water(6, 5) { throw "expected to water"; }
            if api.till(4, 5) { throw "tilled soil cannot be tilled"; }
            if !api.plant(5, 5, "wheat") { throw "expected to plant"; }
            if api.plant(5, 5, "pumpkin") { throw "no pumpkin seeds"; }
        "#;
        let (result, _, _) = run(source, robot_at(5, 4));
        let outcome = result.unwrap();
        assert_eq!(outcome.commands.len(), 3);
    }

    #[test]
    fn memory_persists_and_is_visible_immediately() {
        let source = r#"
            api.mem("home_x", robot.x);
            if api.mem("home_x") != robot.x { throw "write not visible"; }
            api.mem("trail", [1, 2, #{ k: "v" }]);
        "#;
        let (result, memory, _) = run(source, robot_at(3, 3));
        result.unwrap();
        assert_eq!(memory.get("home_x"), Some(&MemoryValue::Int(3)));
        assert!(matches!(memory.get("trail"), Some(MemoryValue::List(items)) if items.len() == 3));
    }

    #[test]
    fn memory_survives_a_later_throw() {
        let (result, memory, _) = run(r#"api.mem("seen", true); throw "boom";"#, robot_at(3, 3));
        assert!(matches!(result, Err(ScriptError::Runtime { .. })));
        assert_eq!(memory.get("seen"), Some(&MemoryValue::Bool(true)));
    }

    #[test]
    fn queries_return_plain_data() {
        let source = r#"
            let p = api.pos();
            if p.x != 3 || p.y != 4 { throw "bad pos"; }
            if api.distance_to(6, 5) != 4 { throw "bad distance"; }
            let t = api.find_tile(#{ kind: "tilled", empty: true, cx: 9, cy: 5, max_dist: 1 });
            if t.x != 9 { throw "bad tile"; }
            let inv = api.inventory();
            if inv.capacity != 32 || inv.load != 0 { throw "bad inventory"; }
            if api.nearby(1).len() != 9 { throw "bad nearby"; }
            api.log("all good");
        "#;
        let (result, _, _) = run(source, robot_at(3, 4));
        let outcome = result.unwrap();
        assert_eq!(outcome.logs, vec!["all good".to_owned()]);
    }

    #[test]
    fn robot_binding_is_read_only() {
        let (result, _, _) = run("robot.x = 99;", robot_at(3, 4));
        assert!(result.is_err());
        let (result, _, _) = run("api = 1;", robot_at(3, 4));
        assert!(result.is_err());
    }

    #[test]
    fn blocked_capabilities_are_absent() {
        let probes = [
            "eval(\"1\")",
            "import \"fs\" as fs;",
            "print(\"x\")",
            "debug(\"x\")",
            "timestamp()",
            "sleep(1)",
            "open(\"/etc/passwd\")",
            "fetch(\"http://example.com\")",
            "let w = window;",
            "let d = document;",
            "let g = globalThis;",
            "let p = process;",
            "let e = env;",
            "let f = Fn(\"open\"); f.call(\"x\")",
        ];
        for probe in probes {
            let (result, _, _) = run(probe, robot_at(3, 4));
            assert!(result.is_err(), "`{probe}` should not run");
        }
    }

    #[test]
    fn runaway_loop_is_stopped() {
        let (result, _, grid) = run("loop { }", robot_at(3, 4));
        assert!(matches!(result, Err(ScriptError::Runtime { .. })));
        assert_eq!(grid.width(), 16);
    }

    #[test]
    fn syntax_error_is_compile_error() {
        let host = ScriptHost::default();
        let err = host.compile("let x = ;").unwrap_err();
        assert!(err.is_compile());
        assert!(err.to_string().starts_with("compile error"));
    }

    #[test]
    fn globals_do_not_survive_between_runs() {
        let host = ScriptHost::default();
        let script = host
            .compile("if counter == () { } let counter = 1;")
            .unwrap();
        let mut grid = farm();
        let mut memory = ScriptMemory::new();
        // `counter` is never defined before the `let`, so every run fails
        // the same way instead of seeing a value left by a previous run.
        for _ in 0..2 {
            let result = host.run(&script, robot_at(3, 4), &mut memory, &mut grid);
            assert!(result.is_err());
        }
    }

    #[test]
    fn limits_parse_from_yaml_with_defaults() {
        let limits: ScriptLimits = serde_yml::from_str("max_operations: 1000\n").unwrap();
        assert_eq!(limits.max_operations, 1000);
        assert_eq!(limits.max_call_levels, 32);
    }
}
