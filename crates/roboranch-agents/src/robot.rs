//! The robot agent.
//!
//! A [`Robot`] owns everything about one machine: where it is, its battery
//! and cargo, what it has been told to do, and the transient state of the
//! current walk or action. The fleet owns robots; the grid never does.
//!
//! Transient state (path, action timer, work timer, recharge flag) is not
//! persisted. A robot restored from a snapshot starts idle with its script
//! recompiled.

use roboranch_script::{CompiledScript, ScriptError, ScriptHost, ScriptMemory, ScriptRobot};
use roboranch_types::{
    BuiltinBehavior, Position, RobotId, RobotSnapshot, RobotState, RobotStatus, WorkArea,
};
use tracing::debug;

use crate::actions::PendingAction;
use crate::battery::Battery;
use crate::config::RobotSpec;
use crate::inventory::RobotInventory;
use crate::movement::Movement;
use crate::stockpile::SharedStock;

/// Species planted by a new robot.
pub const DEFAULT_ASSIGNED_CROP: &str = "wheat";

/// A single farm robot.
#[derive(Debug, Clone)]
pub struct Robot {
    /// Unique identifier.
    pub id: RobotId,
    /// Display name, e.g. `Farm-3`.
    pub name: String,
    /// Model key the stats came from.
    pub model: String,
    /// Model stats, copied at deploy time.
    pub spec: RobotSpec,
    /// Current tile.
    pub position: Position,
    /// Charging and drop-off tile.
    pub home: Position,
    /// Battery level.
    pub battery: Battery,
    /// Carried seeds and crops.
    pub inventory: RobotInventory,
    /// Built-in routine run when there is no script.
    pub behavior: BuiltinBehavior,
    /// Species built-ins plant.
    pub assigned_crop: String,
    /// Optional task search area.
    pub work_area: Option<WorkArea>,
    /// Action whose timer is running.
    pub pending: Option<PendingAction>,
    /// Path being followed.
    pub movement: Movement,
    /// Ticks idle since the last dispatch.
    pub work_timer: u32,
    /// Set when the battery ran flat; the robot only heads home until it
    /// has recharged.
    pub needs_recharge: bool,
    /// Display state, refreshed every tick.
    pub state: RobotState,
    /// Compiled custom script, if the source compiled.
    pub script: Option<CompiledScript>,
    /// Custom script source, kept even when it fails to compile.
    pub script_source: Option<String>,
    /// Last compile or runtime error from the custom script.
    pub last_error: Option<String>,
    /// Persistent script memory. Built-ins use it too.
    pub memory: ScriptMemory,
}

impl Robot {
    /// A fully charged, idle robot standing on its home tile.
    pub fn new(name: String, model: String, spec: RobotSpec, home: Position) -> Self {
        let battery = Battery::full(spec.battery_max_milli);
        Self {
            id: RobotId::new(),
            name,
            model,
            spec,
            position: home,
            home,
            battery,
            inventory: RobotInventory::new(),
            behavior: BuiltinBehavior::AutoFarm,
            assigned_crop: DEFAULT_ASSIGNED_CROP.to_owned(),
            work_area: None,
            pending: None,
            movement: Movement::default(),
            work_timer: 0,
            needs_recharge: false,
            state: RobotState::Idle,
            script: None,
            script_source: None,
            last_error: None,
            memory: ScriptMemory::new(),
        }
    }

    /// Whether the robot stands on its home tile.
    pub fn is_home(&self) -> bool {
        self.position == self.home
    }

    /// Whether the robot is free to be given new work.
    pub fn is_idle(&self) -> bool {
        self.pending.is_none() && !self.movement.is_moving()
    }

    /// Half-width of the task search square: the work area's radius if
    /// one is set, otherwise `default`.
    pub fn search_radius(&self, default: u32) -> u32 {
        self.work_area.map_or(default, |a| a.radius)
    }

    /// Centre of the task search square: the work area's centre if one is
    /// set, otherwise the robot's tile.
    pub fn search_center(&self) -> Position {
        self.work_area.map_or(self.position, |a| a.center)
    }

    /// Whether `quantity` units of `species` fit in the inventory under
    /// the model's capacity and slot limits.
    pub fn has_room_for(&self, species: &str, quantity: u32) -> bool {
        self.inventory.can_hold(
            species,
            quantity,
            self.spec.inventory_capacity,
            self.spec.inventory_slots,
        )
    }

    /// Drop the current path and pending action.
    pub fn cancel(&mut self) {
        self.movement.clear();
        self.pending = None;
        self.state = RobotState::Idle;
    }

    /// Set the idle display state from the battery level.
    pub fn settle_idle_state(&mut self, charging_label_pct: u32) {
        self.state = if self.battery.at_or_below_pct(charging_label_pct) {
            RobotState::Charging
        } else {
            RobotState::Idle
        };
    }

    /// Install a custom script.
    ///
    /// Blank source removes the script. The source is kept even if it
    /// fails to compile so the operator can fix it; the robot does no
    /// automated work until it compiles.
    pub fn set_script(&mut self, host: &ScriptHost, source: &str) -> Result<(), ScriptError> {
        if source.trim().is_empty() {
            self.clear_script();
            return Ok(());
        }
        self.cancel();
        self.script_source = Some(source.to_owned());
        match host.compile(source) {
            Ok(compiled) => {
                self.script = Some(compiled);
                self.last_error = None;
                debug!(robot = %self.name, "Custom script installed");
                Ok(())
            }
            Err(err) => {
                self.script = None;
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Remove the custom script and return to the built-in behavior.
    pub fn clear_script(&mut self) {
        self.cancel();
        self.script = None;
        self.script_source = None;
        self.last_error = None;
    }

    /// Switch built-in behavior. Cancels the current path and action.
    pub fn assign_behavior(&mut self, behavior: BuiltinBehavior) {
        self.cancel();
        self.behavior = behavior;
    }

    /// What a script is allowed to know about this robot.
    pub fn script_view(&self, stock: &SharedStock) -> ScriptRobot {
        ScriptRobot {
            id: self.id.to_string(),
            name: self.name.clone(),
            model: self.model.clone(),
            position: self.position,
            home: self.home,
            battery_milli: self.battery.level_milli(),
            battery_max_milli: self.battery.max_milli(),
            capacity: self.spec.inventory_capacity,
            slots: self.spec.inventory_slots,
            assigned_crop: self.assigned_crop.clone(),
            work_area: self.work_area,
            seeds: self.inventory.seeds().clone(),
            crops: self.inventory.crops().clone(),
            shared_seeds: stock.seeds().clone(),
        }
    }

    /// Operator-facing status.
    pub fn status(&self) -> RobotStatus {
        RobotStatus {
            id: self.id,
            name: self.name.clone(),
            model: self.model.clone(),
            state: self.state,
            position: self.position,
            home: self.home,
            battery_pct: self.battery.pct(),
            behavior: self.behavior,
            assigned_crop: self.assigned_crop.clone(),
            work_area: self.work_area,
            has_script: self.script_source.is_some(),
            last_error: self.last_error.clone(),
            pending_action: self.pending.as_ref().map(|p| p.kind),
            carried_crops: self.inventory.crop_load(),
        }
    }

    /// Durable state for persistence.
    pub fn snapshot(&self) -> RobotSnapshot {
        RobotSnapshot {
            id: self.id,
            name: self.name.clone(),
            model: self.model.clone(),
            position: self.position,
            home: self.home,
            battery_milli: self.battery.level_milli(),
            inventory: self.inventory.snapshot(),
            behavior: self.behavior,
            assigned_crop: self.assigned_crop.clone(),
            work_area: self.work_area,
            script: self.script_source.clone(),
            memory: self.memory.entries().clone(),
        }
    }

    /// Rebuild a robot from a snapshot and its model stats.
    ///
    /// The script is recompiled; a compile failure is recorded on the robot
    /// rather than failing the restore.
    pub fn from_snapshot(snapshot: RobotSnapshot, spec: RobotSpec, host: &ScriptHost) -> Self {
        let battery = Battery::at(snapshot.battery_milli, spec.battery_max_milli);
        let mut robot = Self {
            id: snapshot.id,
            name: snapshot.name,
            model: snapshot.model,
            spec,
            position: snapshot.position,
            home: snapshot.home,
            battery,
            inventory: RobotInventory::from_snapshot(snapshot.inventory),
            behavior: snapshot.behavior,
            assigned_crop: snapshot.assigned_crop,
            work_area: snapshot.work_area,
            pending: None,
            movement: Movement::default(),
            work_timer: 0,
            needs_recharge: false,
            state: RobotState::Idle,
            script: None,
            script_source: None,
            last_error: None,
            memory: ScriptMemory::from_entries(snapshot.memory),
        };
        if let Some(source) = snapshot.script {
            // The error is kept on the robot.
            let _ = robot.set_script(host, &source);
        }
        robot
    }
}
