//! Robot models and tunables for robot mechanics.
//!
//! All quantities are whole numbers in fixed-point units so robot state
//! stays exact and reproducible:
//!
//! - battery values are milli-points (1000 = one battery point),
//! - speeds are milli-tiles per second,
//! - percentages are whole percent of battery capacity.
//!
//! These structs deserialize from the `robots` section of
//! `roboranch-config.yaml`; every field has a default matching the stock
//! game.

use std::collections::BTreeMap;

use roboranch_types::ActionKind;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Robot models
// ---------------------------------------------------------------------------

/// Stats for one purchasable robot model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotSpec {
    /// Display name; the first word prefixes deployed robot names.
    pub name: String,
    /// Travel speed in milli-tiles per second.
    pub speed_milli: u32,
    /// Battery capacity in milli-points.
    pub battery_max_milli: u32,
    /// Battery used per tick of work, in milli-points.
    pub drain_milli: u32,
    /// Battery regained per second on the home tile, in milli-points.
    pub charge_milli: u32,
    /// Task search radius when no work area is set.
    pub default_radius: u32,
    /// Crop units the robot can carry.
    pub inventory_capacity: u32,
    /// Distinct crop species the robot can carry.
    pub inventory_slots: u32,
    /// Whether the robot can eat a ready crop for emergency power.
    #[serde(default)]
    pub can_scavenge: bool,
    /// Purchase price.
    #[serde(default)]
    pub cost: u32,
}

impl RobotSpec {
    /// Prefix for names of deployed robots of this model.
    pub fn name_prefix(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("Robot")
    }
}

/// Every robot model that can be deployed, keyed by model key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RobotCatalog {
    models: BTreeMap<String, RobotSpec>,
}

impl RobotCatalog {
    /// Wrap a model map.
    pub const fn new(models: BTreeMap<String, RobotSpec>) -> Self {
        Self { models }
    }

    /// Look up a model.
    pub fn get(&self, key: &str) -> Option<&RobotSpec> {
        self.models.get(key)
    }

    /// Iterate over models in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RobotSpec)> {
        self.models.iter()
    }
}

impl Default for RobotCatalog {
    fn default() -> Self {
        let mut models = BTreeMap::new();
        models.insert(
            "rust".to_owned(),
            RobotSpec {
                name: "Rust Bucket".to_owned(),
                speed_milli: 1800,
                battery_max_milli: 60_000,
                drain_milli: 40,
                charge_milli: 3000,
                default_radius: 5,
                inventory_capacity: 12,
                inventory_slots: 2,
                can_scavenge: true,
                cost: 100,
            },
        );
        models.insert(
            "basic".to_owned(),
            RobotSpec {
                name: "Farm Bot".to_owned(),
                speed_milli: 2500,
                battery_max_milli: 100_000,
                drain_milli: 50,
                charge_milli: 7000,
                default_radius: 8,
                inventory_capacity: 32,
                inventory_slots: 3,
                can_scavenge: false,
                cost: 250,
            },
        );
        models.insert(
            "pro".to_owned(),
            RobotSpec {
                name: "Pro Harvester".to_owned(),
                speed_milli: 4000,
                battery_max_milli: 150_000,
                drain_milli: 35,
                charge_milli: 12_000,
                default_radius: 14,
                inventory_capacity: 64,
                inventory_slots: 5,
                can_scavenge: false,
                cost: 600,
            },
        );
        Self { models }
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Action durations and seed handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTuning {
    /// Ticks a till action takes.
    #[serde(default = "default_till_ticks")]
    pub till_ticks: u32,
    /// Ticks a plant, water, or harvest action takes.
    #[serde(default = "default_work_ticks")]
    pub work_ticks: u32,
    /// Seeds pulled from the shared stockpile when a robot runs out.
    #[serde(default = "default_seed_pull")]
    pub seed_pull: u32,
}

impl ActionTuning {
    /// Duration of `kind` in ticks.
    pub const fn duration(&self, kind: ActionKind) -> u32 {
        match kind {
            ActionKind::Till => self.till_ticks,
            ActionKind::Plant | ActionKind::Water | ActionKind::Harvest => self.work_ticks,
        }
    }
}

impl Default for ActionTuning {
    fn default() -> Self {
        Self {
            till_ticks: default_till_ticks(),
            work_ticks: default_work_ticks(),
            seed_pull: default_seed_pull(),
        }
    }
}

const fn default_till_ticks() -> u32 {
    25
}

const fn default_work_ticks() -> u32 {
    20
}

const fn default_seed_pull() -> u32 {
    10
}

// ---------------------------------------------------------------------------
// Battery
// ---------------------------------------------------------------------------

/// Battery thresholds and drain factors shared by every model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryTuning {
    /// Share of the per-tick drain charged per tile stepped, in per-mille.
    #[serde(default = "default_step_drain_permille")]
    pub step_drain_permille: u32,
    /// Scavengers eat a crop at or below this percentage.
    #[serde(default = "default_scavenge_threshold_pct")]
    pub scavenge_threshold_pct: u32,
    /// Percentage of capacity restored by eating a crop.
    #[serde(default = "default_scavenge_restore_pct")]
    pub scavenge_restore_pct: u32,
    /// Idle robots at or below this percentage report `charging`.
    #[serde(default = "default_charging_label_pct")]
    pub charging_label_pct: u32,
    /// A robot sent home on an empty battery resumes work at this
    /// percentage.
    #[serde(default = "default_resume_pct")]
    pub resume_pct: u32,
}

impl Default for BatteryTuning {
    fn default() -> Self {
        Self {
            step_drain_permille: default_step_drain_permille(),
            scavenge_threshold_pct: default_scavenge_threshold_pct(),
            scavenge_restore_pct: default_scavenge_restore_pct(),
            charging_label_pct: default_charging_label_pct(),
            resume_pct: default_resume_pct(),
        }
    }
}

const fn default_step_drain_permille() -> u32 {
    300
}

const fn default_scavenge_threshold_pct() -> u32 {
    15
}

const fn default_scavenge_restore_pct() -> u32 {
    35
}

const fn default_charging_label_pct() -> u32 {
    10
}

const fn default_resume_pct() -> u32 {
    25
}
