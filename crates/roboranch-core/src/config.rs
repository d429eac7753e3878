//! Configuration loading and typed config structures for the RoboRanch
//! simulation.
//!
//! The canonical configuration lives in `roboranch-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, and provides a loader that reads and validates the file.
//! Every field has a default matching the stock game, so a partial file (or
//! no file at all) is a valid configuration.

use std::collections::BTreeMap;
use std::path::Path;

use roboranch_agents::{ActionTuning, BatteryTuning, DeployDefaults, RobotCatalog};
use roboranch_script::ScriptLimits;
use roboranch_types::BuiltinBehavior;
use roboranch_world::{
    DEFAULT_MAX_EXPANSIONS, FarmLayout, GrowthSettings, RainChances, SpeciesCatalog,
};
use serde::Deserialize;

/// Environment variable that overrides `simulation.max_ticks`.
pub const MAX_TICKS_ENV: &str = "ROBORANCH_MAX_TICKS";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside its allowed range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Which value is wrong and why.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `roboranch-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Farm dimensions and seed.
    #[serde(default)]
    pub world: WorldConfig,

    /// Tick rate, calendar, growth, and weather.
    #[serde(default)]
    pub time: TimeConfig,

    /// Robot models and mechanics.
    #[serde(default)]
    pub robots: RobotsConfig,

    /// Plantable species.
    #[serde(default)]
    pub crops: SpeciesCatalog,

    /// Sandbox limits for custom scripts.
    #[serde(default)]
    pub scripting: ScriptLimits,

    /// Fleet limits and starting stock.
    #[serde(default)]
    pub fleet: FleetConfig,

    /// Run bounds and pacing.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Save file settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `ROBORANCH_MAX_TICKS` overrides `simulation.max_ticks`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load `path` if it exists, otherwise use the defaults.
    ///
    /// # Errors
    ///
    /// Same as [`SimulationConfig::from_file`] for a file that exists.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.simulation.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.simulation.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };
        if self.time.ticks_per_second == 0 {
            return invalid("time.ticks_per_second must be at least 1");
        }
        if self.time.ticks_per_day == 0 || self.time.days_per_season == 0 {
            return invalid("time.ticks_per_day and time.days_per_season must be at least 1");
        }
        if self.time.growth_pass_interval == 0 {
            return invalid("time.growth_pass_interval must be at least 1");
        }
        if self.robots.models.get(&self.fleet.starting_model).is_none()
            && self.fleet.starting_robots > 0
        {
            return invalid("fleet.starting_model is not a configured robot model");
        }
        for (key, species) in self.crops.iter() {
            if species.stages == 0 || species.yield_units == 0 {
                return invalid(&format!(
                    "crops.{key} needs at least one growth stage and one unit of yield"
                ));
            }
        }
        if !self.crops.contains(&self.fleet.default_crop) {
            return invalid("fleet.default_crop is not a configured crop");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Farm dimensions and generation seed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable farm name.
    #[serde(default = "default_farm_name")]
    pub name: String,

    /// Seed for the starting layout and the rain roll.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Grid width in tiles.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Grid height in tiles.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Width of the cleared area around the farmhouse.
    #[serde(default = "default_clearing_width")]
    pub clearing_width: u32,

    /// Height of the cleared area around the farmhouse.
    #[serde(default = "default_clearing_height")]
    pub clearing_height: u32,
}

impl WorldConfig {
    /// Layout parameters for the starting farm.
    pub const fn layout(&self) -> FarmLayout {
        FarmLayout {
            width: self.width,
            height: self.height,
            seed: self.seed,
            clearing_width: self.clearing_width,
            clearing_height: self.clearing_height,
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_farm_name(),
            seed: default_seed(),
            width: default_width(),
            height: default_height(),
            clearing_width: default_clearing_width(),
            clearing_height: default_clearing_height(),
        }
    }
}

/// Tick rate, calendar, crop growth, and weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimeConfig {
    /// Simulated ticks per second of game time. Robot speeds and charge
    /// rates are per second and divided by this.
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: u32,

    /// Length of an in-game day in ticks.
    #[serde(default = "default_ticks_per_day")]
    pub ticks_per_day: u64,

    /// Days in each season.
    #[serde(default = "default_days_per_season")]
    pub days_per_season: u64,

    /// Ticks between crop growth passes.
    #[serde(default = "default_growth_pass_interval")]
    pub growth_pass_interval: u64,

    /// Whether crops stop growing in winter.
    #[serde(default = "default_true")]
    pub winter_dormancy: bool,

    /// Seasonal rain chances.
    #[serde(default)]
    pub rain: RainChances,
}

impl TimeConfig {
    /// Parameters for the growth pass.
    pub const fn growth_settings(&self) -> GrowthSettings {
        GrowthSettings {
            pass_interval: self.growth_pass_interval,
            ticks_per_day: self.ticks_per_day,
            winter_dormancy: self.winter_dormancy,
        }
    }
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: default_ticks_per_second(),
            ticks_per_day: default_ticks_per_day(),
            days_per_season: default_days_per_season(),
            growth_pass_interval: default_growth_pass_interval(),
            winter_dormancy: true,
            rain: RainChances::default(),
        }
    }
}

/// Robot models and mechanics.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RobotsConfig {
    /// Deployable models keyed by model key.
    #[serde(default)]
    pub models: RobotCatalog,

    /// Action durations and seed handling.
    #[serde(default)]
    pub actions: ActionTuning,

    /// Battery thresholds and drain factors.
    #[serde(default)]
    pub battery: BatteryTuning,

    /// Idle ticks between behavior dispatches.
    #[serde(default = "default_work_delay")]
    pub work_delay: u32,

    /// Pathfinder expansion budget per search.
    #[serde(default = "default_max_path_expansions")]
    pub max_path_expansions: usize,
}

impl Default for RobotsConfig {
    fn default() -> Self {
        Self {
            models: RobotCatalog::default(),
            actions: ActionTuning::default(),
            battery: BatteryTuning::default(),
            work_delay: default_work_delay(),
            max_path_expansions: default_max_path_expansions(),
        }
    }
}

/// Fleet limits, deploy defaults, and starting stock.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FleetConfig {
    /// Robots allowed before perks.
    #[serde(default = "default_max_robots")]
    pub max_robots: u32,

    /// Built-in behavior of newly deployed robots.
    #[serde(default = "default_behavior")]
    pub default_behavior: BuiltinBehavior,

    /// Species newly deployed robots plant.
    #[serde(default = "default_crop")]
    pub default_crop: String,

    /// Robots deployed on a new farm.
    #[serde(default = "default_starting_robots")]
    pub starting_robots: u32,

    /// Model of the starting robots.
    #[serde(default = "default_starting_model")]
    pub starting_model: String,

    /// Seeds in the shared stockpile on a new farm.
    #[serde(default = "default_starting_seeds")]
    pub starting_seeds: BTreeMap<String, u32>,
}

impl FleetConfig {
    /// Settings applied to each deployed robot.
    pub fn deploy_defaults(&self) -> DeployDefaults {
        DeployDefaults {
            behavior: self.default_behavior,
            assigned_crop: self.default_crop.clone(),
        }
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            max_robots: default_max_robots(),
            default_behavior: default_behavior(),
            default_crop: default_crop(),
            starting_robots: default_starting_robots(),
            starting_model: default_starting_model(),
            starting_seeds: default_starting_seeds(),
        }
    }
}

/// Simulation boundary and pacing configuration.
///
/// A value of 0 for either `max_ticks` or `max_real_time_seconds` means
/// unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Maximum number of ticks before the simulation ends (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Maximum wall-clock seconds before the simulation ends (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,

    /// Real-time milliseconds between ticks (0 = as fast as possible).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl SimulationBoundsConfig {
    /// Apply `ROBORANCH_MAX_TICKS` if it is set to a number.
    pub fn apply_env_overrides(&mut self) {
        if let Some(max) = std::env::var(MAX_TICKS_ENV)
            .ok()
            .and_then(|v| v.trim().parse().ok())
        {
            self.max_ticks = max;
        }
    }
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_ticks: 0,
            max_real_time_seconds: 0,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Save file settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Where snapshots are written and read.
    #[serde(default = "default_save_path")]
    pub save_path: String,

    /// Ticks between autosaves (0 = only at shutdown).
    #[serde(default)]
    pub autosave_every_ticks: u64,

    /// Resume from `save_path` at startup if the file exists.
    #[serde(default = "default_true")]
    pub resume: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_path: default_save_path(),
            autosave_every_ticks: 0,
            resume: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is
    /// unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Ticks between tick summary log lines (0 = never).
    #[serde(default = "default_summary_every_ticks")]
    pub summary_every_ticks: u64,

    /// Emit JSON log lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            summary_every_ticks: default_summary_every_ticks(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_farm_name() -> String {
    "RoboRanch".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_width() -> u32 {
    80
}

const fn default_height() -> u32 {
    60
}

const fn default_clearing_width() -> u32 {
    26
}

const fn default_clearing_height() -> u32 {
    20
}

const fn default_ticks_per_second() -> u32 {
    60
}

const fn default_ticks_per_day() -> u64 {
    10_800
}

const fn default_days_per_season() -> u64 {
    28
}

const fn default_growth_pass_interval() -> u64 {
    30
}

const fn default_true() -> bool {
    true
}

const fn default_work_delay() -> u32 {
    22
}

const fn default_max_path_expansions() -> usize {
    DEFAULT_MAX_EXPANSIONS
}

const fn default_max_robots() -> u32 {
    30
}

const fn default_behavior() -> BuiltinBehavior {
    BuiltinBehavior::AutoFarm
}

fn default_crop() -> String {
    "wheat".to_owned()
}

const fn default_starting_robots() -> u32 {
    1
}

fn default_starting_model() -> String {
    "basic".to_owned()
}

fn default_starting_seeds() -> BTreeMap<String, u32> {
    BTreeMap::from([("wheat".to_owned(), 10), ("carrot".to_owned(), 5)])
}

const fn default_tick_interval_ms() -> u64 {
    16
}

fn default_save_path() -> String {
    "roboranch-save.json".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_summary_every_ticks() -> u64 {
    600
}
