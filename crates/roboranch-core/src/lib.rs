//! Farm clock, tick scheduling, and run control for the RoboRanch robot
//! engine.
//!
//! Each tick advances the clock, runs the periodic growth pass, and then
//! updates every robot in fleet order: action countdowns, charging,
//! scavenging, delivery, path following, and finally behavior dispatch for
//! robots whose work timer has come due.
//!
//! # Modules
//!
//! - [`behavior`] -- Built-in behaviors and their task priority chains.
//! - [`clock`] -- [`FarmClock`](clock::FarmClock) with day, season, and
//!   year derivation.
//! - [`commands`] -- Operator fleet commands applied between ticks.
//! - [`config`] -- Loading `roboranch-config.yaml` into typed structs.
//! - [`dispatch`] -- Chooses between recharge, custom script, and built-in
//!   behavior for an idle robot.
//! - [`operator`] -- Shared pause/resume/stop and command queue state.
//! - [`runner`] -- The async tick loop with operator controls.
//! - [`snapshot`] -- Capture, restore, save, and load.
//! - [`tick`] -- One scheduler tick over the whole farm.

pub mod behavior;
pub mod clock;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod operator;
pub mod runner;
pub mod snapshot;
pub mod tick;
