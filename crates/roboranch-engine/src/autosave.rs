//! Tick callback that persists the farm and reports fleet changes.
//!
//! Every `autosave_every_ticks` ticks the callback captures a snapshot and
//! writes it to the save path. A failed write is logged and retried at the
//! next interval; the farm keeps running. Removed robots are logged with
//! their model so the owner's robot pool can be credited.

use std::path::PathBuf;

use roboranch_core::commands::{CommandError, CommandOutcome};
use roboranch_core::runner::TickCallback;
use roboranch_core::snapshot::{self, SnapshotError};
use roboranch_core::tick::{SimulationState, TickSummary};
use tracing::{debug, info, warn};

/// Callback that autosaves the farm on a fixed tick interval.
pub struct AutosaveCallback {
    path: PathBuf,
    every_ticks: u64,
    saves: u64,
}

impl AutosaveCallback {
    /// Save to `path` every `every_ticks` ticks (0 disables autosave).
    pub const fn new(path: PathBuf, every_ticks: u64) -> Self {
        Self {
            path,
            every_ticks,
            saves: 0,
        }
    }

    /// Number of successful saves so far.
    pub const fn saves(&self) -> u64 {
        self.saves
    }

    /// Capture and write the farm now.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] if the file cannot be written.
    pub fn save_now(&mut self, state: &SimulationState) -> Result<(), SnapshotError> {
        let snap = snapshot::capture(state);
        snapshot::save(&snap, &self.path)?;
        self.saves = self.saves.saturating_add(1);
        debug!(
            tick = snap.clock.tick,
            path = %self.path.display(),
            robots = snap.robots.len(),
            "Farm saved"
        );
        Ok(())
    }
}

impl TickCallback for AutosaveCallback {
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState) {
        if self.every_ticks == 0 || summary.tick.checked_rem(self.every_ticks) != Some(0) {
            return;
        }
        if let Err(e) = self.save_now(state) {
            warn!(tick = summary.tick, error = %e, "Autosave failed");
        }
    }

    fn on_command(&mut self, result: &Result<CommandOutcome, CommandError>) {
        match result {
            Ok(CommandOutcome::Removed { robot_id, model }) => {
                info!(robot_id = %robot_id, model = %model, "Robot returned to pool");
            }
            Ok(CommandOutcome::ScriptRejected { robot_id, error }) => {
                info!(robot_id = %robot_id, error = %error, "Script stored with compile error");
            }
            Ok(CommandOutcome::Deployed(_) | CommandOutcome::Updated(_)) | Err(_) => {}
        }
    }
}
