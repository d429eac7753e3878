//! The farm's outer loop.
//!
//! [`run_simulation`] calls [`run_tick`] until a run limit or an operator
//! stop ends it. Before every tick it honours a pause, then applies the
//! operator inbox so new multipliers and fleet commands take effect before
//! any robot moves. Between ticks it sleeps the configured interval, or
//! just yields when the interval is 0.
//!
//! [`run_tick`]: crate::tick::run_tick

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::commands::{CommandError, CommandOutcome, apply_command};
use crate::operator::{OperatorInbox, OperatorState, RunMode, SimulationEndReason};
use crate::tick::{self, SimulationState, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Hooks invoked by the runner.
///
/// The engine uses these for autosave and for reporting removed robots to
/// the economy. The farm state is single-threaded, so implementations
/// need not be `Send`.
pub trait TickCallback {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState);

    /// Called for every queued command after it is applied.
    fn on_command(&mut self, _result: &Result<CommandOutcome, CommandError>) {}
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {}
}

/// Run the farm until a limit is hit or the operator stops it.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick fails.
pub async fn run_simulation(
    state: &mut SimulationState,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let limits = operator.limits();
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        start_tick = state.clock.tick(),
        robots = state.fleet.len(),
        max_ticks = ?limits.max_ticks,
        max_real_time = ?limits.max_real_time,
        tick_interval_ms = operator.tick_interval_ms(),
        "Farm starting"
    );

    let end_reason = loop {
        if operator.mode() == RunMode::Paused {
            info!(tick = state.clock.tick(), "Farm paused");
            operator.wait_while_paused().await;
            info!(tick = state.clock.tick(), "Farm resumed");
        }
        if operator.is_stopping() {
            info!(tick = state.clock.tick(), "Stop requested");
            break SimulationEndReason::OperatorStop;
        }
        if operator.time_exhausted() {
            info!(elapsed = ?operator.elapsed(), "Wall-clock limit reached");
            break SimulationEndReason::MaxRealTimeReached;
        }

        apply_inbox(state, operator.take_inbox().await, callback);

        let summary = tick::run_tick(state)?;
        total_ticks = total_ticks.saturating_add(1);
        callback.on_tick(&summary, state);

        let done = limits.ticks_exhausted(summary.tick);
        last_summary = Some(summary);
        if done {
            info!(tick = state.clock.tick(), "Tick limit reached");
            break SimulationEndReason::MaxTicksReached;
        }

        match operator.tick_interval_ms() {
            0 => tokio::task::yield_now().await,
            ms => tokio::time::sleep(Duration::from_millis(ms)).await,
        }
    };

    Ok(SimulationResult {
        end_reason: operator.record_end(end_reason),
        final_summary: last_summary,
        total_ticks,
    })
}

/// Apply multipliers first, then commands in arrival order.
fn apply_inbox(state: &mut SimulationState, inbox: OperatorInbox, callback: &mut dyn TickCallback) {
    if let Some(multipliers) = inbox.multipliers {
        info!(
            speed_permille = multipliers.speed_permille,
            battery_drain_permille = multipliers.battery_drain_permille,
            work_delay_permille = multipliers.work_delay_permille,
            extra_robot_slots = multipliers.extra_robot_slots,
            "Multipliers updated"
        );
        state.multipliers = multipliers;
    }
    for command in inbox.commands {
        let result = apply_command(state, command);
        if let Err(ref err) = result {
            warn!(error = %err, "Fleet command rejected");
        }
        callback.on_command(&result);
    }
}

/// Log how the run ended and where the farm got to.
pub fn log_simulation_end(result: &SimulationResult) {
    match result.final_summary {
        Some(ref last) => info!(
            reason = ?result.end_reason,
            total_ticks = result.total_ticks,
            tick = last.tick,
            day = last.day,
            season = ?last.season,
            robots = last.robots,
            "Farm stopped"
        ),
        None => warn!(reason = ?result.end_reason, "Farm stopped before its first tick"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use roboranch_agents::{Multipliers, SharedStock};
    use roboranch_types::{FleetCommand, Position, TileKind};
    use roboranch_world::FarmGrid;

    use super::*;
    use crate::config::{SimulationBoundsConfig, SimulationConfig};

    fn state() -> SimulationState {
        let grid = FarmGrid::new(12, 12, TileKind::Grass).unwrap();
        SimulationState::new(SimulationConfig::default(), grid, SharedStock::default()).unwrap()
    }

    fn operator(max_ticks: u64) -> Arc<OperatorState> {
        Arc::new(OperatorState::new(&SimulationBoundsConfig {
            max_ticks,
            max_real_time_seconds: 0,
            tick_interval_ms: 0,
        }))
    }

    #[derive(Default)]
    struct Recorder {
        ticks: u64,
        commands: Vec<bool>,
    }

    impl TickCallback for Recorder {
        fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {
            self.ticks += 1;
        }

        fn on_command(&mut self, result: &Result<CommandOutcome, CommandError>) {
            self.commands.push(result.is_ok());
        }
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut state = state();
        let operator = operator(5);
        let result = run_simulation(&mut state, &operator, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(state.clock.tick(), 5);
        assert_eq!(
            operator.end_reason(),
            Some(SimulationEndReason::MaxTicksReached)
        );
    }

    #[tokio::test]
    async fn operator_stop() {
        let mut state = state();
        let operator = operator(0);
        operator.request_stop();
        let result = run_simulation(&mut state, &operator, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
    }

    #[tokio::test]
    async fn queued_commands_apply_before_the_tick() {
        let mut state = state();
        let operator = operator(3);
        let deploy = |x| FleetCommand::Deploy {
            model: "basic".to_owned(),
            home: Position::new(x, 2),
        };
        operator.queue_command(deploy(2)).await;
        operator.queue_command(deploy(40)).await;
        operator.set_multipliers(Multipliers::SHAREHOLDER).await;

        let mut recorder = Recorder::default();
        let result = run_simulation(&mut state, &operator, &mut recorder)
            .await
            .unwrap();

        assert_eq!(recorder.ticks, 3);
        assert_eq!(recorder.commands, vec![true, false]);
        assert_eq!(state.fleet.len(), 1);
        assert_eq!(state.multipliers, Multipliers::SHAREHOLDER);
        assert_eq!(result.final_summary.unwrap().robots, 1);
    }

    #[tokio::test]
    async fn stop_from_another_task() {
        let mut state = state();
        let operator = Arc::new(OperatorState::new(&SimulationBoundsConfig {
            max_ticks: 0,
            max_real_time_seconds: 0,
            tick_interval_ms: 1,
        }));
        let remote = Arc::clone(&operator);
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
            remote.request_stop();
        });
        let result = run_simulation(&mut state, &operator, &mut NoOpCallback)
            .await
            .unwrap();
        stopper.await.unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert!(result.total_ticks > 0);
    }

    #[tokio::test]
    async fn paused_loop_waits_for_resume() {
        let mut state = state();
        let operator = operator(4);
        operator.pause();
        let remote = Arc::clone(&operator);
        let resumer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert_eq!(remote.mode(), RunMode::Paused);
            remote.resume();
        });
        let result = run_simulation(&mut state, &operator, &mut NoOpCallback)
            .await
            .unwrap();
        resumer.await.unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 4);
    }
}
