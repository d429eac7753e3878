//! Operator controls for a running farm.
//!
//! The tick loop and whatever steers it from outside (the engine binary,
//! a UI bridge, tests) share one [`OperatorState`] behind an `Arc`.
//!
//! - [`RunMode`] lives in a `watch` channel so a paused loop can park on
//!   it and wake on resume or stop.
//! - [`RunLimits`] holds the tick and wall-clock bounds from config.
//! - Fleet commands and multiplier changes collect in an [`OperatorInbox`]
//!   that the loop empties once per tick.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use roboranch_agents::Multipliers;
use roboranch_types::FleetCommand;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};

use crate::config::SimulationBoundsConfig;

/// Slowest pacing the operator may select.
pub const MAX_TICK_INTERVAL_MS: u64 = 10_000;

/// Errors from operator requests.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OperatorError {
    /// Requested pacing is slower than [`MAX_TICK_INTERVAL_MS`].
    #[error("tick interval {requested_ms}ms exceeds the {max_ms}ms maximum")]
    IntervalTooSlow {
        /// The rejected interval.
        requested_ms: u64,
        /// The largest accepted interval.
        max_ms: u64,
    },
}

/// Why the farm stopped ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationEndReason {
    /// `max_ticks` ticks have run.
    MaxTicksReached,
    /// `max_real_time_seconds` of wall-clock time have passed.
    MaxRealTimeReached,
    /// Someone asked the farm to stop.
    OperatorStop,
}

/// What the tick loop should be doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Ticking normally.
    Running,
    /// Parked until resumed or stopped.
    Paused,
    /// Finishing; the loop exits before its next tick. Final.
    Stopping,
}

/// Tick and wall-clock bounds for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    /// Last tick to run, if bounded.
    pub max_ticks: Option<u64>,
    /// Wall-clock budget, if bounded.
    pub max_real_time: Option<Duration>,
}

impl RunLimits {
    /// Read the limits from config, where 0 means unbounded.
    pub fn from_bounds(bounds: &SimulationBoundsConfig) -> Self {
        Self {
            max_ticks: (bounds.max_ticks > 0).then_some(bounds.max_ticks),
            max_real_time: (bounds.max_real_time_seconds > 0)
                .then_some(Duration::from_secs(bounds.max_real_time_seconds)),
        }
    }

    /// Whether `tick` is at or past the tick bound.
    pub const fn ticks_exhausted(&self, tick: u64) -> bool {
        match self.max_ticks {
            Some(max) => tick >= max,
            None => false,
        }
    }

    /// Whether `elapsed` is at or past the wall-clock bound.
    pub fn time_exhausted(&self, elapsed: Duration) -> bool {
        self.max_real_time.is_some_and(|max| elapsed >= max)
    }
}

/// Operator input waiting for the next tick.
#[derive(Debug, Default)]
pub struct OperatorInbox {
    /// Fleet commands in arrival order.
    pub commands: Vec<FleetCommand>,
    /// Latest multiplier set, replacing any earlier one.
    pub multipliers: Option<Multipliers>,
}

impl OperatorInbox {
    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.multipliers.is_none()
    }
}

/// Shared operator control state.
#[derive(Debug)]
pub struct OperatorState {
    mode: watch::Sender<RunMode>,
    tick_interval_ms: AtomicU64,
    limits: RunLimits,
    started_at: DateTime<Utc>,
    started: Instant,
    inbox: Mutex<OperatorInbox>,
    end_reason: OnceLock<SimulationEndReason>,
}

impl OperatorState {
    /// Create operator state from the bounds section of the config.
    pub fn new(bounds: &SimulationBoundsConfig) -> Self {
        let (mode, _) = watch::channel(RunMode::Running);
        Self {
            mode,
            tick_interval_ms: AtomicU64::new(bounds.tick_interval_ms),
            limits: RunLimits::from_bounds(bounds),
            started_at: Utc::now(),
            started: Instant::now(),
            inbox: Mutex::new(OperatorInbox::default()),
            end_reason: OnceLock::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Run mode
    // -----------------------------------------------------------------------

    /// Current run mode.
    pub fn mode(&self) -> RunMode {
        *self.mode.borrow()
    }

    /// Park the loop after the current tick. Ignored once stopping.
    pub fn pause(&self) {
        self.mode.send_if_modified(|mode| {
            let changed = *mode == RunMode::Running;
            if changed {
                *mode = RunMode::Paused;
            }
            changed
        });
    }

    /// Let a paused loop continue. Ignored once stopping.
    pub fn resume(&self) {
        self.mode.send_if_modified(|mode| {
            let changed = *mode == RunMode::Paused;
            if changed {
                *mode = RunMode::Running;
            }
            changed
        });
    }

    /// Ask the loop to finish before its next tick. Also releases a paused
    /// loop.
    pub fn request_stop(&self) {
        self.mode.send_replace(RunMode::Stopping);
    }

    /// Whether a stop has been requested.
    pub fn is_stopping(&self) -> bool {
        self.mode() == RunMode::Stopping
    }

    /// Return once the mode is anything other than [`RunMode::Paused`].
    pub async fn wait_while_paused(&self) {
        let mut rx = self.mode.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|mode| *mode != RunMode::Paused).await;
    }

    /// Record why the run ended. The first reason sticks.
    pub fn record_end(&self, reason: SimulationEndReason) -> SimulationEndReason {
        *self.end_reason.get_or_init(|| reason)
    }

    /// Why the run ended, once it has.
    pub fn end_reason(&self) -> Option<SimulationEndReason> {
        self.end_reason.get().copied()
    }

    // -----------------------------------------------------------------------
    // Pacing
    // -----------------------------------------------------------------------

    /// Real-time milliseconds between ticks.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change pacing; 0 runs ticks back to back. Returns the old interval.
    ///
    /// # Errors
    ///
    /// Returns [`OperatorError::IntervalTooSlow`] above
    /// [`MAX_TICK_INTERVAL_MS`]; the interval is left unchanged.
    pub fn set_tick_interval_ms(&self, ms: u64) -> Result<u64, OperatorError> {
        if ms > MAX_TICK_INTERVAL_MS {
            return Err(OperatorError::IntervalTooSlow {
                requested_ms: ms,
                max_ms: MAX_TICK_INTERVAL_MS,
            });
        }
        Ok(self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }

    // -----------------------------------------------------------------------
    // Limits
    // -----------------------------------------------------------------------

    /// Bounds for this run.
    pub const fn limits(&self) -> RunLimits {
        self.limits
    }

    /// Wall-clock time since the operator state was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether the wall-clock budget is spent.
    pub fn time_exhausted(&self) -> bool {
        self.limits.time_exhausted(self.elapsed())
    }

    /// When the run started.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    // -----------------------------------------------------------------------
    // Inbox
    // -----------------------------------------------------------------------

    /// Queue a fleet command for the start of the next tick.
    pub async fn queue_command(&self, command: FleetCommand) {
        self.inbox.lock().await.commands.push(command);
    }

    /// Hand over new multipliers for the start of the next tick.
    pub async fn set_multipliers(&self, multipliers: Multipliers) {
        self.inbox.lock().await.multipliers = Some(multipliers);
    }

    /// Empty the inbox.
    pub async fn take_inbox(&self) -> OperatorInbox {
        std::mem::take(&mut *self.inbox.lock().await)
    }

    /// Point-in-time status for display.
    pub fn status(&self, tick: u64, robots: u32) -> RunStatus {
        RunStatus {
            tick,
            mode: self.mode(),
            tick_interval_ms: self.tick_interval_ms(),
            elapsed_seconds: self.elapsed().as_secs(),
            max_ticks: self.limits.max_ticks,
            max_real_time_seconds: self.limits.max_real_time.map(|d| d.as_secs()),
            robots,
            end_reason: self.end_reason(),
            started_at: self.started_at,
        }
    }
}

/// Serializable run status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    /// Ticks run so far.
    pub tick: u64,
    /// Current run mode.
    pub mode: RunMode,
    /// Current pacing.
    pub tick_interval_ms: u64,
    /// Wall-clock seconds since start.
    pub elapsed_seconds: u64,
    /// Tick bound, if any.
    pub max_ticks: Option<u64>,
    /// Wall-clock bound in seconds, if any.
    pub max_real_time_seconds: Option<u64>,
    /// Robots currently deployed.
    pub robots: u32,
    /// Why the run ended, once it has.
    pub end_reason: Option<SimulationEndReason>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
}
