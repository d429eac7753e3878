//! Farm clock and calendar for the RoboRanch simulation.
//!
//! The clock is the single source of truth for simulated time. It counts
//! ticks and derives the day, season, and time of day from that count.
//! The only other state it holds is whether today is a rain day, which is
//! rolled once per day by the scheduler.
//!
//! # Design Principles
//!
//! - All temporal derivations use checked arithmetic (no silent overflow).
//! - Day and season are computed from the tick counter, never stored.

use roboranch_types::{ClockSnapshot, Season};

use crate::config::TimeConfig;

/// The seasons in calendar order.
const SEASONS: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid time configuration (e.g. zero ticks per day).
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Farm clock tracking the simulation's temporal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FarmClock {
    /// Ticks elapsed since the farm was founded.
    tick: u64,

    /// Length of an in-game day in ticks.
    ticks_per_day: u64,

    /// Days in each season.
    days_per_season: u64,

    /// Whether the current day is a rain day.
    rain_day: bool,
}

impl FarmClock {
    /// Create a clock at tick 0 from a time configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the day or season length is
    /// zero.
    pub fn new(config: &TimeConfig) -> Result<Self, ClockError> {
        Self::from_parts(0, config.ticks_per_day, config.days_per_season, false)
    }

    /// Create a clock from explicit parameters (useful for testing and
    /// state restoration).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `ticks_per_day` or
    /// `days_per_season` is 0.
    pub fn from_parts(
        tick: u64,
        ticks_per_day: u64,
        days_per_season: u64,
        rain_day: bool,
    ) -> Result<Self, ClockError> {
        if ticks_per_day == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "ticks_per_day must be at least 1".to_owned(),
            });
        }
        if days_per_season == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "days_per_season must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            tick,
            ticks_per_day,
            days_per_season,
            rain_day,
        })
    }

    /// Restore a clock from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the configuration is invalid.
    pub fn restore(snapshot: ClockSnapshot, config: &TimeConfig) -> Result<Self, ClockError> {
        Self::from_parts(
            snapshot.tick,
            config.ticks_per_day,
            config.days_per_season,
            snapshot.rain_day,
        )
    }

    /// Advance the clock by one tick. Returns `true` if the tick starts a
    /// new day.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<bool, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick_of_day() == 0)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Return the configured day length.
    pub const fn ticks_per_day(&self) -> u64 {
        self.ticks_per_day
    }

    /// Return the configured season length in days.
    pub const fn days_per_season(&self) -> u64 {
        self.days_per_season
    }

    /// Days elapsed since tick 0.
    pub fn day(&self) -> u64 {
        self.tick.checked_div(self.ticks_per_day).unwrap_or(0)
    }

    /// Ticks elapsed since the current day began.
    pub fn tick_of_day(&self) -> u64 {
        self.tick.checked_rem(self.ticks_per_day).unwrap_or(0)
    }

    /// Day of the current season, starting at 0.
    pub fn day_of_season(&self) -> u64 {
        self.day().checked_rem(self.days_per_season).unwrap_or(0)
    }

    /// Whole years completed.
    pub fn year(&self) -> u64 {
        self.day()
            .checked_div(self.days_per_season)
            .and_then(|s| s.checked_div(4))
            .unwrap_or(0)
    }

    /// Compute the current season from the day counter.
    pub fn season(&self) -> Season {
        let index = self
            .day()
            .checked_div(self.days_per_season)
            .and_then(|s| s.checked_rem(4))
            .unwrap_or(0);
        usize::try_from(index)
            .ok()
            .and_then(|i| SEASONS.get(i).copied())
            .unwrap_or(Season::Spring)
    }

    /// Whether today is a rain day.
    pub const fn is_rain_day(&self) -> bool {
        self.rain_day
    }

    /// Set today's weather. Called by the scheduler on day rollover.
    pub const fn set_rain_day(&mut self, rain_day: bool) {
        self.rain_day = rain_day;
    }

    /// Durable state for persistence.
    pub const fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            tick: self.tick,
            rain_day: self.rain_day,
        }
    }
}
