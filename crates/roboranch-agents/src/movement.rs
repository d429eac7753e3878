//! Path following with sub-tile progress.
//!
//! A robot moves toward the next step of its path by a fixed amount each
//! tick. Progress is tracked in milli-tiles; once the remaining distance
//! to the step is within one tick's advance the robot snaps onto the step
//! and the step is popped.

use std::collections::VecDeque;

use roboranch_types::Position;

use crate::multipliers::scale;

/// One whole tile in milli-tiles.
const TILE_MILLI: u32 = 1000;

/// Milli-tiles advanced per tick for a robot of speed `speed_milli`
/// (milli-tiles per second). Never less than 1 so robots always arrive.
pub fn tick_advance(speed_milli: u32, speed_permille: u32, ticks_per_second: u32) -> u32 {
    scale(speed_milli, speed_permille)
        .checked_div(ticks_per_second)
        .unwrap_or(TILE_MILLI)
        .max(1)
}

/// A robot's current path and progress along it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Movement {
    path: VecDeque<Position>,
    progress_milli: u32,
}

impl Movement {
    /// Replace the path. Progress toward the old next step is discarded.
    pub fn set_path(&mut self, path: impl IntoIterator<Item = Position>) {
        self.path = path.into_iter().collect();
        self.progress_milli = 0;
    }

    /// Drop the path.
    pub fn clear(&mut self) {
        self.path.clear();
        self.progress_milli = 0;
    }

    /// Whether there is anywhere left to go.
    pub fn is_moving(&self) -> bool {
        !self.path.is_empty()
    }

    /// Steps remaining.
    pub fn remaining(&self) -> usize {
        self.path.len()
    }

    /// Final tile of the path.
    pub fn destination(&self) -> Option<Position> {
        self.path.back().copied()
    }

    /// Progress toward the next step, in milli-tiles.
    pub const fn progress_milli(&self) -> u32 {
        self.progress_milli
    }

    /// Advance by `advance_milli`. Returns the tile arrived on, if the
    /// robot reached its next step this tick.
    pub fn advance(&mut self, advance_milli: u32) -> Option<Position> {
        let next = self.path.front().copied()?;
        let remaining = TILE_MILLI.saturating_sub(self.progress_milli);
        if remaining <= advance_milli {
            self.path.pop_front();
            self.progress_milli = 0;
            Some(next)
        } else {
            self.progress_milli = self.progress_milli.saturating_add(advance_milli);
            None
        }
    }
}

/// Drain for stepping onto a tile: `drain * step_permille`, then scaled by
/// the drain multiplier.
pub fn step_drain(drain_milli: u32, step_permille: u32, drain_multiplier: u32) -> u32 {
    scale(scale(drain_milli, step_permille), drain_multiplier)
}

/// Ticks between dispatches after applying the work-delay multiplier.
/// Never less than 1.
pub fn effective_work_delay(work_delay: u32, work_delay_permille: u32) -> u32 {
    scale(work_delay, work_delay_permille).max(1)
}
