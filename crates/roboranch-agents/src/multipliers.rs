//! Externally supplied modifiers on robot performance.
//!
//! The economy grants these (for example as a shareholder perk); the robot
//! engine only applies them. Values are per-mille, so 1000 leaves a
//! quantity unchanged.

use serde::{Deserialize, Serialize};

/// Neutral per-mille factor.
pub const PERMILLE: u32 = 1000;

/// Per-mille modifiers applied to every robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multipliers {
    /// Scales travel speed.
    pub speed_permille: u32,
    /// Scales battery drain while working and stepping.
    pub battery_drain_permille: u32,
    /// Scales the number of ticks between dispatches.
    pub work_delay_permille: u32,
    /// Robots allowed beyond the base fleet limit.
    pub extra_robot_slots: u32,
}

impl Multipliers {
    /// No modifiers.
    pub const NEUTRAL: Self = Self {
        speed_permille: PERMILLE,
        battery_drain_permille: PERMILLE,
        work_delay_permille: PERMILLE,
        extra_robot_slots: 0,
    };

    /// The shareholder perk: 15% faster, 10% less drain, 25% shorter work
    /// delay, and one extra robot.
    pub const SHAREHOLDER: Self = Self {
        speed_permille: 1150,
        battery_drain_permille: 900,
        work_delay_permille: 750,
        extra_robot_slots: 1,
    };
}

impl Default for Multipliers {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Scale `value` by a per-mille factor, rounding down and saturating.
pub fn scale(value: u32, permille: u32) -> u32 {
    let scaled = u64::from(value)
        .saturating_mul(u64::from(permille))
        .checked_div(u64::from(PERMILLE))
        .unwrap_or(0);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}
