//! Daily rain rolls with per-season probabilities.
//!
//! Rain is decided once per in-game day. A rain day grows every crop on
//! the farm as though it had been watered. The roll is a seeded
//! `xorshift64` over `(world_seed, day)`, so the same seed always produces
//! the same sequence of rain days.

use roboranch_types::Season;
use serde::{Deserialize, Serialize};

/// Chance of rain per season, in whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RainChances {
    /// Spring chance.
    #[serde(default = "default_spring")]
    pub spring: u32,
    /// Summer chance.
    #[serde(default = "default_summer")]
    pub summer: u32,
    /// Autumn chance.
    #[serde(default = "default_autumn")]
    pub autumn: u32,
    /// Winter chance.
    #[serde(default = "default_winter")]
    pub winter: u32,
}

impl RainChances {
    /// Chance for `season`, capped at 100.
    pub fn for_season(&self, season: Season) -> u32 {
        let pct = match season {
            Season::Spring => self.spring,
            Season::Summer => self.summer,
            Season::Autumn => self.autumn,
            Season::Winter => self.winter,
        };
        pct.min(100)
    }
}

impl Default for RainChances {
    fn default() -> Self {
        Self {
            spring: default_spring(),
            summer: default_summer(),
            autumn: default_autumn(),
            winter: default_winter(),
        }
    }
}

const fn default_spring() -> u32 {
    22
}

const fn default_summer() -> u32 {
    12
}

const fn default_autumn() -> u32 {
    20
}

const fn default_winter() -> u32 {
    8
}

/// Deterministic rain generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RainSystem {
    /// The world seed used to derive per-day randomness.
    world_seed: u64,
    /// Seasonal probabilities.
    chances: RainChances,
}

impl RainSystem {
    /// Create a rain system for a world seed.
    pub const fn new(world_seed: u64, chances: RainChances) -> Self {
        Self {
            world_seed,
            chances,
        }
    }

    /// Whether `day` is a rain day in `season`.
    pub fn is_rain_day(&self, day: u64, season: Season) -> bool {
        let pct = u64::from(self.chances.for_season(season));
        let roll = deterministic_random(self.world_seed, day)
            .checked_rem(100)
            .unwrap_or(0);
        roll < pct
    }

    /// Return the world seed.
    pub const fn world_seed(&self) -> u64 {
        self.world_seed
    }
}

/// Deterministic pseudo-random number generator using `xorshift64`.
///
/// Combines the world seed and a counter into a single state and runs one
/// round of `xorshift64`. The same inputs always produce the same output.
pub(crate) const fn deterministic_random(world_seed: u64, counter: u64) -> u64 {
    let mut state = world_seed.wrapping_add(counter.wrapping_mul(0x517c_c1b7_2722_0a95));

    // xorshift has a fixed point at zero.
    if state == 0 {
        state = 0xdead_beef_cafe_babe;
    }

    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;

    state
}
