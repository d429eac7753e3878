//! Battery level with the `0 <= level <= max` invariant.
//!
//! Every mutation clamps, so no sequence of drains, charges, or restores
//! can leave the level outside its range.

/// A robot battery in milli-points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Battery {
    level_milli: u32,
    max_milli: u32,
}

impl Battery {
    /// A fully charged battery.
    pub const fn full(max_milli: u32) -> Self {
        Self {
            level_milli: max_milli,
            max_milli,
        }
    }

    /// A battery at `level_milli`, clamped to capacity.
    pub fn at(level_milli: u32, max_milli: u32) -> Self {
        Self {
            level_milli: level_milli.min(max_milli),
            max_milli,
        }
    }

    /// Current level.
    pub const fn level_milli(&self) -> u32 {
        self.level_milli
    }

    /// Capacity.
    pub const fn max_milli(&self) -> u32 {
        self.max_milli
    }

    /// Level as a whole percentage of capacity.
    pub fn pct(&self) -> u32 {
        let pct = u64::from(self.level_milli)
            .saturating_mul(100)
            .checked_div(u64::from(self.max_milli))
            .unwrap_or(0);
        u32::try_from(pct).unwrap_or(100)
    }

    /// Whether the level is at or below `pct` percent of capacity.
    pub fn at_or_below_pct(&self, pct: u32) -> bool {
        u64::from(self.level_milli).saturating_mul(100)
            <= u64::from(self.max_milli).saturating_mul(u64::from(pct))
    }

    /// Whether the battery is empty.
    pub const fn is_empty(&self) -> bool {
        self.level_milli == 0
    }

    /// Whether the battery is full.
    pub const fn is_full(&self) -> bool {
        self.level_milli >= self.max_milli
    }

    /// Remove `amount`, stopping at zero.
    pub const fn drain(&mut self, amount_milli: u32) {
        self.level_milli = self.level_milli.saturating_sub(amount_milli);
    }

    /// Add `amount`, stopping at capacity.
    pub fn charge(&mut self, amount_milli: u32) {
        self.level_milli = self.level_milli.saturating_add(amount_milli).min(self.max_milli);
    }

    /// Add `pct` percent of capacity, stopping at capacity.
    pub fn restore_pct(&mut self, pct: u32) {
        let amount = u64::from(self.max_milli)
            .saturating_mul(u64::from(pct))
            .checked_div(100)
            .unwrap_or(0);
        self.charge(u32::try_from(amount).unwrap_or(u32::MAX));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_and_charge_clamp() {
        let mut b = Battery::full(1000);
        b.charge(500);
        assert_eq!(b.level_milli(), 1000);
        b.drain(1500);
        assert_eq!(b.level_milli(), 0);
        assert!(b.is_empty());
        b.charge(250);
        assert_eq!(b.pct(), 25);
    }

    #[test]
    fn thresholds() {
        let b = Battery::at(15_000, 100_000);
        assert!(b.at_or_below_pct(15));
        assert!(!b.at_or_below_pct(14));
        assert!(Battery::at(0, 60_000).at_or_below_pct(0));
    }

    #[test]
    fn restore_adds_share_of_capacity() {
        let mut b = Battery::at(5_000, 60_000);
        b.restore_pct(35);
        assert_eq!(b.level_milli(), 26_000);
        b.restore_pct(100);
        assert!(b.is_full());
    }

    #[test]
    fn at_clamps_to_capacity() {
        assert_eq!(Battery::at(9_999, 100).level_milli(), 100);
    }
}
