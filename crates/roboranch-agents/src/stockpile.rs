//! The owner's shared seed and crop stock.
//!
//! Robots draw seeds from here when their own run out and unload carried
//! crops here at their home tile. The stock is passed explicitly to every
//! operation that touches it.

use std::collections::BTreeMap;

use roboranch_types::InventorySnapshot;

/// Seeds and crops shared by every robot and the player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedStock {
    seeds: BTreeMap<String, u32>,
    crops: BTreeMap<String, u32>,
}

impl SharedStock {
    /// A stock holding the given seeds and no crops.
    pub fn with_seeds(seeds: BTreeMap<String, u32>) -> Self {
        Self {
            seeds,
            crops: BTreeMap::new(),
        }
    }

    /// Seeds available, by species.
    pub const fn seeds(&self) -> &BTreeMap<String, u32> {
        &self.seeds
    }

    /// Crops stored, by species.
    pub const fn crops(&self) -> &BTreeMap<String, u32> {
        &self.crops
    }

    /// Seeds of `species` available.
    pub fn seed_count(&self, species: &str) -> u32 {
        self.seeds.get(species).copied().unwrap_or(0)
    }

    /// Crops of `species` stored.
    pub fn crop_count(&self, species: &str) -> u32 {
        self.crops.get(species).copied().unwrap_or(0)
    }

    /// Take up to `max` seeds of `species`. Returns how many were taken.
    pub fn take_seeds(&mut self, species: &str, max: u32) -> u32 {
        let Some(count) = self.seeds.get_mut(species) else {
            return 0;
        };
        let taken = (*count).min(max);
        *count = count.saturating_sub(taken);
        taken
    }

    /// Add seeds, e.g. from a purchase.
    pub fn add_seeds(&mut self, species: &str, quantity: u32) {
        let entry = self.seeds.entry(species.to_owned()).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    /// Add delivered crops.
    pub fn add_crops(&mut self, species: &str, quantity: u32) {
        let entry = self.crops.entry(species.to_owned()).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    /// Persistable copy.
    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            seeds: self.seeds.clone(),
            crops: self.crops.clone(),
        }
    }

    /// Rebuild from a snapshot.
    pub fn from_snapshot(snapshot: InventorySnapshot) -> Self {
        Self {
            seeds: snapshot.seeds,
            crops: snapshot.crops,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_is_bounded_by_stock() {
        let mut stock = SharedStock::default();
        stock.add_seeds("wheat", 4);
        assert_eq!(stock.take_seeds("wheat", 10), 4);
        assert_eq!(stock.take_seeds("wheat", 10), 0);
        assert_eq!(stock.take_seeds("carrot", 10), 0);
    }

    #[test]
    fn crops_accumulate() {
        let mut stock = SharedStock::default();
        stock.add_crops("wheat", 3);
        stock.add_crops("wheat", 2);
        assert_eq!(stock.crop_count("wheat"), 5);
        assert_eq!(SharedStock::from_snapshot(stock.snapshot()), stock);
    }
}
