//! Seeds and crops carried by a robot.
//!
//! Crop storage is bounded two ways: total units by the model's capacity
//! and distinct species by its slot count. Adding crops is all-or-nothing,
//! so a harvest either fits completely or leaves the inventory untouched.
//! Seeds are not bounded.

use std::collections::BTreeMap;

use roboranch_types::InventorySnapshot;

use crate::error::AgentError;

/// A robot's carried items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotInventory {
    seeds: BTreeMap<String, u32>,
    crops: BTreeMap<String, u32>,
}

impl RobotInventory {
    /// An empty inventory.
    pub const fn new() -> Self {
        Self {
            seeds: BTreeMap::new(),
            crops: BTreeMap::new(),
        }
    }

    /// Seeds carried, by species.
    pub const fn seeds(&self) -> &BTreeMap<String, u32> {
        &self.seeds
    }

    /// Crops carried, by species.
    pub const fn crops(&self) -> &BTreeMap<String, u32> {
        &self.crops
    }

    /// Seeds of `species` carried.
    pub fn seed_count(&self, species: &str) -> u32 {
        self.seeds.get(species).copied().unwrap_or(0)
    }

    /// Total crop units carried.
    pub fn crop_load(&self) -> u32 {
        self.crops.values().fold(0_u32, |acc, v| acc.saturating_add(*v))
    }

    /// Whether `quantity` units of `species` would fit.
    pub fn can_hold(&self, species: &str, quantity: u32, capacity: u32, slots: u32) -> bool {
        self.check_room(species, quantity, capacity, slots).is_ok()
    }

    fn check_room(&self, species: &str, quantity: u32, capacity: u32, slots: u32) -> Result<(), AgentError> {
        let load = self.crop_load();
        let fits = load.checked_add(quantity).is_some_and(|total| total <= capacity);
        if !fits {
            return Err(AgentError::InventoryFull {
                species: species.to_owned(),
                attempted: quantity,
                load,
                capacity,
            });
        }
        let new_species = !self.crops.contains_key(species);
        let used = u32::try_from(self.crops.len()).unwrap_or(u32::MAX);
        if new_species && used >= slots {
            return Err(AgentError::NoFreeSlot {
                species: species.to_owned(),
                slots,
            });
        }
        Ok(())
    }

    /// Add crops, or change nothing if they do not all fit.
    pub fn add_crops(
        &mut self,
        species: &str,
        quantity: u32,
        capacity: u32,
        slots: u32,
    ) -> Result<(), AgentError> {
        if quantity == 0 {
            return Ok(());
        }
        self.check_room(species, quantity, capacity, slots)?;
        let entry = self.crops.entry(species.to_owned()).or_insert(0);
        *entry = entry.saturating_add(quantity);
        Ok(())
    }

    /// Add seeds.
    pub fn add_seeds(&mut self, species: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let entry = self.seeds.entry(species.to_owned()).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    /// Use one seed of `species`. Returns `false` if none is carried.
    pub fn take_seed(&mut self, species: &str) -> bool {
        match self.seeds.get_mut(species) {
            Some(count) if *count > 0 => {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.seeds.remove(species);
                }
                true
            }
            _ => false,
        }
    }

    /// Remove and return every carried crop.
    pub fn take_all_crops(&mut self) -> BTreeMap<String, u32> {
        std::mem::take(&mut self.crops)
    }

    /// Persistable copy.
    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            seeds: self.seeds.clone(),
            crops: self.crops.clone(),
        }
    }

    /// Rebuild from a snapshot, dropping zero counts.
    pub fn from_snapshot(snapshot: InventorySnapshot) -> Self {
        Self {
            seeds: snapshot.seeds.into_iter().filter(|(_, n)| *n > 0).collect(),
            crops: snapshot.crops.into_iter().filter(|(_, n)| *n > 0).collect(),
        }
    }
}
