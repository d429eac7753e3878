//! Crop species definitions and the catalog of plantable species.
//!
//! The catalog is configuration: it deserializes straight from the
//! `crops` section of `roboranch-config.yaml` and falls back to the five
//! stock species when the section is absent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Growth and economic parameters for one crop species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropSpecies {
    /// Display name.
    pub name: String,
    /// In-game days from planting to harvest when kept watered.
    pub grow_days: u32,
    /// Number of growth stages; the last one is harvestable.
    pub stages: u8,
    /// Waterings the crop wants per day.
    pub water_needed: u32,
    /// Units produced by one harvest.
    pub yield_units: u32,
    /// Shop price for one seed.
    #[serde(default)]
    pub seed_cost: u32,
    /// Market price for one harvested unit.
    #[serde(default)]
    pub sell_price: u32,
}

impl CropSpecies {
    /// Ticks of growth needed to move through one stage.
    ///
    /// Returns at least 1 so that a degenerate species still progresses.
    pub fn ticks_per_stage(&self, ticks_per_day: u64) -> u64 {
        let total = u64::from(self.grow_days).saturating_mul(ticks_per_day);
        total.checked_div(u64::from(self.stages)).unwrap_or(total).max(1)
    }
}

/// The set of species robots may plant, keyed by species name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesCatalog {
    species: BTreeMap<String, CropSpecies>,
}

impl SpeciesCatalog {
    /// Build a catalog from an explicit species map.
    pub const fn new(species: BTreeMap<String, CropSpecies>) -> Self {
        Self { species }
    }

    /// Look up a species by key.
    pub fn get(&self, key: &str) -> Option<&CropSpecies> {
        self.species.get(key)
    }

    /// Units a harvest of `key` yields; 1 for species the catalog does not
    /// know.
    pub fn harvest_yield(&self, key: &str) -> u32 {
        self.get(key).map_or(1, |s| s.yield_units)
    }

    /// Whether the catalog knows this species.
    pub fn contains(&self, key: &str) -> bool {
        self.species.contains_key(key)
    }

    /// Iterate species in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CropSpecies)> {
        self.species.iter()
    }

    /// Number of species.
    pub fn len(&self) -> usize {
        self.species.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}

impl Default for SpeciesCatalog {
    fn default() -> Self {
        let mut species = BTreeMap::new();
        for (key, name, grow_days, stages, water_needed, yield_units, seed_cost, sell_price) in [
            ("wheat", "Wheat", 3, 4, 1, 3, 4, 12),
            ("carrot", "Carrot", 4, 4, 1, 2, 8, 22),
            ("tomato", "Tomato", 6, 5, 2, 3, 14, 38),
            ("blueberry", "Blueberry", 8, 4, 1, 4, 22, 55),
            ("pumpkin", "Pumpkin", 14, 5, 2, 1, 35, 90),
        ] {
            species.insert(
                key.to_owned(),
                CropSpecies {
                    name: name.to_owned(),
                    grow_days,
                    stages,
                    water_needed,
                    yield_units,
                    seed_cost,
                    sell_price,
                },
            );
        }
        Self { species }
    }
}
