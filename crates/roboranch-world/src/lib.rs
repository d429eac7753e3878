//! Farm grid, crops, pathfinding, and weather for the RoboRanch robot engine.
//!
//! This crate models the physical farm: a rectangular grid of tiles, the
//! crops growing on tilled soil, the routes robots take between tiles, and
//! the daily rain roll that waters everything at once.
//!
//! # Modules
//!
//! - [`error`] -- Error types for grid construction and restoration.
//! - [`species`] -- Crop species parameters and the catalog of plantable
//!   species.
//! - [`grid`] -- [`FarmGrid`], the bounds-checked tile store.
//! - [`farming`] -- Till, plant, water, and harvest primitives plus the
//!   periodic growth pass.
//! - [`pathfinding`] -- Bounded breadth-first search over walkable tiles.
//! - [`search`] -- Nearest-crop and nearest-tile queries used by behaviors
//!   and scripts.
//! - [`weather`] -- Seeded per-day rain rolls with seasonal chances.
//! - [`starting_farm`] -- Default farm layout for a new game.

pub mod error;
pub mod farming;
pub mod grid;
pub mod pathfinding;
pub mod search;
pub mod species;
pub mod starting_farm;
pub mod weather;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use farming::{GrowthReport, GrowthSettings, growth_pass};
pub use grid::FarmGrid;
pub use pathfinding::{DEFAULT_MAX_EXPANSIONS, find_path, find_path_adjacent};
pub use search::{
    CropFilter, DEFAULT_SEARCH_RADIUS, MAX_SEARCH_RADIUS, TileFilter, find_crop, find_tile,
    first_ready_crop, nearby,
};
pub use species::{CropSpecies, SpeciesCatalog};
pub use starting_farm::{FarmLandmarks, FarmLayout, create_starting_farm};
pub use weather::{RainChances, RainSystem};
