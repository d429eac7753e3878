//! Tile-level farm operations and the periodic crop growth pass.
//!
//! The `can_*` predicates are the request-time checks robots run before
//! committing to an action; the matching mutators re-check the same
//! conditions and return `false` instead of failing, so an action whose
//! target changed while its timer ran becomes a silent no-op.
//!
//! Growth model: each pass a wet crop accumulates one pass worth of growth
//! ticks and uses up its water, so it wants watering again before the next
//! pass. A rain day grows every crop, dry or not. Stages follow from
//! accumulated growth and never go backwards.

use roboranch_types::{Crop, Position, Season};
use tracing::debug;

use crate::grid::FarmGrid;
use crate::species::SpeciesCatalog;

// ---------------------------------------------------------------------------
// Request-time predicates
// ---------------------------------------------------------------------------

/// Whether a till action on `pos` would have an effect.
pub fn can_till(grid: &FarmGrid, pos: Position) -> bool {
    grid.get(pos).is_some_and(|t| t.kind.is_tillable())
}

/// Whether `pos` is empty tilled soil ready for a seed.
pub fn can_plant(grid: &FarmGrid, pos: Position) -> bool {
    grid.get(pos).is_some_and(roboranch_types::Tile::is_empty_soil)
}

/// Whether `pos` holds a crop that wants water.
pub fn can_water(grid: &FarmGrid, pos: Position) -> bool {
    grid.get(pos)
        .and_then(|t| t.crop.as_ref())
        .is_some_and(Crop::needs_water)
}

/// Whether `pos` holds a crop at its final stage.
pub fn can_harvest(grid: &FarmGrid, pos: Position) -> bool {
    grid.get(pos)
        .and_then(|t| t.crop.as_ref())
        .is_some_and(Crop::is_ready)
}

// ---------------------------------------------------------------------------
// Mutators
// ---------------------------------------------------------------------------

/// Turn grass or flowers at `pos` into tilled soil.
pub fn till(grid: &mut FarmGrid, pos: Position) -> bool {
    match grid.get_mut(pos) {
        Some(tile) if tile.kind.is_tillable() => {
            tile.kind = roboranch_types::TileKind::Tilled;
            true
        }
        _ => false,
    }
}

/// Plant a stage-0 crop of `species` on empty soil at `pos`.
///
/// Returns `false` if the tile is not empty tilled soil or the species is
/// unknown.
pub fn plant(grid: &mut FarmGrid, pos: Position, species: &str, catalog: &SpeciesCatalog) -> bool {
    let Some(def) = catalog.get(species) else {
        return false;
    };
    match grid.get_mut(pos) {
        Some(tile) if tile.is_empty_soil() => {
            tile.crop = Some(Crop::seedling(species.to_owned(), def.stages));
            true
        }
        _ => false,
    }
}

/// Water the crop at `pos` if it is dry.
pub fn water(grid: &mut FarmGrid, pos: Position) -> bool {
    match grid.get_mut(pos).and_then(|t| t.crop.as_mut()) {
        Some(crop) if crop.needs_water() => {
            crop.is_watered = true;
            true
        }
        _ => false,
    }
}

/// Remove and return the crop at `pos` if it is ready.
pub fn take_ready_crop(grid: &mut FarmGrid, pos: Position) -> Option<Crop> {
    let tile = grid.get_mut(pos)?;
    if tile.crop.as_ref().is_some_and(Crop::is_ready) {
        tile.crop.take()
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Growth pass
// ---------------------------------------------------------------------------

/// Parameters for the periodic growth pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthSettings {
    /// Ticks between growth passes; also the growth credited per pass.
    pub pass_interval: u64,
    /// Length of an in-game day in ticks.
    pub ticks_per_day: u64,
    /// Whether crops stop growing in winter.
    pub winter_dormancy: bool,
}

/// What one growth pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrowthReport {
    /// Crops that accumulated growth this pass.
    pub grew: u32,
    /// Crops that advanced at least one stage.
    pub advanced: u32,
    /// Crops that reached their final stage this pass.
    pub matured: u32,
    /// Wet crops that used up their water this pass.
    pub dried: u32,
}

/// Run one growth pass over every crop on the grid.
///
/// Does nothing in winter when dormancy is enabled. Crops of species
/// missing from the catalog are left untouched.
pub fn growth_pass(
    grid: &mut FarmGrid,
    catalog: &SpeciesCatalog,
    settings: GrowthSettings,
    season: Season,
    rain_day: bool,
) -> GrowthReport {
    let mut report = GrowthReport::default();
    if settings.winter_dormancy && season == Season::Winter {
        return report;
    }

    for (pos, tile) in grid.iter_mut() {
        let Some(crop) = tile.crop.as_mut() else {
            continue;
        };
        let Some(def) = catalog.get(&crop.species) else {
            continue;
        };

        if !(crop.is_watered || rain_day) {
            continue;
        }
        crop.grow_accum = crop.grow_accum.saturating_add(settings.pass_interval);
        report.grew = report.grew.saturating_add(1);

        if crop.is_watered {
            crop.is_watered = false;
            crop.water_count = crop.water_count.saturating_add(1);
            report.dried = report.dried.saturating_add(1);
        }

        let per_stage = def.ticks_per_stage(settings.ticks_per_day);
        let last_stage = crop.stages.saturating_sub(1);
        let reached = crop.grow_accum.checked_div(per_stage).unwrap_or(0);
        let new_stage = u8::try_from(reached).unwrap_or(u8::MAX).min(last_stage);
        if new_stage > crop.stage {
            crop.stage = new_stage;
            report.advanced = report.advanced.saturating_add(1);
            if crop.is_ready() {
                report.matured = report.matured.saturating_add(1);
                debug!(x = pos.x, y = pos.y, species = %crop.species, "Crop ready for harvest");
            }
        }
    }
    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use roboranch_types::TileKind;

    use super::*;

    const SETTINGS: GrowthSettings = GrowthSettings {
        pass_interval: 30,
        ticks_per_day: 120,
        winter_dormancy: true,
    };

    fn soil() -> FarmGrid {
        FarmGrid::new(3, 3, TileKind::Tilled).unwrap()
    }

    fn crop_at(grid: &FarmGrid, pos: Position) -> Crop {
        grid.get(pos).unwrap().crop.clone().unwrap()
    }

    #[test]
    fn till_only_grass_and_flowers() {
        let mut grid = FarmGrid::new(3, 1, TileKind::Grass).unwrap();
        grid.set_kind(Position::new(1, 0), TileKind::Flower).unwrap();
        grid.set_kind(Position::new(2, 0), TileKind::Rock).unwrap();
        assert!(till(&mut grid, Position::new(0, 0)));
        assert!(till(&mut grid, Position::new(1, 0)));
        assert!(!till(&mut grid, Position::new(2, 0)));
        assert!(!till(&mut grid, Position::new(0, 0)));
        assert!(!can_till(&grid, Position::new(5, 5)));
    }

    #[test]
    fn plant_needs_empty_soil_and_known_species() {
        let catalog = SpeciesCatalog::default();
        let mut grid = soil();
        let pos = Position::new(1, 1);
        assert!(!plant(&mut grid, pos, "kudzu", &catalog));
        assert!(plant(&mut grid, pos, "tomato", &catalog));
        assert!(!plant(&mut grid, pos, "wheat", &catalog));
        let crop = crop_at(&grid, pos);
        assert_eq!(crop.stage, 0);
        assert_eq!(crop.stages, 5);
    }

    #[test]
    fn water_only_dry_crops() {
        let catalog = SpeciesCatalog::default();
        let mut grid = soil();
        let pos = Position::new(0, 0);
        assert!(!water(&mut grid, pos));
        plant(&mut grid, pos, "wheat", &catalog);
        assert!(can_water(&grid, pos));
        assert!(water(&mut grid, pos));
        assert!(!can_water(&grid, pos));
        assert!(!water(&mut grid, pos));
    }

    #[test]
    fn harvest_is_idempotent() {
        let catalog = SpeciesCatalog::default();
        let mut grid = soil();
        let pos = Position::new(2, 2);
        plant(&mut grid, pos, "wheat", &catalog);
        assert!(take_ready_crop(&mut grid, pos).is_none());
        grid.get_mut(pos).unwrap().crop.as_mut().unwrap().stage = 3;
        assert!(can_harvest(&grid, pos));
        assert_eq!(take_ready_crop(&mut grid, pos).unwrap().species, "wheat");
        assert!(take_ready_crop(&mut grid, pos).is_none());
        assert_eq!(grid.get(pos).unwrap().kind, TileKind::Tilled);
    }

    #[test]
    fn dry_crops_do_not_grow() {
        let catalog = SpeciesCatalog::default();
        let mut grid = soil();
        let pos = Position::new(1, 1);
        plant(&mut grid, pos, "wheat", &catalog);
        for _ in 0..50 {
            growth_pass(&mut grid, &catalog, SETTINGS, Season::Spring, false);
        }
        assert_eq!(crop_at(&grid, pos).grow_accum, 0);
        assert_eq!(crop_at(&grid, pos).stage, 0);
    }

    #[test]
    fn stage_waits_for_threshold() {
        let catalog = SpeciesCatalog::default();
        let mut grid = soil();
        let pos = Position::new(1, 1);
        plant(&mut grid, pos, "wheat", &catalog);
        // wheat: 3 days * 120 ticks / 4 stages = 90 ticks per stage
        water(&mut grid, pos);
        growth_pass(&mut grid, &catalog, SETTINGS, Season::Spring, false);
        water(&mut grid, pos);
        growth_pass(&mut grid, &catalog, SETTINGS, Season::Spring, false);
        assert_eq!(crop_at(&grid, pos).grow_accum, 60);
        assert_eq!(crop_at(&grid, pos).stage, 0);
        growth_pass(&mut grid, &catalog, SETTINGS, Season::Spring, true);
        assert_eq!(crop_at(&grid, pos).grow_accum, 90);
        assert_eq!(crop_at(&grid, pos).stage, 1);
    }

    #[test]
    fn one_watering_feeds_one_pass() {
        let catalog = SpeciesCatalog::default();
        let mut grid = soil();
        let pos = Position::new(0, 2);
        plant(&mut grid, pos, "tomato", &catalog);
        water(&mut grid, pos);
        let first = growth_pass(&mut grid, &catalog, SETTINGS, Season::Summer, false);
        assert_eq!(first.grew, 1);
        assert_eq!(first.dried, 1);
        assert!(crop_at(&grid, pos).needs_water());
        assert_eq!(crop_at(&grid, pos).water_count, 1);

        // Not watered again: the next pass credits nothing.
        let second = growth_pass(&mut grid, &catalog, SETTINGS, Season::Summer, false);
        assert_eq!(second, GrowthReport::default());
        assert_eq!(crop_at(&grid, pos).grow_accum, 30);

        water(&mut grid, pos);
        growth_pass(&mut grid, &catalog, SETTINGS, Season::Summer, false);
        assert_eq!(crop_at(&grid, pos).grow_accum, 60);
        assert_eq!(crop_at(&grid, pos).water_count, 2);
    }

    #[test]
    fn rain_grows_dry_crops_too() {
        let catalog = SpeciesCatalog::default();
        let mut grid = soil();
        let dry = Position::new(0, 0);
        let wet = Position::new(1, 0);
        plant(&mut grid, dry, "carrot", &catalog);
        plant(&mut grid, wet, "carrot", &catalog);
        water(&mut grid, wet);
        let report = growth_pass(&mut grid, &catalog, SETTINGS, Season::Autumn, true);
        assert_eq!(report.grew, 2);
        assert_eq!(crop_at(&grid, dry).grow_accum, 30);
        assert_eq!(crop_at(&grid, wet).grow_accum, 30);
        assert_eq!(crop_at(&grid, dry).water_count, 0);
        assert_eq!(crop_at(&grid, wet).water_count, 1);
        assert!(crop_at(&grid, wet).needs_water());
    }

    #[test]
    fn winter_dormancy_freezes_growth() {
        let catalog = SpeciesCatalog::default();
        let mut grid = soil();
        let pos = Position::new(1, 1);
        plant(&mut grid, pos, "wheat", &catalog);
        water(&mut grid, pos);
        let report = growth_pass(&mut grid, &catalog, SETTINGS, Season::Winter, true);
        assert_eq!(report, GrowthReport::default());
        assert_eq!(crop_at(&grid, pos).grow_accum, 0);

        let mild = GrowthSettings {
            winter_dormancy: false,
            ..SETTINGS
        };
        growth_pass(&mut grid, &catalog, mild, Season::Winter, false);
        assert_eq!(crop_at(&grid, pos).grow_accum, 30);
    }

    #[test]
    fn stage_is_capped_and_monotone() {
        let catalog = SpeciesCatalog::default();
        let mut grid = soil();
        let pos = Position::new(2, 0);
        plant(&mut grid, pos, "wheat", &catalog);
        let mut last = 0;
        for _ in 0..40 {
            growth_pass(&mut grid, &catalog, SETTINGS, Season::Spring, true);
            let stage = crop_at(&grid, pos).stage;
            assert!(stage >= last);
            last = stage;
        }
        assert_eq!(last, 3);
        assert!(can_harvest(&grid, pos));
    }
}
