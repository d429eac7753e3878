//! Bounded tile queries used by behaviors and scripts.
//!
//! All queries scan a square of half-width `max_dist` around a centre tile,
//! row by row from the top-left, and rank matches by Manhattan distance.
//! The first match found at the best distance wins.

use roboranch_types::{Crop, Position, Tile, TileKind};

use crate::grid::FarmGrid;

/// Default half-width of a search square.
pub const DEFAULT_SEARCH_RADIUS: u32 = 12;

/// Largest half-width any query will scan.
pub const MAX_SEARCH_RADIUS: u32 = 64;

/// Criteria for [`find_crop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropFilter {
    /// Only crops at their final stage.
    pub ready: bool,
    /// Only crops that want water.
    pub needs_water: bool,
    /// Only this species.
    pub species: Option<String>,
    /// Search centre; defaults to the caller's position.
    pub center: Option<Position>,
    /// Half-width of the search square.
    pub max_dist: u32,
}

impl Default for CropFilter {
    fn default() -> Self {
        Self {
            ready: false,
            needs_water: false,
            species: None,
            center: None,
            max_dist: DEFAULT_SEARCH_RADIUS,
        }
    }
}

impl CropFilter {
    /// Whether `crop` satisfies the non-spatial criteria.
    fn accepts(&self, crop: &Crop) -> bool {
        if self.ready && !crop.is_ready() {
            return false;
        }
        if self.needs_water && !crop.needs_water() {
            return false;
        }
        self.species.as_deref().is_none_or(|s| s == crop.species)
    }
}

/// Criteria for [`find_tile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFilter {
    /// Only tiles of this kind.
    pub kind: Option<TileKind>,
    /// Only tiles without a crop.
    pub empty: bool,
    /// Search centre; defaults to the caller's position.
    pub center: Option<Position>,
    /// Half-width of the search square.
    pub max_dist: u32,
}

impl Default for TileFilter {
    fn default() -> Self {
        Self {
            kind: None,
            empty: false,
            center: None,
            max_dist: DEFAULT_SEARCH_RADIUS,
        }
    }
}

impl TileFilter {
    /// Whether `tile` satisfies the non-spatial criteria.
    fn accepts(&self, tile: &Tile) -> bool {
        if self.kind.is_some_and(|k| k != tile.kind) {
            return false;
        }
        !(self.empty && tile.crop.is_some())
    }
}

/// Nearest crop matching `filter`, searching around `filter.center` or
/// `origin`.
pub fn find_crop<'g>(
    grid: &'g FarmGrid,
    origin: Position,
    filter: &CropFilter,
) -> Option<(Position, &'g Crop)> {
    let center = filter.center.unwrap_or(origin);
    nearest(grid, center, filter.max_dist, |tile| {
        tile.crop.as_ref().filter(|c| filter.accepts(c))
    })
}

/// Nearest tile matching `filter`, searching around `filter.center` or
/// `origin`.
pub fn find_tile<'g>(
    grid: &'g FarmGrid,
    origin: Position,
    filter: &TileFilter,
) -> Option<(Position, &'g Tile)> {
    let center = filter.center.unwrap_or(origin);
    nearest(grid, center, filter.max_dist, |tile| {
        filter.accepts(tile).then_some(tile)
    })
}

/// First ready crop in scan order within `radius` of `center`.
///
/// Unlike [`find_crop`] this does not rank by distance; it stops at the
/// first hit, which is what fuel scavenging wants.
pub fn first_ready_crop(grid: &FarmGrid, center: Position, radius: u32) -> Option<Position> {
    square(center, radius).find(|&pos| {
        grid.get(pos)
            .and_then(|t| t.crop.as_ref())
            .is_some_and(Crop::is_ready)
    })
}

/// Every in-bounds tile within `radius` of `center`, in scan order.
pub fn nearby(grid: &FarmGrid, center: Position, radius: u32) -> Vec<(Position, &Tile)> {
    square(center, radius)
        .filter_map(|pos| grid.get(pos).map(|t| (pos, t)))
        .collect()
}

/// Scan the square around `center` and keep the closest hit.
fn nearest<'g, T: ?Sized>(
    grid: &'g FarmGrid,
    center: Position,
    radius: u32,
    mut pick: impl FnMut(&'g Tile) -> Option<&'g T>,
) -> Option<(Position, &'g T)> {
    let mut best: Option<(u32, Position, &'g T)> = None;
    for pos in square(center, radius) {
        let Some(tile) = grid.get(pos) else {
            continue;
        };
        let Some(hit) = pick(tile) else {
            continue;
        };
        let dist = center.manhattan(pos);
        if best.as_ref().is_none_or(|(d, _, _)| dist < *d) {
            best = Some((dist, pos, hit));
        }
    }
    best.map(|(_, pos, hit)| (pos, hit))
}

/// Positions of the square of half-width `radius` around `center`, row by
/// row. Positions whose coordinates would overflow are skipped.
fn square(center: Position, radius: u32) -> impl Iterator<Item = Position> {
    let r = i32::try_from(radius.min(MAX_SEARCH_RADIUS)).unwrap_or(0);
    (r.saturating_neg()..=r).flat_map(move |dy| {
        (r.saturating_neg()..=r).filter_map(move |dx| center.offset(dx, dy))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::farming;
    use crate::species::SpeciesCatalog;

    use super::*;

    fn field() -> FarmGrid {
        let mut grid = FarmGrid::new(20, 20, TileKind::Grass).unwrap();
        let catalog = SpeciesCatalog::default();
        for x in 5..15 {
            grid.set_kind(Position::new(x, 10), TileKind::Tilled).unwrap();
        }
        farming::plant(&mut grid, Position::new(6, 10), "wheat", &catalog);
        farming::plant(&mut grid, Position::new(12, 10), "carrot", &catalog);
        grid
    }

    fn ripen(grid: &mut FarmGrid, pos: Position) {
        let crop = grid.get_mut(pos).unwrap().crop.as_mut().unwrap();
        crop.stage = crop.stages - 1;
    }

    #[test]
    fn nearest_crop_wins() {
        let grid = field();
        let (pos, crop) = find_crop(&grid, Position::new(11, 11), &CropFilter::default()).unwrap();
        assert_eq!(pos, Position::new(12, 10));
        assert_eq!(crop.species, "carrot");
    }

    #[test]
    fn filters_apply() {
        let mut grid = field();
        let origin = Position::new(11, 11);
        let ready = CropFilter {
            ready: true,
            ..CropFilter::default()
        };
        assert!(find_crop(&grid, origin, &ready).is_none());
        ripen(&mut grid, Position::new(6, 10));
        assert_eq!(find_crop(&grid, origin, &ready).unwrap().0, Position::new(6, 10));

        let wheat = CropFilter {
            species: Some("wheat".to_owned()),
            ..CropFilter::default()
        };
        assert_eq!(find_crop(&grid, origin, &wheat).unwrap().0, Position::new(6, 10));

        farming::water(&mut grid, Position::new(12, 10));
        let thirsty = CropFilter {
            needs_water: true,
            ..CropFilter::default()
        };
        assert_eq!(find_crop(&grid, origin, &thirsty).unwrap().0, Position::new(6, 10));
    }

    #[test]
    fn radius_bounds_search() {
        let grid = field();
        let filter = CropFilter {
            max_dist: 2,
            ..CropFilter::default()
        };
        assert!(find_crop(&grid, Position::new(1, 1), &filter).is_none());
        let centred = CropFilter {
            center: Some(Position::new(6, 9)),
            ..filter
        };
        assert!(find_crop(&grid, Position::new(1, 1), &centred).is_some());
    }

    #[test]
    fn ties_go_to_first_in_scan_order() {
        let grid = field();
        let filter = TileFilter {
            kind: Some(TileKind::Tilled),
            empty: true,
            ..TileFilter::default()
        };
        // (5,10) and (7,10) are both two steps from (6,11); (5,10) is
        // scanned first.
        let (pos, _) = find_tile(&grid, Position::new(6, 11), &filter).unwrap();
        assert_eq!(pos, Position::new(5, 10));
        let (pos, _) = find_tile(&grid, Position::new(8, 9), &filter).unwrap();
        assert_eq!(pos, Position::new(8, 10));
    }

    #[test]
    fn first_ready_crop_scans_in_order() {
        let mut grid = field();
        assert!(first_ready_crop(&grid, Position::new(9, 10), 5).is_none());
        ripen(&mut grid, Position::new(6, 10));
        ripen(&mut grid, Position::new(12, 10));
        assert_eq!(first_ready_crop(&grid, Position::new(9, 10), 5), Some(Position::new(6, 10)));
    }

    #[test]
    fn nearby_clips_to_grid() {
        let grid = field();
        assert_eq!(nearby(&grid, Position::new(0, 0), 1).len(), 4);
        assert_eq!(nearby(&grid, Position::new(10, 10), 1).len(), 9);
    }
}
