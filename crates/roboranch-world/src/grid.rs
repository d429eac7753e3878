//! The farm grid: a fixed-size, row-major array of tiles.
//!
//! The grid is the world boundary robots act against. It owns terrain and
//! crops; it never owns robots. All coordinate access is bounds-checked and
//! returns `None` outside the grid.

use roboranch_types::{Position, Tile, TileKind, WorldSnapshot};

use crate::error::WorldError;

/// A rectangular farm grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FarmGrid {
    /// Width in tiles.
    width: u32,
    /// Height in tiles.
    height: u32,
    /// Row-major tiles, `width * height` entries.
    tiles: Vec<Tile>,
}

impl FarmGrid {
    /// Create a grid filled with empty tiles of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] if either dimension is
    /// zero or the tile count does not fit in memory indexing.
    pub fn new(width: u32, height: u32, kind: TileKind) -> Result<Self, WorldError> {
        let count = tile_count(width, height)?;
        Ok(Self {
            width,
            height,
            tiles: vec![Tile::new(kind); count],
        })
    }

    /// Width in tiles.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Row-major index of `pos`, or `None` when out of bounds.
    fn index(&self, pos: Position) -> Option<usize> {
        let x = u32::try_from(pos.x).ok()?;
        let y = u32::try_from(pos.y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.width)?.checked_add(x)?;
        usize::try_from(idx).ok()
    }

    /// Whether `pos` lies inside the grid.
    pub fn in_bounds(&self, pos: Position) -> bool {
        self.index(pos).is_some()
    }

    /// The tile at `pos`.
    pub fn get(&self, pos: Position) -> Option<&Tile> {
        self.index(pos).and_then(|i| self.tiles.get(i))
    }

    /// Mutable access to the tile at `pos`.
    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        let i = self.index(pos)?;
        self.tiles.get_mut(i)
    }

    /// Whether robots may stand on `pos`. Out-of-bounds tiles are not walkable.
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.get(pos).is_some_and(Tile::is_walkable)
    }

    /// Replace the terrain at `pos`. Any crop is dropped unless the new
    /// kind is tilled soil.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `pos` is outside the grid.
    pub fn set_kind(&mut self, pos: Position, kind: TileKind) -> Result<(), WorldError> {
        let tile = self.get_mut(pos).ok_or(WorldError::OutOfBounds(pos))?;
        tile.kind = kind;
        if kind != TileKind::Tilled {
            tile.crop = None;
        }
        Ok(())
    }

    /// Iterate every tile with its position, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Tile)> {
        let width = self.width;
        self.tiles.iter().enumerate().filter_map(move |(i, tile)| {
            let pos = position_of(i, width)?;
            Some((pos, tile))
        })
    }

    /// Iterate every tile mutably with its position, row by row.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Position, &mut Tile)> {
        let width = self.width;
        self.tiles.iter_mut().enumerate().filter_map(move |(i, tile)| {
            let pos = position_of(i, width)?;
            Some((pos, tile))
        })
    }

    /// Number of tiles currently holding a crop.
    pub fn crop_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.crop.is_some()).count()
    }

    /// Capture every tile for persistence.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            width: self.width,
            height: self.height,
            tiles: self.tiles.clone(),
        }
    }

    /// Rebuild a grid from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] or
    /// [`WorldError::TileCountMismatch`] if the snapshot is malformed, or
    /// [`WorldError::CropOnUntilledTile`] if a crop sits on anything but
    /// tilled soil.
    pub fn from_snapshot(snapshot: WorldSnapshot) -> Result<Self, WorldError> {
        let expected = tile_count(snapshot.width, snapshot.height)?;
        if snapshot.tiles.len() != expected {
            return Err(WorldError::TileCountMismatch {
                expected,
                actual: snapshot.tiles.len(),
            });
        }
        let grid = Self {
            width: snapshot.width,
            height: snapshot.height,
            tiles: snapshot.tiles,
        };
        if let Some((pos, _)) = grid
            .iter()
            .find(|(_, t)| t.crop.is_some() && t.kind != TileKind::Tilled)
        {
            return Err(WorldError::CropOnUntilledTile(pos));
        }
        Ok(grid)
    }
}

/// Validate dimensions and return the tile count.
fn tile_count(width: u32, height: u32) -> Result<usize, WorldError> {
    if width == 0 || height == 0 || width > i32::MAX.unsigned_abs() || height > i32::MAX.unsigned_abs() {
        return Err(WorldError::InvalidDimensions { width, height });
    }
    let count = width
        .checked_mul(height)
        .ok_or(WorldError::InvalidDimensions { width, height })?;
    usize::try_from(count).map_err(|_err| WorldError::InvalidDimensions { width, height })
}

/// Position of the tile at row-major index `i`.
fn position_of(i: usize, width: u32) -> Option<Position> {
    let i = u32::try_from(i).ok()?;
    let x = i.checked_rem(width)?;
    let y = i.checked_div(width)?;
    Some(Position::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use roboranch_types::Crop;

    use super::*;

    #[test]
    fn bounds_are_checked() {
        let grid = FarmGrid::new(4, 3, TileKind::Grass).unwrap();
        assert!(grid.in_bounds(Position::new(0, 0)));
        assert!(grid.in_bounds(Position::new(3, 2)));
        assert!(!grid.in_bounds(Position::new(4, 0)));
        assert!(!grid.in_bounds(Position::new(0, 3)));
        assert!(!grid.in_bounds(Position::new(-1, 0)));
        assert!(grid.get(Position::new(-1, -1)).is_none());
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(matches!(
            FarmGrid::new(0, 5, TileKind::Grass),
            Err(WorldError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn walkable_follows_terrain() {
        let mut grid = FarmGrid::new(3, 3, TileKind::Grass).unwrap();
        grid.set_kind(Position::new(1, 1), TileKind::Rock).unwrap();
        assert!(!grid.is_walkable(Position::new(1, 1)));
        assert!(grid.is_walkable(Position::new(0, 1)));
        assert!(!grid.is_walkable(Position::new(9, 9)));
    }

    #[test]
    fn set_kind_drops_crop_off_soil() {
        let mut grid = FarmGrid::new(2, 2, TileKind::Tilled).unwrap();
        let pos = Position::new(1, 0);
        grid.get_mut(pos).unwrap().crop = Some(Crop::seedling("wheat".to_owned(), 4));
        grid.set_kind(pos, TileKind::Tilled).unwrap();
        assert!(grid.get(pos).unwrap().crop.is_some());
        grid.set_kind(pos, TileKind::Grass).unwrap();
        assert!(grid.get(pos).unwrap().crop.is_none());
    }

    #[test]
    fn iter_reports_positions() {
        let grid = FarmGrid::new(3, 2, TileKind::Grass).unwrap();
        let positions: Vec<Position> = grid.iter().map(|(p, _)| p).collect();
        assert_eq!(positions.len(), 6);
        assert_eq!(positions[4], Position::new(1, 1));
    }

    #[test]
    fn snapshot_restores_and_validates() {
        let mut grid = FarmGrid::new(3, 3, TileKind::Tilled).unwrap();
        grid.get_mut(Position::new(2, 2)).unwrap().crop =
            Some(Crop::seedling("carrot".to_owned(), 4));
        let restored = FarmGrid::from_snapshot(grid.snapshot()).unwrap();
        assert_eq!(restored, grid);

        let mut bad = grid.snapshot();
        bad.tiles.pop();
        assert!(matches!(
            FarmGrid::from_snapshot(bad),
            Err(WorldError::TileCountMismatch { expected: 9, actual: 8 })
        ));

        let mut misplaced = grid.snapshot();
        misplaced.tiles[8].kind = TileKind::Rock;
        assert!(matches!(
            FarmGrid::from_snapshot(misplaced),
            Err(WorldError::CropOnUntilledTile(_))
        ));
    }
}
