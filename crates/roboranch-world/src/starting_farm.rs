//! Default starting farm for a new game.
//!
//! A deterministic layout: a tree line around the edge, a pond, scattered
//! rocks and wildflowers outside a central clearing, and a small tilled
//! plot in the middle of the clearing. Scatter is driven by the same
//! seeded hash as the rain roll so a given seed always yields the same
//! farm.

use roboranch_types::{Position, TileKind};

use crate::error::WorldError;
use crate::grid::FarmGrid;
use crate::weather::deterministic_random;

/// Layout parameters for [`create_starting_farm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FarmLayout {
    /// Grid width in tiles.
    pub width: u32,
    /// Grid height in tiles.
    pub height: u32,
    /// Seed for scatter placement.
    pub seed: u64,
    /// Width of the central clearing.
    pub clearing_width: u32,
    /// Height of the central clearing.
    pub clearing_height: u32,
}

/// Where the important features of the starting farm ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FarmLandmarks {
    /// Centre of the clearing; the default robot home.
    pub center: Position,
    /// Top-left corner of the tilled starter plot.
    pub plot_origin: Position,
}

/// Width of the tree line along each edge.
const BORDER: i32 = 2;
/// Starter plot dimensions.
const PLOT_W: i32 = 6;
/// Starter plot height.
const PLOT_H: i32 = 4;
/// One tile in this many outside the clearing becomes a rock.
const ROCK_ODDS: u64 = 60;
/// One tile in this many outside the clearing becomes flowers.
const FLOWER_ODDS: u64 = 16;

/// Build the starting farm.
///
/// # Errors
///
/// Returns [`WorldError::InvalidDimensions`] if the layout is too small to
/// hold the border, clearing, and plot.
pub fn create_starting_farm(layout: &FarmLayout) -> Result<(FarmGrid, FarmLandmarks), WorldError> {
    let invalid = WorldError::InvalidDimensions {
        width: layout.width,
        height: layout.height,
    };
    let w = i32::try_from(layout.width).map_err(|_err| WorldError::ArithmeticOverflow)?;
    let h = i32::try_from(layout.height).map_err(|_err| WorldError::ArithmeticOverflow)?;
    let min_side = BORDER.saturating_mul(2).saturating_add(PLOT_W.max(PLOT_H)).saturating_add(2);
    if w < min_side || h < min_side {
        return Err(invalid);
    }

    let mut grid = FarmGrid::new(layout.width, layout.height, TileKind::Grass)?;
    let center = Position::new(w.checked_div(2).unwrap_or(0), h.checked_div(2).unwrap_or(0));
    let half_cw = layout.clearing_width / 2;
    let half_ch = layout.clearing_height / 2;
    let in_clearing =
        |p: Position| center.x.abs_diff(p.x) <= half_cw && center.y.abs_diff(p.y) <= half_ch;

    let mut counter: u64 = 0;
    for y in 0..h {
        for x in 0..w {
            let pos = Position::new(x, y);
            counter = counter.wrapping_add(1);
            let edge = x.min(y).min(w.saturating_sub(1).saturating_sub(x)).min(h.saturating_sub(1).saturating_sub(y));
            let kind = if edge < BORDER {
                TileKind::Tree
            } else if in_clearing(pos) {
                continue;
            } else {
                let roll = deterministic_random(layout.seed, counter);
                if roll.checked_rem(ROCK_ODDS) == Some(0) {
                    TileKind::Rock
                } else if roll.checked_rem(FLOWER_ODDS) == Some(1) {
                    TileKind::Flower
                } else {
                    continue;
                }
            };
            grid.set_kind(pos, kind)?;
        }
    }

    // Pond in the upper-left quadrant, outside the clearing.
    let pond_x = BORDER.saturating_add(2);
    let pond_y = BORDER.saturating_add(2);
    for y in pond_y..pond_y.saturating_add(4) {
        for x in pond_x..pond_x.saturating_add(6) {
            let pos = Position::new(x, y);
            if !in_clearing(pos) {
                grid.set_kind(pos, TileKind::Water)?;
            }
        }
    }

    let plot_origin = center.offset(1, 1).ok_or(WorldError::ArithmeticOverflow)?;
    for dy in 0..PLOT_H {
        for dx in 0..PLOT_W {
            let pos = plot_origin.offset(dx, dy).ok_or(WorldError::ArithmeticOverflow)?;
            grid.set_kind(pos, TileKind::Tilled)?;
        }
    }

    Ok((grid, FarmLandmarks { center, plot_origin }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pathfinding::{DEFAULT_MAX_EXPANSIONS, find_path};

    fn layout() -> FarmLayout {
        FarmLayout {
            width: 80,
            height: 60,
            seed: 42_069,
            clearing_width: 26,
            clearing_height: 20,
        }
    }

    #[test]
    fn starting_farm_is_deterministic() {
        let (a, _) = create_starting_farm(&layout()).unwrap();
        let (b, _) = create_starting_farm(&layout()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn clearing_and_plot() {
        let (grid, marks) = create_starting_farm(&layout()).unwrap();
        assert_eq!(marks.center, Position::new(40, 30));
        assert_eq!(grid.get(marks.center).unwrap().kind, TileKind::Grass);
        assert_eq!(grid.get(marks.plot_origin).unwrap().kind, TileKind::Tilled);
        let tilled = grid.iter().filter(|(_, t)| t.kind == TileKind::Tilled).count();
        assert_eq!(tilled, 24);
        assert_eq!(grid.get(Position::new(0, 0)).unwrap().kind, TileKind::Tree);
    }

    #[test]
    fn plot_is_reachable_from_home() {
        let (grid, marks) = create_starting_farm(&layout()).unwrap();
        let far_corner = marks.plot_origin.offset(PLOT_W - 1, PLOT_H - 1).unwrap();
        assert!(find_path(&grid, marks.center, far_corner, DEFAULT_MAX_EXPANSIONS).is_some());
    }

    #[test]
    fn tiny_layout_rejected() {
        let tiny = FarmLayout {
            width: 8,
            height: 8,
            ..layout()
        };
        assert!(create_starting_farm(&tiny).is_err());
    }
}
