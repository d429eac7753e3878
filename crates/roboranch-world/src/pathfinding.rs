//! Breadth-first pathfinding over the 4-connected farm grid.
//!
//! Every step costs the same, so BFS already yields a shortest path. The
//! neighbour order is fixed (down, right, up, left) and the first
//! discovery of a tile wins, which makes paths deterministic for a given
//! grid.
//!
//! The search is bounded by an expansion budget. When the budget runs out
//! the search gives up and reports no path; callers treat that the same as
//! an unreachable goal and retry on a later dispatch.

use std::collections::{BTreeMap, VecDeque};

use roboranch_types::Position;

use crate::grid::FarmGrid;

/// Default number of tile expansions before a search gives up.
pub const DEFAULT_MAX_EXPANSIONS: usize = 2000;

/// Neighbour offsets in expansion order: down, right, up, left.
const NEIGHBOURS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Find a path from `start` to `goal`.
///
/// Intermediate tiles must be walkable; the goal itself is always
/// enterable so robots can path onto the tile they mean to work on. The
/// returned path excludes `start` and ends at `goal`. Starting on the goal
/// yields an empty path.
///
/// Returns `None` if either endpoint is out of bounds, the goal is
/// unreachable, or `max_expansions` tiles were expanded without reaching it.
pub fn find_path(
    grid: &FarmGrid,
    start: Position,
    goal: Position,
    max_expansions: usize,
) -> Option<Vec<Position>> {
    if !grid.in_bounds(start) || !grid.in_bounds(goal) {
        return None;
    }
    if start == goal {
        return Some(Vec::new());
    }

    let mut parent: BTreeMap<Position, Position> = BTreeMap::new();
    let mut queue: VecDeque<Position> = VecDeque::new();
    parent.insert(start, start);
    queue.push_back(start);

    let mut expansions: usize = 0;
    while let Some(current) = queue.pop_front() {
        if expansions >= max_expansions {
            return None;
        }
        expansions = expansions.saturating_add(1);

        if current == goal {
            return Some(reconstruct(&parent, start, goal));
        }

        for (dx, dy) in NEIGHBOURS {
            let Some(next) = current.offset(dx, dy) else {
                continue;
            };
            if parent.contains_key(&next) {
                continue;
            }
            if next == goal || grid.is_walkable(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }
    None
}

/// Find a path that stops as soon as the robot is within one tile
/// (including diagonals) of `target`.
///
/// Returns an empty path when already adjacent, and `None` when `target`
/// cannot be reached.
pub fn find_path_adjacent(
    grid: &FarmGrid,
    start: Position,
    target: Position,
    max_expansions: usize,
) -> Option<Vec<Position>> {
    if start.is_adjacent(target) {
        return Some(Vec::new());
    }
    let mut path = find_path(grid, start, target, max_expansions)?;
    if let Some(stop) = path.iter().position(|p| p.is_adjacent(target)) {
        path.truncate(stop.saturating_add(1));
    }
    Some(path)
}

/// Walk the parent map back from `goal` and return the forward path
/// without `start`.
fn reconstruct(parent: &BTreeMap<Position, Position>, start: Position, goal: Position) -> Vec<Position> {
    let mut path = Vec::new();
    let mut cursor = goal;
    while cursor != start {
        path.push(cursor);
        match parent.get(&cursor) {
            Some(&prev) => cursor = prev,
            None => break,
        }
    }
    path.reverse();
    path
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use roboranch_types::TileKind;

    use super::*;

    fn open(width: u32, height: u32) -> FarmGrid {
        FarmGrid::new(width, height, TileKind::Grass).unwrap()
    }

    fn is_connected(start: Position, path: &[Position]) -> bool {
        let mut prev = start;
        for &step in path {
            if prev.manhattan(step) != 1 {
                return false;
            }
            prev = step;
        }
        true
    }

    #[test]
    fn same_tile_is_empty_path() {
        let grid = open(5, 5);
        let p = Position::new(2, 2);
        assert_eq!(find_path(&grid, p, p, DEFAULT_MAX_EXPANSIONS), Some(Vec::new()));
    }

    #[test]
    fn straight_line_is_shortest() {
        let grid = open(10, 10);
        let start = Position::new(1, 1);
        let goal = Position::new(5, 1);
        let path = find_path(&grid, start, goal, DEFAULT_MAX_EXPANSIONS).unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(path.last(), Some(&goal));
        assert!(!path.contains(&start));
        assert!(is_connected(start, &path));
    }

    #[test]
    fn routes_around_walls() {
        let mut grid = open(7, 7);
        for y in 0..6 {
            grid.set_kind(Position::new(3, y), TileKind::Tree).unwrap();
        }
        let start = Position::new(1, 1);
        let goal = Position::new(5, 1);
        let path = find_path(&grid, start, goal, DEFAULT_MAX_EXPANSIONS).unwrap();
        assert!(path.contains(&Position::new(3, 6)));
        assert!(path.iter().all(|p| grid.is_walkable(*p)));
        assert!(is_connected(start, &path));
        // 5 down, 4 across, 5 up
        assert_eq!(path.len(), 14);
    }

    #[test]
    fn barrier_means_no_path() {
        let mut grid = open(7, 5);
        for y in 0..5 {
            grid.set_kind(Position::new(3, y), TileKind::Water).unwrap();
        }
        let path = find_path(&grid, Position::new(0, 0), Position::new(6, 4), DEFAULT_MAX_EXPANSIONS);
        assert!(path.is_none());
    }

    #[test]
    fn goal_may_be_blocked() {
        let mut grid = open(5, 5);
        let rock = Position::new(3, 2);
        grid.set_kind(rock, TileKind::Rock).unwrap();
        let path = find_path(&grid, Position::new(0, 2), rock, DEFAULT_MAX_EXPANSIONS).unwrap();
        assert_eq!(path.last(), Some(&rock));
    }

    #[test]
    fn out_of_bounds_goal_has_no_path() {
        let grid = open(5, 5);
        assert!(find_path(&grid, Position::new(0, 0), Position::new(9, 0), DEFAULT_MAX_EXPANSIONS).is_none());
    }

    #[test]
    fn budget_exhaustion_gives_up() {
        let grid = open(60, 60);
        let path = find_path(&grid, Position::new(0, 0), Position::new(59, 59), 50);
        assert!(path.is_none());
    }

    #[test]
    fn tie_break_is_deterministic() {
        let grid = open(5, 5);
        let a = find_path(&grid, Position::new(0, 0), Position::new(2, 2), DEFAULT_MAX_EXPANSIONS);
        let b = find_path(&grid, Position::new(0, 0), Position::new(2, 2), DEFAULT_MAX_EXPANSIONS);
        assert_eq!(a, b);
        // Down is expanded first, so the first step goes south.
        assert_eq!(a.unwrap().first(), Some(&Position::new(0, 1)));
    }

    #[test]
    fn adjacent_path_stops_next_to_target() {
        let grid = open(10, 3);
        let start = Position::new(0, 1);
        let target = Position::new(6, 1);
        let path = find_path_adjacent(&grid, start, target, DEFAULT_MAX_EXPANSIONS).unwrap();
        assert_eq!(path.last(), Some(&Position::new(5, 1)));
        assert!(!path.contains(&target));

        let next_to = Position::new(5, 2);
        assert_eq!(
            find_path_adjacent(&grid, next_to, target, DEFAULT_MAX_EXPANSIONS),
            Some(Vec::new())
        );
    }
}
