//! Chokepoint detection over passability.
//!
//! A chokepoint is a passable cell whose 3x3 neighborhood matches a doorway
//! template in any of its four distinct orientations. Door sites feed
//! `World::scatter_doors`; ambush points are the passable cells no door
//! site can see.

use std::collections::HashSet;

use bracket_geometry::prelude::Point;

use crate::fov::FovEngine;
use crate::map::{Grid, PassableView};

// Row-major 3x3 passability template: a corridor cell opening into a room.
const PATTERN: [bool; 9] = [
    false, false, true, //
    true, true, true, //
    false, false, true,
];

// Index permutations giving the template's horizontal flip and the two
// transposes; the remaining dihedral images coincide with these.
const ORIENTATIONS: [[usize; 9]; 4] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8],
    [2, 1, 0, 5, 4, 3, 8, 7, 6],
    [0, 3, 6, 1, 4, 7, 2, 5, 8],
    [2, 5, 8, 1, 4, 7, 0, 3, 6],
];

fn matches_pattern(grid: &Grid, pos: Point) -> bool {
    let mut nearby = [false; 9];
    for dy in -1..=1 {
        for dx in -1..=1 {
            nearby[((dy + 1) * 3 + dx + 1) as usize] =
                grid.passable_at(pos + Point::new(dx, dy));
        }
    }
    ORIENTATIONS
        .iter()
        .any(|orientation| orientation.iter().enumerate().all(|(i, &j)| nearby[i] == PATTERN[j]))
}

/// Interior cells matching the doorway template, in scan order.
pub fn door_sites(grid: &Grid) -> Vec<Point> {
    let mut sites = Vec::new();
    for y in 1..grid.height - 1 {
        for x in 1..grid.width - 1 {
            let pos = Point::new(x, y);
            if matches_pattern(grid, pos) {
                sites.push(pos);
            }
        }
    }
    sites
}

/// Passable cells outside every door site's field of view.
pub fn find_ambushes(grid: &Grid, fov: &FovEngine) -> HashSet<Point> {
    let radius = grid.width.max(grid.height);
    let view = PassableView(grid);

    let mut exclude = HashSet::new();
    for site in door_sites(grid) {
        exclude.extend(fov.simple_fov(&view, site, radius));
    }

    let mut ambushes = HashSet::new();
    for y in 0..grid.height {
        for x in 0..grid.width {
            let pos = Point::new(x, y);
            if grid.passable_at(pos) && !exclude.contains(&pos) {
                ambushes.insert(pos);
            }
        }
    }
    ambushes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Tile;

    /// An 8x5 map: a two-cell corridor entering an open room on the right,
    /// plus an isolated nook in the top-left corner.
    fn doorway_map() -> Grid {
        let mut grid = Grid::new(8, 5);
        for y in 0..5 {
            for x in 0..8 {
                grid.set_tile(Point::new(x, y), Tile::wall());
            }
        }
        for y in 0..5 {
            for x in 4..8 {
                grid.set_tile(Point::new(x, y), Tile::floor());
            }
        }
        grid.set_tile(Point::new(2, 2), Tile::floor());
        grid.set_tile(Point::new(3, 2), Tile::floor());
        grid.set_tile(Point::new(0, 0), Tile::floor());
        grid
    }

    #[test]
    fn corridor_mouth_is_a_door_site() {
        let grid = doorway_map();
        assert_eq!(door_sites(&grid), vec![Point::new(3, 2)]);
    }

    #[test]
    fn rotated_doorways_match_too() {
        let mut grid = Grid::new(5, 8);
        for y in 0..8 {
            for x in 0..5 {
                grid.set_tile(Point::new(x, y), Tile::wall());
            }
        }
        // Vertical corridor entering a room below.
        for y in 4..8 {
            for x in 0..5 {
                grid.set_tile(Point::new(x, y), Tile::floor());
            }
        }
        grid.set_tile(Point::new(2, 2), Tile::floor());
        grid.set_tile(Point::new(2, 3), Tile::floor());
        assert_eq!(door_sites(&grid), vec![Point::new(2, 3)]);
    }

    #[test]
    fn open_fields_have_no_door_sites() {
        let grid = Grid::new(10, 10);
        assert!(door_sites(&grid).is_empty());
    }

    #[test]
    fn hidden_nooks_are_ambush_points() {
        let grid = doorway_map();
        let fov = FovEngine::new();
        let ambushes = find_ambushes(&grid, &fov);

        assert!(ambushes.contains(&Point::new(0, 0)));
        assert!(!ambushes.contains(&Point::new(3, 2)), "the door sees itself");
        assert!(!ambushes.contains(&Point::new(2, 2)));
        assert!(!ambushes.contains(&Point::new(5, 2)), "the room mouth is watched");
        for pos in &ambushes {
            assert!(grid.passable_at(*pos));
        }
    }
}
