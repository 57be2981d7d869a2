use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;

use crate::error::{EngineError, Result};
use crate::fov::SightMap;
use crate::rng;

pub const DEFAULT_MAP_WIDTH: i32 = 80;
pub const DEFAULT_MAP_HEIGHT: i32 = 48;

/// One cell's worth of terrain state.
///
/// Rendering details (colors, sprites) live with the presentation layer;
/// the core only tracks identity and the two movement/sight flags.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    pub glyph: u16,
    pub blocks_move: bool,
    pub blocks_sight: bool,
    pub tag: u32,
}

impl Default for Tile {
    fn default() -> Self {
        Tile::floor()
    }
}

impl Tile {
    pub fn wall() -> Self {
        Self {
            glyph: b'#' as u16,
            blocks_move: true,
            blocks_sight: true,
            tag: 0,
        }
    }

    pub fn floor() -> Self {
        Self {
            glyph: b'.' as u16,
            blocks_move: false,
            blocks_sight: false,
            tag: 1,
        }
    }

    pub fn door_closed() -> Self {
        Self {
            glyph: b'+' as u16,
            blocks_move: true,
            blocks_sight: true,
            tag: 2,
        }
    }

    pub fn door_open() -> Self {
        Self {
            glyph: b'`' as u16,
            blocks_move: false,
            blocks_sight: false,
            tag: 3,
        }
    }

    pub fn water() -> Self {
        Self {
            glyph: b'~' as u16,
            blocks_move: true,
            blocks_sight: false,
            tag: 4,
        }
    }
}

/// A 2D map of tiles. Dimensions are fixed for the grid's lifetime.
#[derive(Clone, Debug)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// A new grid, fully passable and translucent, floored throughout.
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0);
        let size = (width * height) as usize;
        Self {
            width,
            height,
            tiles: vec![Tile::floor(); size],
        }
    }

    fn idx(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(Point::new(x, y)) {
            Some((y * self.width + x) as usize)
        } else {
            None
        }
    }

    pub fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0 && point.x < self.width && point.y >= 0 && point.y < self.height
    }

    pub fn set_tile(&mut self, point: Point, tile: Tile) {
        if let Some(idx) = self.idx(point.x, point.y) {
            self.tiles[idx] = tile;
        }
    }

    pub fn tile_at(&self, point: Point) -> Option<&Tile> {
        self.idx(point.x, point.y).map(|idx| &self.tiles[idx])
    }

    pub fn passable_at(&self, point: Point) -> bool {
        self.tile_at(point).map_or(false, |tile| !tile.blocks_move)
    }

    pub fn translucent_at(&self, point: Point) -> bool {
        self.tile_at(point).map_or(false, |tile| !tile.blocks_sight)
    }

    /// A random coordinate satisfying `select`.
    ///
    /// Samples `tries` uniform coordinates first; on exhaustion falls back
    /// to a full scan and picks uniformly among the survivors. Fails with
    /// `NoCandidate` only when no coordinate anywhere satisfies the
    /// predicate.
    pub fn get_random_pos<F>(
        &self,
        rng: &mut RandomNumberGenerator,
        select: F,
        tries: u32,
    ) -> Result<Point>
    where
        F: Fn(Point) -> bool,
    {
        for _ in 0..tries {
            let pos = rng::rand_point(rng, self.width, self.height);
            if select(pos) {
                return Ok(pos);
            }
        }

        let mut candidates = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Point::new(x, y);
                if select(pos) {
                    candidates.push(pos);
                }
            }
        }
        rng::choice(rng, &candidates)
            .copied()
            .ok_or(EngineError::NoCandidate)
    }

    /// A random passable coordinate.
    pub fn get_passable_pos(&self, rng: &mut RandomNumberGenerator) -> Result<Point> {
        self.get_random_pos(rng, |pos| self.passable_at(pos), 100)
    }

    /// Boolean write view with the default wall/floor pair.
    pub fn carve(&mut self) -> CarveView<'_> {
        self.carve_with(Tile::wall(), Tile::floor())
    }

    /// Boolean write view with a chosen wall/floor pair.
    pub fn carve_with(&mut self, wall: Tile, floor: Tile) -> CarveView<'_> {
        CarveView {
            grid: self,
            wall,
            floor,
        }
    }
}

/// Sight queries read translucency from the grid itself.
impl SightMap for Grid {
    fn is_opaque(&self, point: Point) -> bool {
        !self.translucent_at(point)
    }

    fn in_bounds(&self, point: Point) -> bool {
        Grid::in_bounds(self, point)
    }
}

/// Boolean-only adapter over a grid: generators read passability and write
/// an open/closed choice without knowing about tile identity.
pub struct CarveView<'a> {
    grid: &'a mut Grid,
    wall: Tile,
    floor: Tile,
}

impl<'a> CarveView<'a> {
    pub fn width(&self) -> i32 {
        self.grid.width
    }

    pub fn height(&self) -> i32 {
        self.grid.height
    }

    pub fn in_bounds(&self, point: Point) -> bool {
        self.grid.in_bounds(point)
    }

    pub fn is_open(&self, point: Point) -> bool {
        self.grid.passable_at(point)
    }

    pub fn set_open(&mut self, point: Point, open: bool) {
        let tile = if open { self.floor } else { self.wall };
        self.grid.set_tile(point, tile);
    }
}

/// Sight view over passability instead of translucency; used by flood fill
/// and ambush detection.
pub struct PassableView<'a>(pub &'a Grid);

impl<'a> SightMap for PassableView<'a> {
    fn is_opaque(&self, point: Point) -> bool {
        !self.0.passable_at(point)
    }

    fn in_bounds(&self, point: Point) -> bool {
        self.0.in_bounds(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_open_everywhere() {
        let grid = Grid::new(6, 4);
        for y in 0..4 {
            for x in 0..6 {
                let p = Point::new(x, y);
                assert!(grid.passable_at(p));
                assert!(grid.translucent_at(p));
            }
        }
    }

    #[test]
    fn out_of_bounds_reads_are_closed_and_opaque() {
        let grid = Grid::new(6, 4);
        let outside = Point::new(-1, 2);
        assert!(!grid.passable_at(outside));
        assert!(!grid.translucent_at(outside));
        assert!(grid.tile_at(Point::new(6, 0)).is_none());
    }

    #[test]
    fn set_tile_updates_flags() {
        let mut grid = Grid::new(6, 4);
        let p = Point::new(2, 2);
        grid.set_tile(p, Tile::wall());
        assert!(!grid.passable_at(p));
        assert!(!grid.translucent_at(p));
        grid.set_tile(p, Tile::water());
        assert!(!grid.passable_at(p));
        assert!(grid.translucent_at(p));
    }

    #[test]
    fn get_random_pos_finds_the_only_candidate() {
        let mut grid = Grid::new(10, 10);
        for y in 0..10 {
            for x in 0..10 {
                grid.set_tile(Point::new(x, y), Tile::wall());
            }
        }
        let target = Point::new(7, 3);
        grid.set_tile(target, Tile::floor());

        let mut rng = RandomNumberGenerator::seeded(99);
        let found = grid.get_passable_pos(&mut rng).unwrap();
        assert_eq!(found, target);
    }

    #[test]
    fn get_random_pos_errors_when_nothing_matches() {
        let grid = Grid::new(5, 5);
        let mut rng = RandomNumberGenerator::seeded(1);
        let err = grid.get_random_pos(&mut rng, |_| false, 10).unwrap_err();
        assert_eq!(err, EngineError::NoCandidate);
    }

    #[test]
    fn carve_view_round_trips_passability() {
        let mut grid = Grid::new(8, 8);
        {
            let mut view = grid.carve();
            view.set_open(Point::new(3, 3), false);
            assert!(!view.is_open(Point::new(3, 3)));
            assert!(view.is_open(Point::new(4, 4)));
        }
        assert_eq!(grid.tile_at(Point::new(3, 3)), Some(&Tile::wall()));
    }
}
