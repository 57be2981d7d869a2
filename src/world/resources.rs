use bracket_geometry::prelude::Point;

use crate::fov::SightMap;
use crate::map::Grid;

/// Snapshot of the grid's sight flags, rebuilt each tick and handed to the
/// viewshed system as a resource.
pub struct SightContext {
    pub width: i32,
    pub height: i32,
    blocks_sight: Vec<bool>,
}

impl SightContext {
    pub fn from_grid(grid: &Grid) -> Self {
        let mut blocks_sight = Vec::with_capacity((grid.width * grid.height) as usize);
        for y in 0..grid.height {
            for x in 0..grid.width {
                blocks_sight.push(!grid.translucent_at(Point::new(x, y)));
            }
        }
        Self {
            width: grid.width,
            height: grid.height,
            blocks_sight,
        }
    }
}

impl SightMap for SightContext {
    fn is_opaque(&self, point: Point) -> bool {
        if !self.in_bounds(point) {
            return true;
        }
        self.blocks_sight[(point.y * self.width + point.x) as usize]
    }

    fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0 && point.x < self.width && point.y >= 0 && point.y < self.height
    }
}
