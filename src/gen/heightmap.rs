//! Heightmap-based overworld generator.
//!
//! Builds terrain by stamping random ellipses onto a height field that
//! wraps horizontally, then smoothing, equalizing the height distribution,
//! and normalizing into `[0, 1]`. Callers map the final heights onto tiles
//! through an ascending threshold ramp.

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;

use crate::error::{EngineError, Result};
use crate::map::{Grid, Tile};
use crate::rng;

const STAMP_ITERATIONS: u32 = 250;

/// A row-major field of heights with fixed dimensions.
#[derive(Debug)]
pub struct Heightmap {
    pub cols: i32,
    pub rows: i32,
    values: Vec<f64>,
}

impl Heightmap {
    pub fn new(cols: i32, rows: i32) -> Self {
        assert!(cols > 0 && rows > 0);
        Self {
            cols,
            rows,
            values: vec![0.0; (cols * rows) as usize],
        }
    }

    pub fn get(&self, x: i32, y: i32) -> f64 {
        self.values[(y * self.cols + x) as usize]
    }

    pub fn set(&mut self, x: i32, y: i32, value: f64) {
        self.values[(y * self.cols + x) as usize] = value;
    }

    /// Stamps random ellipses of semi-axes `cols/8 x rows/8`, raising every
    /// covered cell by one. The x axis wraps; the y axis clips.
    pub fn raise_ellipses(&mut self, rng: &mut RandomNumberGenerator, iterations: u32) {
        let rx = self.cols / 8;
        let ry = self.rows / 8;
        let rx2 = (rx * rx) as f64;
        let ry2 = (ry * ry) as f64;

        for _ in 0..iterations {
            let center = rng::rand_point(rng, self.cols, self.rows);
            for dx in -rx..rx {
                for dy in -ry..ry {
                    let x = (center.x + dx).rem_euclid(self.cols);
                    let y = center.y + dy;
                    if y < 0 || y >= self.rows {
                        continue;
                    }

                    let off_x = (center.x - x).abs().min(self.cols - (center.x - x).abs());
                    let off_y = (center.y - y).abs();
                    let inside = (off_x * off_x) as f64 / rx2 + (off_y * off_y) as f64 / ry2;
                    if inside < 1.0 {
                        let idx = (y * self.cols + x) as usize;
                        self.values[idx] += 1.0;
                    }
                }
            }
        }
    }

    /// In-place 3-tap blur over the interior, vertical then horizontal.
    pub fn smooth(&mut self) {
        for x in 1..self.cols - 1 {
            for y in 1..self.rows - 1 {
                let v = (self.get(x, y - 1) + self.get(x, y) + self.get(x, y + 1)) / 3.0;
                self.set(x, y, v);
                let h = (self.get(x - 1, y) + self.get(x, y) + self.get(x + 1, y)) / 3.0;
                self.set(x, y, h);
            }
        }
    }

    /// Replaces each height with the cumulative sum of all heights up to and
    /// including it, flattening the height histogram.
    pub fn equalize(&mut self) {
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);

        let mut cumulative = Vec::with_capacity(sorted.len());
        let mut total = 0.0;
        for height in &sorted {
            total += height;
            cumulative.push(total);
        }

        for value in &mut self.values {
            // Index of the last occurrence of this height in sorted order.
            let rank = sorted.partition_point(|h| h.total_cmp(value).is_le());
            *value = cumulative[rank - 1];
        }
    }

    /// Rescales into `[0, 1]`. A constant field collapses to all zeros.
    pub fn normalize(&mut self) {
        let mut low = f64::INFINITY;
        let mut high = f64::NEG_INFINITY;
        for &value in &self.values {
            low = low.min(value);
            high = high.max(value);
        }
        let span = high - low;
        for value in &mut self.values {
            *value = if span > 0.0 { (*value - low) / span } else { 0.0 };
        }
    }
}

/// Builds the full overworld height field: stamp, smooth, equalize,
/// normalize.
pub fn overworld_heightmap(
    cols: i32,
    rows: i32,
    rng: &mut RandomNumberGenerator,
) -> Result<Heightmap> {
    // Ellipse semi-axes are cols/8 x rows/8; anything smaller degenerates.
    if cols < 8 || rows < 8 {
        return Err(EngineError::GridTooSmall { cols, rows });
    }
    let mut hmap = Heightmap::new(cols, rows);
    hmap.raise_ellipses(rng, STAMP_ITERATIONS);
    hmap.smooth();
    hmap.equalize();
    hmap.normalize();
    Ok(hmap)
}

/// Generates an overworld onto the grid.
///
/// `ramp` pairs ascending height thresholds with tiles; each cell takes the
/// tile of the first threshold at or above its height, or the last tile.
pub fn overworld(
    grid: &mut Grid,
    rng: &mut RandomNumberGenerator,
    ramp: &[(f64, Tile)],
) -> Result<()> {
    assert!(!ramp.is_empty(), "ramp needs at least one tile");
    let hmap = overworld_heightmap(grid.width, grid.height, rng)?;
    for y in 0..grid.height {
        for x in 0..grid.width {
            let height = hmap.get(x, y);
            let tile = ramp
                .iter()
                .find(|(threshold, _)| height <= *threshold)
                .or(ramp.last())
                .map(|(_, tile)| *tile)
                .unwrap_or_default();
            grid.set_tile(Point::new(x, y), tile);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_spans_the_unit_interval() {
        let mut rng = RandomNumberGenerator::seeded(31);
        let hmap = overworld_heightmap(32, 24, &mut rng).unwrap();

        let mut low = f64::INFINITY;
        let mut high = f64::NEG_INFINITY;
        for y in 0..24 {
            for x in 0..32 {
                let v = hmap.get(x, y);
                low = low.min(v);
                high = high.max(v);
            }
        }
        assert_eq!(low, 0.0);
        assert_eq!(high, 1.0);
    }

    #[test]
    fn normalize_flattens_a_constant_field() {
        let mut hmap = Heightmap::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                hmap.set(x, y, 7.5);
            }
        }
        hmap.normalize();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(hmap.get(x, y), 0.0);
            }
        }
    }

    #[test]
    fn equalize_preserves_ordering() {
        let mut hmap = Heightmap::new(3, 1);
        hmap.set(0, 0, 2.0);
        hmap.set(1, 0, 5.0);
        hmap.set(2, 0, 5.0);
        hmap.equalize();

        // 2 -> 2, both 5s -> 2 + 5 + 5.
        assert_eq!(hmap.get(0, 0), 2.0);
        assert_eq!(hmap.get(1, 0), 12.0);
        assert_eq!(hmap.get(2, 0), 12.0);
    }

    #[test]
    fn overworld_writes_only_ramp_tiles() {
        let mut grid = Grid::new(24, 16);
        let mut rng = RandomNumberGenerator::seeded(77);
        let ramp = [(0.3, Tile::water()), (0.7, Tile::floor()), (1.0, Tile::wall())];
        overworld(&mut grid, &mut rng, &ramp).unwrap();

        let allowed = [Tile::water(), Tile::floor(), Tile::wall()];
        let mut seen_water = false;
        for y in 0..16 {
            for x in 0..24 {
                let tile = *grid.tile_at(Point::new(x, y)).unwrap();
                assert!(allowed.contains(&tile));
                seen_water |= tile == Tile::water();
            }
        }
        assert!(seen_water, "the lowest band always exists after normalize");
    }

    #[test]
    fn tiny_fields_are_rejected() {
        let mut rng = RandomNumberGenerator::seeded(1);
        let err = overworld_heightmap(7, 40, &mut rng).unwrap_err();
        assert!(matches!(err, EngineError::GridTooSmall { cols: 7, rows: 40 }));
    }
}
