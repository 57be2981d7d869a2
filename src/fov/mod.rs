//! Field-of-view and line-of-sight over precomputed propagation tables.
//!
//! For a radius `r` the engine builds one 45-degree octant of offset ->
//! successor-offset edges, growing coverage by exactly one cell per column,
//! then completes it to full 8-way symmetry by reflection. FOV is then a
//! stack walk over the table; LOS walks the derived successor -> parent
//! table backwards. Tables are pure functions of the radius and are cached
//! inside the engine.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use bracket_geometry::prelude::Point;
use smallvec::SmallVec;

use crate::error::{EngineError, Result};
use crate::geom;

/// Read access needed by sight queries: opacity plus a bounds test.
pub trait SightMap {
    fn is_opaque(&self, point: Point) -> bool;
    fn in_bounds(&self, point: Point) -> bool;
}

type Successors = SmallVec<[Point; 4]>;

/// Offset-to-successor-offsets expansion graph for one radius.
pub struct PropagationTable {
    radius: i32,
    edges: HashMap<Point, Successors>,
}

impl PropagationTable {
    fn build(radius: i32) -> Self {
        let mut table: HashMap<Point, HashSet<Point>> = HashMap::new();
        table.insert(
            Point::new(0, 0),
            [Point::new(1, 0), Point::new(1, 1)].into_iter().collect(),
        );

        // Each column x has x+1 cells; one designated branch row maps to two
        // successors so the covered arc widens by one cell per column. The
        // branch row b stays put for b+2 consecutive columns.
        let mut curr_break = 0;
        let mut break_count = 0;

        for x in 1..radius {
            let mut next_y = 0;
            for y in 0..=x {
                if y == curr_break {
                    table.insert(
                        Point::new(x, y),
                        [Point::new(x + 1, next_y), Point::new(x + 1, next_y + 1)]
                            .into_iter()
                            .collect(),
                    );
                    next_y += 2;
                } else {
                    table.insert(
                        Point::new(x, y),
                        [Point::new(x + 1, next_y)].into_iter().collect(),
                    );
                    next_y += 1;
                }
            }
            break_count -= 1;
            if break_count < 0 {
                break_count = curr_break + 1;
                curr_break += 1;
            }
        }

        // Terminal ring: nothing propagates past the radius.
        for y in 0..=radius {
            table.insert(Point::new(radius, y), HashSet::new());
        }

        complete(&mut table);

        let edges = table
            .into_iter()
            .map(|(key, set)| (key, set.into_iter().collect()))
            .collect();
        Self { radius, edges }
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn successors(&self, offset: Point) -> &[Point] {
        self.edges
            .get(&offset)
            .map(|set| set.as_slice())
            .unwrap_or(&[])
    }

    pub fn offsets(&self) -> impl Iterator<Item = Point> + '_ {
        self.edges.keys().copied()
    }

    fn invert(&self) -> HashMap<Point, Point> {
        let mut reverse = HashMap::new();
        for (&offset, successors) in &self.edges {
            for &succ in successors {
                reverse.insert(succ, offset);
            }
        }
        reverse
    }
}

fn merge(table: &mut HashMap<Point, HashSet<Point>>, key: Point, set: HashSet<Point>) {
    table.entry(key).or_default().extend(set);
}

/// Reflects the built octant across the diagonal and both axes, merging
/// successor sets at shared keys, for full dihedral coverage.
fn complete(table: &mut HashMap<Point, HashSet<Point>>) {
    let octant: Vec<Point> = table.keys().copied().collect();
    for key in octant {
        let swapped = table[&key]
            .iter()
            .map(|s| Point::new(s.y, s.x))
            .collect::<HashSet<Point>>();
        merge(table, Point::new(key.y, key.x), swapped);
    }

    let quadrant: Vec<Point> = table.keys().copied().collect();
    for key in quadrant {
        let set = table[&key].clone();
        merge(
            table,
            Point::new(-key.x, key.y),
            set.iter().map(|s| Point::new(-s.x, s.y)).collect(),
        );
        merge(
            table,
            Point::new(-key.x, -key.y),
            set.iter().map(|s| Point::new(-s.x, -s.y)).collect(),
        );
        merge(
            table,
            Point::new(key.x, -key.y),
            set.iter().map(|s| Point::new(s.x, -s.y)).collect(),
        );
    }
}

/// Owns the radius-keyed table caches. Tables are immutable once built and
/// shared out as `Arc`s; the mutex makes first use a single-writer build.
pub struct FovEngine {
    forward: Mutex<HashMap<i32, Arc<PropagationTable>>>,
    reverse: Mutex<HashMap<i32, Arc<HashMap<Point, Point>>>>,
}

impl Default for FovEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FovEngine {
    pub fn new() -> Self {
        Self {
            forward: Mutex::new(HashMap::new()),
            reverse: Mutex::new(HashMap::new()),
        }
    }

    /// The propagation table for `radius`, building it on first use.
    pub fn table(&self, radius: i32) -> Arc<PropagationTable> {
        let mut cache = self.forward.lock().expect("fov table cache poisoned");
        cache
            .entry(radius)
            .or_insert_with(|| Arc::new(PropagationTable::build(radius)))
            .clone()
    }

    fn reverse_table(&self, radius: i32) -> Arc<HashMap<Point, Point>> {
        let table = self.table(radius);
        let mut cache = self.reverse.lock().expect("fov table cache poisoned");
        cache
            .entry(radius)
            .or_insert_with(|| Arc::new(table.invert()))
            .clone()
    }

    /// Raw table-walk field of view.
    ///
    /// Opaque cells are visible but not expanded; the origin is always
    /// included, even when it is itself opaque.
    pub fn simple_fov(
        &self,
        map: &impl SightMap,
        origin: Point,
        radius: i32,
    ) -> HashSet<Point> {
        let table = self.table(radius);
        let start = Point::new(0, 0);
        let mut fov = HashSet::new();
        let mut visited = HashSet::from([start]);
        let mut stack = vec![start];

        while let Some(offset) = stack.pop() {
            let pos = origin + offset;
            fov.insert(pos);
            if !map.is_opaque(pos) {
                for &succ in table.successors(offset) {
                    if visited.insert(succ) {
                        stack.push(succ);
                    }
                }
            }
        }

        fov
    }

    /// Default field of view: table walk plus wall-artifact repair,
    /// clipped to the map bounds. Circular and directional trims are
    /// separate composable passes.
    pub fn compute_fov(
        &self,
        map: &impl SightMap,
        origin: Point,
        radius: i32,
    ) -> HashSet<Point> {
        let mut fov = self.simple_fov(map, origin, radius);
        fix_wall(&mut fov, origin, radius);
        fov.retain(|pos| map.in_bounds(*pos));
        fov
    }

    /// Casts a ray from `origin` toward `target` along the reverse table.
    ///
    /// The returned path runs from beside the origin outward and ends at
    /// `target` when nothing blocks, or at the blocking cell nearest the
    /// origin otherwise. A zero-length ray yields an empty path.
    pub fn trace(
        &self,
        map: &impl SightMap,
        origin: Point,
        target: Point,
    ) -> Result<Vec<Point>> {
        if !map.in_bounds(origin) {
            return Err(EngineError::OutOfBounds(origin));
        }
        if !map.in_bounds(target) {
            return Err(EngineError::OutOfBounds(target));
        }

        let radius = geom::chebyshev(origin, target);
        if radius == 0 {
            return Ok(Vec::new());
        }

        let reverse = self.reverse_table(radius);
        let parent = |offset: Point| {
            reverse
                .get(&offset)
                .copied()
                .expect("every offset within the radius has a parent")
        };

        let mut last = target - origin;
        let mut curr = parent(last);
        while curr != Point::new(0, 0) {
            if map.is_opaque(origin + curr) {
                last = curr;
            }
            curr = parent(curr);
        }

        let mut offsets = Vec::new();
        let mut step = last;
        while step != Point::new(0, 0) {
            offsets.push(step);
            step = parent(step);
        }
        Ok(offsets.into_iter().rev().map(|o| origin + o).collect())
    }

    /// True iff the traced ray reaches `target` unblocked.
    pub fn line_of_sight(
        &self,
        map: &impl SightMap,
        origin: Point,
        target: Point,
    ) -> Result<bool> {
        if origin == target {
            if !map.in_bounds(origin) {
                return Err(EngineError::OutOfBounds(origin));
            }
            return Ok(true);
        }
        let path = self.trace(map, origin, target)?;
        Ok(path.last() == Some(&target))
    }
}

/// Extends visibility one cell to either side of the four axis rays,
/// repairing grazing-angle gaps along straight walls.
pub fn fix_wall(fov: &mut HashSet<Point>, origin: Point, radius: i32) {
    for x in origin.x..origin.x + radius {
        if !fov.contains(&Point::new(x, origin.y)) {
            break;
        }
        fov.insert(Point::new(x, origin.y + 1));
        fov.insert(Point::new(x, origin.y - 1));
    }
    for x in (origin.x - radius + 1..=origin.x).rev() {
        if !fov.contains(&Point::new(x, origin.y)) {
            break;
        }
        fov.insert(Point::new(x, origin.y + 1));
        fov.insert(Point::new(x, origin.y - 1));
    }
    for y in origin.y..origin.y + radius {
        if !fov.contains(&Point::new(origin.x, y)) {
            break;
        }
        fov.insert(Point::new(origin.x + 1, y));
        fov.insert(Point::new(origin.x - 1, y));
    }
    for y in (origin.y - radius + 1..=origin.y).rev() {
        if !fov.contains(&Point::new(origin.x, y)) {
            break;
        }
        fov.insert(Point::new(origin.x + 1, y));
        fov.insert(Point::new(origin.x - 1, y));
    }
}

/// Drops cells whose squared distance from the origin exceeds `r^2 + 1`,
/// trimming the corner overshoot of the octant approximation.
pub fn fix_circular(fov: &mut HashSet<Point>, origin: Point, radius: i32) {
    let limit = radius * radius + 1;
    fov.retain(|pos| {
        let dx = origin.x - pos.x;
        let dy = origin.y - pos.y;
        dx * dx + dy * dy <= limit
    });
}

const CONE_COSINE: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Restricts the set to a forward cone around `direction`.
pub fn fix_directional(fov: &mut HashSet<Point>, origin: Point, direction: Point) {
    fov.retain(|pos| inside_cone(origin, *pos, direction));
}

fn inside_cone(origin: Point, pos: Point, direction: Point) -> bool {
    // Forward bias: shift by one step so the origin row reads as inside.
    let diff = pos - origin + direction;
    if diff == Point::new(0, 0) {
        return false;
    }
    geom::dot(direction, diff) as f32 / geom::length(diff) / geom::length(direction)
        > CONE_COSINE
}

/// 4-connected flood fill bounded by the view's opaque cells; the
/// "see the whole connected room" alternative to radius-based FOV.
pub fn flood_fov(map: &impl SightMap, origin: Point) -> HashSet<Point> {
    let mut fov = HashSet::new();
    let mut stack = vec![origin];

    while let Some(pos) = stack.pop() {
        if fov.contains(&pos) || map.is_opaque(pos) {
            continue;
        }
        fov.insert(pos);
        for dir in geom::cardinals() {
            stack.push(pos + dir);
        }
    }

    fov
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Grid, Tile};

    fn norm(p: Point) -> i32 {
        p.x.abs().max(p.y.abs())
    }

    #[test]
    fn table_covers_every_ring_and_ends_empty() {
        let engine = FovEngine::new();
        let radius = 4;
        let table = engine.table(radius);
        assert_eq!(table.radius(), radius);

        for ring in 0..=radius {
            let mut cells = 0;
            for offset in table.offsets() {
                if norm(offset) == ring {
                    cells += 1;
                    if ring == radius {
                        assert!(table.successors(offset).is_empty());
                    } else {
                        assert!(!table.successors(offset).is_empty());
                    }
                }
            }
            let expected = if ring == 0 { 1 } else { 8 * ring };
            assert_eq!(cells, expected, "ring {ring} is fully covered");
        }
    }

    #[test]
    fn table_is_dihedrally_symmetric() {
        let engine = FovEngine::new();
        let table = engine.table(5);
        let transforms: [fn(Point) -> Point; 8] = [
            |p| p,
            |p| Point::new(p.y, p.x),
            |p| Point::new(-p.x, p.y),
            |p| Point::new(p.x, -p.y),
            |p| Point::new(-p.x, -p.y),
            |p| Point::new(-p.y, p.x),
            |p| Point::new(p.y, -p.x),
            |p| Point::new(-p.y, -p.x),
        ];

        for offset in table.offsets() {
            let base: HashSet<Point> = table.successors(offset).iter().copied().collect();
            for transform in transforms {
                let image: HashSet<Point> =
                    table.successors(transform(offset)).iter().copied().collect();
                let expected: HashSet<Point> = base.iter().map(|&s| transform(s)).collect();
                assert_eq!(image, expected);
            }
        }
    }

    #[test]
    fn seed_offset_expands_to_all_eight_neighbors() {
        let engine = FovEngine::new();
        let table = engine.table(3);
        let seed: HashSet<Point> = table.successors(Point::new(0, 0)).iter().copied().collect();
        let neighbors: HashSet<Point> = crate::geom::compass().into_iter().collect();
        assert_eq!(seed, neighbors);
    }

    #[test]
    fn open_ground_fov_is_the_chebyshev_disc() {
        let engine = FovEngine::new();
        let grid = Grid::new(9, 9);
        let origin = Point::new(4, 4);
        let fov = engine.compute_fov(&grid, origin, 3);

        assert_eq!(fov.len(), 49);
        assert!(fov.contains(&origin));
        for pos in &fov {
            assert!(crate::geom::chebyshev(origin, *pos) <= 3);
        }
    }

    #[test]
    fn opaque_origin_still_sees_itself() {
        let engine = FovEngine::new();
        let mut grid = Grid::new(5, 5);
        for y in 0..5 {
            for x in 0..5 {
                grid.set_tile(Point::new(x, y), Tile::wall());
            }
        }
        let origin = Point::new(2, 2);
        let fov = engine.simple_fov(&grid, origin, 3);
        assert!(fov.contains(&origin));
    }

    #[test]
    fn walls_cast_shadows() {
        let engine = FovEngine::new();
        let mut grid = Grid::new(11, 11);
        let origin = Point::new(5, 5);
        grid.set_tile(Point::new(7, 5), Tile::wall());

        let fov = engine.simple_fov(&grid, origin, 5);
        assert!(fov.contains(&Point::new(7, 5)), "blocker itself is visible");
        assert!(!fov.contains(&Point::new(9, 5)), "cells behind it are not");
    }

    #[test]
    fn fix_circular_trims_the_corners() {
        let engine = FovEngine::new();
        let grid = Grid::new(5, 5);
        let origin = Point::new(2, 2);
        let mut fov = engine.simple_fov(&grid, origin, 2);
        assert_eq!(fov.len(), 25);

        fix_circular(&mut fov, origin, 2);
        assert_eq!(fov.len(), 21);
        assert!(!fov.contains(&Point::new(0, 0)));
        assert!(!fov.contains(&Point::new(4, 4)));
        assert!(fov.contains(&Point::new(0, 2)));
    }

    #[test]
    fn fix_directional_keeps_the_forward_cone() {
        let engine = FovEngine::new();
        let grid = Grid::new(11, 11);
        let origin = Point::new(5, 5);
        let mut fov = engine.simple_fov(&grid, origin, 4);
        fix_directional(&mut fov, origin, Point::new(1, 0));

        assert!(fov.contains(&origin));
        assert!(fov.contains(&Point::new(9, 5)));
        assert!(!fov.contains(&Point::new(1, 5)), "behind is excluded");
        assert!(!fov.contains(&Point::new(5, 9)), "perpendicular is excluded");
    }

    #[test]
    fn line_of_sight_on_open_ground() {
        let engine = FovEngine::new();
        let grid = Grid::new(12, 12);
        let a = Point::new(1, 1);
        for target in [Point::new(10, 10), Point::new(1, 9), Point::new(8, 3)] {
            assert!(engine.line_of_sight(&grid, a, target).unwrap());
            assert!(engine.line_of_sight(&grid, target, a).unwrap());
        }
        assert!(engine.line_of_sight(&grid, a, a).unwrap());
    }

    #[test]
    fn trace_stops_at_the_first_blocker() {
        let engine = FovEngine::new();
        let mut grid = Grid::new(9, 9);
        grid.set_tile(Point::new(4, 4), Tile::wall());

        let origin = Point::new(1, 4);
        let target = Point::new(7, 4);
        let path = engine.trace(&grid, origin, target).unwrap();
        assert_eq!(
            path,
            vec![Point::new(2, 4), Point::new(3, 4), Point::new(4, 4)]
        );
        assert!(!engine.line_of_sight(&grid, origin, target).unwrap());
    }

    #[test]
    fn zero_length_trace_is_empty() {
        let engine = FovEngine::new();
        let grid = Grid::new(5, 5);
        let origin = Point::new(2, 2);
        assert!(engine.trace(&grid, origin, origin).unwrap().is_empty());
    }

    #[test]
    fn trace_rejects_out_of_bounds_endpoints() {
        let engine = FovEngine::new();
        let grid = Grid::new(5, 5);
        let inside = Point::new(2, 2);
        let outside = Point::new(9, 2);
        assert_eq!(
            engine.trace(&grid, inside, outside).unwrap_err(),
            EngineError::OutOfBounds(outside)
        );
        assert_eq!(
            engine.line_of_sight(&grid, outside, inside).unwrap_err(),
            EngineError::OutOfBounds(outside)
        );
    }

    #[test]
    fn flood_fov_respects_walls() {
        let mut grid = Grid::new(9, 5);
        for y in 0..5 {
            grid.set_tile(Point::new(4, y), Tile::wall());
        }

        let seen = flood_fov(&crate::map::PassableView(&grid), Point::new(1, 2));
        assert_eq!(seen.len(), 20, "only the left room floods");
        assert!(!seen.contains(&Point::new(6, 2)));
    }

    #[test]
    fn five_by_five_radius_two_sees_everything() {
        let engine = FovEngine::new();
        let grid = Grid::new(5, 5);
        let fov = engine.compute_fov(&grid, Point::new(2, 2), 2);
        assert_eq!(fov.len(), 25);
    }
}
