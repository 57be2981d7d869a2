use bracket_geometry::prelude::{DistanceAlg, Point};

/// The four orthogonal step directions.
pub fn cardinals() -> [Point; 4] {
    [
        Point::new(1, 0),
        Point::new(-1, 0),
        Point::new(0, 1),
        Point::new(0, -1),
    ]
}

/// All eight compass directions.
pub fn compass() -> [Point; 8] {
    [
        Point::new(1, 0),
        Point::new(-1, 0),
        Point::new(0, 1),
        Point::new(0, -1),
        Point::new(1, 1),
        Point::new(1, -1),
        Point::new(-1, 1),
        Point::new(-1, -1),
    ]
}

/// King-move distance: max of the absolute component differences.
pub fn chebyshev(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

pub fn manhattan(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

pub fn euclidean(a: Point, b: Point) -> f32 {
    DistanceAlg::Pythagoras.distance2d(a, b)
}

pub fn dot(a: Point, b: Point) -> i32 {
    a.x * b.x + a.y * b.y
}

pub fn length(p: Point) -> f32 {
    ((p.x * p.x + p.y * p.y) as f32).sqrt()
}

/// Unit step from `a` toward `b`, each component clamped to {-1, 0, 1}.
pub fn direction_to(a: Point, b: Point) -> Point {
    Point::new((b.x - a.x).clamp(-1, 1), (b.y - a.y).clamp(-1, 1))
}
