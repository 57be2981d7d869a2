//! Map generators.
//!
//! Every generator writes through a `CarveView` and consumes an injected
//! RNG, so callers pick the tile pair and keep reseeding in their hands.

pub mod cavern;
pub mod chokepoint;
pub mod heightmap;
pub mod maze;
pub mod rooms;

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;

use crate::map::CarveView;
use crate::rng;

/// Writes `open` to every cell.
pub fn fill(view: &mut CarveView, open: bool) {
    for y in 0..view.height() {
        for x in 0..view.width() {
            view.set_open(Point::new(x, y), open);
        }
    }
}

/// Closes the border cells.
pub fn fence(view: &mut CarveView) {
    for x in 0..view.width() {
        view.set_open(Point::new(x, 0), false);
        view.set_open(Point::new(x, view.height() - 1), false);
    }
    for y in 0..view.height() {
        view.set_open(Point::new(0, y), false);
        view.set_open(Point::new(view.width() - 1, y), false);
    }
}

/// Opens each cell independently with the given probability.
pub fn chance_fill(view: &mut CarveView, rng: &mut RandomNumberGenerator, probability: f32) {
    for y in 0..view.height() {
        for x in 0..view.width() {
            let open = rng::chance(rng, probability);
            view.set_open(Point::new(x, y), open);
        }
    }
}
