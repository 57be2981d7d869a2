//! Cellular-automata cavern generator.
//!
//! Seeds the interior at 60% open, applies three passes of the 5-3 rule,
//! then accepts the result only when a single 8-connected open region
//! covers at least 45% of the map. Rejected boards are reseeded and rerun.

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;

use crate::error::{EngineError, Result};
use crate::map::CarveView;
use crate::rng;

const SEED_CHANCE: f32 = 0.6;
const COVERAGE_FLOOR: f32 = 0.45;
const RULE_PASSES: u32 = 3;
const MAX_ATTEMPTS: u32 = 100;

struct Automata {
    cols: i32,
    rows: i32,
    state: Vec<bool>,
    scratch: Vec<bool>,
}

impl Automata {
    fn new(cols: i32, rows: i32) -> Self {
        let size = (cols * rows) as usize;
        Self {
            cols,
            rows,
            state: vec![false; size],
            scratch: vec![false; size],
        }
    }

    fn idx(&self, x: i32, y: i32) -> usize {
        (y * self.cols + x) as usize
    }

    /// Reseeds the interior; the one-cell border stays closed.
    fn reset(&mut self, rng: &mut RandomNumberGenerator) {
        for y in 1..self.rows - 1 {
            for x in 1..self.cols - 1 {
                let idx = self.idx(x, y);
                self.state[idx] = rng::chance(rng, SEED_CHANCE);
            }
        }
    }

    fn run(&mut self, passes: u32) {
        for _ in 0..passes {
            self.apply_rule();
        }
    }

    /// Count of closed cells in the Chebyshev-`r` box around `(x, y)`,
    /// clipped to the board.
    fn wall_count(&self, x: i32, y: i32, r: i32) -> u32 {
        let mut count = 0;
        for dy in (y - r).max(0)..(y + r + 1).min(self.rows) {
            for dx in (x - r).max(0)..(x + r + 1).min(self.cols) {
                if !self.state[self.idx(dx, dy)] {
                    count += 1;
                }
            }
        }
        count
    }

    fn apply_rule(&mut self) {
        for y in 1..self.rows - 1 {
            for x in 1..self.cols - 1 {
                let close = self.wall_count(x, y, 1);
                let far = self.wall_count(x, y, 2);
                let idx = self.idx(x, y);
                self.scratch[idx] = close < 5 && far > 3;
            }
        }
        std::mem::swap(&mut self.state, &mut self.scratch);
    }

    fn open_cells(&self) -> Vec<Point> {
        let mut cells = Vec::new();
        for y in 0..self.rows {
            for x in 0..self.cols {
                if self.state[self.idx(x, y)] {
                    cells.push(Point::new(x, y));
                }
            }
        }
        cells
    }

    /// Floods from a random open cell and keeps the board only when the
    /// flooded region is large enough; everything outside it is closed.
    fn try_connect(&mut self, rng: &mut RandomNumberGenerator) -> bool {
        let candidates = self.open_cells();
        let start = match rng::choice(rng, &candidates) {
            Some(&start) => start,
            None => return false,
        };

        let mut flood = vec![false; (self.cols * self.rows) as usize];
        let mut flooded = 0u32;
        let mut stack = vec![start];
        while let Some(pos) = stack.pop() {
            if pos.x < 0 || pos.x >= self.cols || pos.y < 0 || pos.y >= self.rows {
                continue;
            }
            let idx = self.idx(pos.x, pos.y);
            if flood[idx] || !self.state[idx] {
                continue;
            }
            flood[idx] = true;
            flooded += 1;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx != 0 || dy != 0 {
                        stack.push(pos + Point::new(dx, dy));
                    }
                }
            }
        }

        if (flooded as f32) / ((self.cols * self.rows) as f32) < COVERAGE_FLOOR {
            return false;
        }

        for (idx, open) in self.state.iter_mut().enumerate() {
            if !flood[idx] {
                *open = false;
            }
        }
        true
    }

    fn apply(&self, view: &mut CarveView) {
        for y in 0..self.rows {
            for x in 0..self.cols {
                view.set_open(Point::new(x, y), self.state[self.idx(x, y)]);
            }
        }
    }
}

/// Generates a connected cavern, retrying from fresh seeds on rejection.
pub fn cavern(view: &mut CarveView, rng: &mut RandomNumberGenerator) -> Result<()> {
    let mut automata = Automata::new(view.width(), view.height());
    for attempt in 1..=MAX_ATTEMPTS {
        automata.reset(rng);
        automata.run(RULE_PASSES);
        if automata.try_connect(rng) {
            log::debug!("cavern accepted on attempt {attempt}");
            automata.apply(view);
            return Ok(());
        }
    }
    log::warn!("cavern generation exhausted {MAX_ATTEMPTS} attempts");
    Err(EngineError::GenerationFailed {
        attempts: MAX_ATTEMPTS,
    })
}
