//! Thin helpers over the injected random number generator.
//!
//! Every consumer takes `&mut RandomNumberGenerator` explicitly; nothing in
//! this crate reaches for ambient RNG state.

use std::collections::HashMap;
use std::hash::Hash;

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;

/// Returns true with the given probability.
pub fn chance(rng: &mut RandomNumberGenerator, probability: f32) -> bool {
    rng.rand::<f32>() < probability
}

/// Returns true with probability 0.5.
pub fn coin_flip(rng: &mut RandomNumberGenerator) -> bool {
    rng.range(0, 2) == 0
}

/// A uniform random coordinate in `[0, cols) x [0, rows)`.
pub fn rand_point(rng: &mut RandomNumberGenerator, cols: i32, rows: i32) -> Point {
    Point::new(rng.range(0, cols), rng.range(0, rows))
}

/// A uniform random coordinate in `[min.x, max.x) x [min.y, max.y)`.
pub fn rand_point_in(rng: &mut RandomNumberGenerator, min: Point, max: Point) -> Point {
    Point::new(rng.range(min.x, max.x), rng.range(min.y, max.y))
}

/// A random compass direction, optionally allowing the zero step.
pub fn rand_direction(rng: &mut RandomNumberGenerator, include_origin: bool) -> Point {
    loop {
        let step = Point::new(rng.range(-1, 2), rng.range(-1, 2));
        if include_origin || step != Point::new(0, 0) {
            return step;
        }
    }
}

/// A uniform choice from a slice, or None if it is empty.
pub fn choice<'a, T>(rng: &mut RandomNumberGenerator, items: &'a [T]) -> Option<&'a T> {
    rng.random_slice_entry(items)
}

/// A weighted choice; items with non-positive weight are never picked.
pub fn weighted_choice<'a, T>(
    rng: &mut RandomNumberGenerator,
    items: &'a [(T, f32)],
) -> Option<&'a T> {
    let total: f32 = items.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let mut roll = rng.rand::<f32>() * total;
    for (item, weight) in items {
        let weight = weight.max(0.0);
        if roll < weight {
            return Some(item);
        }
        roll -= weight;
    }
    items.last().map(|(item, _)| item)
}

/// Transition-count Markov chain, sampled with `weighted_choice`.
///
/// The engine only needs the sampling interface; corpus loading and name
/// assembly live with the callers.
#[derive(Clone, Debug, Default)]
pub struct MarkovChain<T: Eq + Hash + Clone> {
    transitions: HashMap<T, Vec<(T, f32)>>,
}

impl<T: Eq + Hash + Clone> MarkovChain<T> {
    pub fn new() -> Self {
        Self {
            transitions: HashMap::new(),
        }
    }

    /// Records one observed `from -> to` transition.
    pub fn observe(&mut self, from: T, to: T) {
        let successors = self.transitions.entry(from).or_default();
        if let Some(entry) = successors.iter_mut().find(|(next, _)| *next == to) {
            entry.1 += 1.0;
        } else {
            successors.push((to, 1.0));
        }
    }

    /// Samples a successor state, or None for an unseen state.
    pub fn sample<'a>(
        &'a self,
        rng: &mut RandomNumberGenerator,
        state: &T,
    ) -> Option<&'a T> {
        let successors = self.transitions.get(state)?;
        weighted_choice(rng, successors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rand_point_stays_in_bounds() {
        let mut rng = RandomNumberGenerator::seeded(17);
        for _ in 0..500 {
            let p = rand_point(&mut rng, 13, 7);
            assert!(p.x >= 0 && p.x < 13);
            assert!(p.y >= 0 && p.y < 7);
        }
    }

    #[test]
    fn rand_direction_skips_origin_unless_asked() {
        let mut rng = RandomNumberGenerator::seeded(5);
        for _ in 0..200 {
            assert_ne!(rand_direction(&mut rng, false), Point::new(0, 0));
        }
    }

    #[test]
    fn weighted_choice_ignores_zero_weights() {
        let mut rng = RandomNumberGenerator::seeded(9);
        let items = [("never", 0.0), ("always", 1.0)];
        for _ in 0..100 {
            assert_eq!(weighted_choice(&mut rng, &items), Some(&"always"));
        }
    }

    #[test]
    fn weighted_choice_empty_is_none() {
        let mut rng = RandomNumberGenerator::seeded(9);
        let items: [(u8, f32); 0] = [];
        assert_eq!(weighted_choice(&mut rng, &items), None);
    }

    #[test]
    fn markov_sampling_follows_observed_transitions() {
        let mut rng = RandomNumberGenerator::seeded(21);
        let mut chain = MarkovChain::new();
        chain.observe('a', 'b');
        chain.observe('b', 'c');
        assert_eq!(chain.sample(&mut rng, &'a'), Some(&'b'));
        assert_eq!(chain.sample(&mut rng, &'b'), Some(&'c'));
        assert_eq!(chain.sample(&mut rng, &'z'), None);
    }
}
