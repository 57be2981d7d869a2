//! Maze generators built on an abstract lattice graph.
//!
//! The abstract pass produces a directed edge map over an `N x M` lattice;
//! the grid pass realizes node `(x, y)` at cell `(2x + 1, 2y + 1)` and opens
//! the wall cell between the endpoints of every edge.

use std::collections::{HashMap, HashSet};

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;

use crate::error::{EngineError, Result};
use crate::geom;
use crate::map::CarveView;
use crate::rng;

use super::fill;

pub type MazeGraph = HashMap<Point, HashSet<Point>>;

fn in_lattice(pos: Point, cols: i32, rows: i32) -> bool {
    pos.x >= 0 && pos.x < cols && pos.y >= 0 && pos.y < rows
}

fn expand(pos: Point, cols: i32, rows: i32, visited: &HashSet<Point>) -> Vec<Point> {
    geom::cardinals()
        .into_iter()
        .map(|step| pos + step)
        .filter(|next| in_lattice(*next, cols, rows) && !visited.contains(next))
        .collect()
}

/// Depth-first perfect maze: a spanning tree of the lattice.
pub fn abstract_perfect(
    cols: i32,
    rows: i32,
    rng: &mut RandomNumberGenerator,
) -> MazeGraph {
    let mut maze: MazeGraph = HashMap::new();
    for y in 0..rows {
        for x in 0..cols {
            maze.insert(Point::new(x, y), HashSet::new());
        }
    }

    let start = rng::rand_point(rng, cols, rows);
    let mut visited = HashSet::from([start]);
    let mut stack = vec![start];

    while let Some(&curr) = stack.last() {
        let candidates = expand(curr, cols, rows, &visited);
        match rng::choice(rng, &candidates) {
            Some(&dig) => {
                stack.push(dig);
                visited.insert(dig);
                maze.get_mut(&curr)
                    .expect("lattice node exists")
                    .insert(dig);
            }
            // Every neighbor is already visited; retreat one step.
            None => {
                stack.pop();
            }
        }
    }

    maze
}

/// Nodes with no outgoing edge, in scan order.
pub fn find_dead_ends(maze: &MazeGraph) -> Vec<Point> {
    let mut ends: Vec<Point> = maze
        .iter()
        .filter(|(_, edges)| edges.is_empty())
        .map(|(node, _)| *node)
        .collect();
    ends.sort_by_key(|p| (p.y, p.x));
    ends
}

/// Gives each listed dead end one extra edge to a random neighbor that does
/// not already point back at it.
pub fn remove_dead_ends(
    maze: &mut MazeGraph,
    dead_ends: &[Point],
    rng: &mut RandomNumberGenerator,
) {
    for &end in dead_ends {
        let candidates: Vec<Point> = geom::cardinals()
            .into_iter()
            .map(|step| end + step)
            .filter(|next| maze.contains_key(next))
            .filter(|next| !maze[next].contains(&end))
            .collect();
        if let Some(&pick) = rng::choice(rng, &candidates) {
            maze.get_mut(&end).expect("lattice node exists").insert(pick);
        }
    }
}

/// Perfect maze with every dead end looped back in.
pub fn abstract_braid(cols: i32, rows: i32, rng: &mut RandomNumberGenerator) -> MazeGraph {
    let mut maze = abstract_perfect(cols, rows, rng);
    let dead_ends = find_dead_ends(&maze);
    remove_dead_ends(&mut maze, &dead_ends, rng);
    maze
}

/// Perfect maze with roughly half the dead ends looped back in.
pub fn abstract_half_braid(
    cols: i32,
    rows: i32,
    rng: &mut RandomNumberGenerator,
) -> MazeGraph {
    let mut maze = abstract_perfect(cols, rows, rng);
    let dead_ends: Vec<Point> = find_dead_ends(&maze)
        .into_iter()
        .filter(|_| rng::coin_flip(rng))
        .collect();
    remove_dead_ends(&mut maze, &dead_ends, rng);
    maze
}

fn apply_maze<F>(view: &mut CarveView, rng: &mut RandomNumberGenerator, algorithm: F) -> Result<()>
where
    F: Fn(i32, i32, &mut RandomNumberGenerator) -> MazeGraph,
{
    let cols = (view.width() - 1) / 2;
    let rows = (view.height() - 1) / 2;
    if cols < 1 || rows < 1 {
        return Err(EngineError::GridTooSmall {
            cols: view.width(),
            rows: view.height(),
        });
    }

    let maze = algorithm(cols, rows, rng);
    fill(view, false);
    for (node, edges) in &maze {
        let pos = Point::new(node.x * 2 + 1, node.y * 2 + 1);
        view.set_open(pos, true);
        for edge in edges {
            view.set_open(pos + geom::direction_to(*node, *edge), true);
        }
    }
    Ok(())
}

pub fn perfect_maze(view: &mut CarveView, rng: &mut RandomNumberGenerator) -> Result<()> {
    apply_maze(view, rng, abstract_perfect)
}

pub fn braid_maze(view: &mut CarveView, rng: &mut RandomNumberGenerator) -> Result<()> {
    apply_maze(view, rng, abstract_braid)
}

pub fn half_braid_maze(view: &mut CarveView, rng: &mut RandomNumberGenerator) -> Result<()> {
    apply_maze(view, rng, abstract_half_braid)
}
