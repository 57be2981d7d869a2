//! Room-and-corridor dungeon and town layouts.
//!
//! Rooms are half-open rectangles placed on a coarse lattice. The dungeon
//! connects them with L-shaped corridors along a half-braid maze graph; the
//! town stamps free-standing building footprints instead.

use bracket_geometry::prelude::{Point, Rect};
use bracket_random::prelude::RandomNumberGenerator;

use crate::error::{EngineError, Result};
use crate::map::CarveView;
use crate::rng;

use super::fill;
use super::maze::abstract_half_braid;

/// A random room inside the `room_dim` cell anchored at `pos`, padded one
/// cell from the cell edges. Fails the `room_chance` roll and it collapses
/// to a 1x1 junction.
fn create_room(
    pos: Point,
    room_dim: Point,
    room_chance: f32,
    rng: &mut RandomNumberGenerator,
) -> Rect {
    let full = rng::chance(rng, room_chance) && room_dim.x - 1 > 3 && room_dim.y - 1 > 3;
    let dim = if full {
        Point::new(rng.range(3, room_dim.x - 1), rng.range(3, room_dim.y - 1))
    } else {
        Point::new(1, 1)
    };
    let off_max = room_dim - dim;
    let off = Point::new(
        rng.range(1, off_max.x.max(2)),
        rng.range(1, off_max.y.max(2)),
    );
    let corner = pos + off;
    Rect::with_size(corner.x, corner.y, dim.x, dim.y)
}

/// A corridor endpoint strictly inside the room, or its corner when the
/// room is too small to have an interior.
fn room_connect_source(room: &Rect, rng: &mut RandomNumberGenerator) -> Point {
    if room.x2 - 1 > room.x1 + 1 && room.y2 - 1 > room.y1 + 1 {
        rng::rand_point_in(
            rng,
            Point::new(room.x1 + 1, room.y1 + 1),
            Point::new(room.x2 - 1, room.y2 - 1),
        )
    } else {
        Point::new(room.x1, room.y1)
    }
}

/// Carves an L-shaped corridor between interior points of two rooms,
/// horizontal leg first.
fn connect_rooms(
    start: &Rect,
    goal: &Rect,
    view: &mut CarveView,
    rng: &mut RandomNumberGenerator,
) {
    let from = room_connect_source(start, rng);
    let to = room_connect_source(goal, rng);
    let step_x = if from.x < to.x { 1 } else { -1 };
    let step_y = if from.y < to.y { 1 } else { -1 };

    let mut pos = from;
    while pos.x != to.x {
        view.set_open(pos, true);
        pos.x += step_x;
    }
    while pos.y != to.y {
        view.set_open(pos, true);
        pos.y += step_y;
    }
}

fn fill_room(view: &mut CarveView, room: &Rect, open: bool) {
    for y in room.y1..room.y2 {
        for x in room.x1..room.x2 {
            view.set_open(Point::new(x, y), open);
        }
    }
}

fn outline_room(view: &mut CarveView, room: &Rect, open: bool) {
    for x in room.x1..room.x2 {
        view.set_open(Point::new(x, room.y1), open);
        view.set_open(Point::new(x, room.y2 - 1), open);
    }
    for y in room.y1..room.y2 {
        view.set_open(Point::new(room.x1, y), open);
        view.set_open(Point::new(room.x2 - 1, y), open);
    }
}

/// Rooms and corridors over a half-braid connection graph.
pub fn medieval(
    view: &mut CarveView,
    rng: &mut RandomNumberGenerator,
    room_chance: f32,
) -> Result<()> {
    let maze_dim = view.width().min(view.height()) / 7;
    if maze_dim < 1 {
        return Err(EngineError::GridTooSmall {
            cols: view.width(),
            rows: view.height(),
        });
    }
    let room_dim = Point::new(view.width() / maze_dim, view.height() / maze_dim);
    log::debug!(
        "medieval layout: {maze_dim}x{maze_dim} lattice, {}x{} cells",
        room_dim.x,
        room_dim.y
    );

    let maze = abstract_half_braid(maze_dim, maze_dim, rng);
    let mut nodes: Vec<Point> = maze.keys().copied().collect();
    nodes.sort_by_key(|p| (p.y, p.x));

    let mut rooms = std::collections::HashMap::new();
    for &node in &nodes {
        let pos = Point::new(node.x * room_dim.x, node.y * room_dim.y);
        rooms.insert(node, create_room(pos, room_dim, room_chance, rng));
    }

    fill(view, false);
    for &node in &nodes {
        fill_room(view, &rooms[&node], true);
    }

    for &node in &nodes {
        let mut edges: Vec<Point> = maze[&node].iter().copied().collect();
        edges.sort_by_key(|p| (p.y, p.x));
        for edge in edges {
            connect_rooms(&rooms[&node], &rooms[&edge], view, rng);
        }
    }
    Ok(())
}

/// Stamps building footprints onto an open field.
///
/// Buildings are closed cells; with `add_entrances` each building gets one
/// opening at a random spot on its perimeter.
pub fn town(
    view: &mut CarveView,
    rng: &mut RandomNumberGenerator,
    fill_rooms: bool,
    add_entrances: bool,
) -> Result<()> {
    let town_dim = (view.width().min(view.height()) - 2) / 7;
    if town_dim < 1 {
        return Err(EngineError::GridTooSmall {
            cols: view.width(),
            rows: view.height(),
        });
    }
    let room_dim = Point::new(
        (view.width() - 2) / town_dim,
        (view.height() - 2) / town_dim,
    );

    for x in 0..town_dim {
        for y in 0..town_dim {
            let pos = Point::new(x * room_dim.x + 1, y * room_dim.y + 1);
            let room = create_room(pos, room_dim, 0.75, rng);
            if room.x2 - room.x1 <= 1 {
                continue;
            }

            if fill_rooms {
                fill_room(view, &room, false);
            } else {
                outline_room(view, &room, false);
            }

            if add_entrances {
                let door = if rng::coin_flip(rng) {
                    let door_x = if rng::coin_flip(rng) { room.x1 } else { room.x2 - 1 };
                    Point::new(door_x, rng.range(room.y1 + 1, room.y2 - 1))
                } else {
                    let door_y = if rng::coin_flip(rng) { room.y1 } else { room.y2 - 1 };
                    Point::new(rng.range(room.x1 + 1, room.x2 - 1), door_y)
                };
                view.set_open(door, true);
            }
        }
    }
    Ok(())
}
