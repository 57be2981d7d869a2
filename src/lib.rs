//! Core engine for turn-based grid simulations.
//!
//! The crate provides a tile grid with boolean carve views, a table-driven
//! field-of-view engine with line-of-sight tracing, a sparse delta-encoded
//! turn scheduler, an ECS-backed `World` composing all of the above, and a
//! family of procedural map generators. Rendering and input live with the
//! consumer.

pub mod clock;
pub mod error;
pub mod fov;
pub mod r#gen;
pub mod geom;
pub mod map;
pub mod rng;
pub mod world;

pub use clock::DeltaClock;
pub use error::{EngineError, Result};
pub use fov::{fix_circular, fix_directional, fix_wall, flood_fov, FovEngine, SightMap};
pub use map::{CarveView, Grid, PassableView, Tile, DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH};
pub use world::{Act, Entity, Item, World};
