use bracket_geometry::prelude::Point;
use thiserror::Error;

/// Errors surfaced by the engine core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No coordinate anywhere on the grid satisfies the predicate.
    #[error("no coordinate satisfies the predicate")]
    NoCandidate,

    /// A sight query was given a coordinate outside the grid.
    #[error("coordinate ({}, {}) is outside the grid", .0.x, .0.y)]
    OutOfBounds(Point),

    /// A generator ran out of attempts without an acceptable map.
    #[error("generation failed after {attempts} attempts")]
    GenerationFailed { attempts: u32 },

    /// The grid is too small for the requested generator.
    #[error("grid {cols}x{rows} is too small for this generator")]
    GridTooSmall { cols: i32, rows: i32 },
}

pub type Result<T> = std::result::Result<T, EngineError>;
