//! Error types for the tactics simulation.
//!
//! Nothing in the core is fatal: every error degrades to "unit stays put" or
//! "placement rejected". Hot-path queries on the tile map keep their boolean
//! or `Option` contracts; fallible entry points return [`Result`].

use thiserror::Error;

use crate::grid::GridPos;
use crate::tilemap::{ObjectId, TileCategory};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// A coordinate lies outside the grid extents.
    #[error("Position ({x}, {y}) is outside the grid")]
    OutOfBounds {
        /// X coordinate.
        x: i32,
        /// Y coordinate.
        y: i32,
    },

    /// The pathfinder exhausted the search space without reaching the goal.
    #[error("No path from {from} to {to}")]
    PathNotFound {
        /// Search start.
        from: GridPos,
        /// Requested goal.
        to: GridPos,
    },

    /// A cell already holds an occupant of the same category.
    #[error("Cannot place {category:?} at ({x}, {y}): tile is occupied")]
    OccupancyConflict {
        /// X coordinate.
        x: i32,
        /// Y coordinate.
        y: i32,
        /// Category that was rejected.
        category: TileCategory,
    },

    /// No object with this id exists.
    #[error("Unknown object: {0}")]
    UnknownObject(ObjectId),

    /// Level data failed validation or parsing.
    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    /// Configuration failed validation or parsing.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Growing the tile map would overflow its coordinate range.
    #[error("Cannot grow a {width}x{height} tile map by {offset} tiles per side")]
    MapTooLarge {
        /// Current width.
        width: u32,
        /// Current height.
        height: u32,
        /// Requested growth per side.
        offset: u32,
    },

    /// Snapshot encoding or decoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl GameError {
    /// Convenience constructor for [`GameError::OutOfBounds`].
    #[must_use]
    pub const fn out_of_bounds(pos: GridPos) -> Self {
        Self::OutOfBounds { x: pos.x, y: pos.y }
    }
}
