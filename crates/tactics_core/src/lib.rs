//! # Tactics Core
//!
//! Deterministic tile-tactics simulation: guards defend loot, enemies try to
//! steal it.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! ## Crate Structure
//!
//! - [`tilemap`] - Per-cell occupancy by category
//! - [`pathfinding`] - Cost grid and A* search with an octile heuristic
//! - [`vision`] - Octant shadowcasting restricted to a facing cone
//! - [`unit`] - Unit movement state machine
//! - [`roles`] - Guard and enemy objective evaluation
//! - [`world`] - Tick driver owning the map, units and props
//! - [`level`] - Level data loaded from RON
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod error;
pub mod grid;
pub mod level;
pub mod math;
pub mod pathfinding;
pub mod roles;
pub mod tilemap;
pub mod transform;
pub mod unit;
pub mod vision;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::GameConfig;
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{Direction, GridPos, RotationTable};
    pub use crate::level::{LevelData, LevelObject};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::pathfinding::{octile_distance, CostGrid, DiagonalRule, PathFinder};
    pub use crate::roles::{Role, TileEvaluator};
    pub use crate::tilemap::{ObjectId, TileCategory, TileMap};
    pub use crate::transform::{AnimationState, Transform};
    pub use crate::unit::{MoveState, Unit, UnitEvent};
    pub use crate::vision::{compute_visible_tiles, ConeTable, VisionCone};
    pub use crate::world::{PropKind, TickEvents, World};
}
