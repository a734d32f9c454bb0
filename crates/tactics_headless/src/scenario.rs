//! Scenario loading and configuration.
//!
//! A scenario bundles a level, the tunables it runs with and how long to run
//! it. The map is drawn as ASCII rows, top row first:
//!
//! | Char | Contents                  |
//! |------|---------------------------|
//! | `.`  | floor                     |
//! | `#`  | wall                      |
//! | `F`  | floor + furniture         |
//! | `L`  | floor + loot              |
//! | `S`  | floor + spawn point       |
//! | `T`  | floor + trap              |
//! | `C`  | floor + camera            |
//! | `G`  | floor + guard             |
//! | `E`  | floor + enemy             |
//! | ` `  | empty                     |
//!
//! Guards that patrol are listed under `objects` so they can carry a route.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tactics_core::config::GameConfig;
use tactics_core::error::GameError;
use tactics_core::level::{LevelData, LevelObject};
use tactics_core::tilemap::TileCategory;
use tactics_core::world::World;
use thiserror::Error;

/// Built-in demo scenario.
const HEIST_RON: &str = include_str!("../levels/heist.ron");

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read or write a file.
    #[error("Scenario IO failed: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The ASCII layout is malformed.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),
    /// The core rejected the level or config.
    #[error(transparent)]
    Game(#[from] GameError),
}

fn default_ticks() -> u64 {
    600
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Ticks to run by default.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    /// Simulation tunables.
    #[serde(default)]
    pub config: GameConfig,
    /// Map rows, top row first.
    pub layout: Vec<String>,
    /// Facing index (0 = north, clockwise) for units drawn in the layout.
    #[serde(default)]
    pub rotation: u8,
    /// Extra placements applied after the layout.
    #[serde(default)]
    pub objects: Vec<LevelObject>,
}

/// Categories drawn by one layout character, bottom layer first.
#[must_use]
pub fn glyph_categories(c: char) -> Option<&'static [TileCategory]> {
    use TileCategory::{Camera, Enemy, Floor, Furniture, Guard, Loot, Spawn, Trap, Wall};
    Some(match c {
        '.' => &[Floor],
        '#' => &[Wall],
        'F' => &[Floor, Furniture],
        'L' => &[Floor, Loot],
        'S' => &[Floor, Spawn],
        'T' => &[Floor, Trap],
        'C' => &[Floor, Camera],
        'G' => &[Floor, Guard],
        'E' => &[Floor, Enemy],
        ' ' => &[],
        _ => return None,
    })
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// The bundled vault heist.
    pub fn heist() -> Result<Self, ScenarioError> {
        Self::from_ron_str(HEIST_RON)
    }

    /// Load `path`, or the bundled heist when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ScenarioError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::heist(),
        }
    }

    /// Expand the layout and extra objects into level data.
    pub fn level(&self) -> Result<LevelData, ScenarioError> {
        let width = self
            .layout
            .iter()
            .map(|row| row.chars().count())
            .max()
            .unwrap_or(0);
        if width == 0 {
            return Err(ScenarioError::InvalidLayout("layout is empty".to_string()));
        }

        let mut objects = Vec::new();
        for (y, row) in self.layout.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                let categories = glyph_categories(c).ok_or_else(|| {
                    ScenarioError::InvalidLayout(format!("unknown character {c:?} at ({x}, {y})"))
                })?;
                for &category in categories {
                    let mut object = LevelObject::new(category, x as i32, y as i32);
                    if category.is_unit() {
                        object.rotation = self.rotation;
                    }
                    objects.push(object);
                }
            }
        }
        objects.extend(self.objects.iter().cloned());

        Ok(LevelData {
            width: width as u32,
            height: self.layout.len() as u32,
            objects,
        })
    }

    /// Build a fresh world with pathfinding initialised.
    pub fn build_world(&self) -> Result<World, ScenarioError> {
        let level = self.level()?;
        let mut world = World::from_level(&level, self.config.clone())?;
        world.init_pathfinding();
        Ok(world)
    }
}
