//! Level data: the map size and the objects placed on it.
//!
//! Levels are authored in RON:
//!
//! ```ron
//! LevelData(
//!     width: 4,
//!     height: 3,
//!     objects: [
//!         (category: Floor, x: 0, y: 0),
//!         (category: Guard, x: 0, y: 0, rotation: 2, patrol: [(x: 3, y: 0)]),
//!     ],
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::{Direction, GridPos};
use crate::tilemap::TileCategory;

/// One object placement in a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelObject {
    /// What to place.
    pub category: TileCategory,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Facing as a clockwise direction index, 0 = north.
    #[serde(default)]
    pub rotation: u8,
    /// Patrol points for a guard; ignored for other categories.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patrol: Vec<GridPos>,
}

impl LevelObject {
    /// Object at `(x, y)` facing north.
    #[must_use]
    pub const fn new(category: TileCategory, x: i32, y: i32) -> Self {
        Self {
            category,
            x,
            y,
            rotation: 0,
            patrol: Vec::new(),
        }
    }

    /// Tile the object is placed on.
    #[must_use]
    pub const fn position(&self) -> GridPos {
        GridPos::new(self.x, self.y)
    }

    /// Facing direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        Direction::from_index(self.rotation as usize)
    }
}

/// A complete level layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelData {
    /// Columns.
    pub width: u32,
    /// Rows.
    pub height: u32,
    /// Placements, applied in order.
    #[serde(default)]
    pub objects: Vec<LevelObject>,
}

impl LevelData {
    /// Parse and validate a level from RON.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLevel`] on a parse error or failed
    /// validation.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let level: Self =
            ron::from_str(source).map_err(|e| GameError::InvalidLevel(e.to_string()))?;
        let errors = level.validate();
        if errors.is_empty() {
            Ok(level)
        } else {
            Err(GameError::InvalidLevel(errors.join("; ")))
        }
    }

    /// Render the level as pretty RON.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Serialization`] if encoding fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::Serialization(e.to_string()))
    }

    /// Validate the layout.
    ///
    /// Returns a list of validation errors. Objects that fall outside the
    /// map are not errors here; the world skips them on load.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.width == 0 || self.height == 0 {
            errors.push(format!(
                "level dimensions must be positive, got {}x{}",
                self.width, self.height
            ));
        }
        for (i, object) in self.objects.iter().enumerate() {
            if object.rotation >= 8 {
                errors.push(format!(
                    "object {i} ({:?}) has rotation {}, expected 0..8",
                    object.category, object.rotation
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: &str = r"
        LevelData(
            width: 3,
            height: 2,
            objects: [
                (category: Floor, x: 0, y: 0),
                (category: Wall, x: 2, y: 1),
                (category: Guard, x: 0, y: 0, rotation: 2, patrol: [(x: 1, y: 0)]),
            ],
        )
    ";

    #[test]
    fn test_parse_level() {
        let level = LevelData::from_ron_str(LEVEL).unwrap();
        assert_eq!(level.width, 3);
        assert_eq!(level.objects.len(), 3);
        assert_eq!(level.objects[0].rotation, 0);
        assert_eq!(level.objects[2].direction(), Direction::East);
        assert_eq!(level.objects[2].patrol, vec![GridPos::new(1, 0)]);
    }

    #[test]
    fn test_ron_roundtrip() {
        let level = LevelData::from_ron_str(LEVEL).unwrap();
        let text = level.to_ron_string().unwrap();
        assert_eq!(LevelData::from_ron_str(&text).unwrap(), level);
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = LevelData::from_ron_str("LevelData(width: 0, height: 4)").unwrap_err();
        assert!(matches!(err, GameError::InvalidLevel(_)));
    }

    #[test]
    fn test_bad_rotation_reported() {
        let mut level = LevelData {
            width: 2,
            height: 2,
            objects: vec![LevelObject::new(TileCategory::Floor, 0, 0)],
        };
        assert!(level.validate().is_empty());
        level.objects[0].rotation = 9;
        assert_eq!(level.validate().len(), 1);
    }
}
