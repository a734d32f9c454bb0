//! Simulation tuning parameters.
//!
//! Every field has a default, so a RON file only needs to name the values it
//! changes.
//!
//! # Example RON
//!
//! ```ron
//! GameConfig(
//!     ticks_per_tile: 20,
//!     cone_half_width: 2,
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::Fixed;
use crate::pathfinding::DiagonalRule;
use crate::vision::{ConeTable, MAX_CONE_HALF_WIDTH};

/// Tunables shared by every unit and prop in a world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Ticks a unit needs to cross one tile along an axis.
    pub ticks_per_tile: u32,
    /// Vision radius in tiles.
    pub vision_radius: u32,
    /// Octants on each side of the facing direction.
    pub cone_half_width: u8,
    /// Ticks an objective interaction takes.
    pub interaction_ticks: u32,
    /// Ticks a unit waits on an occupied tile before giving up.
    pub max_wait_ticks: u32,
    /// Starting guard health.
    pub guard_health: i32,
    /// Starting enemy health.
    pub enemy_health: i32,
    /// Damage a guard deals when a fight resolves.
    pub guard_damage: i32,
    /// Damage a trap deals when triggered.
    pub trap_damage: i32,
    /// Triggers before a trap is spent.
    pub trap_ammunition: u32,
    /// Ticks between spawn waves.
    pub spawn_interval: u32,
    /// Enemies per spawn point.
    pub spawn_count: u32,
    /// Corner-cutting rule for diagonal steps.
    pub diagonal_rule: DiagonalRule,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            ticks_per_tile: 40,
            vision_radius: 6,
            cone_half_width: 1,
            interaction_ticks: 60,
            max_wait_ticks: 30,
            guard_health: 3,
            enemy_health: 2,
            guard_damage: 1,
            trap_damage: 1,
            trap_ammunition: 1,
            spawn_interval: 180,
            spawn_count: 2,
            diagonal_rule: DiagonalRule::Always,
        }
    }
}

impl GameConfig {
    /// Parse a config from RON and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] on a parse error or if any
    /// value fails [`GameConfig::validate`].
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self =
            ron::from_str(source).map_err(|e| GameError::InvalidConfig(e.to_string()))?;
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(GameError::InvalidConfig(errors.join("; ")))
        }
    }

    /// Tiles moved per tick along an axis.
    #[must_use]
    pub fn move_speed(&self) -> Fixed {
        Fixed::ONE / Fixed::from_num(self.ticks_per_tile.max(1))
    }

    /// Cone table for the configured half-width.
    #[must_use]
    pub fn cone_table(&self) -> ConeTable {
        ConeTable::new(self.cone_half_width)
    }

    /// Validate value ranges.
    ///
    /// Returns a list of validation errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.ticks_per_tile == 0 {
            errors.push("ticks_per_tile must be positive".to_string());
        }
        if !(1..=MAX_CONE_HALF_WIDTH).contains(&self.cone_half_width) {
            errors.push(format!(
                "cone_half_width must be in 1..={MAX_CONE_HALF_WIDTH}, got {}",
                self.cone_half_width
            ));
        }
        if self.guard_health <= 0 {
            errors.push("guard_health must be positive".to_string());
        }
        if self.enemy_health <= 0 {
            errors.push("enemy_health must be positive".to_string());
        }
        if self.guard_damage < 0 || self.trap_damage < 0 {
            errors.push("damage values cannot be negative".to_string());
        }
        if self.spawn_interval == 0 {
            errors.push("spawn_interval must be positive".to_string());
        }

        errors
    }
}
