//! Renderer-facing output of a unit: placement matrix and animation token.

use serde::{Deserialize, Serialize};

use crate::grid::Rotation;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// World placement of a unit.
///
/// Tile `(x, y)` maps to world `(x, 0, y)`; the renderer's up axis is `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transform {
    /// World-space translation.
    pub translation: [Fixed; 3],
    /// Rotation about the up axis.
    pub rotation: Rotation,
}

impl Transform {
    /// Transform for a unit at `position` with `rotation`.
    #[must_use]
    pub fn new(position: Vec2Fixed, rotation: Rotation) -> Self {
        Self {
            translation: [position.x, Fixed::ZERO, position.y],
            rotation,
        }
    }

    /// Yaw in radians.
    #[must_use]
    pub const fn yaw(&self) -> Fixed {
        self.rotation.yaw
    }

    /// Rotation about `y` followed by the translation, in row-vector form
    /// (the translation sits in the last row).
    #[must_use]
    pub fn matrix(&self) -> [[Fixed; 4]; 4] {
        let c = self.rotation.cos;
        let s = self.rotation.sin;
        let zero = Fixed::ZERO;
        let one = Fixed::ONE;
        let [tx, ty, tz] = self.translation;
        [
            [c, zero, -s, zero],
            [zero, one, zero, zero],
            [s, zero, c, zero],
            [tx, ty, tz, one],
        ]
    }
}

/// Animation the renderer should play for a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnimationState {
    /// Standing still.
    #[default]
    Idle,
    /// Walking between tiles.
    Walk,
    /// Fighting an adjacent unit.
    Fight,
    /// Picking up or interacting with an object.
    Pickup,
}

impl AnimationState {
    /// Token understood by the renderer.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Walk => "walk",
            Self::Fight => "fight",
            Self::Pickup => "pickup",
        }
    }
}

/// Serializable snapshot of a transform, as raw fixed-point bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformSnapshot {
    /// World x.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// World z.
    #[serde(with = "fixed_serde")]
    pub z: Fixed,
    /// Yaw in radians.
    #[serde(with = "fixed_serde")]
    pub yaw: Fixed,
}

impl From<&Transform> for TransformSnapshot {
    fn from(transform: &Transform) -> Self {
        Self {
            x: transform.translation[0],
            z: transform.translation[2],
            yaw: transform.rotation.yaw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Direction, RotationTable};

    #[test]
    fn test_identity_rotation_for_north() {
        let table = RotationTable::new();
        let position = Vec2Fixed::new(Fixed::from_num(3), Fixed::from_num(4));
        let transform = Transform::new(position, table.get(Direction::North));
        let m = transform.matrix();

        assert_eq!(m[0], [Fixed::ONE, Fixed::ZERO, Fixed::ZERO, Fixed::ZERO]);
        assert_eq!(m[2], [Fixed::ZERO, Fixed::ZERO, Fixed::ONE, Fixed::ZERO]);
        assert_eq!(m[3], [Fixed::from_num(3), Fixed::ZERO, Fixed::from_num(4), Fixed::ONE]);
    }

    #[test]
    fn test_west_quarter_turn() {
        let table = RotationTable::new();
        let transform = Transform::new(Vec2Fixed::ZERO, table.get(Direction::West));
        let m = transform.matrix();
        assert_eq!(m[0][2], -Fixed::ONE);
        assert_eq!(m[2][0], Fixed::ONE);
        assert_eq!(transform.yaw(), table.get(Direction::West).yaw);
    }

    #[test]
    fn test_animation_tokens() {
        assert_eq!(AnimationState::Idle.as_str(), "idle");
        assert_eq!(AnimationState::Walk.as_str(), "walk");
        assert_eq!(AnimationState::Fight.as_str(), "fight");
        assert_eq!(AnimationState::Pickup.as_str(), "pickup");
    }

    #[test]
    fn test_snapshot() {
        let table = RotationTable::new();
        let transform = Transform::new(
            Vec2Fixed::new(Fixed::from_num(2), Fixed::from_num(5)),
            table.get(Direction::South),
        );
        let snapshot = TransformSnapshot::from(&transform);
        assert_eq!(snapshot.x, Fixed::from_num(2));
        assert_eq!(snapshot.z, Fixed::from_num(5));
        assert_eq!(snapshot.yaw, table.get(Direction::South).yaw);
    }
}
