//! Fixed-point math utilities for deterministic simulation.
//!
//! All simulation math uses fixed-point arithmetic so that identical inputs
//! produce bit-identical unit positions, path costs and state hashes on every
//! platform.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

use crate::grid::GridPos;

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// √2, the cost of a diagonal step.
#[must_use]
pub fn sqrt_2() -> Fixed {
    Fixed::from_num(fixed::consts::SQRT_2)
}

/// √2 / 2, the per-axis speed factor for diagonal movement.
#[must_use]
pub fn frac_sqrt_2_2() -> Fixed {
    Fixed::from_num(fixed::consts::FRAC_1_SQRT_2)
}

/// π / 4, one eighth of a turn.
#[must_use]
pub fn frac_pi_4() -> Fixed {
    Fixed::from_num(fixed::consts::FRAC_PI_4)
}

/// Fixed-point 2D vector.
///
/// In world space `x` maps to the tile column and `y` to the tile row; the
/// renderer places `y` on its depth axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// World-space centre of a tile.
    #[must_use]
    pub fn from_grid(pos: GridPos) -> Self {
        Self::new(Fixed::from_num(pos.x), Fixed::from_num(pos.y))
    }

    /// Step toward `target` by `step` on each axis, never overshooting.
    ///
    /// `step` holds the signed per-axis delta; an axis whose step would carry
    /// it past the target snaps onto the target instead.
    #[must_use]
    pub fn step_towards(self, target: Self, step: Self) -> Self {
        Self::new(
            approach(self.x, target.x, step.x),
            approach(self.y, target.y, step.y),
        )
    }
}

fn approach(current: Fixed, target: Fixed, step: Fixed) -> Fixed {
    if step == Fixed::ZERO {
        return current;
    }
    let next = current + step;
    if (step > Fixed::ZERO && next >= target) || (step < Fixed::ZERO && next <= target) {
        target
    } else {
        next
    }
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_grid() {
        let v = Vec2Fixed::from_grid(GridPos::new(3, -2));
        assert_eq!(v, Vec2Fixed::new(Fixed::from_num(3), Fixed::from_num(-2)));
        assert_eq!(v - v, Vec2Fixed::ZERO);
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(40);
        let b = Fixed::from_num(1) / Fixed::from_num(40);
        assert_eq!(a, b);
        assert_eq!(a * sqrt_2(), b * sqrt_2());
    }

    #[test]
    fn test_sqrt_constants() {
        let two = sqrt_2() * sqrt_2();
        let epsilon = Fixed::ONE / Fixed::from_num(1_000_000);
        assert!((two - Fixed::from_num(2)).abs() < epsilon);

        let half = frac_sqrt_2_2() * sqrt_2();
        assert!((half - Fixed::ONE).abs() < epsilon);
    }

    #[test]
    fn test_step_towards_does_not_overshoot() {
        let start = Vec2Fixed::ZERO;
        let target = Vec2Fixed::new(Fixed::ONE, Fixed::ZERO);
        let step = Vec2Fixed::new(Fixed::from_num(0.75), Fixed::ZERO);

        let first = start.step_towards(target, step);
        assert_eq!(first.x, Fixed::from_num(0.75));

        let second = first.step_towards(target, step);
        assert_eq!(second, target);
    }

    #[test]
    fn test_step_towards_negative_direction() {
        let start = Vec2Fixed::new(Fixed::from_num(2), Fixed::from_num(2));
        let target = Vec2Fixed::new(Fixed::ONE, Fixed::ONE);
        let step = Vec2Fixed::new(Fixed::from_num(-0.5), Fixed::from_num(-0.5));

        let mid = start.step_towards(target, step);
        assert_eq!(mid, Vec2Fixed::new(Fixed::from_num(1.5), Fixed::from_num(1.5)));
        assert_eq!(mid.step_towards(target, step), target);
    }
}
