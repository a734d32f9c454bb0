//! Grid coordinates, compass directions and the immutable lookup tables
//! shared by pathfinding, vision and unit movement.
//!
//! The grid uses screen orientation: `x` grows east, `y` grows south.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{frac_pi_4, frac_sqrt_2_2, Fixed};

/// Integer tile coordinate.
///
/// Ordering is lexicographic on `(x, y)` so positions can be used as
/// deterministic map keys.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct GridPos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridPos {
    /// Create a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The origin tile.
    pub const ZERO: Self = Self::new(0, 0);

    /// True when `other` is this cell or one of its eight neighbours.
    #[must_use]
    pub fn is_within_reach(self, other: Self) -> bool {
        (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }

    /// Absolute per-axis distance to `other`.
    #[must_use]
    pub fn abs_delta(self, other: Self) -> (u32, u32) {
        (self.x.abs_diff(other.x), self.y.abs_diff(other.y))
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl std::ops::Add for GridPos {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for GridPos {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<i32> for GridPos {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// One of the eight compass directions a unit can face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// (0, -1)
    North,
    /// (1, -1)
    NorthEast,
    /// (1, 0)
    East,
    /// (1, 1)
    SouthEast,
    /// (0, 1)
    South,
    /// (-1, 1)
    SouthWest,
    /// (-1, 0)
    West,
    /// (-1, -1)
    NorthWest,
}

/// Directions in clockwise order starting at north.
///
/// The index of a direction in this table is its [`Direction::index`]; the
/// vision cone numbers its octants against the same ordering.
pub const CLOCKWISE_ROTATION: [Direction; 8] = [
    Direction::North,
    Direction::NorthEast,
    Direction::East,
    Direction::SouthEast,
    Direction::South,
    Direction::SouthWest,
    Direction::West,
    Direction::NorthWest,
];

/// Neighbour offsets: straight moves in 0..4, diagonal moves in 4..8.
pub const NEIGHBOUR_OFFSETS: [GridPos; 8] = [
    GridPos::new(-1, 0),
    GridPos::new(1, 0),
    GridPos::new(0, -1),
    GridPos::new(0, 1),
    GridPos::new(-1, -1),
    GridPos::new(1, -1),
    GridPos::new(-1, 1),
    GridPos::new(1, 1),
];

impl Direction {
    /// Position in [`CLOCKWISE_ROTATION`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Direction at `index` (wrapping) in [`CLOCKWISE_ROTATION`].
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        CLOCKWISE_ROTATION[index % 8]
    }

    /// Unit offset for this direction.
    #[must_use]
    pub const fn offset(self) -> GridPos {
        match self {
            Self::North => GridPos::new(0, -1),
            Self::NorthEast => GridPos::new(1, -1),
            Self::East => GridPos::new(1, 0),
            Self::SouthEast => GridPos::new(1, 1),
            Self::South => GridPos::new(0, 1),
            Self::SouthWest => GridPos::new(-1, 1),
            Self::West => GridPos::new(-1, 0),
            Self::NorthWest => GridPos::new(-1, -1),
        }
    }

    /// Direction matching a neighbour delta, if the delta is a unit step.
    #[must_use]
    pub fn from_offset(delta: GridPos) -> Option<Self> {
        CLOCKWISE_ROTATION
            .iter()
            .copied()
            .find(|dir| dir.offset() == delta)
    }

    /// True for the four diagonal directions.
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        let offset = self.offset();
        offset.x != 0 && offset.y != 0
    }

    /// Next direction clockwise.
    #[must_use]
    pub const fn clockwise(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Next direction counter-clockwise.
    #[must_use]
    pub const fn counter_clockwise(self) -> Self {
        Self::from_index(self.index() + 7)
    }

    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::from_index(self.index() + 4)
    }

    /// Yaw of this direction in eighths of a turn.
    ///
    /// North faces yaw 0 and yaw grows counter-clockwise, which is the
    /// renderer's convention for its Y-axis rotation.
    #[must_use]
    pub const fn yaw_steps(self) -> u8 {
        ((8 - self.index()) % 8) as u8
    }
}

/// Rotation data for one facing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation {
    /// Yaw in radians.
    pub yaw: Fixed,
    /// Cosine of the yaw.
    pub cos: Fixed,
    /// Sine of the yaw.
    pub sin: Fixed,
}

/// Immutable rotation lookup, built once and shared by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationTable {
    rotations: [Rotation; 8],
}

impl RotationTable {
    /// Build the table for the eight yaw steps.
    #[must_use]
    pub fn new() -> Self {
        let r = frac_sqrt_2_2();
        let one = Fixed::ONE;
        let zero = Fixed::ZERO;
        // cos/sin of k * π/4 for k = 0..8.
        let cos = [one, r, zero, -r, -one, -r, zero, r];
        let sin = [zero, r, one, r, zero, -r, -one, -r];
        let step = frac_pi_4();

        let rotations = std::array::from_fn(|k| Rotation {
            yaw: step * Fixed::from_num(k as i32),
            cos: cos[k],
            sin: sin[k],
        });
        Self { rotations }
    }

    /// Rotation for a facing direction.
    #[must_use]
    pub fn get(&self, direction: Direction) -> Rotation {
        self.rotations[direction.yaw_steps() as usize]
    }
}

impl Default for RotationTable {
    fn default() -> Self {
        Self::new()
    }
}
