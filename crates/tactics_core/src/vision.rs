//! Forward vision cone via recursive shadowcasting.
//!
//! The area around the origin is split into eight octants. Octant `i` spans
//! from `CLOCKWISE_ROTATION[i]` to `CLOCKWISE_ROTATION[i + 1]`, so it is
//! bounded by one straight and one diagonal direction. Each octant is scanned
//! row by row moving away from the origin while a wedge of open slopes is
//! narrowed (and split) by opaque cells.
//!
//! Slopes are exact integer fractions; no floating point is involved.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::grid::{Direction, GridPos, CLOCKWISE_ROTATION};
use crate::tilemap::TileMap;

/// Widest half-width: every octant is active.
pub const MAX_CONE_HALF_WIDTH: u8 = 4;

/// Exact slope `num / den` with `den > 0`.
#[derive(Debug, Clone, Copy)]
struct Slope {
    num: i64,
    den: i64,
}

impl Slope {
    const fn new(num: i64, den: i64) -> Self {
        Self { num, den }
    }
}

impl PartialEq for Slope {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Slope {}

impl PartialOrd for Slope {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slope {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.num * other.den).cmp(&(other.num * self.den))
    }
}

/// Per-direction table of active octants.
///
/// With half-width `w`, a unit facing direction index `d` sees through
/// octants `d - w ..= d + w - 1` (wrapping). `w = 1` is a 90° cone and
/// `w = 4` is full 360° sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConeTable {
    half_width: u8,
    masks: [u8; 8],
}

impl ConeTable {
    /// Build the table; `half_width` is clamped to `1..=4`.
    #[must_use]
    pub fn new(half_width: u8) -> Self {
        let half_width = half_width.clamp(1, MAX_CONE_HALF_WIDTH);
        let w = usize::from(half_width);
        let masks = std::array::from_fn(|dir| {
            (0..2 * w).fold(0u8, |mask, k| {
                let octant = (dir + 8 - w + k) % 8;
                mask | (1 << octant)
            })
        });
        Self { half_width, masks }
    }

    /// Half-width the table was built with.
    #[must_use]
    pub const fn half_width(&self) -> u8 {
        self.half_width
    }

    /// True if `octant` is scanned when facing `direction`.
    #[must_use]
    pub const fn is_active(&self, direction: Direction, octant: usize) -> bool {
        self.masks[direction.index()] & (1 << (octant % 8)) != 0
    }

    /// Active octants for `direction`, ascending.
    pub fn octants(&self, direction: Direction) -> impl Iterator<Item = usize> + '_ {
        (0..8).filter(move |&octant| self.is_active(direction, octant))
    }
}

impl Default for ConeTable {
    fn default() -> Self {
        Self::new(1)
    }
}

/// One octant scan in progress.
struct OctantScan<'a> {
    tilemap: &'a TileMap,
    origin: GridPos,
    radius: i64,
    /// Straight direction bounding the octant.
    axis: GridPos,
    /// Unit step from the straight edge toward the diagonal edge.
    perp: GridPos,
    visible: &'a mut BTreeSet<GridPos>,
}

impl OctantScan<'_> {
    fn cell(&self, depth: i64, col: i64) -> GridPos {
        self.origin + self.axis * depth as i32 + self.perp * col as i32
    }

    /// Scan rows from `depth` outward inside the wedge `[lo, hi]`.
    fn scan(&mut self, mut depth: i64, mut lo: Slope, hi: Slope) {
        while depth <= self.radius && lo < hi {
            let mut prev_opaque = false;

            for col in 0..=depth {
                let bottom = Slope::new(2 * col - 1, 2 * depth + 1);
                let top = Slope::new(2 * col + 1, 2 * depth - 1);
                if top <= lo {
                    continue;
                }
                if bottom >= hi {
                    break;
                }

                let cell = self.cell(depth, col);
                if depth * depth + col * col <= self.radius * self.radius
                    && self.tilemap.in_bounds(cell)
                {
                    self.visible.insert(cell);
                }

                let opaque = self.tilemap.is_opaque(cell);
                if opaque {
                    if !prev_opaque {
                        self.scan(depth + 1, lo, bottom);
                    }
                    lo = top;
                }
                prev_opaque = opaque;
            }

            if prev_opaque {
                return;
            }
            depth += 1;
        }
    }
}

/// Visible cells from `origin` facing `direction`.
///
/// The origin itself is not included. Cells are returned sorted and without
/// duplicates; a cell is visible when it lies in bounds, within Euclidean
/// `radius` and inside the unobstructed wedge of an active octant.
#[must_use]
pub fn compute_visible_tiles(
    tilemap: &TileMap,
    origin: GridPos,
    direction: Direction,
    radius: u32,
    cone: &ConeTable,
) -> Vec<GridPos> {
    let mut visible = BTreeSet::new();
    if radius == 0 || !tilemap.in_bounds(origin) {
        return Vec::new();
    }

    for octant in cone.octants(direction) {
        let first = CLOCKWISE_ROTATION[octant];
        let second = CLOCKWISE_ROTATION[(octant + 1) % 8];
        let (straight, diagonal) = if first.is_diagonal() {
            (second, first)
        } else {
            (first, second)
        };
        let axis = straight.offset();
        let perp = diagonal.offset() - axis;

        let mut scan = OctantScan {
            tilemap,
            origin,
            radius: i64::from(radius),
            axis,
            perp,
            visible: &mut visible,
        };
        scan.scan(1, Slope::new(0, 1), Slope::new(1, 1));
    }

    visible.into_iter().collect()
}

/// A unit's vision cone and its last result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionCone {
    radius: u32,
    cone: ConeTable,
    #[serde(skip)]
    visible: Vec<GridPos>,
}

impl VisionCone {
    /// Create a cone with the given radius and table.
    #[must_use]
    pub const fn new(radius: u32, cone: ConeTable) -> Self {
        Self {
            radius,
            cone,
            visible: Vec::new(),
        }
    }

    /// Vision radius in tiles.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Recompute and return the visible cells.
    pub fn find_visible_tiles(
        &mut self,
        tilemap: &TileMap,
        origin: GridPos,
        direction: Direction,
    ) -> &[GridPos] {
        self.visible = compute_visible_tiles(tilemap, origin, direction, self.radius, &self.cone);
        tracing::trace!(%origin, ?direction, count = self.visible.len(), "Vision recomputed");
        &self.visible
    }

    /// Result of the last recomputation.
    #[must_use]
    pub fn visible_tiles(&self) -> &[GridPos] {
        &self.visible
    }

    /// True if `cell` was visible at the last recomputation.
    #[must_use]
    pub fn can_see(&self, cell: GridPos) -> bool {
        self.visible.binary_search(&cell).is_ok()
    }
}
