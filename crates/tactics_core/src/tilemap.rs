//! Tile occupancy map.
//!
//! Every cell holds at most one occupant per [`TileCategory`]. Occupants are
//! referred to by [`ObjectId`]; the map keeps a reverse index so an object's
//! tile can be looked up without scanning, and add/remove keep both sides of
//! that back-reference consistent.
//!
//! All entry points reject out-of-bounds coordinates by returning `false`,
//! `None` or an empty result: picking and placement code produces borderline
//! coordinates every frame.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::GridPos;

/// Identifier of a game object registered on the map.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Occupancy category an object registers itself under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TileCategory {
    /// Walkable ground.
    Floor,
    /// Impassable and opaque.
    Wall,
    /// An objective enemies try to steal.
    Loot,
    /// Enemy entry and exit point.
    Spawn,
    /// Hostile unit.
    Enemy,
    /// Player-controlled unit.
    Guard,
    /// Trap trigger tile.
    Trap,
    /// Impassable but see-through.
    Furniture,
    /// Security camera.
    Camera,
}

/// Number of occupancy categories.
pub const CATEGORY_COUNT: usize = 9;

impl TileCategory {
    /// All categories in slot order.
    pub const ALL: [Self; CATEGORY_COUNT] = [
        Self::Floor,
        Self::Wall,
        Self::Loot,
        Self::Spawn,
        Self::Enemy,
        Self::Guard,
        Self::Trap,
        Self::Furniture,
        Self::Camera,
    ];

    /// Slot of this category inside a cell.
    #[must_use]
    pub const fn slot(self) -> usize {
        self as usize
    }

    /// Categories that cannot be walked through.
    #[must_use]
    pub const fn is_impassable(self) -> bool {
        matches!(self, Self::Wall | Self::Furniture)
    }

    /// Categories that block line of sight.
    #[must_use]
    pub const fn is_opaque(self) -> bool {
        matches!(self, Self::Wall)
    }

    /// Guards and enemies.
    #[must_use]
    pub const fn is_unit(self) -> bool {
        matches!(self, Self::Guard | Self::Enemy)
    }
}

/// Per-category occupant slots of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
struct Cell {
    slots: [Option<ObjectId>; CATEGORY_COUNT],
}

impl Cell {
    fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    fn has(&self, category: TileCategory) -> bool {
        self.slots[category.slot()].is_some()
    }
}

/// Where an object is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Tile the object occupies.
    pub pos: GridPos,
    /// Category it is registered under.
    pub category: TileCategory,
}

/// Fixed-size grid of occupancy cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMap {
    width: u32,
    height: u32,
    /// Row-major cells.
    cells: Vec<Cell>,
    /// Object -> tile back-references.
    placements: HashMap<ObjectId, Placement>,
}

impl TileMap {
    /// Create an empty map.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "TileMap width must be positive");
        assert!(height > 0, "TileMap height must be positive");

        Self {
            width,
            height,
            cells: vec![Cell::default(); (width as usize) * (height as usize)],
            placements: HashMap::new(),
        }
    }

    /// Map width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Map height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of registered objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.placements.len()
    }

    /// Check if a position is inside the map.
    #[must_use]
    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    #[inline]
    fn index(&self, pos: GridPos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y as usize) * (self.width as usize) + (pos.x as usize))
    }

    fn cell(&self, pos: GridPos) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    /// Register `id` under `category` at `pos`.
    ///
    /// Fails if `pos` is out of bounds, the cell already holds an occupant of
    /// the same category, or `id` is already registered somewhere.
    pub fn add_object(&mut self, pos: GridPos, id: ObjectId, category: TileCategory) -> bool {
        let Some(index) = self.index(pos) else {
            return false;
        };
        if self.placements.contains_key(&id) {
            return false;
        }
        let slot = &mut self.cells[index].slots[category.slot()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(id);
        self.placements.insert(id, Placement { pos, category });
        self.debug_validate();
        true
    }

    /// Remove an object wherever it is registered.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        let Some(placement) = self.placements.remove(&id) else {
            return false;
        };
        if let Some(index) = self.index(placement.pos) {
            self.cells[index].slots[placement.category.slot()] = None;
        }
        self.debug_validate();
        true
    }

    /// Remove whichever object occupies `category` at `pos`.
    pub fn remove_object_at(&mut self, pos: GridPos, category: TileCategory) -> bool {
        match self.object_on_tile(pos, category) {
            Some(id) => self.remove_object(id),
            None => false,
        }
    }

    /// Move a registered object to `to`, vacating its old cell first.
    ///
    /// On failure the object stays registered where it was. Moving onto the
    /// tile it already occupies succeeds without changes.
    pub fn move_object(&mut self, id: ObjectId, to: GridPos) -> bool {
        let Some(placement) = self.placements.get(&id).copied() else {
            return false;
        };
        if placement.pos == to {
            return true;
        }
        self.remove_object(id);
        if self.add_object(to, id, placement.category) {
            true
        } else {
            let restored = self.add_object(placement.pos, id, placement.category);
            debug_assert!(restored, "vacated cell must accept its previous occupant");
            false
        }
    }

    /// Tile and category of a registered object.
    #[must_use]
    pub fn locate(&self, id: ObjectId) -> Option<Placement> {
        self.placements.get(&id).copied()
    }

    /// Occupant of `category` at `pos`.
    #[must_use]
    pub fn object_on_tile(&self, pos: GridPos, category: TileCategory) -> Option<ObjectId> {
        self.cell(pos).and_then(|cell| cell.slots[category.slot()])
    }

    /// All occupants at `pos`, across categories.
    #[must_use]
    pub fn all_objects_on_tile(&self, pos: GridPos) -> Vec<(ObjectId, TileCategory)> {
        let Some(cell) = self.cell(pos) else {
            return Vec::new();
        };
        TileCategory::ALL
            .iter()
            .filter_map(|&category| cell.slots[category.slot()].map(|id| (id, category)))
            .collect()
    }

    /// Check whether an occupant of `category` stands on `pos`.
    #[must_use]
    pub fn is_type_on_tile(&self, pos: GridPos, category: TileCategory) -> bool {
        self.cell(pos).is_some_and(|cell| cell.has(category))
    }

    /// Wall predicate.
    #[must_use]
    pub fn is_wall_on_tile(&self, pos: GridPos) -> bool {
        self.is_type_on_tile(pos, TileCategory::Wall)
    }

    /// Floor predicate.
    #[must_use]
    pub fn is_floor_on_tile(&self, pos: GridPos) -> bool {
        self.is_type_on_tile(pos, TileCategory::Floor)
    }

    /// Enemy predicate.
    #[must_use]
    pub fn is_enemy_on_tile(&self, pos: GridPos) -> bool {
        self.is_type_on_tile(pos, TileCategory::Enemy)
    }

    /// Guard predicate.
    #[must_use]
    pub fn is_guard_on_tile(&self, pos: GridPos) -> bool {
        self.is_type_on_tile(pos, TileCategory::Guard)
    }

    /// Trap predicate.
    #[must_use]
    pub fn is_trap_on_tile(&self, pos: GridPos) -> bool {
        self.is_type_on_tile(pos, TileCategory::Trap)
    }

    /// Objective (loot) predicate.
    #[must_use]
    pub fn is_objective_on_tile(&self, pos: GridPos) -> bool {
        self.is_type_on_tile(pos, TileCategory::Loot)
    }

    /// Furniture predicate.
    #[must_use]
    pub fn is_furniture_on_tile(&self, pos: GridPos) -> bool {
        self.is_type_on_tile(pos, TileCategory::Furniture)
    }

    /// Spawn point predicate.
    #[must_use]
    pub fn is_spawn_on_tile(&self, pos: GridPos) -> bool {
        self.is_type_on_tile(pos, TileCategory::Spawn)
    }

    /// Camera predicate.
    #[must_use]
    pub fn is_camera_on_tile(&self, pos: GridPos) -> bool {
        self.is_type_on_tile(pos, TileCategory::Camera)
    }

    /// True for an in-bounds cell with no occupants at all.
    #[must_use]
    pub fn is_empty_tile(&self, pos: GridPos) -> bool {
        self.cell(pos).is_some_and(Cell::is_empty)
    }

    /// True if the cell holds a wall or furniture. Out of bounds counts as
    /// blocked.
    #[must_use]
    pub fn is_blocked(&self, pos: GridPos) -> bool {
        self.cell(pos).map_or(true, |cell| {
            TileCategory::ALL
                .iter()
                .any(|c| c.is_impassable() && cell.has(*c))
        })
    }

    /// True if the cell blocks line of sight. Out of bounds counts as opaque.
    #[must_use]
    pub fn is_opaque(&self, pos: GridPos) -> bool {
        self.cell(pos).map_or(true, |cell| {
            TileCategory::ALL
                .iter()
                .any(|c| c.is_opaque() && cell.has(*c))
        })
    }

    /// True if a unit could stand on `pos`: in bounds, floored, not blocked.
    #[must_use]
    pub fn can_place_object(&self, pos: GridPos) -> bool {
        self.is_floor_on_tile(pos) && !self.is_blocked(pos)
    }

    /// Placement legality for a new object of `category` at `pos`.
    #[must_use]
    pub fn is_placeable(&self, pos: GridPos, category: TileCategory) -> bool {
        let Some(cell) = self.cell(pos) else {
            return false;
        };
        if cell.has(category) {
            return false;
        }
        let has_unit = cell.has(TileCategory::Guard) || cell.has(TileCategory::Enemy);

        match category {
            TileCategory::Floor => true,
            TileCategory::Wall | TileCategory::Furniture => {
                !has_unit
                    && !cell.has(TileCategory::Trap)
                    && !cell.has(TileCategory::Loot)
                    && !cell.has(TileCategory::Spawn)
                    && !self.is_blocked(pos)
            }
            TileCategory::Guard | TileCategory::Enemy => {
                self.can_place_object(pos) && !cell.has(TileCategory::Trap)
            }
            TileCategory::Trap => {
                self.can_place_object(pos)
                    && !has_unit
                    && !cell.has(TileCategory::Loot)
                    && !cell.has(TileCategory::Spawn)
            }
            TileCategory::Loot | TileCategory::Spawn => self.can_place_object(pos),
            TileCategory::Camera => {
                cell.has(TileCategory::Floor) || cell.has(TileCategory::Wall)
            }
        }
    }

    /// Iterate over every registered object with its placement, in row-major
    /// cell order and category order within a cell.
    pub fn iter_objects(&self) -> impl Iterator<Item = (ObjectId, Placement)> + '_ {
        let width = self.width as usize;
        self.cells.iter().enumerate().flat_map(move |(i, cell)| {
            let pos = GridPos::new((i % width) as i32, (i / width) as i32);
            TileCategory::ALL.into_iter().filter_map(move |category| {
                cell.slots[category.slot()].map(|id| (id, Placement { pos, category }))
            })
        })
    }

    /// Copy of this map grown by `offset` tiles on every side.
    ///
    /// Every occupant is re-added at `(x + offset, y + offset)`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MapTooLarge`] if either grown extent would not
    /// fit a [`GridPos`] coordinate.
    pub fn enlarge(&self, offset: u32) -> Result<Self> {
        if offset == 0 {
            return Ok(self.clone());
        }
        let too_large = GameError::MapTooLarge {
            width: self.width,
            height: self.height,
            offset,
        };
        let (Some(width), Some(height), Ok(shift)) = (
            grown_extent(self.width, offset),
            grown_extent(self.height, offset),
            i32::try_from(offset),
        ) else {
            tracing::warn!(
                width = self.width,
                height = self.height,
                offset,
                "Tile map growth rejected"
            );
            return Err(too_large);
        };
        let shift = GridPos::new(shift, shift);
        let mut large = Self::new(width, height);
        for (id, placement) in self.iter_objects() {
            let added = large.add_object(placement.pos + shift, id, placement.category);
            debug_assert!(added, "enlarged map must accept every occupant");
        }
        tracing::info!(
            width = large.width,
            height = large.height,
            offset,
            "Enlarged tile map"
        );
        Ok(large)
    }

    /// Tight bounding box `(min, max)` of all non-empty cells.
    ///
    /// Rows are scanned for the first and last non-empty row, then columns
    /// for the first and last non-empty column.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(GridPos, GridPos)> {
        let occupied = |x: u32, y: u32| !self.is_empty_tile(GridPos::new(x as i32, y as i32));
        let row_has = |y: u32| (0..self.width).any(|x| occupied(x, y));
        let col_has = |x: u32| (0..self.height).any(|y| occupied(x, y));

        let min_y = (0..self.height).find(|&y| row_has(y))?;
        let max_y = (0..self.height).rev().find(|&y| row_has(y))?;
        let min_x = (0..self.width).find(|&x| col_has(x))?;
        let max_x = (0..self.width).rev().find(|&x| col_has(x))?;

        Some((
            GridPos::new(min_x as i32, min_y as i32),
            GridPos::new(max_x as i32, max_y as i32),
        ))
    }

    /// Shrink the map to the bounding box of its occupants.
    ///
    /// Returns the new map and the translation applied to every occupant
    /// (always zero or negative). An empty map is returned unchanged.
    #[must_use]
    pub fn minimize(self) -> (Self, GridPos) {
        let Some((min, max)) = self.bounding_box() else {
            return (self, GridPos::ZERO);
        };
        let width = (max.x - min.x + 1) as u32;
        let height = (max.y - min.y + 1) as u32;
        if width == self.width && height == self.height {
            return (self, GridPos::ZERO);
        }

        let shift = GridPos::ZERO - min;
        let mut small = Self::new(width, height);
        for (id, placement) in self.iter_objects() {
            let added = small.add_object(placement.pos + shift, id, placement.category);
            debug_assert!(added, "minimized map must accept every occupant");
        }
        tracing::info!(width, height, "Minimized tile map");
        (small, shift)
    }

    #[cfg(feature = "debug-validation")]
    fn debug_validate(&self) {
        for (id, placement) in &self.placements {
            assert_eq!(
                self.object_on_tile(placement.pos, placement.category),
                Some(*id),
                "back-reference for {id} is stale"
            );
        }
        let registered = self.cells.iter().flat_map(|c| c.slots.iter()).flatten().count();
        assert_eq!(registered, self.placements.len(), "cell slots and index disagree");
    }

    #[cfg(not(feature = "debug-validation"))]
    #[inline]
    fn debug_validate(&self) {}
}

/// `extent + 2 * offset`, if the result is a valid [`GridPos`] extent.
fn grown_extent(extent: u32, offset: u32) -> Option<u32> {
    let grown = offset.checked_mul(2)?.checked_add(extent)?;
    i32::try_from(grown).ok().map(|_| grown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: i32, y: i32) -> GridPos {
        GridPos::new(x, y)
    }

    fn floored(width: u32, height: u32) -> TileMap {
        let mut map = TileMap::new(width, height);
        let mut next = 1000;
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                assert!(map.add_object(pos(x, y), ObjectId(next), TileCategory::Floor));
                next += 1;
            }
        }
        map
    }

    #[test]
    fn test_add_and_query() {
        let mut map = TileMap::new(4, 4);
        assert!(map.add_object(pos(1, 2), ObjectId(1), TileCategory::Guard));
        assert!(map.is_guard_on_tile(pos(1, 2)));
        assert_eq!(map.object_on_tile(pos(1, 2), TileCategory::Guard), Some(ObjectId(1)));
        assert_eq!(
            map.locate(ObjectId(1)),
            Some(Placement {
                pos: pos(1, 2),
                category: TileCategory::Guard
            })
        );
    }

    #[test]
    fn test_same_category_is_exclusive() {
        let mut map = TileMap::new(4, 4);
        assert!(map.add_object(pos(0, 0), ObjectId(1), TileCategory::Enemy));
        assert!(!map.add_object(pos(0, 0), ObjectId(2), TileCategory::Enemy));
        // Different categories share a cell.
        assert!(map.add_object(pos(0, 0), ObjectId(3), TileCategory::Floor));
        assert_eq!(map.all_objects_on_tile(pos(0, 0)).len(), 2);
    }

    #[test]
    fn test_out_of_bounds_is_rejected() {
        let mut map = TileMap::new(3, 3);
        assert!(!map.add_object(pos(3, 0), ObjectId(1), TileCategory::Floor));
        assert!(!map.add_object(pos(-1, 0), ObjectId(1), TileCategory::Floor));
        assert!(!map.is_floor_on_tile(pos(-1, -1)));
        assert!(map.all_objects_on_tile(pos(10, 10)).is_empty());
        assert!(map.is_blocked(pos(5, 5)));
        assert!(!map.is_empty_tile(pos(5, 5)));
    }

    #[test]
    fn test_id_cannot_be_registered_twice() {
        let mut map = TileMap::new(3, 3);
        assert!(map.add_object(pos(0, 0), ObjectId(7), TileCategory::Trap));
        assert!(!map.add_object(pos(1, 1), ObjectId(7), TileCategory::Trap));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut map = TileMap::new(3, 3);
        assert!(!map.remove_object(ObjectId(42)));
        assert!(!map.remove_object_at(pos(1, 1), TileCategory::Loot));
        assert!(!map.remove_object_at(pos(9, 9), TileCategory::Loot));
    }

    #[test]
    fn test_remove_clears_both_sides() {
        let mut map = TileMap::new(3, 3);
        map.add_object(pos(2, 2), ObjectId(5), TileCategory::Loot);
        assert!(map.remove_object_at(pos(2, 2), TileCategory::Loot));
        assert!(!map.is_objective_on_tile(pos(2, 2)));
        assert_eq!(map.locate(ObjectId(5)), None);
        assert!(map.is_empty_tile(pos(2, 2)));
    }

    #[test]
    fn test_move_object() {
        let mut map = TileMap::new(3, 3);
        map.add_object(pos(0, 0), ObjectId(1), TileCategory::Guard);
        map.add_object(pos(2, 0), ObjectId(2), TileCategory::Guard);

        assert!(map.move_object(ObjectId(1), pos(1, 0)));
        assert!(map.is_empty_tile(pos(0, 0)));
        assert_eq!(map.locate(ObjectId(1)).map(|p| p.pos), Some(pos(1, 0)));

        // Blocked by another guard: stays put.
        assert!(!map.move_object(ObjectId(1), pos(2, 0)));
        assert_eq!(map.locate(ObjectId(1)).map(|p| p.pos), Some(pos(1, 0)));

        assert!(!map.move_object(ObjectId(99), pos(0, 0)));
    }

    #[test]
    fn test_blocking_and_opacity() {
        let mut map = floored(3, 1);
        map.add_object(pos(0, 0), ObjectId(1), TileCategory::Wall);
        map.add_object(pos(1, 0), ObjectId(2), TileCategory::Furniture);
        assert!(map.is_blocked(pos(0, 0)));
        assert!(map.is_blocked(pos(1, 0)));
        assert!(!map.is_blocked(pos(2, 0)));
        assert!(map.is_opaque(pos(0, 0)));
        assert!(!map.is_opaque(pos(1, 0)));
    }

    #[test]
    fn test_placement_rules() {
        let mut map = floored(4, 1);
        map.add_object(pos(0, 0), ObjectId(1), TileCategory::Trap);
        map.add_object(pos(1, 0), ObjectId(2), TileCategory::Enemy);
        map.add_object(pos(2, 0), ObjectId(3), TileCategory::Wall);

        // Units cannot stand on traps.
        assert!(!map.is_placeable(pos(0, 0), TileCategory::Guard));
        // Traps cannot go under units.
        assert!(!map.is_placeable(pos(1, 0), TileCategory::Trap));
        // Nothing walkable goes into walls.
        assert!(!map.is_placeable(pos(2, 0), TileCategory::Loot));
        assert!(map.is_placeable(pos(2, 0), TileCategory::Camera));
        // Free floor accepts everything.
        assert!(map.is_placeable(pos(3, 0), TileCategory::Guard));
        assert!(map.is_placeable(pos(3, 0), TileCategory::Trap));
        assert!(map.is_placeable(pos(3, 0), TileCategory::Wall));
        assert!(!map.is_placeable(pos(4, 0), TileCategory::Floor));
    }

    #[test]
    fn test_units_need_floor() {
        let map = TileMap::new(2, 2);
        assert!(!map.can_place_object(pos(0, 0)));
        assert!(!map.is_placeable(pos(0, 0), TileCategory::Guard));
        assert!(map.is_placeable(pos(0, 0), TileCategory::Floor));
    }

    #[test]
    fn test_enlarge_translates_occupants() {
        let mut map = TileMap::new(2, 2);
        map.add_object(pos(0, 1), ObjectId(1), TileCategory::Wall);
        map.add_object(pos(1, 0), ObjectId(2), TileCategory::Guard);

        let large = map.enlarge(3).unwrap();
        assert_eq!(large.width(), 8);
        assert_eq!(large.height(), 8);
        assert!(large.is_wall_on_tile(pos(3, 4)));
        assert_eq!(large.locate(ObjectId(2)).map(|p| p.pos), Some(pos(4, 3)));
        assert_eq!(large.object_count(), 2);
    }

    #[test]
    fn test_enlarge_rejects_overflowing_offset() {
        let mut map = TileMap::new(2, 2);
        map.add_object(pos(1, 1), ObjectId(1), TileCategory::Floor);

        for offset in [u32::MAX, u32::MAX / 2 + 1, i32::MAX as u32] {
            let err = map.enlarge(offset).unwrap_err();
            assert_eq!(err, GameError::MapTooLarge { width: 2, height: 2, offset });
        }
        assert_eq!(map.width(), 2);
        assert!(map.is_floor_on_tile(pos(1, 1)));
    }

    #[test]
    fn test_bounding_box_and_minimize() {
        let mut map = TileMap::new(10, 8);
        map.add_object(pos(2, 3), ObjectId(1), TileCategory::Floor);
        map.add_object(pos(6, 5), ObjectId(2), TileCategory::Loot);

        assert_eq!(map.bounding_box(), Some((pos(2, 3), pos(6, 5))));

        let (small, shift) = map.minimize();
        assert_eq!(shift, pos(-2, -3));
        assert_eq!((small.width(), small.height()), (5, 3));
        assert!(small.is_floor_on_tile(pos(0, 0)));
        assert!(small.is_objective_on_tile(pos(4, 2)));
    }

    #[test]
    fn test_minimize_empty_map_is_identity() {
        let map = TileMap::new(4, 4);
        assert_eq!(map.bounding_box(), None);
        let (same, shift) = map.minimize();
        assert_eq!((same.width(), same.height()), (4, 4));
        assert_eq!(shift, GridPos::ZERO);
    }
}
