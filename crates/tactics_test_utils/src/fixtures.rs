//! Test fixtures and helpers.
//!
//! Maps and levels are drawn as ASCII, one string per row:
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

use fixed::types::I32F32;
use tactics_core::grid::GridPos;
use tactics_core::level::{LevelData, LevelObject};
use tactics_core::pathfinding::{CostGrid, BLOCKED};
use tactics_core::tilemap::{ObjectId, TileCategory, TileMap};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Categories drawn by one ASCII cell, bottom layer first.
///
/// # Panics
///
/// Panics on a character outside the legend.
#[must_use]
pub fn cell_categories(c: char) -> Vec<TileCategory> {
    match c {
        '.' => vec![TileCategory::Floor],
        '#' => vec![TileCategory::Wall],
        'F' => vec![TileCategory::Floor, TileCategory::Furniture],
        'L' => vec![TileCategory::Floor, TileCategory::Loot],
        'S' => vec![TileCategory::Floor, TileCategory::Spawn],
        'T' => vec![TileCategory::Floor, TileCategory::Trap],
        'C' => vec![TileCategory::Floor, TileCategory::Camera],
        'G' => vec![TileCategory::Floor, TileCategory::Guard],
        'E' => vec![TileCategory::Floor, TileCategory::Enemy],
        ' ' => Vec::new(),
        other => panic!("unknown map character {other:?}"),
    }
}

fn dimensions(rows: &[&str]) -> (u32, u32) {
    let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
    assert!(width > 0 && !rows.is_empty(), "ASCII map must not be empty");
    (width as u32, rows.len() as u32)
}

fn cells<'a>(rows: &'a [&'a str]) -> impl Iterator<Item = (GridPos, char)> + 'a {
    rows.iter().enumerate().flat_map(|(y, row)| {
        row.chars()
            .enumerate()
            .map(move |(x, c)| (GridPos::new(x as i32, y as i32), c))
    })
}

/// Build a tile map from ASCII rows. Ids are assigned from 1 in row-major
/// order, bottom layer first.
///
/// # Panics
///
/// Panics on an empty map or an unknown character.
#[must_use]
pub fn tilemap_from_ascii(rows: &[&str]) -> TileMap {
    let (width, height) = dimensions(rows);
    let mut tilemap = TileMap::new(width, height);
    let mut next_id = 1;
    for (pos, c) in cells(rows) {
        for category in cell_categories(c) {
            assert!(tilemap.add_object(pos, ObjectId(next_id), category));
            next_id += 1;
        }
    }
    tilemap
}

/// Build level data from ASCII rows, every unit facing `rotation`.
///
/// # Panics
///
/// Panics on an empty map or an unknown character.
#[must_use]
pub fn level_from_ascii(rows: &[&str], rotation: u8) -> LevelData {
    let (width, height) = dimensions(rows);
    let objects = cells(rows)
        .flat_map(|(pos, c)| {
            cell_categories(c).into_iter().map(move |category| {
                let mut object = LevelObject::new(category, pos.x, pos.y);
                if category.is_unit() {
                    object.rotation = rotation;
                }
                object
            })
        })
        .collect();
    LevelData {
        width,
        height,
        objects,
    }
}

/// Build a cost grid from ASCII rows: `#` is blocked, a digit is that cost
/// (`0` counts as blocked), anything else costs 1.
///
/// # Panics
///
/// Panics on an empty map.
#[must_use]
pub fn cost_grid_from_ascii(rows: &[&str]) -> CostGrid {
    let (width, height) = dimensions(rows);
    let mut grid = CostGrid::new(width, height);
    for (pos, c) in cells(rows) {
        let cost = match c {
            '#' | '0' => BLOCKED,
            d if d.is_ascii_digit() => d as i32 - '0' as i32,
            _ => 1,
        };
        grid.set_tile_cost(pos, cost);
    }
    grid
}

/// Open `width × height` tile map with a floor on every cell.
#[must_use]
pub fn floored_tilemap(width: u32, height: u32) -> TileMap {
    let mut tilemap = TileMap::new(width, height);
    let mut next_id = 1;
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            tilemap.add_object(GridPos::new(x, y), ObjectId(next_id), TileCategory::Floor);
            next_id += 1;
        }
    }
    tilemap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tilemap_from_ascii() {
        let map = tilemap_from_ascii(&[".#G", "L TC"]);
        assert_eq!((map.width(), map.height()), (4, 2));
        assert!(map.is_wall_on_tile(GridPos::new(1, 0)));
        assert!(map.is_guard_on_tile(GridPos::new(2, 0)));
        assert!(map.is_floor_on_tile(GridPos::new(2, 0)));
        assert!(map.is_objective_on_tile(GridPos::new(0, 1)));
        assert!(map.is_empty_tile(GridPos::new(1, 1)));
        assert!(map.is_trap_on_tile(GridPos::new(2, 1)));
        assert!(map.is_camera_on_tile(GridPos::new(3, 1)));
        assert!(map.is_empty_tile(GridPos::new(3, 0)));
    }

    #[test]
    fn test_level_from_ascii() {
        let level = level_from_ascii(&["GE"], 2);
        assert_eq!(level.objects.len(), 4);
        assert_eq!(level.objects[0].category, TileCategory::Floor);
        assert_eq!(level.objects[1].category, TileCategory::Guard);
        assert_eq!(level.objects[1].rotation, 2);
        assert_eq!(level.objects[0].rotation, 0);
    }

    #[test]
    fn test_cost_grid_from_ascii() {
        let grid = cost_grid_from_ascii(&[".#5"]);
        assert_eq!(grid.tile_cost(GridPos::new(0, 0)), Some(1));
        assert_eq!(grid.tile_cost(GridPos::new(1, 0)), Some(BLOCKED));
        assert_eq!(grid.tile_cost(GridPos::new(2, 0)), Some(5));
    }

    #[test]
    #[should_panic(expected = "unknown map character")]
    fn test_unknown_character_panics() {
        let _ = tilemap_from_ascii(&["?"]);
    }
}
