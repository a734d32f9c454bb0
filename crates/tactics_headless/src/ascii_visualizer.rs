//! ASCII map visualizer for terminal review.
//!
//! Draws the same glyphs scenario layouts are written in, so a freshly
//! loaded level renders back to its own layout.

use std::collections::BTreeSet;

use tactics_core::grid::GridPos;
use tactics_core::tilemap::{TileCategory, TileMap};
use tactics_core::unit::MoveState;
use tactics_core::world::World;

/// ASCII visualization configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Print the tick header.
    pub show_header: bool,
    /// Print the legend and unit counts.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            show_header: true,
            show_legend: true,
            use_color: true,
        }
    }
}

/// Cells to mark on top of bare floor, such as a path or a vision cone.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    /// Marked cells.
    pub cells: BTreeSet<GridPos>,
    /// Glyph drawn on marked floor cells.
    pub mark: char,
}

impl Overlay {
    /// Overlay marking `cells` with `mark`.
    pub fn new(cells: impl IntoIterator<Item = GridPos>, mark: char) -> Self {
        Self {
            cells: cells.into_iter().collect(),
            mark,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";

    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const GREEN: &str = "\x1b[32m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Draw order: the first category present on a cell wins.
const GLYPHS: [(TileCategory, char); 9] = [
    (TileCategory::Guard, 'G'),
    (TileCategory::Enemy, 'E'),
    (TileCategory::Loot, 'L'),
    (TileCategory::Trap, 'T'),
    (TileCategory::Spawn, 'S'),
    (TileCategory::Camera, 'C'),
    (TileCategory::Furniture, 'F'),
    (TileCategory::Wall, '#'),
    (TileCategory::Floor, '.'),
];

/// Glyph for one cell.
#[must_use]
pub fn cell_glyph(tilemap: &TileMap, pos: GridPos) -> char {
    GLYPHS
        .iter()
        .find(|(category, _)| tilemap.is_type_on_tile(pos, *category))
        .map_or(' ', |&(_, glyph)| glyph)
}

fn glyph_color(glyph: char) -> Option<&'static str> {
    match glyph {
        'G' => Some(colors::BLUE),
        'E' | '$' => Some(colors::RED),
        'L' => Some(colors::YELLOW),
        'T' => Some(colors::MAGENTA),
        'S' => Some(colors::GREEN),
        'C' | 'F' => Some(colors::CYAN),
        '#' => Some(colors::GRAY),
        _ => None,
    }
}

/// Render a tile map as plain rows, top row first.
#[must_use]
pub fn render_tilemap(tilemap: &TileMap, overlay: Option<&Overlay>) -> Vec<String> {
    (0..tilemap.height() as i32)
        .map(|y| {
            (0..tilemap.width() as i32)
                .map(|x| {
                    let pos = GridPos::new(x, y);
                    let glyph = cell_glyph(tilemap, pos);
                    match overlay {
                        Some(overlay) if glyph == '.' && overlay.cells.contains(&pos) => {
                            overlay.mark
                        }
                        _ => glyph,
                    }
                })
                .collect()
        })
        .collect()
}

fn paint(row: &str, use_color: bool) -> String {
    if !use_color {
        return row.to_string();
    }
    let mut painted = String::with_capacity(row.len() * 4);
    for ch in row.chars() {
        match glyph_color(ch) {
            Some(color) => {
                painted.push_str(color);
                painted.push(ch);
                painted.push_str(colors::RESET);
            }
            None => painted.push(ch),
        }
    }
    painted
}

/// Render the world with its header and legend.
///
/// Enemies carrying loot are drawn as `$`.
#[must_use]
pub fn render_world(world: &World, config: &AsciiConfig, overlay: Option<&Overlay>) -> String {
    let mut rows = render_tilemap(world.tilemap(), overlay);
    for unit in world.units() {
        if unit.held_object().is_some() {
            let pos = unit.tile_position();
            if let Some(row) = rows.get_mut(pos.y as usize) {
                *row = row
                    .chars()
                    .enumerate()
                    .map(|(x, ch)| if x == pos.x as usize { '$' } else { ch })
                    .collect();
            }
        }
    }

    let width = world.tilemap().width() as usize;
    let mut output = String::new();

    if config.show_header {
        let (bold, reset) = if config.use_color {
            (colors::BOLD, colors::RESET)
        } else {
            ("", "")
        };
        output.push_str(&format!(
            "{bold}Tick {} │ {}x{}{reset}\n",
            world.tick_count(),
            world.tilemap().width(),
            world.tilemap().height()
        ));
    }

    output.push('┌');
    output.push_str(&"─".repeat(width));
    output.push_str("┐\n");
    for row in &rows {
        output.push('│');
        output.push_str(&paint(row, config.use_color));
        output.push_str("│\n");
    }
    output.push('└');
    output.push_str(&"─".repeat(width));
    output.push_str("┘\n");

    if config.show_legend {
        output.push_str("G=guard E=enemy $=carrier L=loot T=trap S=spawn F=furniture #=wall\n");

        let guards = world
            .units()
            .filter(|u| u.category() == TileCategory::Guard)
            .count();
        let enemies = world.unit_count() - guards;
        let moving = world
            .units()
            .filter(|u| u.move_state() != MoveState::Idle)
            .count();
        output.push_str(&format!(
            "guards: {guards}  enemies: {enemies}  moving: {moving}  loot: {}\n",
            world.loot_count()
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;
    use tactics_test_utils::fixtures::tilemap_from_ascii;

    fn plain() -> AsciiConfig {
        AsciiConfig {
            use_color: false,
            ..AsciiConfig::default()
        }
    }

    #[test]
    fn test_tilemap_renders_back_to_layout() {
        let rows = ["#.GL", "S.T ", "F.E."];
        let map = tilemap_from_ascii(&rows);
        assert_eq!(render_tilemap(&map, None), rows);
    }

    #[test]
    fn test_overlay_marks_bare_floor_only() {
        let map = tilemap_from_ascii(&["....", ".#G."]);
        let overlay = Overlay::new(
            [GridPos::new(0, 0), GridPos::new(1, 1), GridPos::new(2, 1)],
            '*',
        );
        assert_eq!(render_tilemap(&map, Some(&overlay)), ["*...", ".#G."]);
    }

    #[test]
    fn test_render_world_header_and_legend() {
        let world = Scenario::heist().unwrap().build_world().unwrap();
        let output = render_world(&world, &plain(), None);
        assert!(output.starts_with("Tick 0"));
        assert!(output.contains("guards: 2"));
        assert!(output.contains("#S.....#....L#"));
        assert!(!output.contains('\x1b'));
    }

    #[test]
    fn test_color_output() {
        let world = Scenario::heist().unwrap().build_world().unwrap();
        let output = render_world(&world, &AsciiConfig::default(), None);
        assert!(output.contains(colors::BLUE));
        assert!(output.contains(colors::RESET));
    }
}
