//! Search and vision benchmarks for tactics_core.
//!
//! Run with: `cargo bench -p tactics_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tactics_core::grid::{Direction, GridPos};
use tactics_core::pathfinding::{CostGrid, DiagonalRule, PathFinder, BLOCKED};
use tactics_core::tilemap::{ObjectId, TileCategory, TileMap};
use tactics_core::vision::{compute_visible_tiles, ConeTable};

/// Open grid with a vertical wall every eighth column, each with a one-cell
/// gap alternating between the top and bottom rows.
fn maze_grid(size: u32) -> CostGrid {
    let mut grid = CostGrid::new(size, size);
    let last = size as i32 - 1;
    for (n, x) in (4..last).step_by(8).enumerate() {
        let gap = if n % 2 == 0 { 0 } else { last };
        for y in 0..=last {
            if y != gap {
                grid.set_tile_cost(GridPos::new(x, y), BLOCKED);
            }
        }
    }
    grid
}

/// Floored square room with scattered pillars.
fn pillar_room(size: u32) -> TileMap {
    let mut map = TileMap::new(size, size);
    let mut id = 1;
    for y in 0..size as i32 {
        for x in 0..size as i32 {
            let category = if x % 5 == 2 && y % 5 == 2 {
                TileCategory::Wall
            } else {
                TileCategory::Floor
            };
            map.add_object(GridPos::new(x, y), ObjectId(id), category);
            id += 1;
        }
    }
    map
}

pub fn pathfinding_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_path");
    for size in [32u32, 64, 128] {
        let grid = maze_grid(size);
        let goal = GridPos::new(size as i32 - 1, size as i32 - 1);
        for rule in [DiagonalRule::Always, DiagonalRule::NoCornerCutting] {
            let mut finder = PathFinder::new(rule);
            group.bench_with_input(
                BenchmarkId::new(format!("{rule:?}"), size),
                &grid,
                |b, grid| {
                    b.iter(|| {
                        let path = finder.find_path(grid, GridPos::ZERO, black_box(goal));
                        black_box(path.map(<[GridPos]>::len).ok())
                    });
                },
            );
        }
    }
    group.finish();
}

pub fn vision_benchmark(c: &mut Criterion) {
    let map = pillar_room(64);
    let origin = GridPos::new(32, 32);
    let mut group = c.benchmark_group("vision");
    for half_width in [1u8, 4] {
        let cone = ConeTable::new(half_width);
        group.bench_with_input(BenchmarkId::new("cone", half_width), &cone, |b, cone| {
            b.iter(|| {
                compute_visible_tiles(&map, origin, black_box(Direction::North), 12, cone).len()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, pathfinding_benchmark, vision_benchmark);
criterion_main!(benches);
