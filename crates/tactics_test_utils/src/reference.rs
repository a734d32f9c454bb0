//! Brute-force reference search.
//!
//! A plain Dijkstra over the same 8-connected step costs the A* search
//! uses. Slow, obviously correct, and the yardstick for optimality tests.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tactics_core::grid::{GridPos, NEIGHBOUR_OFFSETS};
use tactics_core::math::{sqrt_2, Fixed};
use tactics_core::pathfinding::{CostGrid, DiagonalRule};

/// Cost of stepping from `from` into the neighbouring cell `to`, or `None`
/// if the step is not allowed under `rule`.
#[must_use]
pub fn step_cost(grid: &CostGrid, from: GridPos, to: GridPos, rule: DiagonalRule) -> Option<Fixed> {
    let delta = to - from;
    if delta == GridPos::ZERO || delta.x.abs() > 1 || delta.y.abs() > 1 {
        return None;
    }
    if !grid.is_passable(from) || !grid.is_passable(to) {
        return None;
    }
    let cost = Fixed::from_num(grid.tile_cost(to)?);
    let diagonal = delta.x != 0 && delta.y != 0;
    if !diagonal {
        return Some(cost);
    }
    if rule == DiagonalRule::NoCornerCutting
        && !(grid.is_passable(GridPos::new(to.x, from.y))
            && grid.is_passable(GridPos::new(from.x, to.y)))
    {
        return None;
    }
    Some(sqrt_2() * cost)
}

/// Minimum cost from `start` to `goal`, or `None` if unreachable.
#[must_use]
pub fn reference_path_cost(
    grid: &CostGrid,
    start: GridPos,
    goal: GridPos,
    rule: DiagonalRule,
) -> Option<Fixed> {
    if !grid.is_passable(start) || !grid.is_passable(goal) {
        return None;
    }
    let width = grid.width() as usize;
    let index = |pos: GridPos| pos.y as usize * width + pos.x as usize;

    let mut best = vec![None::<Fixed>; width * grid.height() as usize];
    let mut queue = BinaryHeap::new();
    best[index(start)] = Some(Fixed::ZERO);
    queue.push(Reverse((Fixed::ZERO, start)));

    while let Some(Reverse((cost, pos))) = queue.pop() {
        if pos == goal {
            return Some(cost);
        }
        if best[index(pos)].is_some_and(|known| known < cost) {
            continue;
        }
        for offset in NEIGHBOUR_OFFSETS {
            let next = pos + offset;
            if !grid.in_bounds(next) {
                continue;
            }
            let Some(step) = step_cost(grid, pos, next, rule) else {
                continue;
            };
            let total = cost + step;
            let slot = &mut best[index(next)];
            if slot.map_or(true, |known| total < known) {
                *slot = Some(total);
                queue.push(Reverse((total, next)));
            }
        }
    }
    None
}

/// Total cost of walking `path` from `start`, or `None` if any step is
/// illegal.
#[must_use]
pub fn path_cost(
    grid: &CostGrid,
    start: GridPos,
    path: &[GridPos],
    rule: DiagonalRule,
) -> Option<Fixed> {
    let mut from = start;
    let mut total = Fixed::ZERO;
    for &cell in path {
        total += step_cost(grid, from, cell, rule)?;
        from = cell;
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::cost_grid_from_ascii;

    #[test]
    fn test_open_grid_cost_is_octile() {
        let grid = cost_grid_from_ascii(&["....", "....", "...."]);
        let goal = GridPos::new(3, 2);
        let cost = reference_path_cost(&grid, GridPos::ZERO, goal, DiagonalRule::Always);
        assert_eq!(cost, Some(Fixed::ONE + sqrt_2() * Fixed::from_num(2)));
    }

    #[test]
    fn test_walled_off_goal() {
        let grid = cost_grid_from_ascii(&[".#.", "##.", "..."]);
        assert_eq!(
            reference_path_cost(&grid, GridPos::ZERO, GridPos::new(2, 2), DiagonalRule::Always),
            None
        );
    }

    #[test]
    fn test_corner_cutting_rule() {
        let grid = cost_grid_from_ascii(&[".#", "#."]);
        let goal = GridPos::new(1, 1);
        assert_eq!(
            reference_path_cost(&grid, GridPos::ZERO, goal, DiagonalRule::Always),
            Some(sqrt_2())
        );
        assert_eq!(
            reference_path_cost(&grid, GridPos::ZERO, goal, DiagonalRule::NoCornerCutting),
            None
        );
    }

    #[test]
    fn test_path_cost_rejects_jumps() {
        let grid = cost_grid_from_ascii(&["...."]);
        let rule = DiagonalRule::Always;
        assert_eq!(
            path_cost(&grid, GridPos::ZERO, &[GridPos::new(1, 0), GridPos::new(2, 0)], rule),
            Some(Fixed::from_num(2))
        );
        assert_eq!(path_cost(&grid, GridPos::ZERO, &[GridPos::new(2, 0)], rule), None);
    }
}
