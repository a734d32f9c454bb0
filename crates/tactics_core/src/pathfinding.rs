//! Grid-based pathfinding using the A* algorithm.
//!
//! All calculations use fixed-point math for deterministic results
//! across different platforms and clients. Search nodes live in a flat
//! arena indexed by cell, reused from one search to the next.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::{GridPos, NEIGHBOUR_OFFSETS};
use crate::math::{sqrt_2, Fixed};
use crate::tilemap::TileMap;

/// Cost value marking an impassable cell.
pub const BLOCKED: i32 = -1;

/// Cost of an ordinary walkable cell.
pub const DEFAULT_COST: i32 = 1;

/// Dense per-cell traversal costs.
///
/// A cost of [`BLOCKED`] marks an impassable cell; every other cell costs at
/// least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostGrid {
    /// Grid width in cells.
    width: u32,
    /// Grid height in cells.
    height: u32,
    /// Costs stored in row-major order.
    costs: Vec<i32>,
}

impl CostGrid {
    /// Create a new cost grid with every cell at [`DEFAULT_COST`].
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "CostGrid width must be positive");
        assert!(height > 0, "CostGrid height must be positive");

        Self {
            width,
            height,
            costs: vec![DEFAULT_COST; (width as usize) * (height as usize)],
        }
    }

    /// Build a cost grid from the current tile map occupancy.
    #[must_use]
    pub fn from_tilemap(tilemap: &TileMap) -> Self {
        let mut grid = Self::new(tilemap.width(), tilemap.height());
        grid.rebuild_from(tilemap);
        grid
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Check if a position is within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Row-major index of an in-bounds position.
    #[inline]
    fn index(&self, pos: GridPos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y as usize) * (self.width as usize) + (pos.x as usize))
    }

    #[inline]
    fn position(&self, index: usize) -> GridPos {
        let width = self.width as usize;
        GridPos::new((index % width) as i32, (index / width) as i32)
    }

    /// Reset every cell to [`DEFAULT_COST`].
    pub fn clean_map(&mut self) {
        self.costs.fill(DEFAULT_COST);
    }

    /// Set the cost of one cell.
    ///
    /// Returns `false` if out of bounds or if `cost` is neither [`BLOCKED`]
    /// nor positive.
    pub fn set_tile_cost(&mut self, pos: GridPos, cost: i32) -> bool {
        if cost != BLOCKED && cost < 1 {
            return false;
        }
        match self.index(pos) {
            Some(index) => {
                self.costs[index] = cost;
                true
            }
            None => false,
        }
    }

    /// Cost of one cell, `None` if out of bounds.
    #[must_use]
    pub fn tile_cost(&self, pos: GridPos) -> Option<i32> {
        self.index(pos).map(|index| self.costs[index])
    }

    /// True for an in-bounds cell that is not [`BLOCKED`].
    #[must_use]
    pub fn is_passable(&self, pos: GridPos) -> bool {
        self.tile_cost(pos).is_some_and(|cost| cost != BLOCKED)
    }

    /// Refill costs from the tile map: walls and furniture are blocked,
    /// everything else costs [`DEFAULT_COST`].
    ///
    /// The grid is resized if the map dimensions changed.
    pub fn rebuild_from(&mut self, tilemap: &TileMap) {
        if self.width != tilemap.width() || self.height != tilemap.height() {
            *self = Self::new(tilemap.width(), tilemap.height());
        } else {
            self.clean_map();
        }
        for index in 0..self.costs.len() {
            if tilemap.is_blocked(self.position(index)) {
                self.costs[index] = BLOCKED;
            }
        }
    }
}

/// Whether diagonal steps may squeeze between two blocked corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DiagonalRule {
    /// Any diagonal step into a passable cell is allowed.
    #[default]
    Always,
    /// A diagonal step needs both adjacent straight cells passable.
    NoCornerCutting,
}

/// Octile distance between two cells.
///
/// `max(dx, dy) + (√2 − 1) · min(dx, dy)`: the exact cost of the cheapest
/// 8-connected walk on an open grid with unit cell costs.
#[must_use]
pub fn octile_distance(a: GridPos, b: GridPos) -> Fixed {
    let (dx, dy) = a.abs_delta(b);
    let (long, short) = if dx > dy { (dx, dy) } else { (dy, dx) };
    Fixed::from_num(long) + (sqrt_2() - Fixed::ONE) * Fixed::from_num(short)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum NodeState {
    #[default]
    Unvisited,
    Open,
    Closed,
}

/// Arena slot for one cell.
#[derive(Debug, Clone, Copy, Default)]
struct SearchNode {
    g: Fixed,
    h: Fixed,
    parent: Option<usize>,
    state: NodeState,
}

/// An entry in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct OpenEntry {
    f: Fixed,
    h: Fixed,
    /// Row-major cell index; lowest wins the final tie.
    index: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse every key so the smallest f, then
        // the smallest h, then the smallest cell index pops first.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reusable A* search over a [`CostGrid`].
#[derive(Debug, Clone, Default)]
pub struct PathFinder {
    nodes: Vec<SearchNode>,
    open: BinaryHeap<OpenEntry>,
    path: Vec<GridPos>,
    diagonal_rule: DiagonalRule,
    expanded: usize,
}

impl PathFinder {
    /// Create a pathfinder with the given diagonal rule.
    #[must_use]
    pub fn new(diagonal_rule: DiagonalRule) -> Self {
        Self {
            diagonal_rule,
            ..Self::default()
        }
    }

    /// Diagonal rule in effect.
    #[must_use]
    pub const fn diagonal_rule(&self) -> DiagonalRule {
        self.diagonal_rule
    }

    /// Same formula as [`octile_distance`], for approximate range checks.
    #[must_use]
    pub fn heuristic_distance(a: GridPos, b: GridPos) -> Fixed {
        octile_distance(a, b)
    }

    /// Path from the last successful search: start (exclusive) to goal.
    #[must_use]
    pub fn path(&self) -> &[GridPos] {
        &self.path
    }

    /// Number of steps in the last path.
    #[must_use]
    pub fn path_length(&self) -> usize {
        self.path.len()
    }

    /// Nodes closed by the last search.
    #[must_use]
    pub const fn nodes_expanded(&self) -> usize {
        self.expanded
    }

    /// Find a minimal-cost path from `start` to `goal`.
    ///
    /// The returned slice runs from the cell after `start` up to and
    /// including `goal`; it is empty when `start == goal`. Stepping into a
    /// cell costs that cell's cost, times √2 for diagonal steps.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] if either endpoint lies outside the
    /// grid and [`GameError::PathNotFound`] if either endpoint is blocked or
    /// the goal is unreachable. The stored path is empty after a failure.
    pub fn find_path(
        &mut self,
        grid: &CostGrid,
        start: GridPos,
        goal: GridPos,
    ) -> Result<&[GridPos]> {
        self.path.clear();
        self.expanded = 0;

        let start_index = grid.index(start).ok_or(GameError::out_of_bounds(start))?;
        let goal_index = grid.index(goal).ok_or(GameError::out_of_bounds(goal))?;

        if !grid.is_passable(start) || !grid.is_passable(goal) {
            tracing::debug!(%start, %goal, "Path endpoint is blocked");
            return Err(GameError::PathNotFound { from: start, to: goal });
        }

        if start_index == goal_index {
            return Ok(&self.path);
        }

        self.reset(grid);
        let start_h = octile_distance(start, goal);
        self.nodes[start_index] = SearchNode {
            g: Fixed::ZERO,
            h: start_h,
            parent: None,
            state: NodeState::Open,
        };
        self.open.push(OpenEntry {
            f: start_h,
            h: start_h,
            index: start_index,
        });

        let diagonal = sqrt_2();

        while let Some(current) = self.open.pop() {
            if self.nodes[current.index].state == NodeState::Closed {
                continue;
            }
            self.nodes[current.index].state = NodeState::Closed;
            self.expanded += 1;

            if current.index == goal_index {
                self.reconstruct(grid, goal_index);
                tracing::debug!(
                    %start,
                    %goal,
                    steps = self.path.len(),
                    expanded = self.expanded,
                    "Path found"
                );
                return Ok(&self.path);
            }

            let current_pos = grid.position(current.index);
            let current_g = self.nodes[current.index].g;

            for (i, offset) in NEIGHBOUR_OFFSETS.iter().enumerate() {
                let next = current_pos + *offset;
                let Some(next_index) = grid.index(next) else {
                    continue;
                };
                let cost = grid.costs[next_index];
                if cost == BLOCKED {
                    continue;
                }
                let is_diagonal = i >= 4;
                if is_diagonal && !self.diagonal_allowed(grid, current_pos, *offset) {
                    continue;
                }

                let node = &mut self.nodes[next_index];
                if node.state == NodeState::Closed {
                    continue;
                }

                let step = if is_diagonal {
                    diagonal * Fixed::from_num(cost)
                } else {
                    Fixed::from_num(cost)
                };
                let tentative_g = current_g + step;

                if node.state == NodeState::Unvisited || tentative_g < node.g {
                    if node.state == NodeState::Unvisited {
                        node.h = octile_distance(next, goal);
                    }
                    node.g = tentative_g;
                    node.parent = Some(current.index);
                    node.state = NodeState::Open;
                    self.open.push(OpenEntry {
                        f: tentative_g + node.h,
                        h: node.h,
                        index: next_index,
                    });
                }
            }
        }

        tracing::debug!(%start, %goal, expanded = self.expanded, "No path");
        Err(GameError::PathNotFound { from: start, to: goal })
    }

    fn diagonal_allowed(&self, grid: &CostGrid, from: GridPos, offset: GridPos) -> bool {
        match self.diagonal_rule {
            DiagonalRule::Always => true,
            DiagonalRule::NoCornerCutting => {
                grid.is_passable(GridPos::new(from.x + offset.x, from.y))
                    && grid.is_passable(GridPos::new(from.x, from.y + offset.y))
            }
        }
    }

    /// Prepare the arena for a new search on `grid`.
    fn reset(&mut self, grid: &CostGrid) {
        let cells = grid.costs.len();
        self.nodes.clear();
        self.nodes.resize(cells, SearchNode::default());
        self.open.clear();
    }

    /// Walk parent links back from the goal, excluding the start cell.
    fn reconstruct(&mut self, grid: &CostGrid, goal_index: usize) {
        let mut current = goal_index;
        while let Some(parent) = self.nodes[current].parent {
            self.path.push(grid.position(current));
            current = parent;
        }
        self.path.reverse();
    }
}
