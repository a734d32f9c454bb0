//! Search optimality and failure properties, checked against a brute-force
//! Dijkstra on small random grids.

use tactics_core::error::GameError;
use tactics_core::grid::GridPos;
use tactics_core::math::Fixed;
use tactics_core::pathfinding::{octile_distance, CostGrid, DiagonalRule, PathFinder, BLOCKED};
use tactics_test_utils::determinism::strategies::{arb_cost_grid, arb_grid_pos};
use tactics_test_utils::fixtures::cost_grid_from_ascii;
use tactics_test_utils::proptest::prelude::*;
use tactics_test_utils::reference::{path_cost, reference_path_cost};

const SIZE: u32 = 8;

fn search(
    rule: DiagonalRule,
    grid: &CostGrid,
    start: GridPos,
    goal: GridPos,
) -> Option<Vec<GridPos>> {
    let mut finder = PathFinder::new(rule);
    finder.find_path(grid, start, goal).ok().map(<[GridPos]>::to_vec)
}

proptest! {
    #[test]
    fn prop_open_grid_path_is_octile_optimal(
        start in arb_grid_pos(SIZE, SIZE),
        goal in arb_grid_pos(SIZE, SIZE),
    ) {
        let grid = CostGrid::new(SIZE, SIZE);
        let path = search(DiagonalRule::Always, &grid, start, goal)
            .expect("open grid is connected");
        let cost = path_cost(&grid, start, &path, DiagonalRule::Always);
        prop_assert_eq!(cost, Some(octile_distance(start, goal)));
        prop_assert_eq!(
            reference_path_cost(&grid, start, goal, DiagonalRule::Always),
            Some(octile_distance(start, goal))
        );
    }

    #[test]
    fn prop_matches_brute_force(
        grid in arb_cost_grid(SIZE, SIZE),
        start in arb_grid_pos(SIZE, SIZE),
        goal in arb_grid_pos(SIZE, SIZE),
        no_corner_cutting in any::<bool>(),
    ) {
        let rule = if no_corner_cutting {
            DiagonalRule::NoCornerCutting
        } else {
            DiagonalRule::Always
        };
        let expected = reference_path_cost(&grid, start, goal, rule);
        match search(rule, &grid, start, goal) {
            Some(path) => {
                prop_assert!(expected.is_some());
                if start != goal {
                    prop_assert_eq!(path.last().copied(), Some(goal));
                    prop_assert!(path.first().is_some_and(|first| first.is_within_reach(start)));
                }
                prop_assert!(!path.contains(&start));
                prop_assert_eq!(path_cost(&grid, start, &path, rule), expected);
            }
            None => prop_assert_eq!(expected, None),
        }
    }

    #[test]
    fn prop_octile_is_admissible(
        grid in arb_cost_grid(SIZE, SIZE),
        start in arb_grid_pos(SIZE, SIZE),
        goal in arb_grid_pos(SIZE, SIZE),
    ) {
        if let Some(cost) = reference_path_cost(&grid, start, goal, DiagonalRule::Always) {
            prop_assert!(octile_distance(start, goal) <= cost);
            prop_assert!(PathFinder::heuristic_distance(start, goal) <= cost);
        }
    }

    #[test]
    fn prop_blocked_goal_fails_with_empty_path(
        start in arb_grid_pos(SIZE, SIZE),
        goal in arb_grid_pos(SIZE, SIZE),
    ) {
        let mut grid = CostGrid::new(SIZE, SIZE);
        grid.set_tile_cost(goal, BLOCKED);
        let mut finder = PathFinder::default();
        let result = finder.find_path(&grid, start, goal).map(<[GridPos]>::len);
        let not_found = matches!(result, Err(GameError::PathNotFound { .. }));
        prop_assert!(not_found, "expected PathNotFound, got {:?}", result);
        prop_assert_eq!(finder.path_length(), 0);
    }
}

#[test]
fn test_disconnected_component_fails() {
    let grid = cost_grid_from_ascii(&[
        "...#....",
        "...#....",
        "####....",
        "........",
    ]);
    let mut finder = PathFinder::default();
    // Prime the buffer with a successful search first.
    assert!(finder.find_path(&grid, GridPos::new(4, 0), GridPos::new(7, 3)).is_ok());
    assert!(finder.path_length() > 0);

    let err = finder
        .find_path(&grid, GridPos::ZERO, GridPos::new(7, 3))
        .unwrap_err();
    assert_eq!(
        err,
        GameError::PathNotFound {
            from: GridPos::ZERO,
            to: GridPos::new(7, 3)
        }
    );
    assert!(finder.path().is_empty());
}

#[test]
fn test_start_equals_goal_is_empty_success() {
    let grid = CostGrid::new(4, 4);
    let mut finder = PathFinder::default();
    let path = finder.find_path(&grid, GridPos::new(2, 2), GridPos::new(2, 2)).unwrap();
    assert!(path.is_empty());
}

#[test]
fn test_repeated_searches_on_mutated_grid() {
    let mut grid = CostGrid::new(5, 1);
    let mut finder = PathFinder::default();
    assert_eq!(finder.find_path(&grid, GridPos::ZERO, GridPos::new(4, 0)).unwrap().len(), 4);

    grid.set_tile_cost(GridPos::new(2, 0), BLOCKED);
    assert!(finder.find_path(&grid, GridPos::ZERO, GridPos::new(4, 0)).is_err());

    grid.clean_map();
    assert_eq!(finder.find_path(&grid, GridPos::ZERO, GridPos::new(4, 0)).unwrap().len(), 4);
    assert_eq!(
        path_cost(&grid, GridPos::ZERO, finder.path(), DiagonalRule::Always),
        Some(Fixed::from_num(4))
    );
}
