//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Two worlds built from the same level must stay bit-identical. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`tactics_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Units and props live in `BTreeMap`s and update in ascending id order.
//!
//! - **Search tie-breaking**: equal-cost paths are broken by a fixed rule,
//!   never by heap insertion luck.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tactics_core::world::World;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a world twice from the same setup and compare final hashes.
///
/// # Example
///
/// ```ignore
/// use tactics_test_utils::determinism::verify_world_determinism;
///
/// assert!(verify_world_determinism(|| build_heist_world(), 500));
/// ```
pub fn verify_world_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> World,
{
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |world| {
            world.tick();
        },
        World::state_hash,
    );
    result.is_deterministic
}

/// Compare two world runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if the worlds stay identical, `Some(tick)` if they diverge at
/// that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> World,
{
    let mut world1 = setup_fn();
    let mut world2 = setup_fn();

    if world1.state_hash() != world2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        world1.tick();
        world2.tick();

        if world1.state_hash() != world2.state_hash() {
            tracing::warn!(tick, "Worlds diverged");
            return Some(tick);
        }
    }

    None
}

/// Verify that a snapshot taken after `num_ticks` restores to the same
/// state and keeps running in lockstep with the original for `tail_ticks`.
pub fn verify_snapshot_determinism<F>(setup_fn: F, num_ticks: u64, tail_ticks: u64) -> bool
where
    F: Fn() -> World,
{
    let mut world = setup_fn();
    for _ in 0..num_ticks {
        world.tick();
    }

    let Ok(bytes) = world.serialize() else {
        return false;
    };
    let Ok(mut restored) = World::deserialize(&bytes) else {
        return false;
    };
    if restored.state_hash() != world.state_hash() {
        return false;
    }

    for _ in 0..tail_ticks {
        world.tick();
        restored.tick();
    }
    restored.state_hash() == world.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for grids, positions and facings.
pub mod strategies {
    use proptest::prelude::*;
    use tactics_core::grid::{Direction, GridPos};
    use tactics_core::pathfinding::{CostGrid, BLOCKED};

    /// Generate a cell inside a `width × height` grid.
    pub fn arb_grid_pos(width: u32, height: u32) -> impl Strategy<Value = GridPos> {
        (0..width as i32, 0..height as i32).prop_map(|(x, y)| GridPos::new(x, y))
    }

    /// Generate a facing direction.
    pub fn arb_direction() -> impl Strategy<Value = Direction> {
        (0usize..8).prop_map(Direction::from_index)
    }

    /// Generate a cell cost: blocked about one time in five, otherwise 1-5.
    pub fn arb_cell_cost() -> impl Strategy<Value = i32> {
        prop_oneof![
            1 => Just(BLOCKED),
            4 => 1i32..=5,
        ]
    }

    /// Generate a cost grid of the given size.
    pub fn arb_cost_grid(width: u32, height: u32) -> impl Strategy<Value = CostGrid> {
        proptest::collection::vec(arb_cell_cost(), (width * height) as usize).prop_map(
            move |costs| {
                let mut grid = CostGrid::new(width, height);
                for (i, cost) in costs.into_iter().enumerate() {
                    let pos = GridPos::new((i as u32 % width) as i32, (i as u32 / width) as i32);
                    grid.set_tile_cost(pos, cost);
                }
                grid
            },
        )
    }

    /// Generate ASCII rows of floors and walls, walls about one cell in four.
    pub fn arb_ascii_rows(width: usize, height: usize) -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec(
            proptest::collection::vec(prop_oneof![3 => Just('.'), 1 => Just('#')], width)
                .prop_map(|row| row.into_iter().collect::<String>()),
            height,
        )
    }
}
