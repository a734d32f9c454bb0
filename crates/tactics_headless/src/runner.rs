//! Headless tick runner and JSON summaries.

use serde::{Deserialize, Serialize};
use tactics_core::tilemap::{ObjectId, TileCategory};
use tactics_core::transform::TransformSnapshot;
use tactics_core::unit::MoveState;
use tactics_core::world::{TickEvents, World};

use crate::scenario::{Scenario, ScenarioError};

/// Per-unit state at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSummary {
    /// Unit id.
    pub id: u32,
    /// Guard or enemy.
    pub category: TileCategory,
    /// Registered tile.
    pub tile: [i32; 2],
    /// Movement state.
    pub state: MoveState,
    /// Remaining health.
    pub health: i32,
    /// Carried object id.
    pub holding: Option<u32>,
    /// Renderer animation token.
    pub animation: String,
    /// Renderer placement.
    pub transform: Option<TransformSnapshot>,
}

/// Totals accumulated over every tick of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTotals {
    /// Tiles entered by any unit.
    pub tiles_entered: u64,
    /// Failed path searches.
    pub path_failures: u64,
    /// Enemies released by spawn points.
    pub spawned: u64,
    /// Trap triggers.
    pub traps_triggered: u64,
    /// Traps disarmed by enemies.
    pub traps_disarmed: u64,
    /// Resolved fight blows.
    pub hits: u64,
    /// Loot pick-ups.
    pub loot_taken: u64,
    /// Enemies that left the map with loot.
    pub escaped: u64,
    /// Units killed.
    pub deaths: u64,
}

impl EventTotals {
    /// Add one tick's events.
    pub fn record(&mut self, events: &TickEvents) {
        use tactics_core::unit::UnitEvent;

        for event in &events.unit_events {
            match event {
                UnitEvent::TileEntered { .. } => self.tiles_entered += 1,
                UnitEvent::PathFailed { .. } => self.path_failures += 1,
                _ => {}
            }
        }
        self.spawned += events.spawned.len() as u64;
        self.traps_triggered += events.traps_triggered.len() as u64;
        self.traps_disarmed += events.traps_disarmed.len() as u64;
        self.hits += events.hits.len() as u64;
        self.loot_taken += events.loot_taken.len() as u64;
        self.escaped += events.escaped.len() as u64;
        self.deaths += events.deaths.len() as u64;
    }
}

/// Outcome of a headless run, printed as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// Ticks simulated.
    pub ticks: u64,
    /// Final state hash, hex encoded.
    pub state_hash: String,
    /// Loot still in the world.
    pub loot_remaining: usize,
    /// Event totals.
    pub totals: EventTotals,
    /// Surviving units in id order.
    pub units: Vec<UnitSummary>,
}

impl RunSummary {
    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Outcome of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Ticks per run.
    pub ticks: u64,
    /// Final hash of every run.
    pub hashes: Vec<String>,
    /// Whether a mid-run snapshot resumed in lockstep.
    pub snapshot_matches: bool,
}

impl VerifyReport {
    /// True when every run agreed and the snapshot resumed identically.
    pub fn passed(&self) -> bool {
        self.snapshot_matches && self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Drives a world for a fixed number of ticks.
pub struct HeadlessRunner {
    name: String,
    world: World,
    totals: EventTotals,
}

impl HeadlessRunner {
    /// Build a runner from a scenario.
    pub fn new(scenario: &Scenario) -> Result<Self, ScenarioError> {
        Ok(Self {
            name: scenario.name.clone(),
            world: scenario.build_world()?,
            totals: EventTotals::default(),
        })
    }

    /// The simulated world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Totals so far.
    pub fn totals(&self) -> &EventTotals {
        &self.totals
    }

    /// Advance one tick.
    pub fn step(&mut self) -> TickEvents {
        let events = self.world.tick();
        self.totals.record(&events);
        for id in &events.escaped {
            tracing::info!(tick = self.world.tick_count(), unit = %id, "Enemy escaped with loot");
        }
        for id in &events.deaths {
            tracing::info!(tick = self.world.tick_count(), unit = %id, "Unit died");
        }
        events
    }

    /// Advance `ticks` ticks.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
        tracing::debug!(
            ticks,
            hash = %format!("{:016x}", self.world.state_hash()),
            "Run finished"
        );
    }

    /// Summarise the current state.
    pub fn summary(&self) -> RunSummary {
        let units = self
            .world
            .units()
            .map(|unit| {
                let tile = unit.tile_position();
                UnitSummary {
                    id: unit.id().0,
                    category: unit.category(),
                    tile: [tile.x, tile.y],
                    state: unit.move_state(),
                    health: unit.health(),
                    holding: unit.held_object().map(|ObjectId(id)| id),
                    animation: unit.animation().as_str().to_string(),
                    transform: self
                        .world
                        .transform(unit.id())
                        .map(|t| TransformSnapshot::from(&t)),
                }
            })
            .collect();

        RunSummary {
            scenario: self.name.clone(),
            ticks: self.world.tick_count(),
            state_hash: format!("{:016x}", self.world.state_hash()),
            loot_remaining: self.world.loot_count(),
            totals: self.totals.clone(),
            units,
        }
    }
}

/// Run `scenario` `runs` times for `ticks` ticks and compare final hashes,
/// then check that a snapshot taken halfway resumes in lockstep.
pub fn verify_determinism(
    scenario: &Scenario,
    runs: u32,
    ticks: u64,
) -> Result<VerifyReport, ScenarioError> {
    let mut hashes = Vec::with_capacity(runs as usize);
    for run in 0..runs {
        let mut world = scenario.build_world()?;
        for _ in 0..ticks {
            world.tick();
        }
        let hash = format!("{:016x}", world.state_hash());
        tracing::debug!(run, %hash, "Verification run finished");
        hashes.push(hash);
    }

    let mut world = scenario.build_world()?;
    for _ in 0..ticks / 2 {
        world.tick();
    }
    let mut restored = World::deserialize(&world.serialize()?)?;
    let mut snapshot_matches = restored.state_hash() == world.state_hash();
    for _ in ticks / 2..ticks {
        world.tick();
        restored.tick();
    }
    snapshot_matches &= restored.state_hash() == world.state_hash();

    Ok(VerifyReport {
        ticks,
        hashes,
        snapshot_matches,
    })
}
