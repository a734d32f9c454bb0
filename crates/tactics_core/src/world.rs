//! World driver.
//!
//! The [`World`] owns the tile map, every unit and prop, and the search
//! buffers the units share. It advances everything in a fixed order each
//! tick so that two worlds built from the same level stay identical.
//!
//! # System Execution Order
//!
//! Each tick, systems run in this order:
//! 1. **Spawners** - spawn points release enemies on their interval
//! 2. **Units** - every unit updates in ascending id order
//! 3. **Traps** - active traps hit enemies that just entered their tile
//! 4. **Interactions** - units at their objective fight, steal, disarm or escape
//! 5. **Deaths** - dead units leave the map, dropping what they carried
//! 6. **Idle behaviour** - guards patrol, enemies look for new objectives

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::grid::{Direction, GridPos, RotationTable};
use crate::level::LevelData;
use crate::pathfinding::{CostGrid, PathFinder};
use crate::roles::Role;
use crate::tilemap::{ObjectId, TileCategory, TileMap};
use crate::transform::{AnimationState, Transform};
use crate::unit::{MoveState, MovementContext, Unit, UnitEvent};
use crate::vision::VisionCone;

/// Where a loot object currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LootState {
    /// Lying on its tile.
    OnTile,
    /// Carried by a unit; not registered on the map.
    Carried(ObjectId),
}

/// Spawn point timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Ticks since the last release.
    pub timer: u32,
    /// Enemies still to release.
    pub remaining: u32,
}

/// Trap charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrapState {
    /// Whether the trap still fires.
    pub active: bool,
    /// Triggers left.
    pub ammunition: u32,
    /// Damage per trigger.
    pub damage: i32,
}

/// Category-specific state of a prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropKind {
    /// Floor, wall, furniture or camera.
    Static,
    /// Stealable objective.
    Loot(LootState),
    /// Enemy entry and exit point.
    Spawn(SpawnPoint),
    /// Damages enemies stepping on it.
    Trap(TrapState),
}

/// A non-unit object in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prop {
    /// Object id.
    pub id: ObjectId,
    /// Category it is registered under.
    pub category: TileCategory,
    /// Tile it occupies (last tile, while carried).
    pub tile: GridPos,
    /// Facing.
    pub direction: Direction,
    /// Category payload.
    pub kind: PropKind,
}

/// A guard strike resolved this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitEvent {
    /// Striking unit.
    pub attacker: ObjectId,
    /// Unit struck.
    pub target: ObjectId,
    /// Damage dealt.
    pub damage: i32,
}

/// A trap firing on a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapTrigger {
    /// Trap that fired.
    pub trap: ObjectId,
    /// Unit hit.
    pub unit: ObjectId,
    /// Damage dealt.
    pub damage: i32,
}

/// Events generated during a world tick.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Movement and objective events from the units.
    pub unit_events: Vec<UnitEvent>,
    /// Enemies released by spawn points.
    pub spawned: Vec<ObjectId>,
    /// Traps that fired.
    pub traps_triggered: Vec<TrapTrigger>,
    /// Traps removed by enemies.
    pub traps_disarmed: Vec<ObjectId>,
    /// Guard strikes.
    pub hits: Vec<HitEvent>,
    /// `(unit, loot)` pick-ups.
    pub loot_taken: Vec<(ObjectId, ObjectId)>,
    /// Loot put back on the map by a dying carrier.
    pub loot_dropped: Vec<ObjectId>,
    /// Enemies that left the map with loot.
    pub escaped: Vec<ObjectId>,
    /// Units that died this tick.
    pub deaths: Vec<ObjectId>,
}

/// Outcome of a finished interaction countdown.
#[derive(Debug, Clone, Copy)]
enum Interaction {
    Strike(ObjectId),
    PickUp(ObjectId),
    Disarm(ObjectId),
    Escape,
    Abandon,
}

/// The tactics simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    tick: u64,
    next_id: u32,
    config: GameConfig,
    tilemap: TileMap,
    units: BTreeMap<ObjectId, Unit>,
    props: BTreeMap<ObjectId, Prop>,
    spawning: bool,
    cost_grid: CostGrid,
    #[serde(skip)]
    path_finder: PathFinder,
    #[serde(skip)]
    rotations: RotationTable,
}

impl World {
    /// Create an empty world.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32, config: GameConfig) -> Self {
        Self {
            tick: 0,
            next_id: 1,
            tilemap: TileMap::new(width, height),
            units: BTreeMap::new(),
            props: BTreeMap::new(),
            spawning: true,
            cost_grid: CostGrid::new(width, height),
            path_finder: PathFinder::new(config.diagonal_rule),
            rotations: RotationTable::new(),
            config,
        }
    }

    /// Build a world from level data.
    ///
    /// Objects that cannot be placed are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLevel`] or [`GameError::InvalidConfig`]
    /// if either input fails validation.
    pub fn from_level(level: &LevelData, config: GameConfig) -> Result<Self> {
        let errors = level.validate();
        if !errors.is_empty() {
            return Err(GameError::InvalidLevel(errors.join("; ")));
        }
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(GameError::InvalidConfig(errors.join("; ")));
        }

        let mut world = Self::new(level.width, level.height, config);
        let mut skipped = 0usize;
        for object in &level.objects {
            match world.place_object(object.category, object.position(), object.direction()) {
                Ok(id) => {
                    if object.category == TileCategory::Guard {
                        for &point in &object.patrol {
                            world.add_patrol_point(id, point)?;
                        }
                    }
                }
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(
                        category = ?object.category,
                        x = object.x,
                        y = object.y,
                        %err,
                        "Skipping level object"
                    );
                }
            }
        }

        tracing::info!(
            width = level.width,
            height = level.height,
            units = world.units.len(),
            props = world.props.len(),
            skipped,
            "Level loaded"
        );
        Ok(world)
    }

    /// Current tick.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Simulation tunables.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Occupancy map.
    #[must_use]
    pub const fn tilemap(&self) -> &TileMap {
        &self.tilemap
    }

    /// Units in ascending id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Props in ascending id order.
    pub fn props(&self) -> impl Iterator<Item = &Prop> {
        self.props.values()
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: ObjectId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Look up a unit mutably.
    pub fn unit_mut(&mut self, id: ObjectId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Look up a prop.
    #[must_use]
    pub fn prop(&self, id: ObjectId) -> Option<&Prop> {
        self.props.get(&id)
    }

    /// Number of live units.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Loot objects still in the world, lying or carried.
    #[must_use]
    pub fn loot_count(&self) -> usize {
        self.props
            .values()
            .filter(|prop| matches!(prop.kind, PropKind::Loot(_)))
            .count()
    }

    /// Whether spawn points release enemies.
    #[must_use]
    pub const fn is_spawning(&self) -> bool {
        self.spawning
    }

    /// Enable or disable every spawn point.
    pub fn set_spawning(&mut self, spawning: bool) {
        self.spawning = spawning;
    }

    /// Renderer transform of a unit.
    #[must_use]
    pub fn transform(&self, id: ObjectId) -> Option<Transform> {
        self.units.get(&id).map(|unit| unit.transform(&self.rotations))
    }

    /// Place a new object.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] for a cell outside the map and
    /// [`GameError::OccupancyConflict`] if the placement rules reject it.
    pub fn place_object(
        &mut self,
        category: TileCategory,
        cell: GridPos,
        direction: Direction,
    ) -> Result<ObjectId> {
        if !self.tilemap.in_bounds(cell) {
            return Err(GameError::out_of_bounds(cell));
        }
        if !self.tilemap.is_placeable(cell, category) {
            return Err(GameError::OccupancyConflict {
                x: cell.x,
                y: cell.y,
                category,
            });
        }

        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let added = self.tilemap.add_object(cell, id, category);
        debug_assert!(added, "placeable cell must accept the object");

        if category.is_unit() {
            let (role, health) = if category == TileCategory::Guard {
                (Role::guard(), self.config.guard_health)
            } else {
                (Role::enemy(), self.config.enemy_health)
            };
            let vision = VisionCone::new(self.config.vision_radius, self.config.cone_table());
            let mut unit = Unit::new(id, role, cell, direction, health, vision);
            unit.rotate(&self.tilemap);
            self.units.insert(id, unit);
        } else {
            let kind = match category {
                TileCategory::Loot => PropKind::Loot(LootState::OnTile),
                TileCategory::Spawn => PropKind::Spawn(SpawnPoint {
                    timer: 0,
                    remaining: self.config.spawn_count,
                }),
                TileCategory::Trap => PropKind::Trap(TrapState {
                    active: true,
                    ammunition: self.config.trap_ammunition,
                    damage: self.config.trap_damage,
                }),
                _ => PropKind::Static,
            };
            self.props.insert(
                id,
                Prop {
                    id,
                    category,
                    tile: cell,
                    direction,
                    kind,
                },
            );
        }

        tracing::debug!(%id, ?category, %cell, "Object placed");
        Ok(id)
    }

    /// Remove an object. A removed unit drops what it carries.
    ///
    /// Returns `false` if no such object exists.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        if let Some(unit) = self.units.remove(&id) {
            self.tilemap.remove_object(id);
            if let Some(loot) = unit.held_object() {
                self.drop_loot(loot, unit.tile_position());
            }
            return true;
        }

        let Some(prop) = self.props.remove(&id) else {
            return false;
        };
        if let PropKind::Loot(LootState::Carried(carrier)) = prop.kind {
            if let Some(unit) = self.units.get_mut(&carrier) {
                unit.set_held_object(None);
            }
        } else {
            self.tilemap.remove_object(id);
        }
        true
    }

    /// Send a unit to `goal`.
    ///
    /// Returns `Ok(false)` if the unit is already planning a path.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownObject`] if no such unit exists.
    pub fn set_goal(&mut self, id: ObjectId, goal: GridPos) -> Result<bool> {
        let unit = self.units.get_mut(&id).ok_or(GameError::UnknownObject(id))?;
        Ok(unit.set_goal_tile_position(goal))
    }

    /// Append a point to a guard's patrol route.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownObject`] if `id` is not a guard.
    pub fn add_patrol_point(&mut self, id: ObjectId, point: GridPos) -> Result<()> {
        let brain = self
            .units
            .get_mut(&id)
            .and_then(|unit| unit.role_mut().as_guard_mut())
            .ok_or(GameError::UnknownObject(id))?;
        brain.set_patrol_point(point);
        Ok(())
    }

    /// Clear a guard's patrol route.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownObject`] if `id` is not a guard.
    pub fn remove_patrol(&mut self, id: ObjectId) -> Result<()> {
        let brain = self
            .units
            .get_mut(&id)
            .and_then(|unit| unit.role_mut().as_guard_mut())
            .ok_or(GameError::UnknownObject(id))?;
        brain.remove_patrol();
        Ok(())
    }

    /// Initial scan: every unit refreshes its vision and looks over the
    /// whole map for objectives.
    pub fn init_pathfinding(&mut self) -> Vec<UnitEvent> {
        let mut events = Vec::new();
        let mut ctx = MovementContext {
            tilemap: &mut self.tilemap,
            config: &self.config,
            path_finder: &mut self.path_finder,
            cost_grid: &mut self.cost_grid,
            events: &mut events,
        };
        for unit in self.units.values_mut() {
            unit.rotate(ctx.tilemap);
            unit.check_all_tiles(&mut ctx);
        }
        events
    }

    /// Advance the world by one tick.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = TickEvents::default();

        self.spawn_system(&mut events);
        self.movement_system(&mut events);
        self.trap_system(&mut events);
        self.interaction_system(&mut events);
        self.death_system(&mut events);
        self.idle_system(&mut events);

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "World state hash");
        }

        events
    }

    fn spawn_system(&mut self, events: &mut TickEvents) {
        if !self.spawning {
            return;
        }
        let interval = self.config.spawn_interval;
        let ready: Vec<(ObjectId, GridPos, Direction)> = self
            .props
            .values_mut()
            .filter_map(|prop| {
                let PropKind::Spawn(spawn) = &mut prop.kind else {
                    return None;
                };
                if spawn.remaining == 0 {
                    return None;
                }
                spawn.timer += 1;
                if spawn.timer < interval {
                    return None;
                }
                spawn.timer = 0;
                Some((prop.id, prop.tile, prop.direction))
            })
            .collect();

        for (spawn_id, tile, direction) in ready {
            match self.place_object(TileCategory::Enemy, tile, direction) {
                Ok(id) => {
                    if let Some(PropKind::Spawn(spawn)) =
                        self.props.get_mut(&spawn_id).map(|prop| &mut prop.kind)
                    {
                        spawn.remaining = spawn.remaining.saturating_sub(1);
                    }
                    self.scan_all(id, &mut events.unit_events);
                    tracing::debug!(spawn = %spawn_id, unit = %id, "Enemy spawned");
                    events.spawned.push(id);
                }
                Err(err) => {
                    tracing::trace!(spawn = %spawn_id, %err, "Spawn point blocked");
                }
            }
        }
    }

    fn movement_system(&mut self, events: &mut TickEvents) {
        let mut ctx = MovementContext {
            tilemap: &mut self.tilemap,
            config: &self.config,
            path_finder: &mut self.path_finder,
            cost_grid: &mut self.cost_grid,
            events: &mut events.unit_events,
        };
        for unit in self.units.values_mut() {
            unit.update(&mut ctx);
        }
    }

    fn trap_system(&mut self, events: &mut TickEvents) {
        for event in &events.unit_events {
            let UnitEvent::TileEntered { unit: unit_id, to, .. } = *event else {
                continue;
            };
            let Some(trap_id) = self.tilemap.object_on_tile(to, TileCategory::Trap) else {
                continue;
            };
            let Some(unit) = self.units.get_mut(&unit_id) else {
                continue;
            };
            if unit.category() != TileCategory::Enemy {
                continue;
            }
            let Some(Prop {
                kind: PropKind::Trap(trap),
                ..
            }) = self.props.get_mut(&trap_id)
            else {
                continue;
            };
            if !trap.active {
                continue;
            }

            unit.take_damage(trap.damage);
            trap.ammunition = trap.ammunition.saturating_sub(1);
            if trap.ammunition == 0 {
                trap.active = false;
            }
            tracing::debug!(trap = %trap_id, unit = %unit_id, "Trap triggered");
            events.traps_triggered.push(TrapTrigger {
                trap: trap_id,
                unit: unit_id,
                damage: trap.damage,
            });
        }
    }

    fn interaction_system(&mut self, events: &mut TickEvents) {
        let waiting: Vec<ObjectId> = self
            .units
            .values()
            .filter(|unit| unit.move_state() == MoveState::AtObjective)
            .map(Unit::id)
            .collect();
        for id in waiting {
            self.interact(id, events);
        }
    }

    fn interact(&mut self, id: ObjectId, events: &mut TickEvents) {
        let interaction = {
            let Some(unit) = self.units.get_mut(&id) else {
                return;
            };
            let Some(objective) = unit.objective() else {
                unit.clear_objective();
                return;
            };
            let in_reach = self
                .tilemap
                .locate(objective.id)
                .is_some_and(|placement| placement.pos.is_within_reach(unit.tile_position()));
            if !in_reach {
                tracing::debug!(unit = %id, objective = %objective.id, "Objective out of reach");
                unit.clear_objective();
                return;
            }

            unit.animate(if objective.category.is_unit() {
                AnimationState::Fight
            } else {
                AnimationState::Pickup
            });
            if !unit.use_countdown(self.config.interaction_ticks) {
                return;
            }

            match objective.category {
                TileCategory::Enemy | TileCategory::Guard => Interaction::Strike(objective.id),
                TileCategory::Loot => Interaction::PickUp(objective.id),
                TileCategory::Trap => Interaction::Disarm(objective.id),
                TileCategory::Spawn => Interaction::Escape,
                _ => Interaction::Abandon,
            }
        };

        match interaction {
            Interaction::Strike(target) => self.strike(id, target, events),
            Interaction::PickUp(loot) => self.pick_up(id, loot, events),
            Interaction::Disarm(trap) => {
                self.tilemap.remove_object(trap);
                self.props.remove(&trap);
                tracing::debug!(unit = %id, %trap, "Trap disarmed");
                events.traps_disarmed.push(trap);
                if let Some(unit) = self.units.get_mut(&id) {
                    unit.clear_objective();
                }
            }
            Interaction::Escape => self.escape(id, events),
            Interaction::Abandon => {
                if let Some(unit) = self.units.get_mut(&id) {
                    unit.clear_objective();
                }
            }
        }
    }

    /// Resolve a fight round. The attacker keeps fighting until the target
    /// is dead or gone.
    fn strike(&mut self, attacker: ObjectId, target: ObjectId, events: &mut TickEvents) {
        let damage = self.config.guard_damage;
        let target_dead = match self.units.get_mut(&target) {
            Some(unit) => {
                unit.take_damage(damage);
                events.hits.push(HitEvent {
                    attacker,
                    target,
                    damage,
                });
                unit.is_dead()
            }
            None => true,
        };
        if target_dead {
            if let Some(unit) = self.units.get_mut(&attacker) {
                unit.clear_objective();
            }
        }
    }

    fn pick_up(&mut self, id: ObjectId, loot: ObjectId, events: &mut TickEvents) {
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        if unit.held_object().is_none() && self.tilemap.remove_object(loot) {
            unit.set_held_object(Some(loot));
            if let Some(prop) = self.props.get_mut(&loot) {
                prop.kind = PropKind::Loot(LootState::Carried(id));
            }
            tracing::debug!(unit = %id, %loot, "Loot taken");
            events.loot_taken.push((id, loot));
        }
        unit.clear_objective();
    }

    /// An enemy at a spawn point leaves the map; with loot, the loot is gone
    /// for good.
    fn escape(&mut self, id: ObjectId, events: &mut TickEvents) {
        let Some(loot) = self.units.get(&id).and_then(Unit::held_object) else {
            if let Some(unit) = self.units.get_mut(&id) {
                unit.clear_objective();
            }
            return;
        };
        self.tilemap.remove_object(id);
        self.units.remove(&id);
        self.props.remove(&loot);
        tracing::info!(unit = %id, %loot, "Enemy escaped with loot");
        events.escaped.push(id);
    }

    fn death_system(&mut self, events: &mut TickEvents) {
        let dead: Vec<ObjectId> = self
            .units
            .values()
            .filter(|unit| unit.is_dead())
            .map(Unit::id)
            .collect();

        for id in dead {
            let Some(unit) = self.units.remove(&id) else {
                continue;
            };
            self.tilemap.remove_object(id);
            if let Some(loot) = unit.held_object() {
                if self.drop_loot(loot, unit.tile_position()) {
                    events.loot_dropped.push(loot);
                }
            }
            tracing::debug!(unit = %id, "Unit died");
            events.deaths.push(id);
        }
    }

    /// Put carried loot back on `tile`. Loot that does not fit is lost.
    fn drop_loot(&mut self, loot: ObjectId, tile: GridPos) -> bool {
        let Some(prop) = self.props.get_mut(&loot) else {
            return false;
        };
        if self.tilemap.is_placeable(tile, TileCategory::Loot)
            && self.tilemap.add_object(tile, loot, TileCategory::Loot)
        {
            prop.tile = tile;
            prop.kind = PropKind::Loot(LootState::OnTile);
            true
        } else {
            tracing::debug!(%loot, %tile, "Dropped loot lost");
            self.props.remove(&loot);
            false
        }
    }

    fn idle_system(&mut self, events: &mut TickEvents) {
        let mut ctx = MovementContext {
            tilemap: &mut self.tilemap,
            config: &self.config,
            path_finder: &mut self.path_finder,
            cost_grid: &mut self.cost_grid,
            events: &mut events.unit_events,
        };

        for unit in self.units.values_mut() {
            if unit.move_state() != MoveState::Idle {
                continue;
            }
            unit.check_visible_tiles(&mut ctx);
            if unit.move_state() != MoveState::Idle {
                continue;
            }
            match unit.category() {
                TileCategory::Guard => {
                    let tile = unit.tile_position();
                    let goal = unit.role_mut().as_guard_mut().and_then(|brain| {
                        brain
                            .take_last_sighting()
                            .filter(|&sighting| sighting != tile)
                            .or_else(|| brain.next_patrol_goal(tile))
                    });
                    if let Some(goal) = goal {
                        unit.set_goal_tile_position(goal);
                    }
                }
                _ => unit.check_all_tiles(&mut ctx),
            }
        }
    }

    fn scan_all(&mut self, id: ObjectId, events: &mut Vec<UnitEvent>) {
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        let mut ctx = MovementContext {
            tilemap: &mut self.tilemap,
            config: &self.config,
            path_finder: &mut self.path_finder,
            cost_grid: &mut self.cost_grid,
            events,
        };
        unit.check_all_tiles(&mut ctx);
    }

    /// Grow the map by `offset` tiles on every side, shifting every object.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MapTooLarge`] if the grown map would not fit the
    /// coordinate range; the world is left unchanged.
    pub fn enlarge_tilemap(&mut self, offset: u32) -> Result<()> {
        if offset == 0 {
            return Ok(());
        }
        self.tilemap = self.tilemap.enlarge(offset)?;
        // enlarge only succeeds for offsets within i32 range
        let shift = offset as i32;
        self.translate_objects(GridPos::new(shift, shift));
        Ok(())
    }

    /// Shrink the map to the bounding box of its occupants.
    ///
    /// Returns the translation applied to every object.
    pub fn minimize_tilemap(&mut self) -> GridPos {
        let tilemap = std::mem::replace(&mut self.tilemap, TileMap::new(1, 1));
        let (tilemap, shift) = tilemap.minimize();
        self.tilemap = tilemap;
        if shift != GridPos::ZERO {
            self.translate_objects(shift);
        }
        shift
    }

    fn translate_objects(&mut self, shift: GridPos) {
        for prop in self.props.values_mut() {
            prop.tile = prop.tile + shift;
        }
        for unit in self.units.values_mut() {
            unit.translate(shift);
            unit.rotate(&self.tilemap);
        }
        self.cost_grid.rebuild_from(&self.tilemap);
    }

    /// Compute a hash of the world state for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.next_id.hash(&mut hasher);
        self.tilemap.width().hash(&mut hasher);
        self.tilemap.height().hash(&mut hasher);

        // Occupancy in row-major order
        for (id, placement) in self.tilemap.iter_objects() {
            id.hash(&mut hasher);
            placement.pos.hash(&mut hasher);
            placement.category.hash(&mut hasher);
        }

        self.units.len().hash(&mut hasher);
        for (id, unit) in &self.units {
            id.hash(&mut hasher);
            unit.position().x.to_bits().hash(&mut hasher);
            unit.position().y.to_bits().hash(&mut hasher);
            unit.tile_position().hash(&mut hasher);
            unit.next_tile().hash(&mut hasher);
            unit.direction().hash(&mut hasher);
            unit.move_state().hash(&mut hasher);
            unit.goal_tile_position().hash(&mut hasher);
            unit.path_length().hash(&mut hasher);
            unit.health().hash(&mut hasher);
            unit.held_object().hash(&mut hasher);
            unit.objective().map(|objective| objective.id).hash(&mut hasher);
            unit.interaction_timer().hash(&mut hasher);
            unit.wait_ticks().hash(&mut hasher);
            unit.avoided_tile().hash(&mut hasher);
            unit.animation().hash(&mut hasher);
            if let Some(brain) = unit.role().as_guard() {
                brain.patrol_route().hash(&mut hasher);
                brain.next_patrol_index().hash(&mut hasher);
                brain.last_sighting().hash(&mut hasher);
            }
        }

        self.props.len().hash(&mut hasher);
        for prop in self.props.values() {
            prop.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Serialize the world state to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Serialization`] if encoding fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::Serialization(format!("Failed to serialize world: {e}")))
    }

    /// Deserialize world state from bytes.
    ///
    /// Search buffers and vision are rebuilt; the result continues exactly
    /// where the serialized world left off.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Serialization`] if decoding fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let mut world: Self = bincode::deserialize(data)
            .map_err(|e| GameError::Serialization(format!("Failed to deserialize world: {e}")))?;
        world.path_finder = PathFinder::new(world.config.diagonal_rule);
        for unit in world.units.values_mut() {
            unit.rotate(&world.tilemap);
        }
        Ok(world)
    }
}
