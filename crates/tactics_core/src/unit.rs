//! Per-unit movement state machine.
//!
//! A unit alternates between discrete tile steps and continuous movement:
//!
//! ```text
//! Idle --set_goal--> FindingPath --path--> Moving --centred--> SwitchingTile
//!                        |                   ^                      |
//!                        +--no path--> Idle  +------path left-------+
//!                                                                   |
//!                              AtObjective <--objective in reach----+
//! ```
//!
//! The unit stays registered on its old tile while moving and commits the
//! new tile through [`TileMap::move_object`] on arrival, so a vacated cell is
//! released before the new one is claimed.

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::grid::{Direction, GridPos, RotationTable};
use crate::math::{frac_sqrt_2_2, Vec2Fixed};
use crate::pathfinding::{octile_distance, CostGrid, PathFinder, BLOCKED};
use crate::roles::{EvaluationContext, Role, SeenObject};
use crate::tilemap::{ObjectId, TileCategory, TileMap};
use crate::transform::{AnimationState, Transform};
use crate::vision::VisionCone;

/// Movement state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MoveState {
    /// Standing still without a goal.
    #[default]
    Idle,
    /// Waiting for a path to be planned this tick.
    FindingPath,
    /// Interpolating toward the next tile.
    Moving,
    /// Centred on a tile, committing it and picking the next step.
    SwitchingTile,
    /// In reach of the objective, waiting for the interaction to resolve.
    AtObjective,
}

/// A weak reference to the object a unit is heading for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    /// Target object.
    pub id: ObjectId,
    /// Tile the target was last known to occupy.
    pub tile: GridPos,
    /// Category the target is registered under.
    pub category: TileCategory,
    /// Priority assigned by the role; lower is more urgent.
    pub priority: u8,
}

/// Something that happened to a unit during an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitEvent {
    /// A path was planned.
    PathFound {
        /// Unit id.
        unit: ObjectId,
        /// Steps in the path.
        steps: usize,
    },
    /// Planning failed; the unit went idle.
    PathFailed {
        /// Unit id.
        unit: ObjectId,
        /// Requested goal.
        goal: GridPos,
    },
    /// The unit committed a new tile.
    TileEntered {
        /// Unit id.
        unit: ObjectId,
        /// Tile left.
        from: GridPos,
        /// Tile entered.
        to: GridPos,
    },
    /// The next tile is held by a unit of the same category.
    Blocked {
        /// Unit id.
        unit: ObjectId,
        /// Contested tile.
        tile: GridPos,
    },
    /// The unit picked a new objective.
    ObjectiveAdopted {
        /// Unit id.
        unit: ObjectId,
        /// Target object.
        objective: ObjectId,
        /// Role priority.
        priority: u8,
    },
    /// The unit is in reach of its objective.
    ObjectiveReached {
        /// Unit id.
        unit: ObjectId,
        /// Target object.
        objective: ObjectId,
    },
}

/// Shared resources a unit needs for one update.
///
/// One context is built per tick by the world and lent to every unit in
/// turn.
#[derive(Debug)]
pub struct MovementContext<'a> {
    /// Occupancy map, mutated on tile commits.
    pub tilemap: &'a mut TileMap,
    /// Simulation tunables.
    pub config: &'a GameConfig,
    /// Search buffers shared by all units.
    pub path_finder: &'a mut PathFinder,
    /// Cost grid rebuilt before every search.
    pub cost_grid: &'a mut CostGrid,
    /// Event sink.
    pub events: &'a mut Vec<UnitEvent>,
}

/// A guard or enemy on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    id: ObjectId,
    role: Role,
    position: Vec2Fixed,
    tile: GridPos,
    next_tile: GridPos,
    direction: Direction,
    state: MoveState,
    goal: GridPos,
    /// Remaining steps, goal first; the next step is at the end.
    path: Vec<GridPos>,
    objective: Option<Objective>,
    health: i32,
    held_object: Option<ObjectId>,
    vision: VisionCone,
    animation: AnimationState,
    interaction_timer: Option<u32>,
    wait_ticks: u32,
    /// Cell treated as blocked by the next search.
    avoid: Option<GridPos>,
}

impl Unit {
    /// Create a unit standing at rest on `tile`.
    ///
    /// The caller registers the unit on the tile map.
    #[must_use]
    pub fn new(
        id: ObjectId,
        role: Role,
        tile: GridPos,
        direction: Direction,
        health: i32,
        vision: VisionCone,
    ) -> Self {
        Self {
            id,
            role,
            position: Vec2Fixed::from_grid(tile),
            tile,
            next_tile: tile,
            direction,
            state: MoveState::Idle,
            goal: tile,
            path: Vec::new(),
            objective: None,
            health,
            held_object: None,
            vision,
            animation: AnimationState::Idle,
            interaction_timer: None,
            wait_ticks: 0,
            avoid: None,
        }
    }

    /// Unit id.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// Role and its state.
    #[must_use]
    pub const fn role(&self) -> &Role {
        &self.role
    }

    /// Mutable role state.
    pub fn role_mut(&mut self) -> &mut Role {
        &mut self.role
    }

    /// Category the unit registers under.
    #[must_use]
    pub const fn category(&self) -> TileCategory {
        self.role.category()
    }

    /// Continuous world position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Tile the unit is registered on.
    #[must_use]
    pub const fn tile_position(&self) -> GridPos {
        self.tile
    }

    /// Tile the unit is heading into (its own tile when at rest).
    #[must_use]
    pub const fn next_tile(&self) -> GridPos {
        self.next_tile
    }

    /// Requested goal tile.
    #[must_use]
    pub const fn goal_tile_position(&self) -> GridPos {
        self.goal
    }

    /// Ticks spent waiting on a blocked tile.
    #[must_use]
    pub const fn wait_ticks(&self) -> u32 {
        self.wait_ticks
    }

    /// Cell the next search treats as blocked.
    #[must_use]
    pub const fn avoided_tile(&self) -> Option<GridPos> {
        self.avoid
    }

    /// Current movement state.
    #[must_use]
    pub const fn move_state(&self) -> MoveState {
        self.state
    }

    /// Facing direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Remaining path steps after the next tile.
    #[must_use]
    pub fn path_length(&self) -> usize {
        self.path.len()
    }

    /// Current objective.
    #[must_use]
    pub const fn objective(&self) -> Option<Objective> {
        self.objective
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    /// True once health has dropped to zero or below.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Apply damage.
    pub fn take_damage(&mut self, damage: i32) {
        self.health -= damage;
        tracing::debug!(unit = %self.id, damage, health = self.health, "Unit damaged");
    }

    /// Object the unit is carrying.
    #[must_use]
    pub const fn held_object(&self) -> Option<ObjectId> {
        self.held_object
    }

    /// Start carrying `object`, returning whatever was held before.
    pub fn set_held_object(&mut self, object: Option<ObjectId>) -> Option<ObjectId> {
        std::mem::replace(&mut self.held_object, object)
    }

    /// Animation token for the renderer.
    #[must_use]
    pub const fn animation(&self) -> AnimationState {
        self.animation
    }

    /// Set the animation token.
    pub fn animate(&mut self, animation: AnimationState) {
        self.animation = animation;
    }

    /// Vision cone and its last result.
    #[must_use]
    pub const fn vision(&self) -> &VisionCone {
        &self.vision
    }

    /// World transform for the renderer.
    #[must_use]
    pub fn transform(&self, rotations: &RotationTable) -> Transform {
        Transform::new(self.position, rotations.get(self.direction))
    }

    /// Turn to face `direction` and recompute vision.
    pub fn set_direction(&mut self, direction: Direction, tilemap: &TileMap) {
        self.direction = direction;
        self.rotate(tilemap);
    }

    /// Recompute vision for the current tile and facing.
    pub fn rotate(&mut self, tilemap: &TileMap) {
        self.vision.find_visible_tiles(tilemap, self.tile, self.direction);
    }

    /// Shift every tile reference by `shift` after the map was resized.
    pub fn translate(&mut self, shift: GridPos) {
        self.position = self.position + Vec2Fixed::from_grid(shift);
        self.tile = self.tile + shift;
        self.next_tile = self.next_tile + shift;
        self.goal = self.goal + shift;
        for cell in &mut self.path {
            *cell = *cell + shift;
        }
        if let Some(objective) = &mut self.objective {
            objective.tile = objective.tile + shift;
        }
        self.avoid = self.avoid.map(|cell| cell + shift);
        if let Some(brain) = self.role.as_guard_mut() {
            brain.translate(shift);
        }
    }

    /// Request a path to `goal`.
    ///
    /// Ignored (returns `false`) while a path is already being planned.
    /// Clears the current objective.
    pub fn set_goal_tile_position(&mut self, goal: GridPos) -> bool {
        if self.state == MoveState::FindingPath {
            return false;
        }
        self.clear_objective();
        self.goal = goal;
        self.state = MoveState::FindingPath;
        tracing::debug!(unit = %self.id, %goal, "Goal requested");
        true
    }

    /// Drop the objective and the remaining path.
    ///
    /// A unit waiting at its objective goes idle.
    pub fn clear_objective(&mut self) {
        self.objective = None;
        self.path.clear();
        self.interaction_timer = None;
        if self.state == MoveState::AtObjective {
            self.state = MoveState::Idle;
            self.animation = AnimationState::Idle;
        }
    }

    /// Advance an interaction countdown of `frames` ticks.
    ///
    /// The first call starts the countdown; each later call ticks it down;
    /// the call that finds it at zero returns `true` and resets it.
    pub fn use_countdown(&mut self, frames: u32) -> bool {
        match self.interaction_timer {
            None => {
                self.interaction_timer = Some(frames);
                false
            }
            Some(0) => {
                self.interaction_timer = None;
                true
            }
            Some(remaining) => {
                self.interaction_timer = Some(remaining - 1);
                false
            }
        }
    }

    /// Ticks left on the running interaction, if any.
    #[must_use]
    pub const fn interaction_timer(&self) -> Option<u32> {
        self.interaction_timer
    }

    /// Run one simulation tick.
    pub fn update(&mut self, ctx: &mut MovementContext<'_>) {
        match self.state {
            MoveState::Idle | MoveState::AtObjective => {}
            MoveState::FindingPath => self.find_path(ctx),
            MoveState::Moving => self.moving(ctx),
            MoveState::SwitchingTile => self.switching_tile(ctx),
        }
    }

    fn at_rest(&self) -> bool {
        self.next_tile == self.tile && self.position == Vec2Fixed::from_grid(self.tile)
    }

    fn objective_in_reach(&self) -> bool {
        self.objective
            .is_some_and(|objective| objective.tile.is_within_reach(self.tile))
    }

    fn go_idle(&mut self) {
        self.objective = None;
        self.path.clear();
        self.state = MoveState::Idle;
        self.animation = AnimationState::Idle;
    }

    fn reach_objective(&mut self, ctx: &mut MovementContext<'_>) {
        let Some(objective) = self.objective else {
            return;
        };
        self.path.clear();
        self.state = MoveState::AtObjective;
        self.animation = AnimationState::Idle;
        if let Some(facing) = Direction::from_offset(objective.tile - self.tile) {
            self.set_direction(facing, ctx.tilemap);
        }
        tracing::debug!(unit = %self.id, objective = %objective.id, "Objective reached");
        ctx.events.push(UnitEvent::ObjectiveReached {
            unit: self.id,
            objective: objective.id,
        });
    }

    /// Plan from the next tile to the goal on a freshly rebuilt cost grid.
    fn find_path(&mut self, ctx: &mut MovementContext<'_>) {
        ctx.cost_grid.rebuild_from(ctx.tilemap);
        if let Some(avoid) = self.avoid.take() {
            if avoid != self.goal {
                ctx.cost_grid.set_tile_cost(avoid, BLOCKED);
            }
        }

        match ctx.path_finder.find_path(ctx.cost_grid, self.next_tile, self.goal) {
            Ok(path) => {
                self.path = path.iter().rev().copied().collect();
                ctx.events.push(UnitEvent::PathFound {
                    unit: self.id,
                    steps: self.path.len(),
                });
            }
            Err(err) => {
                tracing::debug!(unit = %self.id, %err, "Planning failed");
                ctx.events.push(UnitEvent::PathFailed {
                    unit: self.id,
                    goal: self.goal,
                });
                self.go_idle();
                return;
            }
        }

        if !self.at_rest() {
            // Mid-step: finish the current step first.
            self.state = MoveState::Moving;
        } else if self.objective_in_reach() {
            self.reach_objective(ctx);
        } else if self.path.is_empty() {
            self.go_idle();
        } else {
            self.depart(ctx);
        }
    }

    /// Step toward the centre of the next tile.
    fn moving(&mut self, ctx: &MovementContext<'_>) {
        let target = Vec2Fixed::from_grid(self.next_tile);
        let speed = if self.direction.is_diagonal() {
            ctx.config.move_speed() * frac_sqrt_2_2()
        } else {
            ctx.config.move_speed()
        };
        // Signed by what is left to cover, so a walk back to the registered
        // tile (next_tile == tile) still moves.
        let step = Vec2Fixed::new(
            speed * (target.x - self.position.x).signum(),
            speed * (target.y - self.position.y).signum(),
        );
        self.position = self.position.step_towards(target, step);
        tracing::trace!(unit = %self.id, x = %self.position.x, y = %self.position.y, "Moving");

        if self.position == target {
            self.state = MoveState::SwitchingTile;
        }
    }

    /// Commit the reached tile and decide what comes next.
    fn switching_tile(&mut self, ctx: &mut MovementContext<'_>) {
        if self.next_tile != self.tile {
            if ctx.tilemap.move_object(self.id, self.next_tile) {
                let from = self.tile;
                self.tile = self.next_tile;
                self.wait_ticks = 0;
                self.rotate(ctx.tilemap);
                ctx.events.push(UnitEvent::TileEntered {
                    unit: self.id,
                    from,
                    to: self.tile,
                });
            } else {
                self.wait_on_commit(ctx);
                return;
            }
        }

        self.track_objective(ctx.tilemap);

        if self.state == MoveState::FindingPath {
            // Objective moved; replanned next tick.
        } else if self.objective_in_reach() {
            self.reach_objective(ctx);
        } else if self.path.is_empty() {
            self.go_idle();
        } else {
            self.depart(ctx);
        }

        self.check_visible_tiles(ctx);
    }

    /// The committed tile was taken by someone else: wait, then walk back.
    fn wait_on_commit(&mut self, ctx: &mut MovementContext<'_>) {
        self.wait_ticks += 1;
        ctx.events.push(UnitEvent::Blocked {
            unit: self.id,
            tile: self.next_tile,
        });
        if self.wait_ticks <= ctx.config.max_wait_ticks {
            return;
        }

        tracing::debug!(unit = %self.id, tile = %self.next_tile, "Giving up contested tile");
        let back = self.tile;
        if let Some(facing) = Direction::from_offset(back - self.next_tile) {
            self.set_direction(facing, ctx.tilemap);
        }
        self.next_tile = back;
        self.wait_ticks = 0;
        self.objective = None;
        self.path.clear();
        self.state = MoveState::Moving;
        self.animation = AnimationState::Walk;
    }

    /// Refresh the objective's tile; replan if it moved, drop it if gone.
    fn track_objective(&mut self, tilemap: &TileMap) {
        let Some(objective) = self.objective else {
            return;
        };
        match tilemap.locate(objective.id) {
            None => {
                tracing::debug!(unit = %self.id, objective = %objective.id, "Objective vanished");
                self.objective = None;
                self.path.clear();
            }
            Some(placement) if placement.pos != objective.tile => {
                self.objective = Some(Objective {
                    tile: placement.pos,
                    ..objective
                });
                if !placement.pos.is_within_reach(self.tile) {
                    self.goal = placement.pos;
                    self.state = MoveState::FindingPath;
                }
            }
            Some(_) => {}
        }
    }

    /// Start moving into the next path cell, after re-validating it.
    fn depart(&mut self, ctx: &mut MovementContext<'_>) {
        let Some(&next) = self.path.last() else {
            self.go_idle();
            return;
        };

        let Some(facing) = Direction::from_offset(next - self.tile) else {
            self.state = MoveState::FindingPath;
            return;
        };

        if ctx.tilemap.is_blocked(next) {
            tracing::debug!(unit = %self.id, tile = %next, "Path blocked, replanning");
            self.state = MoveState::FindingPath;
            return;
        }

        let occupant = ctx.tilemap.object_on_tile(next, self.category());
        if occupant.is_some_and(|other| other != self.id) {
            self.wait_ticks += 1;
            self.state = MoveState::SwitchingTile;
            ctx.events.push(UnitEvent::Blocked {
                unit: self.id,
                tile: next,
            });
            if self.wait_ticks > ctx.config.max_wait_ticks {
                self.wait_ticks = 0;
                self.avoid = Some(next);
                self.state = MoveState::FindingPath;
            }
            return;
        }

        self.path.pop();
        self.wait_ticks = 0;
        self.next_tile = next;
        self.set_direction(facing, ctx.tilemap);
        self.animation = AnimationState::Walk;
        self.state = MoveState::Moving;
    }

    /// Evaluate the objects on every visible tile.
    pub fn check_visible_tiles(&mut self, ctx: &mut MovementContext<'_>) {
        let visible = self.vision.visible_tiles().to_vec();
        let own = self.category();
        for tile in visible {
            let mut candidates = vec![TileCategory::Trap];
            if own != TileCategory::Enemy {
                candidates.push(TileCategory::Enemy);
            }
            if own != TileCategory::Guard {
                candidates.push(TileCategory::Guard);
            }
            candidates.push(TileCategory::Loot);

            for category in candidates {
                if let Some(id) = ctx.tilemap.object_on_tile(tile, category) {
                    self.consider(SeenObject { id, category, tile }, ctx);
                }
            }
        }
    }

    /// Omniscient scan: rebuild the cost grid and evaluate every loot and
    /// spawn point on the map.
    pub fn check_all_tiles(&mut self, ctx: &mut MovementContext<'_>) {
        ctx.cost_grid.rebuild_from(ctx.tilemap);
        let (width, height) = (ctx.tilemap.width() as i32, ctx.tilemap.height() as i32);
        for y in 0..height {
            for x in 0..width {
                let tile = GridPos::new(x, y);
                let seen = if let Some(id) = ctx.tilemap.object_on_tile(tile, TileCategory::Loot) {
                    Some(SeenObject {
                        id,
                        category: TileCategory::Loot,
                        tile,
                    })
                } else {
                    ctx.tilemap
                        .object_on_tile(tile, TileCategory::Spawn)
                        .map(|id| SeenObject {
                            id,
                            category: TileCategory::Spawn,
                            tile,
                        })
                };
                if let Some(seen) = seen {
                    self.consider(seen, ctx);
                }
            }
        }
    }

    /// Adopt `seen` as the objective if the role ranks it above the current one.
    fn consider(&mut self, seen: SeenObject, ctx: &mut MovementContext<'_>) {
        if seen.id == self.id {
            return;
        }
        let eval_ctx = EvaluationContext {
            tile: self.tile,
            held_object: self.held_object,
        };
        let Some(priority) = self.role.evaluator().evaluate_tile(&seen, &eval_ctx) else {
            return;
        };

        if let Some(current) = self.objective {
            if current.id == seen.id {
                return;
            }
            let closer =
                octile_distance(self.tile, seen.tile) < octile_distance(self.tile, current.tile);
            let better =
                priority < current.priority || (priority == current.priority && closer);
            if !better {
                return;
            }
        }

        self.objective = Some(Objective {
            id: seen.id,
            tile: seen.tile,
            category: seen.category,
            priority,
        });
        self.goal = seen.tile;
        self.interaction_timer = None;
        tracing::debug!(unit = %self.id, objective = %seen.id, priority, "Objective adopted");
        ctx.events.push(UnitEvent::ObjectiveAdopted {
            unit: self.id,
            objective: seen.id,
            priority,
        });

        if self.at_rest() && self.objective_in_reach() {
            self.reach_objective(ctx);
        } else {
            self.path.clear();
            self.state = MoveState::FindingPath;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Fixed;
    use crate::vision::ConeTable;

    struct Fixture {
        tilemap: TileMap,
        config: GameConfig,
        path_finder: PathFinder,
        cost_grid: CostGrid,
        events: Vec<UnitEvent>,
    }

    impl Fixture {
        fn new(width: u32, height: u32) -> Self {
            let mut tilemap = TileMap::new(width, height);
            let mut id = 10_000;
            for y in 0..height as i32 {
                for x in 0..width as i32 {
                    tilemap.add_object(GridPos::new(x, y), ObjectId(id), TileCategory::Floor);
                    id += 1;
                }
            }
            Self {
                cost_grid: CostGrid::new(width, height),
                tilemap,
                config: GameConfig {
                    ticks_per_tile: 4,
                    ..GameConfig::default()
                },
                path_finder: PathFinder::default(),
                events: Vec::new(),
            }
        }

        fn ctx(&mut self) -> MovementContext<'_> {
            MovementContext {
                tilemap: &mut self.tilemap,
                config: &self.config,
                path_finder: &mut self.path_finder,
                cost_grid: &mut self.cost_grid,
                events: &mut self.events,
            }
        }

        fn spawn(&mut self, id: u32, role: Role, tile: GridPos) -> Unit {
            let unit = Unit::new(
                ObjectId(id),
                role,
                tile,
                Direction::South,
                3,
                VisionCone::new(4, ConeTable::default()),
            );
            assert!(self.tilemap.add_object(tile, unit.id(), unit.category()));
            unit
        }

        fn run(&mut self, unit: &mut Unit, ticks: usize) {
            for _ in 0..ticks {
                unit.update(&mut self.ctx());
            }
        }

        fn tiles_entered(&self) -> usize {
            self.events
                .iter()
                .filter(|e| matches!(e, UnitEvent::TileEntered { .. }))
                .count()
        }
    }

    #[test]
    fn test_goal_ignored_while_finding_path() {
        let mut fx = Fixture::new(5, 5);
        let mut unit = fx.spawn(1, Role::guard(), GridPos::ZERO);
        assert!(unit.set_goal_tile_position(GridPos::new(4, 0)));
        assert!(!unit.set_goal_tile_position(GridPos::new(0, 4)));
        assert_eq!(unit.goal_tile_position(), GridPos::new(4, 0));
        assert_eq!(unit.move_state(), MoveState::FindingPath);
    }

    #[test]
    fn test_first_step_consumed_on_plan() {
        let mut fx = Fixture::new(5, 5);
        let mut unit = fx.spawn(1, Role::guard(), GridPos::ZERO);
        unit.set_goal_tile_position(GridPos::new(3, 0));
        fx.run(&mut unit, 1);

        assert_eq!(unit.move_state(), MoveState::Moving);
        assert_eq!(unit.next_tile(), GridPos::new(1, 0));
        assert_eq!(unit.direction(), Direction::East);
        assert_eq!(unit.animation(), AnimationState::Walk);
        assert_eq!(unit.path_length(), 2);
    }

    #[test]
    fn test_walks_to_goal() {
        let mut fx = Fixture::new(5, 5);
        let mut unit = fx.spawn(1, Role::guard(), GridPos::ZERO);
        unit.set_goal_tile_position(GridPos::new(3, 0));
        fx.run(&mut unit, 40);

        assert_eq!(unit.move_state(), MoveState::Idle);
        assert_eq!(unit.tile_position(), GridPos::new(3, 0));
        assert_eq!(unit.position(), Vec2Fixed::from_grid(GridPos::new(3, 0)));
        assert_eq!(fx.tiles_entered(), 3);
        assert_eq!(
            fx.tilemap.object_on_tile(GridPos::new(3, 0), TileCategory::Guard),
            Some(ObjectId(1))
        );
        assert!(!fx.tilemap.is_guard_on_tile(GridPos::ZERO));
    }

    #[test]
    fn test_diagonal_steps_take_longer_per_axis() {
        let mut fx = Fixture::new(5, 5);
        let mut unit = fx.spawn(1, Role::guard(), GridPos::ZERO);
        unit.set_goal_tile_position(GridPos::new(1, 1));
        fx.run(&mut unit, 5);
        // Four axis ticks would finish a straight step; a diagonal is still
        // under way.
        assert_eq!(unit.move_state(), MoveState::Moving);
        assert_eq!(unit.direction(), Direction::SouthEast);
        fx.run(&mut unit, 10);
        assert_eq!(unit.tile_position(), GridPos::new(1, 1));
    }

    #[test]
    fn test_unreachable_goal_goes_idle() {
        let mut fx = Fixture::new(5, 5);
        for (i, cell) in [(3, 0), (3, 1), (4, 1)].into_iter().enumerate() {
            let wall = GridPos::new(cell.0, cell.1);
            fx.tilemap
                .add_object(wall, ObjectId(500 + i as u32), TileCategory::Wall);
        }
        let mut unit = fx.spawn(1, Role::guard(), GridPos::ZERO);
        unit.set_goal_tile_position(GridPos::new(4, 0));
        fx.run(&mut unit, 1);

        assert_eq!(unit.move_state(), MoveState::Idle);
        assert_eq!(unit.path_length(), 0);
        assert!(fx
            .events
            .iter()
            .any(|e| matches!(e, UnitEvent::PathFailed { .. })));
    }

    #[test]
    fn test_blocked_cell_triggers_replan() {
        let mut fx = Fixture::new(5, 3);
        let mut unit = fx.spawn(1, Role::guard(), GridPos::new(0, 1));
        unit.set_goal_tile_position(GridPos::new(4, 1));
        fx.run(&mut unit, 1);
        assert_eq!(unit.next_tile(), GridPos::new(1, 1));

        // Drop furniture on the straight route after planning.
        fx.tilemap
            .add_object(GridPos::new(2, 1), ObjectId(900), TileCategory::Furniture);
        fx.run(&mut unit, 60);

        assert_eq!(unit.tile_position(), GridPos::new(4, 1));
        let replans = fx
            .events
            .iter()
            .filter(|e| matches!(e, UnitEvent::PathFound { .. }))
            .count();
        assert_eq!(replans, 2);
    }

    #[test]
    fn test_objective_in_reach_stops_unit() {
        let mut fx = Fixture::new(7, 3);
        fx.tilemap
            .add_object(GridPos::new(5, 1), ObjectId(50), TileCategory::Loot);
        let mut unit = fx.spawn(1, Role::enemy(), GridPos::new(0, 1));
        unit.check_all_tiles(&mut fx.ctx());

        assert_eq!(unit.objective().map(|o| o.id), Some(ObjectId(50)));
        assert_eq!(unit.move_state(), MoveState::FindingPath);

        fx.run(&mut unit, 40);
        assert_eq!(unit.move_state(), MoveState::AtObjective);
        assert_eq!(unit.tile_position(), GridPos::new(4, 1));
        assert_eq!(unit.direction(), Direction::East);

        unit.clear_objective();
        assert_eq!(unit.move_state(), MoveState::Idle);
    }

    #[test]
    fn test_vanished_objective_is_dropped() {
        let mut fx = Fixture::new(7, 3);
        fx.tilemap
            .add_object(GridPos::new(6, 1), ObjectId(50), TileCategory::Loot);
        let mut unit = fx.spawn(1, Role::enemy(), GridPos::new(0, 1));
        unit.check_all_tiles(&mut fx.ctx());
        fx.run(&mut unit, 2);

        fx.tilemap.remove_object(ObjectId(50));
        fx.run(&mut unit, 10);
        assert_eq!(unit.objective(), None);
        assert_eq!(unit.move_state(), MoveState::Idle);
    }

    #[test]
    fn test_better_priority_replaces_objective() {
        let mut fx = Fixture::new(9, 3);
        // The far loot is scanned first.
        fx.tilemap
            .add_object(GridPos::new(8, 0), ObjectId(50), TileCategory::Loot);
        fx.tilemap
            .add_object(GridPos::new(4, 1), ObjectId(51), TileCategory::Loot);
        let mut unit = fx.spawn(1, Role::enemy(), GridPos::new(0, 1));
        unit.check_all_tiles(&mut fx.ctx());
        // Same priority: the closer loot wins.
        assert_eq!(unit.objective().map(|o| o.id), Some(ObjectId(51)));

        unit.set_held_object(Some(ObjectId(51)));
        fx.tilemap
            .add_object(GridPos::new(0, 0), ObjectId(60), TileCategory::Spawn);
        unit.check_all_tiles(&mut fx.ctx());
        assert_eq!(unit.objective().map(|o| o.id), Some(ObjectId(60)));
        assert_eq!(unit.objective().map(|o| o.priority), Some(0));
    }

    #[test]
    fn test_same_category_unit_blocks_departure() {
        let mut fx = Fixture::new(5, 1);
        let mut blocker = fx.spawn(2, Role::guard(), GridPos::new(1, 0));
        let mut unit = fx.spawn(1, Role::guard(), GridPos::ZERO);
        unit.set_goal_tile_position(GridPos::new(3, 0));
        fx.run(&mut unit, 1);

        assert_eq!(unit.move_state(), MoveState::SwitchingTile);
        assert_eq!(unit.tile_position(), GridPos::ZERO);
        assert!(fx
            .events
            .iter()
            .any(|e| matches!(e, UnitEvent::Blocked { tile, .. } if *tile == GridPos::new(1, 0))));

        // Once the blocker leaves, the unit carries on.
        blocker.set_goal_tile_position(GridPos::new(4, 0));
        for _ in 0..40 {
            blocker.update(&mut fx.ctx());
            unit.update(&mut fx.ctx());
        }
        assert_eq!(blocker.tile_position(), GridPos::new(4, 0));
        assert_eq!(unit.tile_position(), GridPos::new(3, 0));
    }

    #[test]
    fn test_lost_contest_walks_back_and_idles() {
        let mut fx = Fixture::new(3, 1);
        let mut winner = fx.spawn(1, Role::guard(), GridPos::ZERO);
        let mut loser = fx.spawn(2, Role::guard(), GridPos::new(2, 0));
        let middle = GridPos::new(1, 0);
        winner.set_goal_tile_position(middle);
        loser.set_goal_tile_position(middle);

        for _ in 0..10 {
            winner.update(&mut fx.ctx());
            loser.update(&mut fx.ctx());
        }
        assert_eq!(winner.tile_position(), middle);
        assert_eq!(loser.tile_position(), GridPos::new(2, 0));
        assert_eq!(loser.position(), Vec2Fixed::from_grid(middle));

        let max_wait = fx.config.max_wait_ticks as usize;
        fx.run(&mut loser, max_wait + 10);
        assert_eq!(loser.move_state(), MoveState::Idle);
        assert_eq!(loser.tile_position(), GridPos::new(2, 0));
        assert_eq!(loser.next_tile(), GridPos::new(2, 0));
        assert_eq!(loser.position(), Vec2Fixed::from_grid(GridPos::new(2, 0)));
        assert_eq!(loser.direction(), Direction::East);
    }

    #[test]
    fn test_use_countdown() {
        let mut fx = Fixture::new(3, 3);
        let mut unit = fx.spawn(1, Role::guard(), GridPos::ZERO);
        assert!(!unit.use_countdown(2));
        assert_eq!(unit.interaction_timer(), Some(2));
        assert!(!unit.use_countdown(2));
        assert!(!unit.use_countdown(2));
        assert!(unit.use_countdown(2));
        assert_eq!(unit.interaction_timer(), None);
    }

    #[test]
    fn test_guard_spots_enemy_in_cone() {
        let mut fx = Fixture::new(7, 7);
        let _enemy = fx.spawn(2, Role::enemy(), GridPos::new(3, 5));
        let mut guard = fx.spawn(1, Role::guard(), GridPos::new(3, 1));
        guard.rotate(&fx.tilemap);
        guard.check_visible_tiles(&mut fx.ctx());

        assert_eq!(guard.objective().map(|o| o.id), Some(ObjectId(2)));
        assert_eq!(guard.move_state(), MoveState::FindingPath);
        assert_eq!(guard.goal_tile_position(), GridPos::new(3, 5));
    }

    #[test]
    fn test_damage_and_cargo() {
        let mut fx = Fixture::new(3, 3);
        let mut unit = fx.spawn(1, Role::enemy(), GridPos::ZERO);
        unit.take_damage(2);
        assert_eq!(unit.health(), 1);
        assert!(!unit.is_dead());
        unit.take_damage(1);
        assert!(unit.is_dead());

        assert_eq!(unit.set_held_object(Some(ObjectId(7))), None);
        assert_eq!(unit.held_object(), Some(ObjectId(7)));
        assert_eq!(unit.set_held_object(None), Some(ObjectId(7)));
    }

    #[test]
    fn test_transform_follows_position() {
        let mut fx = Fixture::new(3, 3);
        let unit = fx.spawn(1, Role::guard(), GridPos::new(2, 1));
        let table = RotationTable::new();
        let transform = unit.transform(&table);
        assert_eq!(transform.translation[0], Fixed::from_num(2));
        assert_eq!(transform.translation[2], Fixed::from_num(1));
        assert_eq!(transform.yaw(), table.get(Direction::South).yaw);
    }
}
