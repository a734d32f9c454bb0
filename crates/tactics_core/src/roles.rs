//! Per-role reactions to what a unit sees.
//!
//! Guards and enemies look at the same tiles but want different things. Each
//! role implements [`TileEvaluator`], which ranks a seen object as a possible
//! objective; lower priority values win.

use serde::{Deserialize, Serialize};

use crate::grid::GridPos;
use crate::tilemap::{ObjectId, TileCategory};

/// Priority of chasing an intruder.
pub const PRIORITY_INTRUDER: u8 = 0;
/// Priority of escaping with loot.
pub const PRIORITY_ESCAPE: u8 = 0;
/// Priority of grabbing loot.
pub const PRIORITY_LOOT: u8 = 1;
/// Priority of disarming a trap.
pub const PRIORITY_DISARM: u8 = 2;

/// An object found on a tile during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeenObject {
    /// Object id.
    pub id: ObjectId,
    /// Category it is registered under.
    pub category: TileCategory,
    /// Tile it stands on.
    pub tile: GridPos,
}

/// State of the evaluating unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationContext {
    /// Tile the unit stands on.
    pub tile: GridPos,
    /// Object the unit is carrying.
    pub held_object: Option<ObjectId>,
}

/// Ranks seen objects as objectives.
pub trait TileEvaluator {
    /// Priority of `seen` as an objective, or `None` if the role ignores it.
    fn evaluate_tile(&mut self, seen: &SeenObject, ctx: &EvaluationContext) -> Option<u8>;
}

/// Guard behaviour: chase enemies, walk a patrol route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardBrain {
    patrol_route: Vec<GridPos>,
    next_patrol_point: usize,
    last_sighting: Option<GridPos>,
}

impl GuardBrain {
    /// Append a point to the patrol route.
    pub fn set_patrol_point(&mut self, point: GridPos) {
        self.patrol_route.push(point);
    }

    /// Current patrol route.
    #[must_use]
    pub fn patrol_route(&self) -> &[GridPos] {
        &self.patrol_route
    }

    /// Index of the patrol point to try next.
    #[must_use]
    pub const fn next_patrol_index(&self) -> usize {
        self.next_patrol_point
    }

    /// Forget the patrol route.
    pub fn remove_patrol(&mut self) {
        self.patrol_route.clear();
        self.next_patrol_point = 0;
    }

    /// Tile of the most recent intruder sighting.
    #[must_use]
    pub const fn last_sighting(&self) -> Option<GridPos> {
        self.last_sighting
    }

    /// Take the last sighting, leaving none.
    pub fn take_last_sighting(&mut self) -> Option<GridPos> {
        self.last_sighting.take()
    }

    /// Shift the route and the last sighting by `shift`.
    pub fn translate(&mut self, shift: GridPos) {
        for point in &mut self.patrol_route {
            *point = *point + shift;
        }
        self.last_sighting = self.last_sighting.map(|tile| tile + shift);
    }

    /// Next patrol point to walk to, cycling through the route.
    ///
    /// A point equal to `current` is skipped once, so a guard standing on a
    /// patrol point moves on to the following one.
    pub fn next_patrol_goal(&mut self, current: GridPos) -> Option<GridPos> {
        if self.patrol_route.is_empty() {
            return None;
        }
        for _ in 0..self.patrol_route.len() {
            let point = self.patrol_route[self.next_patrol_point % self.patrol_route.len()];
            self.next_patrol_point = (self.next_patrol_point + 1) % self.patrol_route.len();
            if point != current {
                return Some(point);
            }
        }
        None
    }
}

impl TileEvaluator for GuardBrain {
    fn evaluate_tile(&mut self, seen: &SeenObject, _ctx: &EvaluationContext) -> Option<u8> {
        match seen.category {
            TileCategory::Enemy => {
                self.last_sighting = Some(seen.tile);
                Some(PRIORITY_INTRUDER)
            }
            _ => None,
        }
    }
}

/// Enemy behaviour: steal loot, escape through a spawn point, disarm traps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyBrain;

impl TileEvaluator for EnemyBrain {
    fn evaluate_tile(&mut self, seen: &SeenObject, ctx: &EvaluationContext) -> Option<u8> {
        let holding = ctx.held_object.is_some();
        match seen.category {
            TileCategory::Loot if !holding => Some(PRIORITY_LOOT),
            TileCategory::Spawn if holding => Some(PRIORITY_ESCAPE),
            TileCategory::Trap => Some(PRIORITY_DISARM),
            _ => None,
        }
    }
}

/// A unit's role and its role-specific state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Player-side unit.
    Guard(GuardBrain),
    /// Hostile unit.
    Enemy(EnemyBrain),
}

impl Role {
    /// Fresh guard role.
    #[must_use]
    pub fn guard() -> Self {
        Self::Guard(GuardBrain::default())
    }

    /// Fresh enemy role.
    #[must_use]
    pub fn enemy() -> Self {
        Self::Enemy(EnemyBrain)
    }

    /// Category the unit registers under on the tile map.
    #[must_use]
    pub const fn category(&self) -> TileCategory {
        match self {
            Self::Guard(_) => TileCategory::Guard,
            Self::Enemy(_) => TileCategory::Enemy,
        }
    }

    /// Evaluation capability of this role.
    pub fn evaluator(&mut self) -> &mut dyn TileEvaluator {
        match self {
            Self::Guard(brain) => brain,
            Self::Enemy(brain) => brain,
        }
    }

    /// Guard state, if this is a guard.
    #[must_use]
    pub const fn as_guard(&self) -> Option<&GuardBrain> {
        match self {
            Self::Guard(brain) => Some(brain),
            Self::Enemy(_) => None,
        }
    }

    /// Mutable guard state, if this is a guard.
    pub fn as_guard_mut(&mut self) -> Option<&mut GuardBrain> {
        match self {
            Self::Guard(brain) => Some(brain),
            Self::Enemy(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seen(category: TileCategory) -> SeenObject {
        SeenObject {
            id: ObjectId(9),
            category,
            tile: GridPos::new(2, 2),
        }
    }

    fn ctx(held_object: Option<ObjectId>) -> EvaluationContext {
        EvaluationContext {
            tile: GridPos::ZERO,
            held_object,
        }
    }

    #[test]
    fn test_guard_chases_enemies_only() {
        let mut role = Role::guard();
        let evaluator = role.evaluator();
        assert_eq!(evaluator.evaluate_tile(&seen(TileCategory::Enemy), &ctx(None)), Some(0));
        assert_eq!(evaluator.evaluate_tile(&seen(TileCategory::Loot), &ctx(None)), None);
        assert_eq!(evaluator.evaluate_tile(&seen(TileCategory::Trap), &ctx(None)), None);
        assert_eq!(
            role.as_guard().and_then(GuardBrain::last_sighting),
            Some(GridPos::new(2, 2))
        );
    }

    #[test]
    fn test_enemy_priorities_depend_on_cargo() {
        let mut role = Role::enemy();
        let evaluator = role.evaluator();
        let empty = ctx(None);
        let carrying = ctx(Some(ObjectId(4)));
        let mut rate = |category, context: &EvaluationContext| {
            evaluator.evaluate_tile(&seen(category), context)
        };

        assert_eq!(rate(TileCategory::Loot, &empty), Some(PRIORITY_LOOT));
        assert_eq!(rate(TileCategory::Spawn, &empty), None);
        assert_eq!(rate(TileCategory::Loot, &carrying), None);
        assert_eq!(rate(TileCategory::Spawn, &carrying), Some(PRIORITY_ESCAPE));
        assert_eq!(rate(TileCategory::Trap, &carrying), Some(PRIORITY_DISARM));
        assert_eq!(rate(TileCategory::Guard, &carrying), None);
    }

    #[test]
    fn test_patrol_cycles() {
        let mut brain = GuardBrain::default();
        assert_eq!(brain.next_patrol_goal(GridPos::ZERO), None);

        brain.set_patrol_point(GridPos::new(1, 1));
        brain.set_patrol_point(GridPos::new(4, 1));
        assert_eq!(brain.next_patrol_goal(GridPos::ZERO), Some(GridPos::new(1, 1)));
        assert_eq!(brain.next_patrol_goal(GridPos::new(1, 1)), Some(GridPos::new(4, 1)));
        assert_eq!(brain.next_patrol_goal(GridPos::new(4, 1)), Some(GridPos::new(1, 1)));

        brain.remove_patrol();
        assert!(brain.patrol_route().is_empty());
    }

    #[test]
    fn test_single_point_patrol_at_point_stays() {
        let mut brain = GuardBrain::default();
        brain.set_patrol_point(GridPos::new(3, 3));
        assert_eq!(brain.next_patrol_goal(GridPos::new(3, 3)), None);
        assert_eq!(brain.next_patrol_goal(GridPos::ZERO), Some(GridPos::new(3, 3)));
    }

    #[test]
    fn test_role_categories() {
        assert_eq!(Role::guard().category(), TileCategory::Guard);
        assert_eq!(Role::enemy().category(), TileCategory::Enemy);
        assert!(Role::enemy().as_guard().is_none());
    }
}
