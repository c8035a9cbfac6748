//! # Autoexplore Module
//!
//! Decision making for auto-play: where to step next while exploring and
//! what to do in an encounter.
//!
//! Every call re-evaluates its priorities from the current view. The
//! explorer only remembers what it needs to notice that it is stuck, plus a
//! held route while it walks out of a back-and-forth loop.

use crate::{find_path, ratio, Direction, Enemy, Item, Level, Position, TileType};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Calls at one position after which a random step is forced.
const SAME_POSITION_LIMIT: u32 = 3;

/// Calls that found the explorer where it stood before, after which a
/// random step is forced.
const NO_PROGRESS_LIMIT: u32 = 20;

/// Recent positions kept for loop detection.
const LOOP_WINDOW: usize = 12;

/// A full window spread over no more cells than this is a loop.
const LOOP_CELLS: usize = 3;

/// Mana needed before the combat agent considers magic.
const MAGIC_MANA: u32 = crate::config::MAGIC_COST;

/// What the explorer saw when it decided.
#[derive(Debug, Clone, Copy)]
pub struct ExplorationView<'a> {
    pub player_pos: Position,
    pub hp: u32,
    pub max_hp: u32,
    pub level: &'a Level,
    pub enemies: &'a [Enemy],
    pub items: &'a [Item],
}

/// Why the explorer picked its last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExploreReason {
    SeekFountain,
    SeekStairs,
    SeekItem,
    SeekEnemy,
    ExploreUnknown,
    ReturnToStairs,
    /// Nothing to aim for
    Wander,
    /// A target was chosen but no path step led there
    PathFallback,
    /// Same position three calls in a row
    Unstuck,
    /// Twenty calls without moving
    NoProgress,
    /// Walking a held route out of a back-and-forth loop
    HoldRoute,
}

/// Steps left on a route the explorer committed to.
#[derive(Debug, Clone)]
struct Route {
    goal: Position,
    /// Where the explorer stands if the previous step went through
    expected: Position,
    steps: VecDeque<Direction>,
}

/// Exploration agent with stuck detection.
#[derive(Debug, Clone, Default)]
pub struct ExplorationAgent {
    last_position: Option<Position>,
    same_position_calls: u32,
    no_progress_calls: u32,
    recent: VecDeque<Position>,
    route: Option<Route>,
    last_reason: Option<ExploreReason>,
}

impl ExplorationAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything; called when the level changes.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn last_reason(&self) -> Option<ExploreReason> {
        self.last_reason
    }

    /// Picks the next step.
    ///
    /// Priorities, highest first:
    /// 1. below 40% hp, walk to the nearest visible fountain;
    /// 2. with every enemy dead, walk to the nearest revealed stairs;
    /// 3. above 50% hp, sometimes grab the nearest visible item;
    /// 4. above 60% hp, engage the nearest visible enemy;
    /// 5. explore the nearest unrevealed floor, then the stairs, then wander.
    ///
    /// An explorer that keeps bouncing between a few cells stops
    /// re-deciding: it holds the whole path to the revealed stairs (or to
    /// its current target) until it gets there or the path breaks.
    ///
    /// Returns `None` only when no neighbouring cell is walkable.
    pub fn decide_exploration_move(
        &mut self,
        view: &ExplorationView,
        rng: &mut StdRng,
    ) -> Option<Direction> {
        let pos = view.player_pos;

        if self.last_position == Some(pos) {
            self.same_position_calls += 1;
            self.no_progress_calls += 1;
        } else {
            self.same_position_calls = 1;
        }
        self.last_position = Some(pos);

        if self.recent.len() == LOOP_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(pos);

        if self.same_position_calls >= SAME_POSITION_LIMIT {
            self.same_position_calls = 0;
            self.route = None;
            log::debug!("Explorer stuck at ({}, {})", pos.x, pos.y);
            return self.random_step(view, rng, ExploreReason::Unstuck);
        }
        if self.no_progress_calls >= NO_PROGRESS_LIMIT {
            self.no_progress_calls = 0;
            self.route = None;
            log::debug!("Explorer made no progress, forcing a random step");
            return self.random_step(view, rng, ExploreReason::NoProgress);
        }

        if let Some(direction) = self.follow_route(view) {
            self.last_reason = Some(ExploreReason::HoldRoute);
            return Some(direction);
        }

        let target = choose_target(view, rng);
        if self.is_looping() {
            self.recent.clear();
            let goal = nearest_revealed_stairs(view.level, pos).or(target.map(|(_, goal)| goal));
            if let Some(goal) = goal {
                if let Some(direction) = self.hold_route(view, goal) {
                    self.last_reason = Some(ExploreReason::HoldRoute);
                    return Some(direction);
                }
            }
        }

        match target {
            Some((reason, goal)) => match first_step(view, goal) {
                Some(direction) => {
                    log::debug!("Explorer {:?} toward ({}, {})", reason, goal.x, goal.y);
                    self.last_reason = Some(reason);
                    Some(direction)
                }
                None => self.random_step(view, rng, ExploreReason::PathFallback),
            },
            None => self.random_step(view, rng, ExploreReason::Wander),
        }
    }

    fn is_looping(&self) -> bool {
        self.recent.len() == LOOP_WINDOW
            && self.recent.iter().collect::<HashSet<_>>().len() <= LOOP_CELLS
    }

    /// Commits to the full path toward `goal` and takes its first step.
    fn hold_route(&mut self, view: &ExplorationView, goal: Position) -> Option<Direction> {
        let level = view.level;
        let path = find_path(view.player_pos, goal, &level.tiles, level.width, level.height)?;
        let steps = path
            .into_iter()
            .map(Direction::from_delta)
            .collect::<Option<VecDeque<_>>>()?;
        log::debug!(
            "Explorer looping around ({}, {}), holding a {}-step route to ({}, {})",
            view.player_pos.x,
            view.player_pos.y,
            steps.len(),
            goal.x,
            goal.y
        );
        self.route = Some(Route {
            goal,
            expected: view.player_pos,
            steps,
        });
        self.follow_route(view)
    }

    /// Next step of the held route; drops the route once it is walked, or
    /// when the last step did not land where planned.
    fn follow_route(&mut self, view: &ExplorationView) -> Option<Direction> {
        let mut route = self.route.take()?;
        if route.expected != view.player_pos || route.expected == route.goal {
            return None;
        }
        let direction = route.steps.pop_front()?;
        let next = view.player_pos + direction.to_delta();
        if !view.level.is_walkable(next) {
            return None;
        }
        route.expected = next;
        self.route = Some(route);
        Some(direction)
    }

    fn random_step(
        &mut self,
        view: &ExplorationView,
        rng: &mut StdRng,
        reason: ExploreReason,
    ) -> Option<Direction> {
        self.last_reason = Some(reason);
        random_walkable_direction(view.level, view.player_pos, rng)
    }
}

fn choose_target(view: &ExplorationView, rng: &mut StdRng) -> Option<(ExploreReason, Position)> {
    let pos = view.player_pos;
    let level = view.level;
    let hp_ratio = ratio(view.hp, view.max_hp);

    if hp_ratio < 0.4 {
        let fountains = level
            .positions_of(TileType::HealingFountain)
            .into_iter()
            .filter(|&p| level.is_visible(p));
        if let Some(fountain) = nearest(pos, fountains) {
            return Some((ExploreReason::SeekFountain, fountain));
        }
    }

    let any_enemy_alive = view.enemies.iter().any(Enemy::is_alive);
    if !any_enemy_alive {
        if let Some(stairs) = nearest_revealed_stairs(level, pos) {
            return Some((ExploreReason::SeekStairs, stairs));
        }
    } else {
        let visible_items = view
            .items
            .iter()
            .filter_map(|item| item.position)
            .filter(|&p| level.is_visible(p));
        if let Some(item) = nearest(pos, visible_items) {
            if hp_ratio > 0.5 && rng.gen_bool(0.3) {
                return Some((ExploreReason::SeekItem, item));
            }
        }

        if hp_ratio > 0.6 {
            let visible_enemies = view
                .enemies
                .iter()
                .filter(|e| e.is_alive() && level.is_visible(e.position))
                .map(|e| e.position);
            if let Some(enemy) = nearest(pos, visible_enemies) {
                return Some((ExploreReason::SeekEnemy, enemy));
            }
        }
    }

    let unexplored = level
        .tiles
        .iter()
        .filter(|tile| !tile.revealed && tile.tile_type == TileType::Floor)
        .map(|tile| tile.position);
    if let Some(frontier) = nearest(pos, unexplored) {
        return Some((ExploreReason::ExploreUnknown, frontier));
    }

    nearest_revealed_stairs(level, pos).map(|stairs| (ExploreReason::ReturnToStairs, stairs))
}

fn nearest_revealed_stairs(level: &Level, from: Position) -> Option<Position> {
    let stairs = level
        .positions_of(TileType::StairsDown)
        .into_iter()
        .filter(|&p| level.is_revealed(p));
    nearest(from, stairs)
}

/// Closest candidate by Manhattan distance; the first wins ties.
fn nearest(from: Position, candidates: impl Iterator<Item = Position>) -> Option<Position> {
    let mut best: Option<(u32, Position)> = None;
    for candidate in candidates {
        let distance = from.manhattan_distance(candidate);
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, candidate));
        }
    }
    best.map(|(_, p)| p)
}

fn first_step(view: &ExplorationView, goal: Position) -> Option<Direction> {
    let level = view.level;
    let path = find_path(view.player_pos, goal, &level.tiles, level.width, level.height)?;
    path.first().copied().and_then(Direction::from_delta)
}

/// A uniformly random direction whose destination is walkable.
pub fn random_walkable_direction(
    level: &Level,
    from: Position,
    rng: &mut StdRng,
) -> Option<Direction> {
    let options: Vec<Direction> = Direction::cardinal()
        .into_iter()
        .filter(|d| level.is_walkable(from + d.to_delta()))
        .collect();
    options.choose(rng).copied()
}

/// What the fighter sees of an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatView {
    pub hp: u32,
    pub max_hp: u32,
    pub mana: u32,
    pub max_mana: u32,
    pub enemy_hp: u32,
    pub enemy_max_hp: u32,
    pub enemy_is_boss: bool,
}

/// Intents available in a dungeon encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatAction {
    Attack,
    Defend,
    Magic,
    /// Manual play only
    Flee,
}

/// Chooses an encounter action. Never flees.
///
/// # Examples
///
/// ```
/// use depths::{decide_combat_action, CombatAction, CombatView};
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
/// let view = CombatView {
///     hp: 90, max_hp: 100, mana: 0, max_mana: 50,
///     enemy_hp: 40, enemy_max_hp: 60, enemy_is_boss: false,
/// };
/// assert_eq!(decide_combat_action(&view, &mut rng), CombatAction::Attack);
/// ```
pub fn decide_combat_action(view: &CombatView, rng: &mut StdRng) -> CombatAction {
    let hp_ratio = ratio(view.hp, view.max_hp);
    let enemy_ratio = ratio(view.enemy_hp, view.enemy_max_hp);
    let can_cast = view.mana >= MAGIC_MANA;

    if hp_ratio < 0.35 && rng.gen_bool(0.5) {
        return CombatAction::Defend;
    }
    if view.enemy_is_boss && can_cast && rng.gen_bool(0.7) {
        return CombatAction::Magic;
    }
    if enemy_ratio > 0.8 && ratio(view.mana, view.max_mana) > 0.3 && can_cast {
        return CombatAction::Magic;
    }
    if enemy_ratio < 0.25 && can_cast && rng.gen_bool(0.6) {
        return CombatAction::Magic;
    }
    CombatAction::Attack
}
