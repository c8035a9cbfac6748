//! # Game State Module
//!
//! Session orchestration: owns the current level, the player and everything
//! the subsystems hand back, and turns player or agent intents into state
//! changes.
//!
//! The orchestrator is the only mutable owner of session data. Generation
//! output is handed over once per level, and every intent is fully resolved
//! (including death checks) before the call returns.

use crate::{
    config, decide_combat_action, Ability, Action, BattleCharacter, BattleEvent, BattleSession,
    BattleState, Character, CombatAction, CombatView, DepthsError, DepthsResult, Direction,
    DungeonGenerator, Enemy, EntityId, ExplorationAgent, ExplorationView, GenerationConfig,
    GenerationRequest, Generator, IdCounters, Item, ItemType, Level, LevelResult, Player,
    Position, Room, Side, TileType,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

/// Mana restored by defending in an encounter.
const DEFEND_MANA: u32 = 5;

/// Ticks an encounter may run while waiting for the player's turn.
const MAX_WAIT_TICKS: u32 = 1_000;

/// Arena slots of a dungeon encounter.
const HERO: Side = Side::Player(0);
const FOE: Side = Side::Enemy(0);

/// Chance that fleeing from a regular enemy succeeds.
const FLEE_CHANCE: f64 = 0.5;

/// Auto-play drinks a potion below this hp ratio.
const AUTOPLAY_POTION_RATIO: f64 = 0.3;

/// Auto-play rests at an inn below this hp ratio.
const AUTOPLAY_REST_RATIO: f64 = 0.5;

/// Settings for one play session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seed for every random decision in the session
    pub seed: u64,
    pub width: i32,
    pub height: i32,
    /// Deepest level index; descending from it wins the run
    pub max_depth: u32,
    pub player_name: String,
    /// Delay the runner waits between auto-play steps
    pub tick_interval_ms: u64,
    pub generation: GenerationConfig,
}

impl SessionConfig {
    /// Creates the default session configuration for a seed.
    ///
    /// # Examples
    ///
    /// ```
    /// use depths::SessionConfig;
    ///
    /// let config = SessionConfig::new(42);
    /// assert_eq!(config.seed, 42);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            width: config::DEFAULT_DUNGEON_WIDTH,
            height: config::DEFAULT_DUNGEON_HEIGHT,
            max_depth: config::DEFAULT_MAX_DEPTH,
            player_name: "Hero".to_string(),
            tick_interval_ms: 0,
            generation: GenerationConfig::new(),
        }
    }

    /// Small, shallow session for tests.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            width: 40,
            height: 30,
            max_depth: 3,
            generation: GenerationConfig::for_testing(),
            ..Self::new(seed)
        }
    }

    /// Loads a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> DepthsResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: SessionConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DepthsResult<()> {
        self.generation.validate(self.width, self.height)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Game statistics tracking player progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    pub enemies_defeated: u32,
    pub bosses_defeated: u32,
    /// Deepest level index entered
    pub max_depth_reached: u32,
    pub items_collected: u32,
    pub gold_collected: u32,
    pub damage_dealt: u64,
    pub damage_taken: u64,
    pub steps_taken: u64,
    pub potions_used: u32,
}

impl GameStatistics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Game completion state for handling endings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameCompletionState {
    Playing,
    /// Descended past the deepest level
    Victory,
    PlayerDied,
}

/// An enemy the player is locked in combat with.
///
/// The battle owns both combatants for the encounter's lifetime; the
/// session copies hp and mana back after every round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    /// Index into the level's enemy list
    pub enemy_index: usize,
    pub enemy_id: EntityId,
    pub battle: BattleSession,
}

/// Result of a movement intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    Moved,
    /// The destination is a wall
    Blocked,
    /// A living enemy stopped the move, or an aggressive one jumped in after it
    EncounterStarted { enemy_id: EntityId },
    PickedUp { count: usize },
    Fountain { healed: u32 },
    EnteredShop,
    EnteredInn,
    Descended { level_index: u32 },
    Victory,
}

/// Result of a combat intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatOutcome {
    /// Both sides acted and both still stand
    Exchanged { dealt: u32, taken: u32 },
    EnemyDefeated {
        xp: u32,
        levels_gained: u32,
        loot_dropped: bool,
    },
    Fled,
    PlayerDied,
}

/// What one auto-play step did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AutoplayIntent {
    DrinkPotion { healed: u32 },
    Equip { item: String },
    Combat {
        action: CombatAction,
        outcome: CombatOutcome,
    },
    Rest { cost: u32 },
    Move {
        direction: Direction,
        outcome: MoveOutcome,
    },
    /// No walkable neighbour
    Idle,
}

/// Auto-play switch plus the explorer's memory (not serialized).
#[derive(Debug, Clone, Default)]
pub struct AutoplayState {
    pub enabled: bool,
    pub steps: u64,
    explorer: ExplorationAgent,
}

/// Serializable view of a session for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub level_index: u32,
    pub max_depth: u32,
    pub level: Level,
    pub player: Player,
    /// Living enemies only
    pub enemies: Vec<Enemy>,
    pub items: Vec<Item>,
    pub shop_stock: Vec<Item>,
    pub encounter: Option<Encounter>,
    pub messages: Vec<String>,
    pub statistics: GameStatistics,
    pub completion_state: GameCompletionState,
    pub autoplay: bool,
}

/// The session orchestrator.
#[derive(Debug, Clone)]
pub struct GameState {
    pub config: SessionConfig,
    pub level_index: u32,
    pub level: Level,
    pub rooms: Vec<Room>,
    /// Every enemy of the level; dead ones stay so ids are never reused
    pub enemies: Vec<Enemy>,
    /// Items lying on the floor
    pub items: Vec<Item>,
    pub shop_stock: Vec<Item>,
    pub player: Player,
    pub ids: IdCounters,
    pub encounter: Option<Encounter>,
    pub statistics: GameStatistics,
    pub completion_state: GameCompletionState,
    generator: DungeonGenerator,
    rng: StdRng,
    messages: VecDeque<String>,
    autoplay: AutoplayState,
}

impl GameState {
    /// Starts a session on a freshly generated level 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use depths::{GameCompletionState, GameState, SessionConfig};
    ///
    /// let game = GameState::new(SessionConfig::for_testing(7)).unwrap();
    /// assert_eq!(game.level_index, 0);
    /// assert_eq!(game.completion_state, GameCompletionState::Playing);
    /// ```
    pub fn new(config: SessionConfig) -> DepthsResult<Self> {
        config.validate()?;
        let mut state = Self::empty(config);
        state.load_level(0)?;
        state.push_message(format!("{} enters the depths.", state.player.name));
        Ok(state)
    }

    /// Starts a session on an already generated level.
    pub fn with_level(
        config: SessionConfig,
        level_index: u32,
        result: LevelResult,
    ) -> DepthsResult<Self> {
        let mut state = Self::empty(config);
        state.install_level(level_index, result);
        Ok(state)
    }

    fn empty(config: SessionConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let generator = DungeonGenerator::with_config(config.generation.clone());
        let player = Player::new(config.player_name.clone(), Position::origin());
        Self {
            level_index: 0,
            level: Level::new(config.width, config.height),
            rooms: Vec::new(),
            enemies: Vec::new(),
            items: Vec::new(),
            shop_stock: Vec::new(),
            player,
            ids: IdCounters::default(),
            encounter: None,
            statistics: GameStatistics::new(),
            completion_state: GameCompletionState::Playing,
            generator,
            rng,
            messages: VecDeque::new(),
            autoplay: AutoplayState::default(),
            config,
        }
    }

    fn load_level(&mut self, level_index: u32) -> DepthsResult<()> {
        let request = GenerationRequest {
            width: self.config.width,
            height: self.config.height,
            level_index,
            ids: self.ids,
        };
        let result = self.generator.generate(&request, &mut self.rng)?;
        self.install_level(level_index, result);
        Ok(())
    }

    fn install_level(&mut self, level_index: u32, result: LevelResult) {
        self.level_index = level_index;
        self.level = result.level;
        self.rooms = result.rooms;
        self.enemies = result.enemies;
        self.items = result.items;
        self.ids = result.ids;
        self.shop_stock = self
            .generator
            .items
            .shop_stock(level_index, &mut self.ids, &mut self.rng);
        self.player.position = result.player_spawn;
        self.level.update_visibility(result.player_spawn);
        self.encounter = None;
        self.autoplay.explorer.reset();
        self.statistics.max_depth_reached = self.statistics.max_depth_reached.max(level_index);
        log::info!(
            "Entered level {} ({} rooms, {} enemies, {} items)",
            level_index,
            self.rooms.len(),
            self.enemies.len(),
            self.items.len()
        );
    }

    pub fn is_game_over(&self) -> bool {
        self.completion_state != GameCompletionState::Playing
    }

    fn ensure_playing(&self) -> DepthsResult<()> {
        if self.is_game_over() {
            return Err(DepthsError::InvalidState(format!(
                "Session has ended: {:?}",
                self.completion_state
            )));
        }
        Ok(())
    }

    /// The newest messages, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Appends to the message log, dropping the oldest entry past the cap.
    pub fn push_message(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("{}", message);
        self.messages.push_back(message);
        while self.messages.len() > config::MAX_MESSAGES {
            self.messages.pop_front();
        }
    }

    fn living_enemy_at(&self, pos: Position) -> Option<usize> {
        self.enemies
            .iter()
            .position(|e| e.is_alive() && e.position == pos)
    }

    fn adjacent_aggressor(&self) -> Option<usize> {
        let pos = self.player.position;
        self.enemies
            .iter()
            .position(|e| e.is_alive() && e.aggressive && e.position.manhattan_distance(pos) == 1)
    }

    fn start_encounter(&mut self, enemy_index: usize) -> MoveOutcome {
        let enemy = &self.enemies[enemy_index];
        let enemy_id = enemy.id;
        let battle = BattleSession::init(
            vec![Character::from_enemy(enemy)],
            vec![Character::from_player(&self.player)],
            Vec::new(),
        );
        let message = if enemy.boss {
            format!("{} rises to face you!", enemy.name)
        } else {
            format!("A {} blocks your path!", enemy.name)
        };
        self.encounter = Some(Encounter {
            enemy_index,
            enemy_id,
            battle,
        });
        self.push_message(message);
        MoveOutcome::EncounterStarted { enemy_id }
    }

    /// Tries to step one cell.
    ///
    /// Moves off the grid are rejected before anything changes.
    pub fn try_move(&mut self, direction: Direction) -> DepthsResult<MoveOutcome> {
        self.ensure_playing()?;
        if self.encounter.is_some() {
            return Err(DepthsError::InvalidAction(
                "Cannot move during an encounter".to_string(),
            ));
        }

        let target = self.player.position + direction.to_delta();
        if !self.level.in_bounds(target) {
            return Err(DepthsError::OutOfBounds {
                x: target.x,
                y: target.y,
            });
        }
        if !self.level.is_walkable(target) {
            return Ok(MoveOutcome::Blocked);
        }
        if let Some(index) = self.living_enemy_at(target) {
            return Ok(self.start_encounter(index));
        }

        self.player.position = target;
        self.player.restore_mana(1);
        self.statistics.steps_taken += 1;
        self.level.update_visibility(target);

        let picked = self.pick_up_items(target);

        let outcome = match self.level.tile_type(target) {
            Some(TileType::HealingFountain) => {
                let healed = self.player.heal(config::FOUNTAIN_HEAL);
                self.push_message(format!("The fountain restores {} hp.", healed));
                MoveOutcome::Fountain { healed }
            }
            Some(TileType::Shop) => {
                self.push_message("You enter a shop.");
                MoveOutcome::EnteredShop
            }
            Some(TileType::Inn) => {
                self.push_message("You enter an inn.");
                MoveOutcome::EnteredInn
            }
            Some(TileType::StairsDown) => return self.descend(),
            _ if picked > 0 => MoveOutcome::PickedUp { count: picked },
            _ => MoveOutcome::Moved,
        };

        if matches!(outcome, MoveOutcome::Moved | MoveOutcome::PickedUp { .. }) {
            if let Some(index) = self.adjacent_aggressor() {
                return Ok(self.start_encounter(index));
            }
        }
        Ok(outcome)
    }

    fn pick_up_items(&mut self, pos: Position) -> usize {
        let (here, rest): (Vec<Item>, Vec<Item>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|item| item.position == Some(pos));
        self.items = rest;

        let count = here.len();
        for mut item in here {
            self.statistics.items_collected += 1;
            if item.item_type == ItemType::Gold {
                self.player.gold += item.gold;
                self.statistics.gold_collected += item.gold;
                self.push_message(format!("You pick up {} gold.", item.gold));
            } else {
                item.position = None;
                self.push_message(format!("You pick up {}.", item.name));
                self.player.inventory.push(item);
            }
        }
        count
    }

    fn descend(&mut self) -> DepthsResult<MoveOutcome> {
        if self.level_index >= self.config.max_depth {
            self.completion_state = GameCompletionState::Victory;
            self.push_message("You escape the deepest level. Victory!");
            log::info!("Run won at depth {}", self.level_index);
            return Ok(MoveOutcome::Victory);
        }
        let next = self.level_index + 1;
        self.load_level(next)?;
        self.push_message(format!("You descend to depth {}.", next));
        Ok(MoveOutcome::Descended { level_index: next })
    }

    /// Resolves one round of the current encounter.
    ///
    /// The battle ticks until the player holds a turn, the player acts, and
    /// the enemy answers if it has a turn banked. Attack is a basic attack,
    /// Magic casts Fireball, Defend braces and recovers mana, and Flee tries
    /// to break off (never against a boss).
    pub fn combat_action(&mut self, action: CombatAction) -> DepthsResult<CombatOutcome> {
        self.ensure_playing()?;
        let index = self
            .encounter
            .as_ref()
            .map(|encounter| encounter.enemy_index)
            .ok_or_else(|| DepthsError::InvalidAction("Not in an encounter".to_string()))?;
        let (enemy_name, enemy_boss) = match self.enemies.get(index) {
            Some(enemy) if enemy.is_alive() => (enemy.name.clone(), enemy.boss),
            _ => {
                self.encounter = None;
                return Err(DepthsError::InvalidState(
                    "Encounter enemy is gone".to_string(),
                ));
            }
        };
        if action == CombatAction::Magic && self.player.mana < config::MAGIC_COST {
            return Err(DepthsError::InvalidAction("Not enough mana".to_string()));
        }

        let Some(mut encounter) = self.encounter.take() else {
            return Err(DepthsError::InvalidAction("Not in an encounter".to_string()));
        };
        self.refresh_hero(&mut encounter.battle)?;
        let hp_before = self.player.hp;
        let enemy_hp_before = self.enemies[index].hp;

        if action == CombatAction::Flee {
            if !enemy_boss && self.rng.gen_bool(FLEE_CHANCE) {
                self.push_message(format!("You escape from the {}.", enemy_name));
                encounter.battle.finish();
                return Ok(CombatOutcome::Fled);
            }
            self.push_message("You fail to escape!");
        }

        self.wait_for_hero_turn(&mut encounter.battle, &enemy_name)?;
        if encounter.battle.state() == BattleState::BattleInProgress {
            self.hero_acts(&mut encounter.battle, action, &enemy_name)?;
        }
        if encounter.battle.state() == BattleState::BattleInProgress {
            self.foe_responds(&mut encounter.battle, &enemy_name);
        }

        let battle = &encounter.battle;
        if let Some(hero) = battle.get(HERO) {
            hero.character.write_back(&mut self.player);
        }
        if let Some(foe) = battle.get(FOE) {
            let wounds = self.enemies[index].hp.saturating_sub(foe.character.hp);
            self.enemies[index].take_damage(wounds);
        }
        let dealt = enemy_hp_before.saturating_sub(self.enemies[index].hp);
        let taken = hp_before.saturating_sub(self.player.hp);
        self.statistics.damage_dealt += dealt as u64;
        self.statistics.damage_taken += taken as u64;

        match encounter.battle.state() {
            BattleState::BattleWon => {
                encounter.battle.finish();
                Ok(self.defeat_enemy(index))
            }
            BattleState::BattleLost => {
                encounter.battle.finish();
                self.completion_state = GameCompletionState::PlayerDied;
                self.push_message(format!("You were slain by the {}.", enemy_name));
                log::info!("Player died at depth {}", self.level_index);
                Ok(CombatOutcome::PlayerDied)
            }
            _ => {
                self.encounter = Some(encounter);
                Ok(CombatOutcome::Exchanged { dealt, taken })
            }
        }
    }

    /// Pushes the player's current stats into the arena, keeping the turn
    /// meter, agro and status effects the battle has built up.
    fn refresh_hero(&self, battle: &mut BattleSession) -> DepthsResult<()> {
        let current = battle
            .get(HERO)
            .cloned()
            .ok_or_else(|| DepthsError::InvalidState("Encounter has no hero".to_string()))?;
        let mut character = Character::from_player(&self.player);
        character.agro = current.character.agro;
        character.status_effects = current.character.status_effects;
        battle.set(
            HERO,
            BattleCharacter {
                character,
                ..current
            },
        )
    }

    fn wait_for_hero_turn(
        &mut self,
        battle: &mut BattleSession,
        enemy_name: &str,
    ) -> DepthsResult<()> {
        for _ in 0..MAX_WAIT_TICKS {
            if battle.state() != BattleState::BattleInProgress
                || battle.get(HERO).map_or(true, |hero| hero.turns > 0)
            {
                return Ok(());
            }
            for event in battle.tick(&mut self.rng) {
                if let BattleEvent::AutoAttack { source, damage, .. } = event {
                    let message = match source {
                        Side::Player(_) => {
                            format!("You lash out at the {} for {}.", enemy_name, damage)
                        }
                        Side::Enemy(_) => {
                            format!("The {} lunges at you for {}.", enemy_name, damage)
                        }
                    };
                    self.push_message(message);
                }
            }
        }
        Err(DepthsError::InvalidState(format!(
            "No turn for the player after {} ticks",
            MAX_WAIT_TICKS
        )))
    }

    fn hero_acts(
        &mut self,
        battle: &mut BattleSession,
        action: CombatAction,
        enemy_name: &str,
    ) -> DepthsResult<()> {
        let foe_hp = |battle: &BattleSession| battle.get(FOE).map_or(0, |foe| foe.character.hp);
        let before = foe_hp(battle);
        match action {
            CombatAction::Attack => {
                battle.basic_attack(HERO, FOE, &mut self.rng);
                let dealt = before.saturating_sub(foe_hp(battle));
                self.push_message(format!("You hit the {} for {}.", enemy_name, dealt));
            }
            CombatAction::Magic => {
                battle.act(&Action {
                    ability: Ability::fireball(),
                    source: HERO,
                    target: FOE,
                });
                let dealt = before.saturating_sub(foe_hp(battle));
                self.push_message(format!(
                    "Your spell sears the {} for {}.",
                    enemy_name, dealt
                ));
            }
            CombatAction::Defend => {
                battle.act(&Action {
                    ability: Ability::brace(),
                    source: HERO,
                    target: HERO,
                });
                if let Some(mut hero) = battle.get(HERO).cloned() {
                    hero.character.will =
                        (hero.character.will + DEFEND_MANA).min(hero.character.max_will);
                    battle.set(HERO, hero)?;
                }
                self.push_message("You raise your guard.");
            }
            CombatAction::Flee => {
                if let Some(mut hero) = battle.get(HERO).cloned() {
                    hero.turns = hero.turns.saturating_sub(1);
                    battle.set(HERO, hero)?;
                }
            }
        }
        Ok(())
    }

    /// The enemy spends a banked turn: a special ability while it has the
    /// will for one, a basic attack otherwise.
    fn foe_responds(&mut self, battle: &mut BattleSession, enemy_name: &str) {
        let Some(Side::Enemy(slot)) = battle.next_enemy_actor() else {
            return;
        };
        let hero_hp =
            |battle: &BattleSession| battle.get(HERO).map_or(0, |hero| hero.character.hp);
        let before = hero_hp(battle);
        let special = battle
            .get(Side::Enemy(slot))
            .map(|foe| foe.character.affordable_attack())
            .filter(|ability| ability.cost > 0);
        match &special {
            Some(_) => battle.enemy_act(slot, &mut self.rng),
            None => battle.basic_attack(Side::Enemy(slot), HERO, &mut self.rng),
        };
        let taken = before.saturating_sub(hero_hp(battle));
        let message = match special {
            Some(ability) => format!("The {} uses {} for {}.", enemy_name, ability.name, taken),
            None => format!("The {} hits you for {}.", enemy_name, taken),
        };
        self.push_message(message);
    }

    fn defeat_enemy(&mut self, index: usize) -> CombatOutcome {
        self.encounter = None;
        let enemy = self.enemies[index].clone();
        self.statistics.enemies_defeated += 1;
        if enemy.boss {
            self.statistics.bosses_defeated += 1;
        }

        let levels_gained = self.player.gain_xp(enemy.xp_reward);
        self.push_message(format!(
            "The {} falls. +{} xp.",
            enemy.name, enemy.xp_reward
        ));
        if levels_gained > 0 {
            self.push_message(format!("You reach level {}!", self.player.level));
        }

        let loot = self.generator.items.loot_drop(
            self.level_index,
            enemy.position,
            &mut self.ids,
            &mut self.rng,
        );
        let loot_dropped = loot.is_some();
        if let Some(item) = loot {
            self.push_message(format!("The {} dropped {}.", enemy.name, item.name));
            self.items.push(item);
        }

        CombatOutcome::EnemyDefeated {
            xp: enemy.xp_reward,
            levels_gained,
            loot_dropped,
        }
    }

    fn standing_on(&self, tile_type: TileType) -> bool {
        self.level.tile_type(self.player.position) == Some(tile_type)
    }

    /// Buys an item from the shop the player is standing in.
    pub fn buy(&mut self, stock_index: usize) -> DepthsResult<Item> {
        self.ensure_playing()?;
        if !self.standing_on(TileType::Shop) {
            return Err(DepthsError::InvalidAction("No shop here".to_string()));
        }
        let price = self
            .shop_stock
            .get(stock_index)
            .map(|item| item.price)
            .ok_or_else(|| DepthsError::InvalidAction(format!("No ware #{}", stock_index)))?;
        if self.player.gold < price {
            return Err(DepthsError::InvalidAction(format!(
                "Need {} gold, have {}",
                price, self.player.gold
            )));
        }

        let item = self.shop_stock.remove(stock_index);
        self.player.gold -= price;
        self.player.inventory.push(item.clone());
        self.push_message(format!("You buy {} for {} gold.", item.name, price));
        Ok(item)
    }

    /// Gold an inn night costs on the current level.
    pub fn inn_cost(&self) -> u32 {
        10 + 2 * self.level_index
    }

    /// Fully restores hp and mana at the inn the player is standing in.
    pub fn rest_at_inn(&mut self) -> DepthsResult<u32> {
        self.ensure_playing()?;
        if !self.standing_on(TileType::Inn) {
            return Err(DepthsError::InvalidAction("No inn here".to_string()));
        }
        let cost = self.inn_cost();
        if self.player.gold < cost {
            return Err(DepthsError::InvalidAction(format!(
                "A room costs {} gold",
                cost
            )));
        }
        self.player.gold -= cost;
        self.player.hp = self.player.max_hp;
        self.player.mana = self.player.max_mana;
        self.push_message(format!("You rest for {} gold.", cost));
        Ok(cost)
    }

    /// Equips an inventory item; the replaced piece goes back to the bag.
    pub fn equip(&mut self, inventory_index: usize) -> DepthsResult<()> {
        self.ensure_playing()?;
        if inventory_index >= self.player.inventory.len() {
            return Err(DepthsError::InvalidAction(format!(
                "No item #{}",
                inventory_index
            )));
        }
        let item = self.player.inventory.remove(inventory_index);
        let name = item.name.clone();
        match self.player.equip(item) {
            Ok(previous) => {
                if let Some(previous) = previous {
                    self.player.inventory.push(previous);
                }
                self.push_message(format!("You equip {}.", name));
                Ok(())
            }
            Err(item) => {
                self.player.inventory.insert(inventory_index, item);
                Err(DepthsError::InvalidAction(format!("{} cannot be equipped", name)))
            }
        }
    }

    fn inventory_index_of(&self, item_type: ItemType) -> Option<usize> {
        self.player
            .inventory
            .iter()
            .position(|item| item.item_type == item_type)
    }

    /// Drinks the first potion in the inventory.
    pub fn use_potion(&mut self) -> DepthsResult<u32> {
        self.ensure_playing()?;
        let index = self
            .inventory_index_of(ItemType::Potion)
            .ok_or_else(|| DepthsError::InvalidAction("No potion".to_string()))?;
        let potion = self.player.inventory.remove(index);
        let healed = self.player.heal(potion.heal);
        self.statistics.potions_used += 1;
        self.push_message(format!("You drink {} and recover {} hp.", potion.name, healed));
        Ok(healed)
    }

    /// Reads the first scroll, revealing the whole level.
    pub fn read_scroll(&mut self) -> DepthsResult<()> {
        self.ensure_playing()?;
        let index = self
            .inventory_index_of(ItemType::Scroll)
            .ok_or_else(|| DepthsError::InvalidAction("No scroll".to_string()))?;
        let scroll = self.player.inventory.remove(index);
        self.level.reveal_all();
        self.push_message(format!("{} reveals the level.", scroll.name));
        Ok(())
    }

    /// Toggles auto-play on/off and returns the new setting.
    pub fn toggle_autoplay(&mut self) -> bool {
        self.autoplay.enabled = !self.autoplay.enabled;
        log::info!("Auto-play {}", if self.autoplay.enabled { "on" } else { "off" });
        self.autoplay.enabled
    }

    pub fn is_autoplay_enabled(&self) -> bool {
        self.autoplay.enabled
    }

    pub fn autoplay_steps(&self) -> u64 {
        self.autoplay.steps
    }

    /// Performs one auto-play intent. Returns `None` when auto-play is off or
    /// the session has ended.
    pub fn autoplay_step(&mut self) -> DepthsResult<Option<AutoplayIntent>> {
        if !self.autoplay.enabled || self.is_game_over() {
            return Ok(None);
        }
        self.autoplay.steps += 1;

        if self.player.hp_ratio() < AUTOPLAY_POTION_RATIO
            && self.inventory_index_of(ItemType::Potion).is_some()
        {
            let healed = self.use_potion()?;
            return Ok(Some(AutoplayIntent::DrinkPotion { healed }));
        }

        if let Some(index) = self
            .player
            .inventory
            .iter()
            .position(|item| self.player.is_upgrade(item))
        {
            let item = self.player.inventory[index].name.clone();
            self.equip(index)?;
            return Ok(Some(AutoplayIntent::Equip { item }));
        }

        if let Some(encounter) = &self.encounter {
            let enemy = &self.enemies[encounter.enemy_index];
            let view = CombatView {
                hp: self.player.hp,
                max_hp: self.player.max_hp,
                mana: self.player.mana,
                max_mana: self.player.max_mana,
                enemy_hp: enemy.hp,
                enemy_max_hp: enemy.max_hp,
                enemy_is_boss: enemy.boss,
            };
            let action = decide_combat_action(&view, &mut self.rng);
            let outcome = self.combat_action(action)?;
            return Ok(Some(AutoplayIntent::Combat { action, outcome }));
        }

        if self.standing_on(TileType::Inn)
            && self.player.hp_ratio() < AUTOPLAY_REST_RATIO
            && self.player.gold >= self.inn_cost()
        {
            let cost = self.rest_at_inn()?;
            return Ok(Some(AutoplayIntent::Rest { cost }));
        }

        let view = ExplorationView {
            player_pos: self.player.position,
            hp: self.player.hp,
            max_hp: self.player.max_hp,
            level: &self.level,
            enemies: &self.enemies,
            items: &self.items,
        };
        let step = self.autoplay.explorer.decide_exploration_move(&view, &mut self.rng);
        match step {
            Some(direction) => {
                let outcome = self.try_move(direction)?;
                Ok(Some(AutoplayIntent::Move { direction, outcome }))
            }
            None => Ok(Some(AutoplayIntent::Idle)),
        }
    }

    /// Serializable view of the session.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            level_index: self.level_index,
            max_depth: self.config.max_depth,
            level: self.level.clone(),
            player: self.player.clone(),
            enemies: self
                .enemies
                .iter()
                .filter(|e| e.is_alive())
                .cloned()
                .collect(),
            items: self.items.clone(),
            shop_stock: self.shop_stock.clone(),
            encounter: self.encounter.clone(),
            messages: self.messages.iter().cloned().collect(),
            statistics: self.statistics.clone(),
            completion_state: self.completion_state,
            autoplay: self.autoplay.enabled,
        }
    }

    pub fn snapshot_json(&self) -> DepthsResult<String> {
        serde_json::to_string_pretty(&self.snapshot()).map_err(DepthsError::from)
    }
}
