//! # Battle Module
//!
//! Speed-accumulation turn engine for party battles.
//!
//! Every tick each living character adds its speed to a meter. A full meter
//! banks one turn, up to `MAX_TURNS`; a full meter with a full bank becomes an
//! overflow action the session resolves on its own. Players spend banked
//! turns through [`BattleSession::act`]; enemies respond through
//! [`BattleSession::enemy_act`] and pick targets weighted by agro.

pub mod ability;
pub mod character;
pub mod targeting;

pub use ability::*;
pub use character::*;
pub use targeting::*;

use crate::{config, resolve_damage, DepthsError, DepthsResult, Item, ItemType};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Lifecycle of a battle. Won and lost are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleState {
    BattleStart,
    BattleInProgress,
    BattleWon,
    BattleLost,
}

impl BattleState {
    pub fn is_over(self) -> bool {
        matches!(self, BattleState::BattleWon | BattleState::BattleLost)
    }
}

/// What a full speed meter produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    TurnGained,
    /// The turn bank was already full
    OverflowAction,
}

/// Address of a character in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player(usize),
    Enemy(usize),
}

/// A character plus its turn bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleCharacter {
    pub character: Character,
    /// Banked turns, never above the session's cap
    pub turns: u32,
    /// Speed meter; a turn is produced once it exceeds 1
    pub speed_built: f64,
}

impl BattleCharacter {
    pub fn new(character: Character) -> Self {
        Self {
            character,
            turns: 0,
            speed_built: 0.0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.character.is_alive()
    }

    /// Advances the speed meter by one tick.
    ///
    /// # Examples
    ///
    /// ```
    /// use depths::{BattleCharacter, Character, TickOutcome};
    ///
    /// let mut fighter = BattleCharacter::new(Character::new("Rogue", 40, 10, 6, 3, 0.6));
    /// assert_eq!(fighter.build_speed(3), None);
    /// assert_eq!(fighter.build_speed(3), Some(TickOutcome::TurnGained));
    /// assert_eq!(fighter.turns, 1);
    /// ```
    pub fn build_speed(&mut self, max_turns: u32) -> Option<TickOutcome> {
        if !self.is_alive() {
            return None;
        }

        self.speed_built += self.character.effective(Stat::Speed);
        if self.speed_built <= 1.0 {
            return None;
        }

        self.speed_built -= 1.0;
        if self.turns < max_turns {
            self.turns += 1;
            Some(TickOutcome::TurnGained)
        } else {
            Some(TickOutcome::OverflowAction)
        }
    }
}

/// A request to use an ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub ability: Ability,
    pub source: Side,
    pub target: Side,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    /// Gating failed; nothing changed
    Rejected,
    /// The action resolved. `next_actor` is the first living enemy holding
    /// a turn, if any, for the caller to schedule a response.
    Resolved { next_actor: Option<Side> },
}

/// Something the session did on its own during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEvent {
    TurnGained(Side),
    AutoAttack {
        source: Side,
        target: Side,
        damage: u32,
    },
    /// An overflow that produced no action
    OverflowSkipped(Side),
}

/// Final state handed back by [`BattleSession::finish`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleResult {
    pub state: BattleState,
    pub players: Vec<Character>,
    pub enemies: Vec<Character>,
    /// Items left unused
    pub inventory: Vec<Item>,
}

impl BattleResult {
    pub fn won(&self) -> bool {
        self.state == BattleState::BattleWon
    }
}

/// One battle between a player party and an enemy party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSession {
    state: BattleState,
    players: Vec<BattleCharacter>,
    enemies: Vec<BattleCharacter>,
    inventory: Vec<Item>,
    max_turns: u32,
    ticks: u64,
}

impl BattleSession {
    /// Seats both parties without starting the battle.
    pub fn new(enemies: Vec<Character>, players: Vec<Character>, inventory: Vec<Item>) -> Self {
        Self {
            state: BattleState::BattleStart,
            players: players.into_iter().map(BattleCharacter::new).collect(),
            enemies: enemies.into_iter().map(BattleCharacter::new).collect(),
            inventory,
            max_turns: config::MAX_TURNS,
            ticks: 0,
        }
    }

    /// Seats both parties and starts the battle.
    pub fn init(enemies: Vec<Character>, players: Vec<Character>, inventory: Vec<Item>) -> Self {
        let mut session = Self::new(enemies, players, inventory);
        session.begin();
        session
    }

    /// Moves a battle out of `BattleStart`. A battle with nobody left on a
    /// side ends immediately.
    pub fn begin(&mut self) {
        if self.state == BattleState::BattleStart {
            self.state = BattleState::BattleInProgress;
            log::info!(
                "Battle started: {} players vs {} enemies",
                self.players.len(),
                self.enemies.len()
            );
            self.evaluate();
        }
    }

    pub fn state(&self) -> BattleState {
        self.state
    }

    pub fn players(&self) -> &[BattleCharacter] {
        &self.players
    }

    pub fn enemies(&self) -> &[BattleCharacter] {
        &self.enemies
    }

    pub fn inventory(&self) -> &[Item] {
        &self.inventory
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    pub fn get(&self, side: Side) -> Option<&BattleCharacter> {
        match side {
            Side::Player(index) => self.players.get(index),
            Side::Enemy(index) => self.enemies.get(index),
        }
    }

    pub fn set(&mut self, side: Side, character: BattleCharacter) -> DepthsResult<()> {
        let slot = match side {
            Side::Player(index) => self.players.get_mut(index),
            Side::Enemy(index) => self.enemies.get_mut(index),
        };
        match slot {
            Some(slot) => {
                *slot = character;
                Ok(())
            }
            None => Err(DepthsError::InvalidAction(format!(
                "No character at {:?}",
                side
            ))),
        }
    }

    fn get_mut(&mut self, side: Side) -> Option<&mut BattleCharacter> {
        match side {
            Side::Player(index) => self.players.get_mut(index),
            Side::Enemy(index) => self.enemies.get_mut(index),
        }
    }

    /// Advances every living character's speed meter, players first.
    ///
    /// Overflow on the player side becomes an automatic strike by the first
    /// player with a full turn bank against the first living enemy. Overflow
    /// on the enemy side attacks an agro-picked player one time in twelve.
    pub fn tick(&mut self, rng: &mut StdRng) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        if self.state != BattleState::BattleInProgress {
            return events;
        }
        self.ticks += 1;

        for index in 0..self.players.len() {
            if self.state.is_over() {
                return events;
            }
            let side = Side::Player(index);
            match self.players[index].build_speed(self.max_turns) {
                Some(TickOutcome::TurnGained) => events.push(BattleEvent::TurnGained(side)),
                Some(TickOutcome::OverflowAction) => events.push(
                    self.player_auto_attack()
                        .unwrap_or(BattleEvent::OverflowSkipped(side)),
                ),
                None => {}
            }
        }

        for index in 0..self.enemies.len() {
            if self.state.is_over() {
                return events;
            }
            let side = Side::Enemy(index);
            match self.enemies[index].build_speed(self.max_turns) {
                Some(TickOutcome::TurnGained) => events.push(BattleEvent::TurnGained(side)),
                Some(TickOutcome::OverflowAction) => {
                    let event = if rng.gen_range(0..12) == 3 {
                        self.enemy_auto_attack(index, rng)
                    } else {
                        None
                    };
                    events.push(event.unwrap_or(BattleEvent::OverflowSkipped(side)));
                }
                None => {}
            }
        }

        log::trace!("Battle tick {}: {} events", self.ticks, events.len());
        events
    }

    fn player_auto_attack(&mut self) -> Option<BattleEvent> {
        let source = self
            .players
            .iter()
            .position(|p| p.is_alive() && p.turns == self.max_turns)
            .map(Side::Player)?;
        let target = self
            .enemies
            .iter()
            .position(BattleCharacter::is_alive)
            .map(Side::Enemy)?;
        self.auto_attack(source, target)
    }

    fn enemy_auto_attack(&mut self, index: usize, rng: &mut StdRng) -> Option<BattleEvent> {
        let target = pick_by_aggro(&self.players, rng).map(Side::Player)?;
        self.auto_attack(Side::Enemy(index), target)
    }

    fn auto_attack(&mut self, source: Side, target: Side) -> Option<BattleEvent> {
        let ability = self.get(source)?.character.affordable_attack();
        let hp_before = self.get(target)?.character.hp;
        let action = Action {
            ability,
            source,
            target,
        };
        match self.act(&action) {
            ActionOutcome::Resolved { .. } => {
                let hp_after = self.get(target).map_or(0, |t| t.character.hp);
                Some(BattleEvent::AutoAttack {
                    source,
                    target,
                    damage: hp_before.saturating_sub(hp_after),
                })
            }
            ActionOutcome::Rejected => None,
        }
    }

    /// Resolves an ability use.
    ///
    /// Rejected unless the battle is in progress, both characters exist and
    /// are alive, the source has a banked turn and the will to pay.
    pub fn act(&mut self, action: &Action) -> ActionOutcome {
        if self.state != BattleState::BattleInProgress {
            log::debug!("Rejected {}: battle is {:?}", action.ability.name, self.state);
            return ActionOutcome::Rejected;
        }
        let (source, target) = match (self.get(action.source), self.get(action.target)) {
            (Some(source), Some(target)) => (source.clone(), target.clone()),
            _ => {
                log::debug!("Rejected {}: unknown participant", action.ability.name);
                return ActionOutcome::Rejected;
            }
        };
        if !source.is_alive()
            || source.turns == 0
            || source.character.will < action.ability.cost
            || !target.is_alive()
        {
            log::debug!(
                "Rejected {} from {:?} on {:?}",
                action.ability.name,
                action.source,
                action.target
            );
            return ActionOutcome::Rejected;
        }

        let mut source = source;
        source.turns -= 1;
        source.character.tick_status_effects();

        if action.source == action.target {
            let (caster, mut affected) = apply(&action.ability, &source.character, &source.character);
            affected.will = caster.will;
            if action.ability.kind == AbilityKind::Stealth {
                affected.agro = caster.agro;
            }
            source.character = affected;
        } else {
            let mut target = target;
            let (caster, affected) = apply(&action.ability, &source.character, &target.character);
            source.character = caster;
            target.character = affected;
            if let Some(slot) = self.get_mut(action.target) {
                *slot = target;
            }
        }
        if let Some(slot) = self.get_mut(action.source) {
            *slot = source;
        }

        log::debug!(
            "{:?} used {} on {:?}",
            action.source,
            action.ability.name,
            action.target
        );
        self.resolved()
    }

    /// Lets an enemy spend a banked turn on its best affordable attack
    /// against an agro-picked player.
    pub fn enemy_act(&mut self, index: usize, rng: &mut StdRng) -> ActionOutcome {
        let ability = match self.enemies.get(index) {
            Some(enemy) => enemy.character.affordable_attack(),
            None => return ActionOutcome::Rejected,
        };
        let target = match pick_by_aggro(&self.players, rng) {
            Some(target) => Side::Player(target),
            None => return ActionOutcome::Rejected,
        };
        self.act(&Action {
            ability,
            source: Side::Enemy(index),
            target,
        })
    }

    /// Spends a banked turn on a basic attack.
    ///
    /// Gated like [`act`](Self::act) but costs no will. Damage follows the
    /// shared basic-attack formula against the target's effective defense.
    ///
    /// # Examples
    ///
    /// ```
    /// use depths::{ActionOutcome, BattleSession, Character, Side};
    /// use rand::SeedableRng;
    ///
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    /// let mut session = BattleSession::init(
    ///     vec![Character::new("Slime", 30, 0, 3, 1, 0.2).with_defense(100)],
    ///     vec![Character::new("Hero", 100, 20, 10, 5, 1.5)],
    ///     Vec::new(),
    /// );
    /// session.tick(&mut rng);
    /// let outcome = session.basic_attack(Side::Player(0), Side::Enemy(0), &mut rng);
    /// assert!(matches!(outcome, ActionOutcome::Resolved { .. }));
    /// assert_eq!(session.enemies()[0].character.hp, 29);
    /// ```
    pub fn basic_attack(&mut self, source: Side, target: Side, rng: &mut StdRng) -> ActionOutcome {
        if self.state != BattleState::BattleInProgress || source == target {
            return ActionOutcome::Rejected;
        }
        let (attack, defense) = match (self.get(source), self.get(target)) {
            (Some(s), Some(t)) if s.is_alive() && s.turns > 0 && t.is_alive() => (
                s.character.effective(Stat::Strength) as u32,
                t.character.effective(Stat::Defense) as u32,
            ),
            _ => {
                log::debug!("Rejected basic attack from {:?} on {:?}", source, target);
                return ActionOutcome::Rejected;
            }
        };

        let damage = resolve_damage(attack, defense, rng);
        if let Some(attacker) = self.get_mut(source) {
            attacker.turns -= 1;
            attacker.character.tick_status_effects();
        }
        if let Some(defender) = self.get_mut(target) {
            defender.character.take_damage(damage);
        }
        log::debug!("{:?} hit {:?} for {}", source, target, damage);
        self.resolved()
    }

    /// Drinks a potion from the shared inventory, spending the source's turn.
    pub fn use_item(&mut self, source: Side, item_index: usize, target: Side) -> ActionOutcome {
        if self.state != BattleState::BattleInProgress {
            return ActionOutcome::Rejected;
        }
        let usable = match self.inventory.get(item_index) {
            Some(item) => item.item_type == ItemType::Potion && item.heal > 0,
            None => false,
        };
        let source_ready = self
            .get(source)
            .map_or(false, |s| s.is_alive() && s.turns > 0);
        let target_alive = self.get(target).map_or(false, BattleCharacter::is_alive);
        if !usable || !source_ready || !target_alive {
            log::debug!("Rejected item {} from {:?}", item_index, source);
            return ActionOutcome::Rejected;
        }

        let item = self.inventory.remove(item_index);
        if let Some(user) = self.get_mut(source) {
            user.turns -= 1;
            user.character.tick_status_effects();
        }
        if let Some(drinker) = self.get_mut(target) {
            drinker.character.heal(item.heal);
        }
        log::debug!("{:?} used {} on {:?}", source, item.name, target);
        self.resolved()
    }

    /// First living enemy holding a banked turn.
    pub fn next_enemy_actor(&self) -> Option<Side> {
        self.enemies
            .iter()
            .position(|e| e.is_alive() && e.turns > 0)
            .map(Side::Enemy)
    }

    /// Ends the battle and hands back the updated characters.
    pub fn finish(self) -> BattleResult {
        log::info!("Battle finished after {} ticks: {:?}", self.ticks, self.state);
        BattleResult {
            state: self.state,
            players: self.players.into_iter().map(|p| p.character).collect(),
            enemies: self.enemies.into_iter().map(|e| e.character).collect(),
            inventory: self.inventory,
        }
    }

    fn resolved(&mut self) -> ActionOutcome {
        self.evaluate();
        let next_actor = if self.state.is_over() {
            None
        } else {
            self.next_enemy_actor()
        };
        ActionOutcome::Resolved { next_actor }
    }

    fn evaluate(&mut self) {
        if self.state != BattleState::BattleInProgress {
            return;
        }
        if self.enemies.iter().all(|e| !e.is_alive()) {
            self.state = BattleState::BattleWon;
            log::info!("Battle won");
        } else if self.players.iter().all(|p| !p.is_alive()) {
            self.state = BattleState::BattleLost;
            log::info!("Battle lost");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Position, Rarity};
    use rand::SeedableRng;

    fn hero(speed: f64) -> Character {
        Character::new("Hero", 100, 40, 10, 8, speed).with_abilities(Ability::starter_kit())
    }

    fn slime(hp: u32, speed: f64) -> Character {
        Character::new("Slime", hp, 0, 4, 1, speed)
    }

    fn potion() -> Item {
        Item {
            id: 1,
            name: "Healing Potion".to_string(),
            item_type: ItemType::Potion,
            rarity: Rarity::Common,
            position: None::<Position>,
            attack: 0,
            defense: 0,
            heal: 30,
            gold: 0,
            price: 10,
        }
    }

    fn strike(source: Side, target: Side) -> Action {
        Action {
            ability: Ability::strike(),
            source,
            target,
        }
    }

    #[test]
    fn test_init_starts_battle() {
        let session = BattleSession::new(vec![slime(20, 0.2)], vec![hero(0.4)], Vec::new());
        assert_eq!(session.state(), BattleState::BattleStart);

        let session = BattleSession::init(vec![slime(20, 0.2)], vec![hero(0.4)], Vec::new());
        assert_eq!(session.state(), BattleState::BattleInProgress);
    }

    #[test]
    fn test_turn_bank_caps_and_overflows() {
        let mut fighter = BattleCharacter::new(slime(10, 1.5));
        let outcomes: Vec<_> = (0..5).map(|_| fighter.build_speed(3)).collect();
        assert_eq!(
            outcomes,
            vec![
                Some(TickOutcome::TurnGained),
                Some(TickOutcome::TurnGained),
                Some(TickOutcome::TurnGained),
                Some(TickOutcome::OverflowAction),
                Some(TickOutcome::OverflowAction),
            ]
        );
        assert_eq!(fighter.turns, 3);
    }

    #[test]
    fn test_dead_characters_do_not_build_speed() {
        let mut fighter = BattleCharacter::new(slime(0, 2.0));
        assert_eq!(fighter.build_speed(3), None);
        assert_eq!(fighter.speed_built, 0.0);
    }

    #[test]
    fn test_act_without_turns_is_rejected() {
        let mut session = BattleSession::init(vec![slime(20, 0.0)], vec![hero(0.0)], Vec::new());
        let before = session.clone();
        let outcome = session.act(&strike(Side::Player(0), Side::Enemy(0)));
        assert_eq!(outcome, ActionOutcome::Rejected);
        assert_eq!(session, before);
    }

    #[test]
    fn test_act_without_will_is_rejected() {
        let mut session = BattleSession::init(vec![slime(20, 0.0)], vec![hero(0.0)], Vec::new());
        let mut player = session.get(Side::Player(0)).cloned().unwrap();
        player.turns = 1;
        player.character.will = 5;
        session.set(Side::Player(0), player).unwrap();

        let fireball = Action {
            ability: Ability::fireball(),
            source: Side::Player(0),
            target: Side::Enemy(0),
        };
        assert_eq!(session.act(&fireball), ActionOutcome::Rejected);
        assert_eq!(session.get(Side::Player(0)).unwrap().turns, 1);
    }

    #[test]
    fn test_resolved_action_names_next_enemy() {
        let mut session =
            BattleSession::init(vec![slime(50, 0.6), slime(50, 0.0)], vec![hero(0.6)], Vec::new());
        let mut rng = StdRng::seed_from_u64(1);
        session.tick(&mut rng);
        session.tick(&mut rng);
        assert_eq!(session.get(Side::Player(0)).unwrap().turns, 1);
        assert_eq!(session.get(Side::Enemy(0)).unwrap().turns, 1);

        let outcome = session.act(&strike(Side::Player(0), Side::Enemy(1)));
        assert_eq!(
            outcome,
            ActionOutcome::Resolved {
                next_actor: Some(Side::Enemy(0))
            }
        );
        assert_eq!(session.get(Side::Enemy(1)).unwrap().character.hp, 40);
        assert_eq!(session.get(Side::Player(0)).unwrap().turns, 0);

        let counter = session.enemy_act(0, &mut rng);
        assert_eq!(counter, ActionOutcome::Resolved { next_actor: None });
        assert_eq!(session.get(Side::Player(0)).unwrap().character.hp, 96);
    }

    #[test]
    fn test_victory_is_terminal() {
        let mut session = BattleSession::init(vec![slime(5, 0.0)], vec![hero(0.0)], Vec::new());
        let mut player = session.get(Side::Player(0)).cloned().unwrap();
        player.turns = 2;
        session.set(Side::Player(0), player).unwrap();

        let outcome = session.act(&strike(Side::Player(0), Side::Enemy(0)));
        assert_eq!(outcome, ActionOutcome::Resolved { next_actor: None });
        assert_eq!(session.state(), BattleState::BattleWon);

        let mut rng = StdRng::seed_from_u64(3);
        assert!(session.tick(&mut rng).is_empty());
        assert_eq!(
            session.act(&strike(Side::Player(0), Side::Enemy(0))),
            ActionOutcome::Rejected
        );

        let result = session.finish();
        assert!(result.won());
        assert_eq!(result.enemies[0].hp, 0);
    }

    #[test]
    fn test_player_overflow_auto_attacks_first_living_enemy() {
        let mut session =
            BattleSession::init(vec![slime(0, 0.0), slime(100, 0.0)], vec![hero(1.5)], Vec::new());
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..3 {
            session.tick(&mut rng);
        }
        let events = session.tick(&mut rng);
        assert_eq!(
            events,
            vec![BattleEvent::AutoAttack {
                source: Side::Player(0),
                target: Side::Enemy(1),
                damage: 10,
            }]
        );
        assert_eq!(session.get(Side::Player(0)).unwrap().turns, 2);
    }

    #[test]
    fn test_enemy_overflow_attacks_rarely() {
        let wall = Character::new("Wall", 1_000_000, 0, 0, 0, 0.0);
        let mut session = BattleSession::init(vec![slime(10, 2.0)], vec![wall], Vec::new());
        let mut rng = StdRng::seed_from_u64(2024);

        let mut attacks = 0;
        let mut skipped = 0;
        for _ in 0..6000 {
            for event in session.tick(&mut rng) {
                match event {
                    BattleEvent::AutoAttack { .. } => attacks += 1,
                    BattleEvent::OverflowSkipped(_) => skipped += 1,
                    BattleEvent::TurnGained(_) => {}
                }
            }
        }
        let share = attacks as f64 / (attacks + skipped) as f64;
        assert!((0.05..0.12).contains(&share), "share = {}", share);
    }

    #[test]
    fn test_self_target_merges_caster_and_target() {
        let mut session = BattleSession::init(vec![slime(20, 0.0)], vec![hero(0.0)], Vec::new());
        let mut player = session.get(Side::Player(0)).cloned().unwrap();
        player.turns = 3;
        player.character.hp = 50;
        player.character.agro = 6;
        session.set(Side::Player(0), player).unwrap();

        let me = Side::Player(0);
        let mend = Action {
            ability: Ability::mend(),
            source: me,
            target: me,
        };
        assert!(matches!(session.act(&mend), ActionOutcome::Resolved { .. }));
        let after = &session.get(me).unwrap().character;
        assert_eq!(after.hp, 75);
        assert_eq!(after.will, 30);

        let vanish = Action {
            ability: Ability::vanish(),
            source: me,
            target: me,
        };
        assert!(matches!(session.act(&vanish), ActionOutcome::Resolved { .. }));
        let after = &session.get(me).unwrap().character;
        assert_eq!(after.agro, 3);
        assert_eq!(after.will, 25);
        assert_eq!(after.hp, 75);
    }

    #[test]
    fn test_status_effects_tick_down_on_source_action() {
        let mut session = BattleSession::init(vec![slime(100, 0.0)], vec![hero(0.0)], Vec::new());
        let me = Side::Player(0);
        let mut player = session.get(me).cloned().unwrap();
        player.turns = 3;
        session.set(me, player).unwrap();

        let rally = Action {
            ability: Ability::rally(),
            source: me,
            target: me,
        };
        session.act(&rally);
        assert_eq!(session.get(me).unwrap().character.status_effects[0].turns_remaining, 3);

        session.act(&strike(me, Side::Enemy(0)));
        assert_eq!(session.get(me).unwrap().character.status_effects[0].turns_remaining, 2);
        // 10 strength + 4 from the rally
        assert_eq!(session.get(Side::Enemy(0)).unwrap().character.hp, 86);
    }

    #[test]
    fn test_use_item_consumes_potion() {
        let mut session =
            BattleSession::init(vec![slime(20, 0.0)], vec![hero(0.0)], vec![potion()]);
        let me = Side::Player(0);
        assert_eq!(session.use_item(me, 0, me), ActionOutcome::Rejected);

        let mut player = session.get(me).cloned().unwrap();
        player.turns = 1;
        player.character.hp = 40;
        session.set(me, player).unwrap();

        assert!(matches!(session.use_item(me, 0, me), ActionOutcome::Resolved { .. }));
        assert_eq!(session.get(me).unwrap().character.hp, 70);
        assert!(session.inventory().is_empty());
        assert_eq!(session.use_item(me, 0, me), ActionOutcome::Rejected);
    }

    #[test]
    fn test_basic_attack_uses_defense_and_floor() {
        let mut session = BattleSession::init(
            vec![slime(40, 0.0).with_defense(6)],
            vec![hero(0.0)],
            Vec::new(),
        );
        let me = Side::Player(0);
        let mut rng = StdRng::seed_from_u64(12);
        assert_eq!(
            session.basic_attack(me, Side::Enemy(0), &mut rng),
            ActionOutcome::Rejected
        );

        let mut player = session.get(me).cloned().unwrap();
        player.turns = 2;
        session.set(me, player).unwrap();

        session.basic_attack(me, Side::Enemy(0), &mut rng);
        // 10 strength against 6 defense: 7 plus or minus 2
        let hp = session.get(Side::Enemy(0)).unwrap().character.hp;
        assert!((31..=35).contains(&hp), "hp = {}", hp);
        assert_eq!(session.get(me).unwrap().turns, 1);
        assert_eq!(session.get(me).unwrap().character.will, 40);

        let mut enemy = session.get(Side::Enemy(0)).cloned().unwrap();
        enemy.turns = 1;
        session.set(Side::Enemy(0), enemy).unwrap();
        let brace = Action {
            ability: Ability::brace(),
            source: me,
            target: me,
        };
        assert!(matches!(session.act(&brace), ActionOutcome::Resolved { .. }));
        session.basic_attack(Side::Enemy(0), me, &mut rng);
        // 4 strength into 10 braced defense hits the floor
        assert_eq!(session.get(me).unwrap().character.hp, 99);
    }

    #[test]
    fn test_losing_side() {
        let mut session = BattleSession::init(vec![slime(20, 0.0)], vec![hero(0.0)], Vec::new());
        let mut enemy = session.get(Side::Enemy(0)).cloned().unwrap();
        enemy.turns = 1;
        enemy.character.strength = 500;
        session.set(Side::Enemy(0), enemy).unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        assert!(matches!(session.enemy_act(0, &mut rng), ActionOutcome::Resolved { .. }));
        assert_eq!(session.state(), BattleState::BattleLost);
        assert!(session.set(Side::Enemy(3), BattleCharacter::new(slime(1, 0.0))).is_err());
    }
}
