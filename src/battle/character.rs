//! # Battle Characters
//!
//! Stat blocks used by the battle resolver, timed status effects, and the
//! conversions between dungeon actors and battle characters.

use crate::{Ability, Enemy, Player};
use serde::{Deserialize, Serialize};

/// Stats that status effects can modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Strength,
    Mind,
    Speed,
    Defense,
}

/// A timed modifier. Negative amounts are debuffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub stat: Stat,
    pub amount: f64,
    /// Actions of the bearer before the effect expires
    pub turns_remaining: u32,
}

/// A combatant's stat block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub will: u32,
    pub max_will: u32,
    pub strength: u32,
    pub mind: u32,
    /// Mitigation against basic attacks
    #[serde(default)]
    pub defense: u32,
    /// Turn meter gained per tick
    pub speed: f64,
    /// Weight in enemy target selection; never below 1
    pub agro: u32,
    pub status_effects: Vec<StatusEffect>,
    pub abilities: Vec<Ability>,
}

impl Character {
    /// Creates a character at full hp and will with only the basic strike.
    ///
    /// # Examples
    ///
    /// ```
    /// use depths::Character;
    ///
    /// let knight = Character::new("Knight", 120, 30, 12, 4, 0.4);
    /// assert!(knight.is_alive());
    /// assert_eq!(knight.agro, 1);
    /// ```
    pub fn new(name: &str, max_hp: u32, max_will: u32, strength: u32, mind: u32, speed: f64) -> Self {
        Self {
            name: name.to_string(),
            hp: max_hp,
            max_hp,
            will: max_will,
            max_will,
            strength,
            mind,
            defense: 0,
            speed,
            agro: 1,
            status_effects: Vec::new(),
            abilities: vec![Ability::strike()],
        }
    }

    pub fn with_abilities(mut self, abilities: Vec<Ability>) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn with_defense(mut self, defense: u32) -> Self {
        self.defense = defense;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Subtracts hp, flooring at zero. Returns the damage actually taken.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.hp);
        self.hp -= taken;
        taken
    }

    /// Restores hp up to the maximum. Returns the amount actually healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let healed = amount.min(self.max_hp.saturating_sub(self.hp));
        self.hp += healed;
        healed
    }

    /// A stat including every active status effect, floored at zero.
    pub fn effective(&self, stat: Stat) -> f64 {
        let base = match stat {
            Stat::Strength => self.strength as f64,
            Stat::Mind => self.mind as f64,
            Stat::Speed => self.speed,
            Stat::Defense => self.defense as f64,
        };
        let modifier: f64 = self
            .status_effects
            .iter()
            .filter(|effect| effect.stat == stat)
            .map(|effect| effect.amount)
            .sum();
        (base + modifier).max(0.0)
    }

    pub fn add_status(&mut self, effect: StatusEffect) {
        if effect.turns_remaining > 0 {
            self.status_effects.push(effect);
        }
    }

    /// Counts down every status effect by one action and drops expired ones.
    pub fn tick_status_effects(&mut self) {
        for effect in &mut self.status_effects {
            effect.turns_remaining = effect.turns_remaining.saturating_sub(1);
        }
        self.status_effects.retain(|effect| effect.turns_remaining > 0);
    }

    /// First offensive ability the character can currently pay for.
    pub fn affordable_attack(&self) -> Ability {
        self.abilities
            .iter()
            .find(|ability| ability.is_offensive() && ability.cost <= self.will)
            .cloned()
            .unwrap_or_else(Ability::strike)
    }

    /// Builds a battle character from the player, using mana as will.
    pub fn from_player(player: &Player) -> Self {
        let mut character = Self::new(
            &player.name,
            player.max_hp,
            player.max_mana,
            player.total_attack(),
            5 + player.level * 2,
            0.35,
        )
        .with_abilities(Ability::starter_kit())
        .with_defense(player.total_defense());
        character.hp = player.hp;
        character.will = player.mana;
        character
    }

    /// Builds a battle character from a dungeon enemy.
    pub fn from_enemy(enemy: &Enemy) -> Self {
        let speed = if enemy.boss { 0.3 } else { 0.25 };
        let mut character = Self::new(
            &enemy.name,
            enemy.max_hp,
            20,
            enemy.attack,
            enemy.attack / 2,
            speed,
        )
        .with_defense(enemy.defense);
        character.hp = enemy.hp;
        if enemy.boss {
            character.abilities.insert(0, Ability::rend());
        }
        character
    }

    /// Copies the battle outcome back onto the player's hp and mana.
    pub fn write_back(&self, player: &mut Player) {
        player.hp = self.hp.min(player.max_hp);
        player.mana = self.will.min(player.max_mana);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    #[test]
    fn test_damage_and_heal_clamp() {
        let mut character = Character::new("Test", 50, 10, 5, 5, 0.5);
        assert_eq!(character.take_damage(80), 50);
        assert!(!character.is_alive());
        assert_eq!(character.heal(200), 50);
        assert_eq!(character.hp, 50);
    }

    #[test]
    fn test_status_effects_modify_and_expire() {
        let mut character = Character::new("Test", 50, 10, 10, 5, 0.5);
        character.add_status(StatusEffect {
            stat: Stat::Strength,
            amount: 4.0,
            turns_remaining: 2,
        });
        character.add_status(StatusEffect {
            stat: Stat::Speed,
            amount: -1.0,
            turns_remaining: 1,
        });
        assert_eq!(character.effective(Stat::Strength), 14.0);
        assert_eq!(character.effective(Stat::Speed), 0.0);
        assert_eq!(character.effective(Stat::Mind), 5.0);

        character.tick_status_effects();
        assert_eq!(character.status_effects.len(), 1);
        assert_eq!(character.effective(Stat::Speed), 0.5);

        character.tick_status_effects();
        assert!(character.status_effects.is_empty());
        assert_eq!(character.effective(Stat::Strength), 10.0);
    }

    #[test]
    fn test_player_round_trip() {
        let mut player = Player::new("Hero".to_string(), Position::origin());
        player.hp = 60;
        player.mana = 20;

        let mut character = Character::from_player(&player);
        assert_eq!(character.hp, 60);
        assert_eq!(character.will, 20);
        assert_eq!(character.strength, player.total_attack());
        assert_eq!(character.effective(Stat::Defense), player.total_defense() as f64);

        character.take_damage(15);
        character.will = 5;
        character.write_back(&mut player);
        assert_eq!(player.hp, 45);
        assert_eq!(player.mana, 5);
    }

    #[test]
    fn test_enemy_conversion_keeps_wounds_and_armor() {
        let mut enemy = Enemy {
            id: 3,
            name: "Orc".to_string(),
            tier: 3,
            position: Position::new(4, 4),
            hp: 60,
            max_hp: 60,
            attack: 14,
            defense: 6,
            xp_reward: 40,
            alive: true,
            aggressive: true,
            boss: false,
        };
        enemy.take_damage(25);

        let orc = Character::from_enemy(&enemy);
        assert_eq!(orc.hp, 35);
        assert_eq!(orc.max_hp, 60);
        assert_eq!(orc.strength, 14);
        assert_eq!(orc.defense, 6);
        assert_eq!(orc.affordable_attack(), Ability::strike());

        enemy.boss = true;
        let boss = Character::from_enemy(&enemy);
        assert_eq!(boss.affordable_attack(), Ability::rend());
        assert!(boss.speed > orc.speed);
    }

    #[test]
    fn test_affordable_attack_falls_back_to_strike() {
        let mut character =
            Character::new("Mage", 40, 5, 3, 12, 0.3).with_abilities(vec![Ability::fireball()]);
        assert_eq!(character.affordable_attack(), Ability::strike());
        character.will = 50;
        assert_eq!(character.affordable_attack(), Ability::fireball());
    }
}
