//! # Entities Module
//!
//! Enemies, items and the player character.

use crate::{config, EntityId, Position};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A hostile actor on the grid.
///
/// Defeated enemies are marked dead and stay in the level's enemy list so
/// their ids are never handed out again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub name: String,
    pub tier: usize,
    pub position: Position,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub xp_reward: u32,
    pub alive: bool,
    pub aggressive: bool,
    pub boss: bool,
}

impl Enemy {
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Applies damage, flooring hp at zero. Returns the damage actually dealt.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.hp);
        self.hp -= dealt;
        if self.hp == 0 {
            self.alive = false;
        }
        dealt
    }

    pub fn hp_ratio(&self) -> f64 {
        crate::ratio(self.hp, self.max_hp)
    }
}

/// Item rarity. Stat multipliers strictly increase with rarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn multiplier(self) -> f64 {
        match self {
            Rarity::Common => 1.0,
            Rarity::Rare => 1.5,
            Rarity::Epic => 2.0,
            Rarity::Legendary => 3.0,
        }
    }

    /// Rolls a rarity: 60% common, 25% rare, 12% epic, 3% legendary.
    pub fn roll(rng: &mut StdRng) -> Rarity {
        let roll = rng.gen::<f64>();
        if roll < 0.60 {
            Rarity::Common
        } else if roll < 0.85 {
            Rarity::Rare
        } else if roll < 0.97 {
            Rarity::Epic
        } else {
            Rarity::Legendary
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Weapon,
    Armor,
    Helmet,
    Boots,
    Accessory,
    Potion,
    Gold,
    Key,
    Scroll,
}

impl ItemType {
    /// The equipment slot this item occupies, if it can be equipped.
    pub fn equip_slot(self) -> Option<EquipSlot> {
        match self {
            ItemType::Weapon => Some(EquipSlot::Weapon),
            ItemType::Armor => Some(EquipSlot::Armor),
            ItemType::Helmet => Some(EquipSlot::Helmet),
            ItemType::Boots => Some(EquipSlot::Boots),
            ItemType::Accessory => Some(EquipSlot::Accessory),
            _ => None,
        }
    }
}

/// An item on the floor (`position` set), in a shop, or owned by the player
/// (`position` is `None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: EntityId,
    pub name: String,
    pub item_type: ItemType,
    pub rarity: Rarity,
    pub position: Option<Position>,
    pub attack: u32,
    pub defense: u32,
    /// Hit points restored when consumed
    pub heal: u32,
    /// Gold granted on pickup
    pub gold: u32,
    /// Shop price
    pub price: u32,
}

impl Item {
    /// Combined stat value used to compare gear for the same slot.
    pub fn power(&self) -> u32 {
        self.attack * 2 + self.defense * 2 + self.heal / 10
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    Weapon,
    Armor,
    Helmet,
    Boots,
    Accessory,
}

/// Items currently worn by the player, one per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub weapon: Option<Item>,
    pub armor: Option<Item>,
    pub helmet: Option<Item>,
    pub boots: Option<Item>,
    pub accessory: Option<Item>,
}

impl Equipment {
    pub fn slot(&self, slot: EquipSlot) -> Option<&Item> {
        match slot {
            EquipSlot::Weapon => self.weapon.as_ref(),
            EquipSlot::Armor => self.armor.as_ref(),
            EquipSlot::Helmet => self.helmet.as_ref(),
            EquipSlot::Boots => self.boots.as_ref(),
            EquipSlot::Accessory => self.accessory.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: EquipSlot) -> &mut Option<Item> {
        match slot {
            EquipSlot::Weapon => &mut self.weapon,
            EquipSlot::Armor => &mut self.armor,
            EquipSlot::Helmet => &mut self.helmet,
            EquipSlot::Boots => &mut self.boots,
            EquipSlot::Accessory => &mut self.accessory,
        }
    }

    fn worn(&self) -> impl Iterator<Item = &Item> {
        [
            &self.weapon,
            &self.armor,
            &self.helmet,
            &self.boots,
            &self.accessory,
        ]
        .into_iter()
        .flatten()
    }

    pub fn attack_bonus(&self) -> u32 {
        self.worn().map(|item| item.attack).sum()
    }

    pub fn defense_bonus(&self) -> u32 {
        self.worn().map(|item| item.defense).sum()
    }
}

/// The controlled character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub position: Position,
    pub hp: u32,
    pub max_hp: u32,
    pub mana: u32,
    pub max_mana: u32,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub base_attack: u32,
    pub base_defense: u32,
    pub gold: u32,
    pub equipment: Equipment,
    pub inventory: Vec<Item>,
}

impl Player {
    /// Creates a level 1 character.
    ///
    /// # Examples
    ///
    /// ```
    /// use depths::{Player, Position};
    ///
    /// let player = Player::new("Hero".to_string(), Position::new(3, 4));
    /// assert_eq!(player.level, 1);
    /// assert_eq!(player.hp, player.max_hp);
    /// ```
    pub fn new(name: String, position: Position) -> Self {
        Self {
            name,
            position,
            hp: config::DEFAULT_PLAYER_HEALTH,
            max_hp: config::DEFAULT_PLAYER_HEALTH,
            mana: config::DEFAULT_PLAYER_MANA,
            max_mana: config::DEFAULT_PLAYER_MANA,
            level: 1,
            xp: 0,
            xp_to_next_level: 100,
            base_attack: 10,
            base_defense: 5,
            gold: 0,
            equipment: Equipment::default(),
            inventory: Vec::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn hp_ratio(&self) -> f64 {
        crate::ratio(self.hp, self.max_hp)
    }

    pub fn total_attack(&self) -> u32 {
        self.base_attack + self.equipment.attack_bonus()
    }

    pub fn total_defense(&self) -> u32 {
        self.base_defense + self.equipment.defense_bonus()
    }

    /// Applies damage, flooring hp at zero. Returns the damage actually taken.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.hp);
        self.hp -= taken;
        taken
    }

    /// Restores hp up to the maximum. Returns the amount actually healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let healed = amount.min(self.max_hp - self.hp);
        self.hp += healed;
        healed
    }

    pub fn restore_mana(&mut self, amount: u32) -> u32 {
        let restored = amount.min(self.max_mana - self.mana);
        self.mana += restored;
        restored
    }

    /// Spends mana if enough is available.
    pub fn spend_mana(&mut self, amount: u32) -> bool {
        if self.mana < amount {
            return false;
        }
        self.mana -= amount;
        true
    }

    /// Grants experience and applies every level-up it pays for.
    ///
    /// The surplus over each threshold carries forward. Returns the number of
    /// levels gained.
    ///
    /// # Examples
    ///
    /// ```
    /// use depths::{Player, Position};
    ///
    /// let mut player = Player::new("Hero".to_string(), Position::origin());
    /// assert_eq!(player.gain_xp(150), 1);
    /// assert_eq!(player.xp, 50);
    /// ```
    pub fn gain_xp(&mut self, amount: u32) -> u32 {
        self.xp += amount;
        let mut levels = 0;
        while self.xp >= self.xp_to_next_level {
            self.xp -= self.xp_to_next_level;
            self.level_up();
            levels += 1;
        }
        levels
    }

    fn level_up(&mut self) {
        self.level += 1;
        self.xp_to_next_level = 100 * self.level;
        self.max_hp += 20;
        self.max_mana += 10;
        self.base_attack += 3;
        self.base_defense += 2;
        self.heal(20);
        self.restore_mana(10);
    }

    /// Equips an owned item, returning whatever previously filled its slot.
    ///
    /// Non-equippable items are handed straight back.
    pub fn equip(&mut self, mut item: Item) -> Result<Option<Item>, Item> {
        let Some(slot) = item.item_type.equip_slot() else {
            return Err(item);
        };
        item.position = None;
        Ok(self.equipment.slot_mut(slot).replace(item))
    }

    /// Whether `item` beats what the player wears in the same slot.
    pub fn is_upgrade(&self, item: &Item) -> bool {
        match item.item_type.equip_slot() {
            Some(slot) => match self.equipment.slot(slot) {
                Some(worn) => item.power() > worn.power(),
                None => true,
            },
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(item_type: ItemType, attack: u32, defense: u32) -> Item {
        Item {
            id: 1,
            name: "Test".to_string(),
            item_type,
            rarity: Rarity::Common,
            position: Some(Position::new(1, 1)),
            attack,
            defense,
            heal: 0,
            gold: 0,
            price: 0,
        }
    }

    #[test]
    fn test_rarity_multipliers_increase() {
        let rarities = [Rarity::Common, Rarity::Rare, Rarity::Epic, Rarity::Legendary];
        for pair in rarities.windows(2) {
            assert!(pair[0].multiplier() < pair[1].multiplier());
        }
    }

    #[test]
    fn test_level_up_carries_surplus() {
        let mut player = Player::new("Hero".to_string(), Position::origin());
        assert_eq!(player.xp_to_next_level, 100);

        let levels = player.gain_xp(150);
        assert_eq!(levels, 1);
        assert_eq!(player.level, 2);
        assert_eq!(player.xp, 50);
    }

    #[test]
    fn test_no_level_up_below_threshold() {
        let mut player = Player::new("Hero".to_string(), Position::origin());
        assert_eq!(player.gain_xp(99), 0);
        assert_eq!(player.level, 1);
        assert_eq!(player.gain_xp(1), 1);
        assert_eq!(player.xp, 0);
    }

    #[test]
    fn test_hp_and_mana_clamped() {
        let mut player = Player::new("Hero".to_string(), Position::origin());
        assert_eq!(player.take_damage(250), 100);
        assert_eq!(player.hp, 0);
        assert!(!player.is_alive());

        player.hp = 90;
        assert_eq!(player.heal(30), 10);
        assert_eq!(player.hp, player.max_hp);

        assert!(!player.spend_mana(500));
        assert!(player.spend_mana(20));
        assert_eq!(player.restore_mana(100), 20);
    }

    #[test]
    fn test_equip_swaps_and_rejects() {
        let mut player = Player::new("Hero".to_string(), Position::origin());
        let sword = item(ItemType::Weapon, 5, 0);
        assert!(player.is_upgrade(&sword));
        assert_eq!(player.equip(sword).unwrap(), None);
        assert_eq!(player.total_attack(), 15);
        assert!(player.equipment.weapon.as_ref().unwrap().position.is_none());

        let axe = item(ItemType::Weapon, 8, 0);
        let old = player.equip(axe).unwrap().unwrap();
        assert_eq!(old.attack, 5);
        assert_eq!(player.total_attack(), 18);

        let potion = item(ItemType::Potion, 0, 0);
        assert!(!player.is_upgrade(&potion));
        assert!(player.equip(potion).is_err());
    }

    #[test]
    fn test_enemy_death_flag() {
        let mut enemy = Enemy {
            id: 7,
            name: "Slime".to_string(),
            tier: 0,
            position: Position::new(2, 2),
            hp: 10,
            max_hp: 10,
            attack: 3,
            defense: 1,
            xp_reward: 5,
            alive: true,
            aggressive: false,
            boss: false,
        };
        assert_eq!(enemy.take_damage(4), 4);
        assert!(enemy.is_alive());
        assert_eq!(enemy.take_damage(40), 6);
        assert_eq!(enemy.hp, 0);
        assert!(!enemy.is_alive());
    }
}
