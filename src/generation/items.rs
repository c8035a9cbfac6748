//! # Item Generation
//!
//! Floor loot, enemy drops and shop stock, scaled by depth and rarity.

use crate::{IdCounters, Item, ItemType, Position, Rarity};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Chance that a defeated enemy leaves an item behind.
pub const LOOT_DROP_CHANCE: f64 = 0.3;

/// Number of items a shop offers.
pub const SHOP_STOCK_SIZE: usize = 4;

/// Item types that can appear on the dungeon floor.
const FLOOR_ITEM_TYPES: [ItemType; 4] = [
    ItemType::Weapon,
    ItemType::Armor,
    ItemType::Potion,
    ItemType::Gold,
];

/// Item types a shop may stock.
const SHOP_ITEM_TYPES: [ItemType; 7] = [
    ItemType::Weapon,
    ItemType::Armor,
    ItemType::Helmet,
    ItemType::Boots,
    ItemType::Accessory,
    ItemType::Potion,
    ItemType::Scroll,
];

/// Stateless item factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemGenerator;

impl ItemGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Builds an item of the given type with depth- and rarity-scaled stats.
    pub fn create_item(
        &self,
        item_type: ItemType,
        rarity: Rarity,
        level_index: u32,
        id: u32,
        position: Option<Position>,
        rng: &mut StdRng,
    ) -> Item {
        let scale = |base: u32| (base as f64 * rarity.multiplier()).round() as u32;
        let mut item = Item {
            id,
            name: String::new(),
            item_type,
            rarity,
            position,
            attack: 0,
            defense: 0,
            heal: 0,
            gold: 0,
            price: 0,
        };

        match item_type {
            ItemType::Weapon => {
                item.attack = scale(3 + level_index);
                item.name = format!("{:?} Blade", rarity);
            }
            ItemType::Armor => {
                item.defense = scale(2 + level_index / 2);
                item.name = format!("{:?} Mail", rarity);
            }
            ItemType::Helmet => {
                item.defense = scale(1 + level_index / 3);
                item.name = format!("{:?} Helm", rarity);
            }
            ItemType::Boots => {
                item.defense = scale(1 + level_index / 4);
                item.name = format!("{:?} Boots", rarity);
            }
            ItemType::Accessory => {
                item.attack = scale(1 + level_index / 3);
                item.defense = scale(1 + level_index / 4);
                item.name = format!("{:?} Charm", rarity);
            }
            ItemType::Potion => {
                item.heal = scale(30 + level_index * 2);
                item.name = "Healing Potion".to_string();
            }
            ItemType::Gold => {
                item.gold = scale(rng.gen_range(10..=30) + level_index * 5);
                item.name = format!("{} Gold", item.gold);
            }
            ItemType::Key => {
                item.name = "Rusty Key".to_string();
            }
            ItemType::Scroll => {
                item.name = "Scroll of Mapping".to_string();
            }
        }

        item.price = 10 + item.power() * 4 + level_index * 2;
        item
    }

    /// Rolls a random floor item (weapon, armor, potion or gold).
    pub fn random_floor_item(
        &self,
        level_index: u32,
        id: u32,
        position: Position,
        rng: &mut StdRng,
    ) -> Item {
        let item_type = *FLOOR_ITEM_TYPES
            .choose(rng)
            .unwrap_or(&ItemType::Gold);
        let rarity = Rarity::roll(rng);
        self.create_item(item_type, rarity, level_index, id, Some(position), rng)
    }

    /// Rolls the loot a defeated enemy leaves on its tile.
    pub fn loot_drop(
        &self,
        level_index: u32,
        position: Position,
        ids: &mut IdCounters,
        rng: &mut StdRng,
    ) -> Option<Item> {
        if !rng.gen_bool(LOOT_DROP_CHANCE) {
            return None;
        }
        let id = ids.take_item_id();
        Some(self.random_floor_item(level_index, id, position, rng))
    }

    /// Rolls the wares of a shop. Stock items are unplaced.
    pub fn shop_stock(&self, level_index: u32, ids: &mut IdCounters, rng: &mut StdRng) -> Vec<Item> {
        (0..SHOP_STOCK_SIZE)
            .map(|_| {
                let item_type = *SHOP_ITEM_TYPES.choose(rng).unwrap_or(&ItemType::Potion);
                let rarity = Rarity::roll(rng);
                let id = ids.take_item_id();
                self.create_item(item_type, rarity, level_index, id, None, rng)
            })
            .collect()
    }
}
