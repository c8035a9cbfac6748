//! # Encounter Generation
//!
//! Enemy archetypes, tier selection and boss placement.

use crate::{Enemy, IdCounters, Position};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Base stats of an enemy archetype before depth scaling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    pub name: String,
    pub base_hp: u32,
    pub base_attack: u32,
    pub base_defense: u32,
    pub base_xp: u32,
    pub aggressive: bool,
}

impl EnemyTemplate {
    fn new(name: &str, hp: u32, attack: u32, defense: u32, xp: u32, aggressive: bool) -> Self {
        Self {
            name: name.to_string(),
            base_hp: hp,
            base_attack: attack,
            base_defense: defense,
            base_xp: xp,
            aggressive,
        }
    }
}

/// Spawns enemies from a tier table, scaling stats linearly with depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterGenerator {
    /// Archetypes ordered from weakest (tier 0) to strongest
    pub tiers: Vec<EnemyTemplate>,
}

impl EncounterGenerator {
    pub fn new() -> Self {
        Self {
            tiers: vec![
                EnemyTemplate::new("Slime", 20, 4, 1, 10, false),
                EnemyTemplate::new("Goblin", 30, 6, 2, 15, true),
                EnemyTemplate::new("Skeleton", 40, 8, 3, 20, false),
                EnemyTemplate::new("Orc", 55, 10, 4, 30, true),
                EnemyTemplate::new("Wraith", 70, 13, 5, 40, true),
            ],
        }
    }

    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    /// Number of tiers unlocked at this depth: `min(level_index + 1, tier_count)`.
    pub fn unlocked_tiers(&self, level_index: u32) -> usize {
        (level_index as usize + 1).min(self.tier_count())
    }

    /// Spawns a regular enemy with a tier drawn uniformly from the unlocked ones.
    ///
    /// Returns `None` when the tier table is empty.
    pub fn spawn_enemy(
        &self,
        level_index: u32,
        position: Position,
        ids: &mut IdCounters,
        rng: &mut StdRng,
    ) -> Option<Enemy> {
        let unlocked = self.unlocked_tiers(level_index);
        if unlocked == 0 {
            return None;
        }
        let tier = rng.gen_range(0..unlocked);
        let template = &self.tiers[tier];
        let max_hp = template.base_hp + level_index * 5;

        Some(Enemy {
            id: ids.take_enemy_id(),
            name: template.name.clone(),
            tier,
            position,
            hp: max_hp,
            max_hp,
            attack: template.base_attack + level_index * 2,
            defense: template.base_defense + level_index,
            xp_reward: template.base_xp + level_index * 5,
            alive: true,
            aggressive: template.aggressive,
            boss: false,
        })
    }

    /// Spawns the boss guarding a boss level.
    ///
    /// # Examples
    ///
    /// ```
    /// use depths::{EncounterGenerator, IdCounters, Position};
    ///
    /// let mut ids = IdCounters::default();
    /// let boss = EncounterGenerator::new().spawn_boss(10, Position::new(4, 4), &mut ids);
    /// assert_eq!(boss.hp, 350);
    /// assert!(boss.boss && boss.aggressive);
    /// ```
    pub fn spawn_boss(&self, level_index: u32, position: Position, ids: &mut IdCounters) -> Enemy {
        let max_hp = 250 + level_index * 10;
        Enemy {
            id: ids.take_enemy_id(),
            name: format!("Warden of Depth {}", level_index),
            tier: self.tier_count(),
            position,
            hp: max_hp,
            max_hp,
            attack: 20 + level_index * 2,
            defense: 10 + level_index,
            xp_reward: 200 + level_index * 20,
            alive: true,
            aggressive: true,
            boss: true,
        }
    }
}

impl Default for EncounterGenerator {
    fn default() -> Self {
        Self::new()
    }
}
