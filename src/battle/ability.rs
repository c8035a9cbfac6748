//! Abilities and their pure effect dispatch.

use super::character::{Character, Stat, StatusEffect};
use serde::{Deserialize, Serialize};

/// Which stat an offensive ability scales with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageType {
    /// Scales with strength
    Physical,
    /// Scales with mind
    Magical,
}

/// What an ability does when it resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AbilityKind {
    Offensive { damage_type: DamageType, factor: f64 },
    Heal { amount: u32 },
    /// Timed modifier on the target; negative amounts debuff
    Buff { stat: Stat, amount: f64, turns: u32 },
    /// Raises the target's agro
    Taunt { agro: u32 },
    /// Halves the caster's agro
    Stealth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub name: String,
    /// Will spent on use
    pub cost: u32,
    pub kind: AbilityKind,
}

impl Ability {
    pub fn new(name: &str, cost: u32, kind: AbilityKind) -> Self {
        Self {
            name: name.to_string(),
            cost,
            kind,
        }
    }

    /// Free physical attack every character falls back on.
    pub fn strike() -> Self {
        Self::new(
            "Strike",
            0,
            AbilityKind::Offensive {
                damage_type: DamageType::Physical,
                factor: 1.0,
            },
        )
    }

    pub fn rend() -> Self {
        Self::new(
            "Rend",
            10,
            AbilityKind::Offensive {
                damage_type: DamageType::Physical,
                factor: 1.5,
            },
        )
    }

    pub fn fireball() -> Self {
        Self::new(
            "Fireball",
            15,
            AbilityKind::Offensive {
                damage_type: DamageType::Magical,
                factor: 2.0,
            },
        )
    }

    pub fn mend() -> Self {
        Self::new("Mend", 10, AbilityKind::Heal { amount: 25 })
    }

    pub fn rally() -> Self {
        Self::new(
            "Rally",
            8,
            AbilityKind::Buff {
                stat: Stat::Strength,
                amount: 4.0,
                turns: 3,
            },
        )
    }

    pub fn hamstring() -> Self {
        Self::new(
            "Hamstring",
            6,
            AbilityKind::Buff {
                stat: Stat::Speed,
                amount: -0.1,
                turns: 2,
            },
        )
    }

    /// Raises the caster's defense until their next action.
    pub fn brace() -> Self {
        Self::new(
            "Brace",
            0,
            AbilityKind::Buff {
                stat: Stat::Defense,
                amount: 10.0,
                turns: 1,
            },
        )
    }

    pub fn provoke() -> Self {
        Self::new("Provoke", 5, AbilityKind::Taunt { agro: 3 })
    }

    pub fn vanish() -> Self {
        Self::new("Vanish", 5, AbilityKind::Stealth)
    }

    /// Abilities a player character starts with.
    pub fn starter_kit() -> Vec<Ability> {
        vec![
            Self::strike(),
            Self::fireball(),
            Self::mend(),
            Self::rally(),
            Self::hamstring(),
            Self::brace(),
            Self::provoke(),
            Self::vanish(),
        ]
    }

    pub fn is_offensive(&self) -> bool {
        matches!(self.kind, AbilityKind::Offensive { .. })
    }

    /// Damage this ability would deal from `source`, before hp clamping.
    pub fn damage_from(&self, source: &Character) -> u32 {
        match self.kind {
            AbilityKind::Offensive {
                damage_type,
                factor,
            } => {
                let power = match damage_type {
                    DamageType::Physical => source.effective(Stat::Strength),
                    DamageType::Magical => source.effective(Stat::Mind),
                };
                (factor * power).max(0.0).floor() as u32
            }
            _ => 0,
        }
    }
}

/// Resolves `ability` from `source` onto `target` and returns both updated.
///
/// Deducts the cost from the caster but performs no gating; callers check
/// liveness, turns and will first. When source and target are the same
/// character, the caller merges the two results.
///
/// # Examples
///
/// ```
/// use depths::{apply, Ability, Character};
///
/// let hero = Character::new("Hero", 100, 30, 12, 8, 0.4);
/// let slime = Character::new("Slime", 20, 0, 3, 1, 0.2);
/// let (_, slime) = apply(&Ability::strike(), &hero, &slime);
/// assert_eq!(slime.hp, 8);
/// ```
pub fn apply(ability: &Ability, source: &Character, target: &Character) -> (Character, Character) {
    let mut caster = source.clone();
    let mut affected = target.clone();
    caster.will = caster.will.saturating_sub(ability.cost);

    match &ability.kind {
        AbilityKind::Offensive { .. } => {
            affected.take_damage(ability.damage_from(source));
        }
        AbilityKind::Heal { amount } => {
            affected.heal(*amount);
        }
        AbilityKind::Buff {
            stat,
            amount,
            turns,
        } => {
            affected.add_status(StatusEffect {
                stat: *stat,
                amount: *amount,
                turns_remaining: *turns,
            });
        }
        AbilityKind::Taunt { agro } => {
            affected.agro += agro;
        }
        AbilityKind::Stealth => {
            caster.agro = (caster.agro / 2).max(1);
        }
    }

    (caster, affected)
}
