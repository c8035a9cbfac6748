//! # Game Mathematics
//!
//! Damage and ratio helpers for combat calculations.

use rand::rngs::StdRng;
use rand::Rng;

/// Resolves a basic attack: `max(1, attack - defense / 2 + U[-2, 2])`.
///
/// # Examples
///
/// ```
/// use depths::resolve_damage;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(7);
/// assert!(resolve_damage(1, 100, &mut rng) >= 1);
/// ```
pub fn resolve_damage(attack: u32, defense: u32, rng: &mut StdRng) -> u32 {
    let variance: i64 = rng.gen_range(-2..=2);
    let raw = attack as i64 - (defense / 2) as i64 + variance;
    raw.max(1) as u32
}

/// `current / max` as a float, treating a zero maximum as empty.
pub fn ratio(current: u32, max: u32) -> f64 {
    if max == 0 {
        0.0
    } else {
        current as f64 / max as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_damage_bounds() {
        let mut rng = StdRng::seed_from_u64(12345);
        for _ in 0..500 {
            let damage = resolve_damage(20, 10, &mut rng);
            assert!((13..=17).contains(&damage), "damage {} out of range", damage);
        }
    }

    #[test]
    fn test_damage_floor_when_outclassed() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..500 {
            assert_eq!(resolve_damage(2, 50, &mut rng), 1);
        }
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(50, 100), 0.5);
        assert_eq!(ratio(5, 0), 0.0);
    }
}
