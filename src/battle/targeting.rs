//! Aggro-weighted target selection.

use super::BattleCharacter;
use rand::rngs::StdRng;
use rand::Rng;

/// Picks a living character with probability proportional to its agro.
///
/// Dead characters weigh nothing. Returns `None` when nobody is alive.
pub fn pick_by_aggro(candidates: &[BattleCharacter], rng: &mut StdRng) -> Option<usize> {
    let weight = |candidate: &BattleCharacter| {
        if candidate.is_alive() {
            candidate.character.agro.max(1)
        } else {
            0
        }
    };

    let total: u32 = candidates.iter().map(weight).sum();
    if total == 0 {
        return None;
    }

    let mut roll = rng.gen_range(0..total);
    for (index, candidate) in candidates.iter().enumerate() {
        let w = weight(candidate);
        if roll < w {
            return Some(index);
        }
        roll -= w;
    }
    None
}
