//! Property tests for the battle resolver.

use depths::{
    pick_by_aggro, resolve_damage, Ability, Action, ActionOutcome, BattleCharacter, BattleState,
    BattleSession, Character, Side,
};
use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

fn fighter(name: &str, hp: u32, strength: u32, speed: f64) -> Character {
    Character::new(name, hp, 30, strength, 5, speed).with_abilities(Ability::starter_kit())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn turns_never_exceed_the_cap(
        seed in any::<u64>(),
        speeds in prop::collection::vec(0.0f64..2.5, 2..6),
        ticks in 1usize..300,
    ) {
        let (players, enemies) = speeds.split_at(speeds.len() / 2);
        let players = players.iter().map(|&s| fighter("P", 500, 3, s)).collect();
        let enemies = enemies.iter().map(|&s| fighter("E", 500, 3, s)).collect();
        let mut session = BattleSession::init(enemies, players, Vec::new());
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..ticks {
            session.tick(&mut rng);
            for bc in session.players().iter().chain(session.enemies()) {
                prop_assert!(bc.turns <= session.max_turns());
                prop_assert!(bc.character.hp <= bc.character.max_hp);
            }
        }
    }

    #[test]
    fn basic_damage_is_at_least_one(
        seed in any::<u64>(),
        attack in 0u32..500,
        defense in 0u32..1000,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let damage = resolve_damage(attack, defense, &mut rng);
        prop_assert!(damage >= 1);
        prop_assert!(damage as i64 <= (attack as i64 - (defense / 2) as i64 + 2).max(1));
    }

    #[test]
    fn aggro_never_picks_the_dead(
        seed in any::<u64>(),
        party in prop::collection::vec((1u32..10, any::<bool>()), 0..8),
    ) {
        let candidates: Vec<BattleCharacter> = party
            .iter()
            .map(|&(agro, alive)| {
                let mut c = fighter("X", 10, 1, 0.1);
                c.agro = agro;
                c.hp = if alive { 10 } else { 0 };
                BattleCharacter::new(c)
            })
            .collect();
        let mut rng = StdRng::seed_from_u64(seed);
        let any_alive = party.iter().any(|&(_, alive)| alive);

        for _ in 0..20 {
            match pick_by_aggro(&candidates, &mut rng) {
                Some(index) => prop_assert!(candidates[index].is_alive()),
                None => prop_assert!(!any_alive),
            }
        }
    }

    #[test]
    fn rejected_actions_change_nothing(
        seed in any::<u64>(),
        ticks in 0usize..10,
        source_index in 0usize..3,
        target_index in 0usize..3,
    ) {
        let players = vec![fighter("A", 40, 5, 0.3), fighter("B", 0, 5, 0.3)];
        let enemies = vec![fighter("C", 40, 5, 0.2), fighter("D", 0, 5, 0.2)];
        let mut session = BattleSession::init(enemies, players, Vec::new());
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..ticks {
            session.tick(&mut rng);
        }

        let before = session.clone();
        let action = Action {
            ability: Ability::fireball(),
            source: Side::Player(source_index),
            target: Side::Enemy(target_index),
        };
        if session.act(&action) == ActionOutcome::Rejected {
            prop_assert_eq!(session, before);
        }
    }
}

#[test]
fn equal_aggro_is_roughly_uniform() {
    let candidates: Vec<BattleCharacter> = (0..3)
        .map(|_| BattleCharacter::new(fighter("X", 10, 1, 0.1)))
        .collect();
    let mut rng = StdRng::seed_from_u64(1234);
    let mut counts = [0usize; 3];
    let draws = 9000;
    for _ in 0..draws {
        let index = pick_by_aggro(&candidates, &mut rng).unwrap();
        counts[index] += 1;
    }
    for count in counts {
        let share = count as f64 / draws as f64;
        assert!((0.30..0.37).contains(&share), "counts = {:?}", counts);
    }
}

#[test]
fn a_full_battle_reaches_a_terminal_state() {
    let players = vec![fighter("Knight", 120, 12, 0.5), fighter("Cleric", 80, 6, 0.4)];
    let enemies = vec![fighter("Orc", 60, 8, 0.35), fighter("Bat", 30, 4, 0.6)];
    let mut session = BattleSession::init(enemies, players, Vec::new());
    let mut rng = StdRng::seed_from_u64(77);

    for _ in 0..10_000 {
        if session.state().is_over() {
            break;
        }
        session.tick(&mut rng);

        // Players spend every banked turn striking the first living enemy.
        for p in 0..session.players().len() {
            while session.get(Side::Player(p)).map_or(false, |bc| bc.turns > 0 && bc.is_alive()) {
                let Some(target) = session.enemies().iter().position(BattleCharacter::is_alive) else {
                    break;
                };
                let action = Action {
                    ability: Ability::strike(),
                    source: Side::Player(p),
                    target: Side::Enemy(target),
                };
                if let ActionOutcome::Resolved { next_actor: Some(Side::Enemy(e)) } = session.act(&action) {
                    session.enemy_act(e, &mut rng);
                }
                if session.state().is_over() {
                    break;
                }
            }
        }
    }

    let state = session.state();
    assert!(matches!(state, BattleState::BattleWon | BattleState::BattleLost));
    let result = session.finish();
    assert_eq!(result.state, state);
    if result.won() {
        assert!(result.enemies.iter().all(|e| e.hp == 0));
    } else {
        assert!(result.players.iter().all(|p| p.hp == 0));
    }
}
