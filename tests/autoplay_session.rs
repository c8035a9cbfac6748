//! Integration tests driving whole sessions through auto-play.

use depths::{config, AutoplayIntent, GameCompletionState, GameState, MoveOutcome, SessionConfig};

fn run(seed: u64, steps: usize) -> GameState {
    let mut game = GameState::new(SessionConfig::for_testing(seed)).expect("session starts");
    game.toggle_autoplay();
    for _ in 0..steps {
        match game.autoplay_step().expect("auto-play never issues an invalid intent") {
            Some(_) => {}
            None => break,
        }
        assert!(game.message_count() <= config::MAX_MESSAGES);
        assert!(game.player.hp <= game.player.max_hp);
        assert!(game.player.mana <= game.player.max_mana);
        assert!(game.level.is_walkable(game.player.position));
    }
    game
}

#[test]
fn autoplay_keeps_session_invariants() {
    for seed in [1, 2, 3, 4, 5, 6] {
        let game = run(seed, 3_000);
        assert!(
            game.is_game_over() || game.statistics.max_depth_reached >= 1,
            "seed {} stalled on the first level at {:?} after {} steps",
            seed,
            game.player.position,
            game.autoplay_steps()
        );
    }
}

#[test]
fn autoplay_sessions_reach_an_end() {
    for seed in [4, 11, 23] {
        let game = run(seed, 20_000);
        assert!(
            game.is_game_over(),
            "seed {} still playing at depth {} after {} steps",
            seed,
            game.level_index,
            game.autoplay_steps()
        );
        assert!(matches!(
            game.completion_state,
            GameCompletionState::Victory | GameCompletionState::PlayerDied
        ));
    }
}

#[test]
fn autoplay_is_deterministic_for_a_seed() {
    let a = run(42, 1_500);
    let b = run(42, 1_500);
    assert_eq!(a.snapshot_json().unwrap(), b.snapshot_json().unwrap());
}

#[test]
fn autoplay_makes_progress() {
    let mut game = GameState::new(SessionConfig::for_testing(9)).unwrap();
    game.toggle_autoplay();

    let mut moved = 0;
    let mut fought = 0;
    for _ in 0..2_000 {
        match game.autoplay_step().unwrap() {
            Some(AutoplayIntent::Move { outcome, .. }) if outcome != MoveOutcome::Blocked => {
                moved += 1
            }
            Some(AutoplayIntent::Combat { .. }) => fought += 1,
            Some(_) => {}
            None => break,
        }
    }

    assert!(moved > 0);
    assert!(
        fought > 0 || game.statistics.max_depth_reached > 0 || game.is_game_over(),
        "explorer neither fought nor descended"
    );
}

#[test]
fn finished_session_stops_autoplay() {
    let mut game = run(7, 50);
    game.completion_state = GameCompletionState::PlayerDied;
    assert_eq!(game.autoplay_step().unwrap(), None);
}
