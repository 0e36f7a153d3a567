//! Library-level self-play checks against the reference arena.

use flagwarden::arena::Arena;
use flagwarden::board::GameView;
use flagwarden::config::EngineConfig;
use flagwarden::engine::create_team;
use flagwarden::selfplay::{play_game, play_games, SelfPlayConfig, DEFAULT_ROWS};
use flagwarden::tactics::TacticalState;

fn config(seed: u64, games: usize) -> SelfPlayConfig {
    SelfPlayConfig {
        games,
        max_turns: 300,
        seed,
        quiet: true,
        ..Default::default()
    }
}

#[test]
fn every_move_is_legal_under_partial_observation() {
    let engine = EngineConfig {
        seed: 31,
        ..EngineConfig::default()
    };
    let mut arena = Arena::from_rows(DEFAULT_ROWS).unwrap();
    let [r0, r2] = create_team(0, 2, &engine);
    let [b1, b3] = create_team(1, 3, &engine);
    let mut agents = [r0, b1, r2, b3];
    for agent in agents.iter_mut() {
        agent.initialize(&arena.observe(agent.id(), Some(5)));
    }

    for turn in 0..400usize {
        if arena.is_over() {
            break;
        }
        let id = turn % 4;
        let view = arena.observe(id, Some(5));
        let action = agents[id].choose_action(&view).unwrap();
        assert!(
            arena.legal_actions(id).contains(&action),
            "turn {turn}: agent {id} chose {action}"
        );
        arena.apply(id, action);
    }
}

#[test]
fn raiders_leave_start_on_their_first_turn() {
    let game = play_game(&config(8, 1), &EngineConfig::default(), 0).unwrap();
    for raider in [0, 1] {
        assert_ne!(game.final_states[raider], TacticalState::Start);
    }
}

#[test]
fn full_sight_games_complete() {
    let cfg = SelfPlayConfig {
        sight_range: None,
        ..config(12, 2)
    };
    let games = play_games(&cfg, &EngineConfig::default()).unwrap();
    assert_eq!(games.len(), 2);
    for game in &games {
        assert!(game.turns <= 300);
        assert!(game.red_food_left <= 10 && game.blue_food_left <= 10);
    }
}

#[test]
fn different_seeds_are_recorded_per_game() {
    let games = play_games(&config(100, 3), &EngineConfig::default()).unwrap();
    let seeds: Vec<u64> = games.iter().map(|g| g.seed).collect();
    assert_eq!(seeds, vec![100, 101, 102]);
}
