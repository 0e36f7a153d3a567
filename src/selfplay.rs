//! Self-play match generation.
//!
//! Pits two default teams against each other on the reference arena. Each
//! agent only sees the snapshot its team can observe, and every chosen
//! action is checked against the arena's legal moves before it is applied.
//! Games are independent, so several can run at once on a rayon pool.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use log::{debug, info};
use serde::Serialize;

use crate::arena::{Arena, ArenaError, Team};
use crate::board::{Action, AgentId, GameView};
use crate::config::EngineConfig;
use crate::engine::{create_team, Agent, EngineError};
use crate::tactics::TacticalState;

/// Built-in 20x9 four-agent maze, point-symmetric between the halves.
pub const DEFAULT_ROWS: &[&str] = &[
    "%%%%%%%%%%%%%%%%%%%%",
    "%3 . .  .%  o   .  %",
    "% %%% %% % %% % %% %",
    "% . o  . ..  .  . 2%",
    "%%% %  % %% %  % %%%",
    "%1 .  .  .. .  o . %",
    "% %% % %% % %% %%% %",
    "%  .   o  %.  . . 4%",
    "%%%%%%%%%%%%%%%%%%%%",
];

/// Errors that can end a self-play run.
#[derive(Debug, thiserror::Error)]
pub enum SelfPlayError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("invalid layout: {0}")]
    Arena(#[from] ArenaError),

    #[error("agent {agent} chose illegal action {action}")]
    IllegalAction { agent: AgentId, action: Action },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("self-play needs a four-agent layout, got {0} agents")]
    UnsupportedAgentCount(usize),
}

/// Configuration for self-play match generation.
#[derive(Debug, Clone)]
pub struct SelfPlayConfig {
    /// Number of games to play.
    pub games: usize,
    /// Moves (over all agents) before a game is stopped.
    pub max_turns: u32,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    /// Number of parallel threads for concurrent games.
    pub threads: usize,
    /// Manhattan range within which opponents are visible. `None` sees all.
    pub sight_range: Option<u32>,
    /// Fixture rows of the maze to play on.
    pub layout: &'static [&'static str],
    /// Suppress per-game progress output.
    pub quiet: bool,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        SelfPlayConfig {
            games: 10,
            max_turns: 1200,
            seed: 0,
            threads: 1,
            sight_range: Some(5),
            layout: DEFAULT_ROWS,
            quiet: false,
        }
    }
}

/// How a game ended, from red's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Red,
    Blue,
    Tie,
}

/// A completed self-play game.
#[derive(Debug, Clone, Serialize)]
pub struct GameRecord {
    pub game_id: usize,
    /// Seed the agents were built with (0 when drawn from entropy).
    pub seed: u64,
    pub turns: u32,
    /// Final score from red's perspective.
    pub red_score: i32,
    pub outcome: Outcome,
    /// Food still on each half when the game ended.
    pub red_food_left: usize,
    pub blue_food_left: usize,
    /// Tactical state of each agent at the end, by agent index.
    pub final_states: Vec<TacticalState>,
    /// Tactical state changes per agent over the game.
    pub transitions: Vec<u32>,
}

/// Plays one game with both teams configured from `engine`.
pub fn play_game(
    config: &SelfPlayConfig,
    engine: &EngineConfig,
    game_id: usize,
) -> Result<GameRecord, SelfPlayError> {
    let mut arena = Arena::from_rows(config.layout)?;
    if arena.agent_count() != 4 {
        return Err(SelfPlayError::UnsupportedAgentCount(arena.agent_count()));
    }

    let seed = if config.seed != 0 {
        config.seed.wrapping_add(game_id as u64)
    } else {
        0
    };
    let engine = EngineConfig {
        seed,
        ..engine.clone()
    };

    let [r0, r2] = create_team(0, 2, &engine);
    let [b1, b3] = create_team(1, 3, &engine);
    let mut agents: [Agent; 4] = [r0, b1, r2, b3];
    for agent in agents.iter_mut() {
        agent.initialize(&arena.observe(agent.id(), config.sight_range));
    }

    let mut states: Vec<TacticalState> = agents.iter().map(Agent::state).collect();
    let mut transitions = vec![0u32; agents.len()];

    while !arena.is_over() && arena.turn() < config.max_turns {
        let id = arena.turn() as usize % agents.len();
        let view = arena.observe(id, config.sight_range);
        let action = agents[id].choose_action(&view)?;
        if !arena.legal_actions(id).contains(&action) {
            return Err(SelfPlayError::IllegalAction { agent: id, action });
        }
        arena.apply(id, action);

        if agents[id].state() != states[id] {
            states[id] = agents[id].state();
            transitions[id] += 1;
        }
    }

    let red_score = arena.red_score();
    let outcome = match red_score {
        s if s > 0 => Outcome::Red,
        s if s < 0 => Outcome::Blue,
        _ => Outcome::Tie,
    };
    debug!(
        "game {} ended after {} turns: {:?} ({})",
        game_id,
        arena.turn(),
        outcome,
        red_score
    );

    Ok(GameRecord {
        game_id,
        seed,
        turns: arena.turn(),
        red_score,
        outcome,
        red_food_left: arena.food_left(Team::Red),
        blue_food_left: arena.food_left(Team::Blue),
        final_states: states,
        transitions,
    })
}

/// Plays `config.games` games, in parallel when `config.threads > 1`.
/// Records come back ordered by game id.
pub fn play_games(
    config: &SelfPlayConfig,
    engine: &EngineConfig,
) -> Result<Vec<GameRecord>, SelfPlayError> {
    info!(
        "playing {} games on {} thread(s), seed {}",
        config.games, config.threads, config.seed
    );
    if config.threads > 1 {
        play_parallel(config, engine)
    } else {
        (0..config.games)
            .map(|i| -> Result<GameRecord, SelfPlayError> {
                let start = Instant::now();
                let game = play_game(config, engine, i)?;
                report(config, &game, i + 1, start.elapsed().as_secs_f64());
                Ok(game)
            })
            .collect()
    }
}

fn play_parallel(
    config: &SelfPlayConfig,
    engine: &EngineConfig,
) -> Result<Vec<GameRecord>, SelfPlayError> {
    use rayon::prelude::*;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    let completed = AtomicUsize::new(0);

    pool.install(|| {
        (0..config.games)
            .into_par_iter()
            .map(|i| -> Result<GameRecord, SelfPlayError> {
                let start = Instant::now();
                let game = play_game(config, engine, i)?;
                let n = completed.fetch_add(1, Ordering::Relaxed) + 1;
                report(config, &game, n, start.elapsed().as_secs_f64());
                Ok(game)
            })
            .collect()
    })
}

fn report(config: &SelfPlayConfig, game: &GameRecord, n: usize, secs: f64) {
    if config.quiet {
        return;
    }
    let outcome = match game.outcome {
        Outcome::Red => format!("red wins by {}", game.red_score),
        Outcome::Blue => format!("blue wins by {}", -game.red_score),
        Outcome::Tie => "tie".to_string(),
    };
    eprintln!(
        "Game {}/{}: {} after {} turns ({:.2}s)",
        n, config.games, outcome, game.turns, secs
    );
}

/// Writes game records as JSONL (one JSON object per game, one per line).
pub fn write_jsonl<W: Write>(games: &[GameRecord], out: &mut W) -> std::io::Result<()> {
    for game in games {
        serde_json::to_writer(&mut *out, game)?;
        writeln!(out)?;
    }
    out.flush()
}

/// Prints a summary of self-play results to stderr.
pub fn print_summary(games: &[GameRecord]) {
    let total = games.len();
    let count = |o: Outcome| games.iter().filter(|g| g.outcome == o).count();
    let pct = |n: usize| 100.0 * n as f64 / total.max(1) as f64;
    let turns: u64 = games.iter().map(|g| u64::from(g.turns)).sum();
    let margin: i64 = games.iter().map(|g| i64::from(g.red_score)).sum();

    eprintln!("=== Self-Play Summary ===");
    eprintln!("Games: {}", total);
    eprintln!("Avg turns/game: {:.1}", turns as f64 / total.max(1) as f64);
    eprintln!("Avg red margin: {:+.2}", margin as f64 / total.max(1) as f64);
    for (label, outcome) in [("red", Outcome::Red), ("blue", Outcome::Blue), ("tie", Outcome::Tie)] {
        let n = count(outcome);
        eprintln!("  {:>5}: {} ({:.1}%)", label, n, pct(n));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(seed: u64) -> SelfPlayConfig {
        SelfPlayConfig {
            games: 1,
            max_turns: 200,
            seed,
            quiet: true,
            ..Default::default()
        }
    }

    #[test]
    fn default_layout_is_playable() {
        let arena = Arena::from_rows(DEFAULT_ROWS).unwrap();
        assert_eq!(arena.agent_count(), 4);
        assert!(!arena.is_over());
        assert_eq!(arena.food_left(Team::Red), arena.food_left(Team::Blue));
    }

    #[test]
    fn single_game_completes_within_the_turn_limit() {
        let game = play_game(&quick(42), &EngineConfig::default(), 0).unwrap();
        assert!(game.turns <= 200);
        assert_eq!(game.final_states.len(), 4);
        assert_eq!(game.seed, 42);
        match game.outcome {
            Outcome::Red => assert!(game.red_score > 0),
            Outcome::Blue => assert!(game.red_score < 0),
            Outcome::Tie => assert_eq!(game.red_score, 0),
        }
    }

    #[test]
    fn guards_stay_on_defend() {
        let game = play_game(&quick(7), &EngineConfig::default(), 0).unwrap();
        assert_eq!(game.final_states[2], TacticalState::Defend);
        assert_eq!(game.final_states[3], TacticalState::Defend);
        assert_eq!(game.transitions[2], 0);
        assert_eq!(game.transitions[3], 0);
    }

    #[test]
    fn seeded_games_are_reproducible() {
        let a = play_game(&quick(1234), &EngineConfig::default(), 3).unwrap();
        let b = play_game(&quick(1234), &EngineConfig::default(), 3).unwrap();
        assert_eq!(a.turns, b.turns);
        assert_eq!(a.red_score, b.red_score);
        assert_eq!(a.final_states, b.final_states);
        assert_eq!(a.transitions, b.transitions);
    }

    #[test]
    fn parallel_run_produces_ordered_records() {
        let config = SelfPlayConfig {
            games: 4,
            threads: 2,
            ..quick(77)
        };
        let games = play_games(&config, &EngineConfig::default()).unwrap();
        let ids: Vec<usize> = games.iter().map(|g| g.game_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn two_agent_layouts_are_rejected() {
        let config = SelfPlayConfig {
            layout: &["%%%%%%", "%1..2%", "%%%%%%"],
            ..quick(1)
        };
        let err = play_game(&config, &EngineConfig::default(), 0).unwrap_err();
        assert!(matches!(err, SelfPlayError::UnsupportedAgentCount(2)));
    }

    #[test]
    fn jsonl_output_is_one_object_per_line() {
        let games = play_games(&quick(55), &EngineConfig::default()).unwrap();
        let mut buf = Vec::new();
        write_jsonl(&games, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();

        assert_eq!(output.lines().count(), 1);
        for line in output.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["game_id"], 0);
            assert!(value["outcome"].is_string());
            assert_eq!(value["final_states"].as_array().map(Vec::len), Some(4));
        }
    }
}
