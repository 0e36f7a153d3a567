//! Per-unit decision making.
//!
//! An [`Agent`] controls one unit. Every turn it updates its tactical state
//! from the current snapshot, scores each legal action with the linear
//! evaluator and picks among the best ones.

use log::{debug, trace};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::board::{Action, AgentId, Cell, GameView};
use crate::config::EngineConfig;
use crate::eval::{aligned_successor, evaluate, extract, in_danger, WeightBook};
use crate::tactics::{self, Observation, TacticalState, Thresholds, UnitMemory};

/// Errors that can occur while choosing an action.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("agent {agent} has no legal actions")]
    NoLegalActions { agent: AgentId },

    #[error("agent {agent} was asked to move before initialize")]
    NotInitialized { agent: AgentId },
}

/// How a unit plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Runs the full tactical state machine.
    Raider,
    /// Stays in `Defend` for the whole game.
    Guard,
}

/// A controller bound to one unit.
pub struct Agent {
    id: AgentId,
    role: Role,
    state: TacticalState,
    memory: UnitMemory,
    spawn: Option<Cell>,
    thresholds: Thresholds,
    weights: WeightBook,
    home_food_threshold: usize,
    sentinel: u32,
    rng: SmallRng,
}

impl Agent {
    /// Creates an agent for unit `id`. A zero seed draws from entropy;
    /// otherwise the unit id is mixed in so teammates do not share a stream.
    pub fn new(id: AgentId, role: Role, config: &EngineConfig) -> Self {
        let rng = if config.seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(config.seed.wrapping_add(id as u64))
        };
        let state = match role {
            Role::Raider => TacticalState::Start,
            Role::Guard => TacticalState::Defend,
        };

        Agent {
            id,
            role,
            state,
            memory: UnitMemory::default(),
            spawn: None,
            thresholds: config.thresholds,
            weights: WeightBook::new(&config.weights),
            home_food_threshold: config.home_food_threshold,
            sentinel: config.sentinel,
            rng,
        }
    }

    /// Records the spawn cell and the enemy food count at game start.
    pub fn initialize<V: GameView>(&mut self, view: &V) {
        let me = view.agent_state(self.id);
        self.spawn = me.nearest_cell();
        self.memory = UnitMemory::new(view.target_food(self.id).len());
        debug!(
            "agent {} ({:?}) initialized at {:?} with {} enemy food",
            self.id, self.role, self.spawn, self.memory.last_enemy_food
        );
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> TacticalState {
        self.state
    }

    pub fn memory(&self) -> &UnitMemory {
        &self.memory
    }

    pub fn spawn(&self) -> Option<Cell> {
        self.spawn
    }

    /// Picks this turn's action. The result is always one of
    /// `view.legal_actions(id)`.
    pub fn choose_action<V: GameView>(&mut self, view: &V) -> Result<Action, EngineError> {
        let spawn = self.spawn.ok_or(EngineError::NotInitialized { agent: self.id })?;
        let legal = view.legal_actions(self.id);
        if legal.is_empty() {
            return Err(EngineError::NoLegalActions { agent: self.id });
        }

        if self.role == Role::Raider {
            let obs = self.observe(view);
            let (next, memory) =
                tactics::advance(self.state, self.memory, &obs, &self.thresholds);
            tactics::log_transition(self.id, self.state, next, &memory);
            self.state = next;
            self.memory = memory;
        }

        let mut scores = self.score_actions(view, &legal);
        if scores.iter().any(|&(_, danger)| danger) {
            let escalated = tactics::escalate_danger(self.state);
            if escalated != self.state {
                tactics::log_transition(self.id, self.state, escalated, &self.memory);
                self.state = escalated;
                scores = self.score_actions(view, &legal);
            }
        }

        let best = scores
            .iter()
            .map(|&(s, _)| s)
            .fold(f64::NEG_INFINITY, f64::max);
        let tied: Vec<Action> = legal
            .iter()
            .zip(&scores)
            .filter(|&(_, &(s, _))| s == best)
            .map(|(&a, _)| a)
            .collect();

        let home_low = view.own_food(self.id).len() <= self.home_food_threshold;
        let action = if tied.len() > 1 && home_low {
            self.nearest_to(view, &tied, spawn)
        } else {
            *tied.choose(&mut self.rng).unwrap_or(&legal[0])
        };

        debug!(
            "agent {} [{}] chose {} (score {:.1}, {} tied of {})",
            self.id,
            self.state,
            action,
            best,
            tied.len(),
            legal.len()
        );
        Ok(action)
    }

    fn observe<V: GameView>(&self, view: &V) -> Observation {
        let enemies: Vec<_> = view
            .opponents(self.id)
            .into_iter()
            .map(|o| view.agent_state(o))
            .collect();
        Observation {
            official_score: view.score(self.id),
            enemy_food_remaining: view.target_food(self.id).len(),
            max_enemy_carry: enemies.iter().map(|e| e.num_carrying).max().unwrap_or(0),
            on_offense: view.agent_state(self.id).is_pacman,
            max_enemy_scare: enemies.iter().map(|e| e.scared_timer).max().unwrap_or(0),
        }
    }

    /// Score of each legal action and whether it shows danger, in legal order.
    fn score_actions<V: GameView>(&self, view: &V, legal: &[Action]) -> Vec<(f64, bool)> {
        let weights = self.weights.for_state(self.state);
        legal
            .iter()
            .map(|&action| {
                let features = extract(view, self.id, action, self.state, self.sentinel);
                let score = evaluate(&features, weights);
                trace!("agent {} {} -> {:.2} {}", self.id, action, score, features);
                let danger =
                    self.state == TacticalState::Attack && in_danger(&features, self.sentinel);
                (score, danger)
            })
            .collect()
    }

    /// The action among `candidates` whose successor lies closest to `spawn`.
    fn nearest_to<V: GameView>(&self, view: &V, candidates: &[Action], spawn: Cell) -> Action {
        candidates
            .iter()
            .copied()
            .min_by_key(|&action| {
                aligned_successor(view, self.id, action)
                    .agent_state(self.id)
                    .nearest_cell()
                    .map_or(u32::MAX, |cell| view.maze_distance(cell, spawn))
            })
            .unwrap_or(candidates[0])
    }
}

/// Builds a two-unit team: a raider on `first` and a guard on `second`.
pub fn create_team(first: AgentId, second: AgentId, config: &EngineConfig) -> [Agent; 2] {
    [
        Agent::new(first, Role::Raider, config),
        Agent::new(second, Role::Guard, config),
    ]
}
