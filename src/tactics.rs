//! Per-unit tactical state machine.
//!
//! Tracks whether a unit is attacking, retreating or defending, and keeps a
//! running estimate of how much food it carries. The machine is a pure
//! function: the caller owns the `TacticalState` and `UnitMemory` and feeds
//! them back in every turn.
//!
//! Bookkeeping runs first (score baseline, carry counter, capture
//! detection), then the transition for the current state is applied.

use log::info;
use serde::{Deserialize, Serialize};

/// The tactical mode of one controlled unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TacticalState {
    #[default]
    Start,
    Attack,
    Defend,
    Retreat,
}

/// All tactical states.
pub const ALL_TACTICAL_STATES: [TacticalState; 4] = [
    TacticalState::Start,
    TacticalState::Attack,
    TacticalState::Defend,
    TacticalState::Retreat,
];

impl TacticalState {
    /// Returns the lowercase name used in logs and configuration.
    pub const fn name(self) -> &'static str {
        match self {
            TacticalState::Start => "start",
            TacticalState::Attack => "attack",
            TacticalState::Defend => "defend",
            TacticalState::Retreat => "retreat",
        }
    }
}

impl std::fmt::Display for TacticalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Counters a unit carries from one turn to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitMemory {
    /// Enemy-side food count seen on the previous turn.
    pub last_enemy_food: usize,
    /// Food eaten since the last deposit or capture.
    pub accumulated_carry: u32,
    /// Official score baseline. `None` means unset.
    pub last_official_score: Option<i32>,
}

impl UnitMemory {
    /// Memory for a unit entering a game with `enemy_food` items to eat.
    pub fn new(enemy_food: usize) -> Self {
        UnitMemory {
            last_enemy_food: enemy_food,
            accumulated_carry: 0,
            last_official_score: None,
        }
    }
}

/// What the state machine needs to know about the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Observation {
    /// Official score from the unit's team perspective.
    pub official_score: i32,
    /// Food left on the enemy side.
    pub enemy_food_remaining: usize,
    /// Largest food load carried by any opponent.
    pub max_enemy_carry: u32,
    /// True while the unit is inside enemy territory.
    pub on_offense: bool,
    /// Largest scare timer among opponents.
    pub max_enemy_scare: u32,
}

/// Tunable limits of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Thresholds {
    /// Lead above which the unit stops attacking and guards home.
    pub min_valid_score: i32,
    /// Enemy food load above which the unit turns back to defend.
    pub enemy_max_carry: u32,
    /// Food eaten before heading home. Doubled while any enemy is scared.
    pub carry_limit: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            min_valid_score: 5,
            enemy_max_carry: 4,
            carry_limit: 2,
        }
    }
}

impl Thresholds {
    /// Carry limit in effect for the given enemy scare timer.
    pub fn effective_carry_limit(&self, max_enemy_scare: u32) -> u32 {
        if max_enemy_scare > 0 {
            self.carry_limit * 2
        } else {
            self.carry_limit
        }
    }
}

/// Runs one turn of bookkeeping and transition.
///
/// Deterministic: identical inputs always produce identical outputs.
pub fn advance(
    state: TacticalState,
    memory: UnitMemory,
    obs: &Observation,
    limits: &Thresholds,
) -> (TacticalState, UnitMemory) {
    let (state, mut memory) = bookkeep(state, memory, obs);

    let next = match state {
        TacticalState::Start => from_start(obs, limits),
        TacticalState::Attack => from_attack(&memory, obs, limits),
        TacticalState::Retreat => from_retreat(&mut memory, obs, limits),
        TacticalState::Defend => from_defend(obs, limits),
    };

    (next, memory)
}

/// Forces an attacking unit with no safe target into `Retreat`.
pub fn escalate_danger(state: TacticalState) -> TacticalState {
    match state {
        TacticalState::Attack => TacticalState::Retreat,
        other => other,
    }
}

/// Logs a state change. No-op when the state is unchanged.
pub(crate) fn log_transition(
    agent: usize,
    from: TacticalState,
    to: TacticalState,
    memory: &UnitMemory,
) {
    if from != to {
        info!(
            "agent {} entered state {} (carry {}, score baseline {:?})",
            agent, to, memory.accumulated_carry, memory.last_official_score
        );
    }
}

/// Updates the score baseline and carry counter. Returns `Start` in place of
/// `state` when the unit was captured since the last turn.
fn bookkeep(
    state: TacticalState,
    mut memory: UnitMemory,
    obs: &Observation,
) -> (TacticalState, UnitMemory) {
    let scored = match memory.last_official_score {
        Some(last) => obs.official_score > last,
        None => true,
    };
    if scored {
        memory.last_official_score = Some(obs.official_score);
        memory.accumulated_carry = 0;
    }

    let food = obs.enemy_food_remaining;
    if food < memory.last_enemy_food {
        if !scored {
            memory.accumulated_carry += (memory.last_enemy_food - food) as u32;
        }
        memory.last_enemy_food = food;
        (state, memory)
    } else if food > memory.last_enemy_food {
        // Food went back on the board: the unit was eaten while carrying.
        memory.accumulated_carry = 0;
        memory.last_enemy_food = food;
        memory.last_official_score = None;
        (TacticalState::Start, memory)
    } else {
        (state, memory)
    }
}

fn from_start(obs: &Observation, limits: &Thresholds) -> TacticalState {
    if obs.official_score > limits.min_valid_score || obs.max_enemy_carry > limits.enemy_max_carry
    {
        TacticalState::Defend
    } else {
        TacticalState::Attack
    }
}

fn from_attack(memory: &UnitMemory, obs: &Observation, limits: &Thresholds) -> TacticalState {
    if !obs.on_offense && obs.max_enemy_carry > limits.enemy_max_carry {
        TacticalState::Defend
    } else if memory.accumulated_carry < limits.effective_carry_limit(obs.max_enemy_scare) {
        TacticalState::Attack
    } else {
        TacticalState::Retreat
    }
}

fn from_retreat(memory: &mut UnitMemory, obs: &Observation, limits: &Thresholds) -> TacticalState {
    if obs.on_offense {
        TacticalState::Retreat
    } else {
        memory.accumulated_carry = 0;
        from_start(obs, limits)
    }
}

fn from_defend(obs: &Observation, limits: &Thresholds) -> TacticalState {
    from_start(obs, limits)
}
