//! Feature extraction.
//!
//! Turns a hypothetical move into a `FeatureVector` by looking one ply
//! ahead through the host's `successor`. Which features are measured
//! depends on the unit's tactical state:
//!
//! - Defend: intercept invaders and shadow the food they are heading for.
//! - Attack: eat enemy food, steering around food a defender reaches first.
//! - Retreat: head for home food, still avoiding contested cells.
//!
//! Extraction is a pure function of the snapshot, the action and the
//! tactical state; it never reads per-unit memory.

use log::warn;

use super::feature::{Feature, FeatureVector};
use crate::board::{Action, AgentId, AgentState, Cell, GameView};
use crate::tactics::TacticalState;

/// Distance reported when no safe target exists.
pub const DEFAULT_SENTINEL: u32 = 999;

/// Returns the successor after `agent` plays `action`, taking a second ply
/// when the host leaves the agent between two cells.
pub fn aligned_successor<V: GameView>(view: &V, agent: AgentId, action: Action) -> V {
    let next = view.successor(agent, action);
    match next.agent_state(agent).position {
        Some(pos) if pos.aligned_cell().is_none() => next.successor(agent, action),
        _ => next,
    }
}

/// Drops every target that a visible, unscared defender reaches in
/// strictly fewer steps than `me`.
pub fn exclude_contested<F>(
    targets: Vec<Cell>,
    me: Cell,
    enemies: &[AgentState],
    distance: F,
) -> Vec<Cell>
where
    F: Fn(Cell, Cell) -> u32,
{
    let guards: Vec<Cell> = enemies
        .iter()
        .filter(|e| e.is_active_defender())
        .filter_map(AgentState::nearest_cell)
        .collect();

    targets
        .into_iter()
        .filter(|&target| {
            let mine = distance(me, target);
            guards.iter().all(|&guard| distance(guard, target) >= mine)
        })
        .collect()
}

/// Nearest of `cells` from `from`, with its distance.
fn nearest<V: GameView>(view: &V, from: Cell, cells: &[Cell]) -> Option<(Cell, u32)> {
    cells
        .iter()
        .map(|&c| (c, view.maze_distance(from, c)))
        .min_by_key(|&(_, d)| d)
}

/// True when both target distances sit at the sentinel: no safe food and
/// no safe capsule is left.
pub fn in_danger(features: &FeatureVector, sentinel: u32) -> bool {
    let sentinel = f64::from(sentinel);
    features[Feature::DistanceToFood] == sentinel && features[Feature::DistanceToCapsule] == sentinel
}

/// Measures the features of `agent` playing `action` in `state`.
pub fn extract<V: GameView>(
    view: &V,
    agent: AgentId,
    action: Action,
    state: TacticalState,
    sentinel: u32,
) -> FeatureVector {
    let mut features = FeatureVector::default();
    if state == TacticalState::Start {
        return features;
    }

    let next = aligned_successor(view, agent, action);
    let me = match next.agent_state(agent).nearest_cell() {
        Some(cell) => cell,
        None => {
            warn!("agent {} has no position after {}", agent, action);
            return features;
        }
    };

    match state {
        TacticalState::Defend => defend_features(view, &next, agent, action, me, &mut features),
        TacticalState::Attack => forage_features(
            view,
            &next,
            agent,
            me,
            next.target_food(agent),
            sentinel,
            &mut features,
        ),
        TacticalState::Retreat => forage_features(
            view,
            &next,
            agent,
            me,
            next.own_food(agent),
            sentinel,
            &mut features,
        ),
        TacticalState::Start => {}
    }
    features
}

fn defend_features<V: GameView>(
    view: &V,
    next: &V,
    agent: AgentId,
    action: Action,
    me: Cell,
    out: &mut FeatureVector,
) {
    let mine = next.agent_state(agent);
    out[Feature::OnDefense] = if mine.is_pacman { 0.0 } else { 1.0 };
    if mine.is_pacman {
        out[Feature::IsPacman] = 1.0;
    }

    let enemies: Vec<AgentState> = next
        .opponents(agent)
        .into_iter()
        .map(|o| next.agent_state(o))
        .collect();
    let visible: Vec<Cell> = enemies.iter().filter_map(AgentState::nearest_cell).collect();
    let invaders: Vec<Cell> = enemies
        .iter()
        .filter(|e| e.is_pacman)
        .filter_map(AgentState::nearest_cell)
        .collect();
    out[Feature::NumInvaders] = invaders.len() as f64;

    let chase = nearest(next, me, &invaders)
        .or_else(|| nearest(next, me, &visible))
        .or_else(|| nearest(next, me, &next.own_food(agent)));
    if let Some((_, d)) = chase {
        out[Feature::InvaderDistance] = f64::from(d);
    }

    if action == Action::Stop {
        out[Feature::Stop] = 1.0;
    }
    if action == view.agent_state(agent).direction.reverse() {
        out[Feature::Reverse] = 1.0;
    }

    // Stand between the closest enemy and the food it is nearest to.
    let threat = nearest(next, me, &invaders).or_else(|| nearest(next, me, &visible));
    let front = match threat {
        Some((enemy, _)) => {
            let mut guarded = next.own_food(agent);
            guarded.extend(next.own_capsules(agent));
            nearest(next, enemy, &guarded).map(|(item, _)| next.maze_distance(me, item))
        }
        None => nearest(view, me, &view.target_food(agent)).map(|(_, d)| d),
    };
    if let Some(d) = front {
        out[Feature::DefendFrontFood] = -f64::from(d);
    }
}

fn forage_features<V: GameView>(
    view: &V,
    next: &V,
    agent: AgentId,
    me: Cell,
    food: Vec<Cell>,
    sentinel: u32,
    out: &mut FeatureVector,
) {
    // Attack counts enemy food left to eat, Retreat the home food still held.
    out[Feature::SuccessorScore] = -(food.len() as f64);

    let enemies: Vec<AgentState> = next
        .opponents(agent)
        .into_iter()
        .map(|o| next.agent_state(o))
        .collect();
    let distance = |a: Cell, b: Cell| next.maze_distance(a, b);

    let safe_food = exclude_contested(food, me, &enemies, distance);
    out[Feature::DistanceToFood] = f64::from(
        nearest(next, me, &safe_food).map_or(sentinel, |(_, d)| d),
    );

    let safe_capsules = exclude_contested(view.target_capsules(agent), me, &enemies, distance);
    out[Feature::DistanceToCapsule] = f64::from(
        nearest(next, me, &safe_capsules).map_or(sentinel, |(_, d)| d),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::board::Position;

    fn guard_at(x: i32, y: i32) -> AgentState {
        AgentState {
            position: Some(Position::new(x as f32, y as f32)),
            is_pacman: false,
            scared_timer: 0,
            num_carrying: 0,
            direction: Action::Stop,
        }
    }

    fn manhattan(a: Cell, b: Cell) -> u32 {
        a.manhattan(b)
    }

    #[test]
    fn exclusion_drops_targets_an_enemy_reaches_first() {
        let me = Cell::new(0, 0);
        let targets = vec![Cell::new(2, 0), Cell::new(6, 0), Cell::new(0, 5)];
        let enemies = [guard_at(7, 0)];
        let kept = exclude_contested(targets, me, &enemies, manhattan);
        assert_eq!(kept, vec![Cell::new(2, 0), Cell::new(0, 5)]);
    }

    #[test]
    fn exclusion_keeps_ties() {
        let me = Cell::new(0, 0);
        let enemies = [guard_at(4, 0)];
        let kept = exclude_contested(vec![Cell::new(2, 0)], me, &enemies, manhattan);
        assert_eq!(kept, vec![Cell::new(2, 0)]);
    }

    #[test]
    fn exclusion_ignores_scared_invading_and_hidden_enemies() {
        let me = Cell::new(0, 0);
        let target = Cell::new(5, 0);

        let scared = AgentState {
            scared_timer: 10,
            ..guard_at(6, 0)
        };
        let invading = AgentState {
            is_pacman: true,
            ..guard_at(6, 0)
        };
        let hidden = AgentState {
            position: None,
            ..guard_at(6, 0)
        };
        let kept = exclude_contested(vec![target], me, &[scared, invading, hidden], manhattan);
        assert_eq!(kept, vec![target]);
    }

    #[test]
    fn exclusion_property_holds_on_a_grid() {
        let me = Cell::new(1, 1);
        let enemy = guard_at(6, 3);
        let targets: Vec<Cell> = (0..8)
            .flat_map(|x| (0..5).map(move |y| Cell::new(x, y)))
            .collect();
        let kept = exclude_contested(targets.clone(), me, &[enemy], manhattan);
        for t in targets {
            let enemy_closer = Cell::new(6, 3).manhattan(t) < me.manhattan(t);
            assert_eq!(!kept.contains(&t), enemy_closer, "target {:?}", t);
        }
    }

    // Red agent 0 at (1,1) guards the left half; blue agent 1 invades at (4,2).
    const DEFENCE_ROWS: &[&str] = &[
        "%%%%%%%%%%",
        "%1       %",
        "%   2    %",
        "%   .  . %",
        "%%%%%%%%%%",
    ];

    #[test]
    fn defend_measures_the_single_invader() {
        let arena = Arena::from_rows(DEFENCE_ROWS).unwrap();
        let f = extract(&arena, 0, Action::Stop, TacticalState::Defend, DEFAULT_SENTINEL);
        assert_eq!(f[Feature::NumInvaders], 1.0);
        assert_eq!(f[Feature::InvaderDistance], 4.0);
        assert_eq!(f[Feature::OnDefense], 1.0);
        assert_eq!(f[Feature::Stop], 1.0);
        assert_eq!(f[Feature::IsPacman], 0.0);
        // Own food at (4,3) is nearest the invader; it is 5 steps from (1,1).
        assert_eq!(f[Feature::DefendFrontFood], -5.0);
    }

    #[test]
    fn defend_flags_reverse_and_movement() {
        let arena = Arena::from_rows(DEFENCE_ROWS).unwrap();
        let f = extract(&arena, 0, Action::East, TacticalState::Defend, DEFAULT_SENTINEL);
        assert_eq!(f[Feature::InvaderDistance], 3.0);
        assert_eq!(f[Feature::Stop], 0.0);

        let moved = arena.successor(0, Action::East);
        let back = extract(&moved, 0, Action::West, TacticalState::Defend, DEFAULT_SENTINEL);
        assert_eq!(back[Feature::Reverse], 1.0);
    }

    #[test]
    fn defend_without_invaders_tracks_nearest_opponent() {
        let rows = &[
            "%%%%%%%%%%",
            "%1       %",
            "%      2 %",
            "%   .  . %",
            "%%%%%%%%%%",
        ];
        let arena = Arena::from_rows(rows).unwrap();
        let f = extract(&arena, 0, Action::Stop, TacticalState::Defend, DEFAULT_SENTINEL);
        assert_eq!(f[Feature::NumInvaders], 0.0);
        assert_eq!(f[Feature::InvaderDistance], 7.0);
    }

    #[test]
    fn defend_with_nobody_visible_falls_back_to_food() {
        let rows = &[
            "%%%%%%%%%%",
            "%1       %",
            "%      2 %",
            "%   .  . %",
            "%%%%%%%%%%",
        ];
        let arena = Arena::from_rows(rows).unwrap().observe(0, Some(2));
        let f = extract(&arena, 0, Action::Stop, TacticalState::Defend, DEFAULT_SENTINEL);
        // Nearest own food (4,3) for the chase distance...
        assert_eq!(f[Feature::InvaderDistance], 5.0);
        // ...and nearest enemy food (7,3) for the front.
        assert_eq!(f[Feature::DefendFrontFood], -8.0);
    }

    #[test]
    fn defend_flags_crossing_into_enemy_territory() {
        let rows = &[
            "%%%%%%%%%%",
            "%   1    %",
            "%      2 %",
            "%   .  . %",
            "%%%%%%%%%%",
        ];
        let arena = Arena::from_rows(rows).unwrap();
        let f = extract(&arena, 0, Action::East, TacticalState::Defend, DEFAULT_SENTINEL);
        assert_eq!(f[Feature::IsPacman], 1.0);
        assert_eq!(f[Feature::OnDefense], 0.0);
    }

    #[test]
    fn attack_counts_food_and_distances() {
        let rows = &[
            "%%%%%%%%%%",
            "%1   . o %",
            "%        %",
            "%      .2%",
            "%%%%%%%%%%",
        ];
        let arena = Arena::from_rows(rows).unwrap();
        let f = extract(&arena, 0, Action::East, TacticalState::Attack, DEFAULT_SENTINEL);
        assert_eq!(f[Feature::SuccessorScore], -2.0);
        // From (2,1): food at (5,1) is 3 away and uncontested.
        assert_eq!(f[Feature::DistanceToFood], 3.0);
        // Capsule (7,1) is 5 from me but 3 from the defender at (8,3).
        assert_eq!(f[Feature::DistanceToCapsule], f64::from(DEFAULT_SENTINEL));
    }

    #[test]
    fn attack_with_everything_contested_is_in_danger() {
        let rows = &[
            "%%%%%%%%%%",
            "%1     2.%",
            "%       o%",
            "%%%%%%%%%%",
        ];
        let arena = Arena::from_rows(rows).unwrap();
        let f = extract(&arena, 0, Action::Stop, TacticalState::Attack, DEFAULT_SENTINEL);
        assert!(in_danger(&f, DEFAULT_SENTINEL));
    }

    #[test]
    fn retreat_heads_for_home_food() {
        let rows = &[
            "%%%%%%%%%%",
            "%.     1 %",
            "%      . %",
            "%2       %",
            "%%%%%%%%%%",
        ];
        let arena = Arena::from_rows(rows).unwrap();
        let f = extract(&arena, 0, Action::West, TacticalState::Retreat, DEFAULT_SENTINEL);
        assert_eq!(f[Feature::DistanceToFood], 5.0);
        assert_eq!(f[Feature::SuccessorScore], -1.0);
    }

    #[test]
    fn retreat_does_not_detour_for_enemy_food() {
        let rows = &[
            "%%%%%%%%%%",
            "%.    1. %",
            "%       2%",
            "%%%%%%%%%%",
        ];
        let arena = Arena::from_rows(rows).unwrap();
        let weights = crate::eval::default_weights(TacticalState::Retreat);

        let west = extract(&arena, 0, Action::West, TacticalState::Retreat, DEFAULT_SENTINEL);
        let east = extract(&arena, 0, Action::East, TacticalState::Retreat, DEFAULT_SENTINEL);
        // Eating (7,1) leaves the home food count unchanged.
        assert_eq!(west[Feature::SuccessorScore], -1.0);
        assert_eq!(east[Feature::SuccessorScore], -1.0);
        assert_eq!(west[Feature::DistanceToFood], 4.0);
        assert_eq!(east[Feature::DistanceToFood], 6.0);
        assert!(crate::eval::evaluate(&west, &weights) > crate::eval::evaluate(&east, &weights));
    }

    #[test]
    fn retreat_filters_capsules_against_their_own_list() {
        let rows = &[
            "%%%%%%%%%%",
            "%.    1  %",
            "%      2o%",
            "%%%%%%%%%%",
        ];
        let arena = Arena::from_rows(rows).unwrap();
        let f = extract(&arena, 0, Action::West, TacticalState::Retreat, DEFAULT_SENTINEL);
        // Home food (1,1) is 4 away and out of the defender's reach; the
        // capsule (8,2) is 4 away from me but 1 from the defender at (7,2).
        assert_eq!(f[Feature::DistanceToFood], 4.0);
        assert_eq!(f[Feature::DistanceToCapsule], f64::from(DEFAULT_SENTINEL));
        assert!(!in_danger(&f, DEFAULT_SENTINEL));
    }

    #[test]
    fn stop_at_rest_counts_as_reverse() {
        let arena = Arena::from_rows(DEFENCE_ROWS).unwrap();
        assert_eq!(arena.agent_state(0).direction, Action::Stop);
        let f = extract(&arena, 0, Action::Stop, TacticalState::Defend, DEFAULT_SENTINEL);
        assert_eq!(f[Feature::Stop], 1.0);
        assert_eq!(f[Feature::Reverse], 1.0);

        let moved = arena.successor(0, Action::East);
        let f = extract(&moved, 0, Action::Stop, TacticalState::Defend, DEFAULT_SENTINEL);
        assert_eq!(f[Feature::Stop], 1.0);
        assert_eq!(f[Feature::Reverse], 0.0);
    }

    #[test]
    fn start_extracts_nothing() {
        let arena = Arena::from_rows(DEFENCE_ROWS).unwrap();
        let f = extract(&arena, 0, Action::Stop, TacticalState::Start, DEFAULT_SENTINEL);
        assert_eq!(f, FeatureVector::default());
    }

    #[test]
    fn extracted_keys_stay_within_the_state_set() {
        let arena = Arena::from_rows(DEFENCE_ROWS).unwrap();
        for state in crate::tactics::ALL_TACTICAL_STATES {
            for action in arena.legal_actions(0) {
                let f = extract(&arena, 0, action, state, DEFAULT_SENTINEL);
                for (feature, _) in f.nonzero() {
                    assert!(Feature::produced_in(state).contains(&feature));
                }
            }
        }
    }

    #[test]
    fn half_steps_are_completed_before_measuring() {
        let arena = Arena::from_rows(DEFENCE_ROWS).unwrap().with_half_steps();
        let next = aligned_successor(&arena, 0, Action::East);
        let pos = next.agent_state(0).position.unwrap();
        assert_eq!(pos.aligned_cell(), Some(Cell::new(2, 1)));

        let f = extract(&arena, 0, Action::East, TacticalState::Defend, DEFAULT_SENTINEL);
        assert_eq!(f[Feature::InvaderDistance], 3.0);
    }
}
