//! Per-state weight tables.
//!
//! Weights depend only on the tactical state. The defaults below can be
//! overridden entry by entry from configuration; overrides are keyed by the
//! closed `Feature` enum, so an unknown name is rejected when the
//! configuration is parsed rather than silently ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::feature::{Feature, WeightTable};
use crate::tactics::TacticalState;

/// Built-in weights for `state`.
pub fn default_weights(state: TacticalState) -> WeightTable {
    match state {
        TacticalState::Start => WeightTable::default(),
        TacticalState::Defend => WeightTable::from_pairs(&[
            (Feature::NumInvaders, -1000.0),
            (Feature::OnDefense, 100.0),
            (Feature::InvaderDistance, -10.0),
            (Feature::Stop, -100.0),
            (Feature::Reverse, -2.0),
            (Feature::DefendFrontFood, 1000.0),
            (Feature::IsPacman, -100000.0),
        ]),
        TacticalState::Attack => WeightTable::from_pairs(&[
            (Feature::SuccessorScore, 100.0),
            (Feature::DistanceToFood, -1.0),
            (Feature::DistanceToCapsule, -1.2),
        ]),
        TacticalState::Retreat => WeightTable::from_pairs(&[
            (Feature::SuccessorScore, 100.0),
            (Feature::DistanceToFood, -1.0),
            (Feature::DistanceToCapsule, -1.0),
        ]),
    }
}

/// Entry-wise replacements for the built-in tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeightOverrides {
    pub attack: BTreeMap<Feature, f64>,
    pub defend: BTreeMap<Feature, f64>,
    pub retreat: BTreeMap<Feature, f64>,
}

impl WeightOverrides {
    fn for_state(&self, state: TacticalState) -> Option<&BTreeMap<Feature, f64>> {
        match state {
            TacticalState::Start => None,
            TacticalState::Attack => Some(&self.attack),
            TacticalState::Defend => Some(&self.defend),
            TacticalState::Retreat => Some(&self.retreat),
        }
    }
}

/// The resolved weight tables of one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightBook {
    start: WeightTable,
    attack: WeightTable,
    defend: WeightTable,
    retreat: WeightTable,
}

impl WeightBook {
    /// Applies `overrides` on top of the built-in tables.
    pub fn new(overrides: &WeightOverrides) -> Self {
        let resolve = |state: TacticalState| {
            let mut table = default_weights(state);
            if let Some(entries) = overrides.for_state(state) {
                for (&feature, &weight) in entries {
                    table[feature] = weight;
                }
            }
            table
        };
        WeightBook {
            start: resolve(TacticalState::Start),
            attack: resolve(TacticalState::Attack),
            defend: resolve(TacticalState::Defend),
            retreat: resolve(TacticalState::Retreat),
        }
    }

    /// Returns the table for `state`.
    pub fn for_state(&self, state: TacticalState) -> &WeightTable {
        match state {
            TacticalState::Start => &self.start,
            TacticalState::Attack => &self.attack,
            TacticalState::Defend => &self.defend,
            TacticalState::Retreat => &self.retreat,
        }
    }
}

impl Default for WeightBook {
    fn default() -> Self {
        WeightBook::new(&WeightOverrides::default())
    }
}
