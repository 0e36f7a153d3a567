//! Feature identifiers and fixed-size feature maps.
//!
//! Both extracted feature vectors and weight tables are `FeatureMap`s: a
//! dense array indexed by `Feature as usize`, so a missing entry is simply
//! zero and there is no way to spell a feature name the other side does not
//! know about.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::tactics::TacticalState;

/// The number of distinct features.
pub const FEATURE_COUNT: usize = 10;

/// A named scalar signal measured on a successor snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum Feature {
    OnDefense = 0,
    NumInvaders = 1,
    InvaderDistance = 2,
    Stop = 3,
    Reverse = 4,
    DefendFrontFood = 5,
    IsPacman = 6,
    SuccessorScore = 7,
    DistanceToFood = 8,
    DistanceToCapsule = 9,
}

/// All features in discriminant order.
pub const ALL_FEATURES: [Feature; FEATURE_COUNT] = [
    Feature::OnDefense,
    Feature::NumInvaders,
    Feature::InvaderDistance,
    Feature::Stop,
    Feature::Reverse,
    Feature::DefendFrontFood,
    Feature::IsPacman,
    Feature::SuccessorScore,
    Feature::DistanceToFood,
    Feature::DistanceToCapsule,
];

const DEFEND_FEATURES: &[Feature] = &[
    Feature::OnDefense,
    Feature::NumInvaders,
    Feature::InvaderDistance,
    Feature::Stop,
    Feature::Reverse,
    Feature::DefendFrontFood,
    Feature::IsPacman,
];

const FORAGE_FEATURES: &[Feature] = &[
    Feature::SuccessorScore,
    Feature::DistanceToFood,
    Feature::DistanceToCapsule,
];

impl Feature {
    /// Returns the camelCase name used in configuration files and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Feature::OnDefense => "onDefense",
            Feature::NumInvaders => "numInvaders",
            Feature::InvaderDistance => "invaderDistance",
            Feature::Stop => "stop",
            Feature::Reverse => "reverse",
            Feature::DefendFrontFood => "defendFrontFood",
            Feature::IsPacman => "isPacman",
            Feature::SuccessorScore => "successorScore",
            Feature::DistanceToFood => "distanceToFood",
            Feature::DistanceToCapsule => "distanceToCapsule",
        }
    }

    /// Features the extractor may emit while in `state`.
    pub const fn produced_in(state: TacticalState) -> &'static [Feature] {
        match state {
            TacticalState::Start => &[],
            TacticalState::Defend => DEFEND_FEATURES,
            TacticalState::Attack | TacticalState::Retreat => FORAGE_FEATURES,
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A total map from `Feature` to a real value. Unset entries are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureMap {
    values: [f64; FEATURE_COUNT],
}

/// Values extracted for one (state, action) pair.
pub type FeatureVector = FeatureMap;

/// Coefficients applied to a `FeatureVector`.
pub type WeightTable = FeatureMap;

impl FeatureMap {
    /// Builds a map from `(feature, value)` pairs. Later pairs win.
    pub fn from_pairs(pairs: &[(Feature, f64)]) -> Self {
        let mut map = FeatureMap::default();
        for &(feature, value) in pairs {
            map[feature] = value;
        }
        map
    }

    /// Iterates over every feature with its value, zeros included.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        ALL_FEATURES.iter().map(move |&f| (f, self.values[f as usize]))
    }

    /// Iterates over features with a non-zero value.
    pub fn nonzero(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        self.iter().filter(|&(_, v)| v != 0.0)
    }
}

impl Index<Feature> for FeatureMap {
    type Output = f64;

    fn index(&self, feature: Feature) -> &f64 {
        &self.values[feature as usize]
    }
}

impl IndexMut<Feature> for FeatureMap {
    fn index_mut(&mut self, feature: Feature) -> &mut f64 {
        &mut self.values[feature as usize]
    }
}

impl std::fmt::Display for FeatureMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (feature, value)) in self.nonzero().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", feature, value)?;
        }
        f.write_str("}")
    }
}
