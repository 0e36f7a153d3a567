//! Linear scoring of feature vectors.

use super::feature::{FeatureVector, WeightTable, ALL_FEATURES};

/// Inner product of `features` and `weights`.
///
/// A feature contributes only when both sides carry a non-zero entry for it.
#[inline]
pub fn evaluate(features: &FeatureVector, weights: &WeightTable) -> f64 {
    ALL_FEATURES
        .iter()
        .map(|&f| features[f] * weights[f])
        .sum()
}
