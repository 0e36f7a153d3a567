//! Action evaluation.
//!
//! Scores a hypothetical move by extracting a small vector of named
//! features from its successor snapshot and taking the inner product with a
//! weight table chosen by the unit's tactical state.

pub mod feature;
pub mod features;
pub mod linear;
pub mod weights;

pub use feature::{Feature, FeatureMap, FeatureVector, WeightTable, ALL_FEATURES, FEATURE_COUNT};
pub use features::{aligned_successor, exclude_contested, extract, in_danger, DEFAULT_SENTINEL};
pub use linear::evaluate;
pub use weights::{default_weights, WeightBook, WeightOverrides};
