//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration. Weight overrides are keyed by feature name per tactical
//! state, e.g. `{"weights": {"attack": {"distanceToCapsule": -2.0}}}`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::eval::{WeightOverrides, DEFAULT_SENTINEL};
use crate::tactics::Thresholds;

/// Errors that can occur while loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tuning knobs shared by every agent of a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EngineConfig {
    /// Limits of the tactical transition table.
    pub thresholds: Thresholds,
    /// Own-side food count at or below which ties go to the move nearest spawn.
    pub home_food_threshold: usize,
    /// Distance reported when no safe target exists.
    pub sentinel: u32,
    /// Random seed for tie-breaking (0 = use entropy).
    pub seed: u64,
    /// Per-state replacements for the built-in weights.
    pub weights: WeightOverrides,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            thresholds: Thresholds::default(),
            home_food_threshold: 4,
            sentinel: DEFAULT_SENTINEL,
            seed: 0,
            weights: WeightOverrides::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }
}
