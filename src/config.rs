//! Editor configuration
//! Defaults used when the controller creates entities on its own

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fsm::{Dimensions, Point};
use crate::history::HistoryConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("history_max_depth must be at least 1")]
    ZeroHistoryDepth,
}

/// Editor defaults (engine parameters)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo capacity
    pub history_max_depth: usize,
    pub state_dimensions: Dimensions,
    pub initial_state_dimensions: Dimensions,
    pub final_state_dimensions: Dimensions,
    pub choice_state_dimensions: Dimensions,
    pub note_dimensions: Dimensions,
    /// Where an auto-created initial state sits relative to its target
    pub initial_state_offset: Point,
    pub transition_color: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_max_depth: 100,
            state_dimensions: Dimensions::new(450.0, 100.0),
            initial_state_dimensions: Dimensions::new(50.0, 50.0),
            final_state_dimensions: Dimensions::new(50.0, 50.0),
            choice_state_dimensions: Dimensions::new(50.0, 50.0),
            note_dimensions: Dimensions::new(200.0, 40.0),
            initial_state_offset: Point::new(-100.0, 0.0),
            transition_color: "#0000FF".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(source)?;
        if config.history_max_depth == 0 {
            return Err(ConfigError::ZeroHistoryDepth);
        }
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }

    pub fn history(&self) -> HistoryConfig {
        HistoryConfig {
            max_depth: self.history_max_depth,
        }
    }
}
