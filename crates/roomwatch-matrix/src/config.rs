use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::ConfigError;
use crate::notify::DEFAULT_MAX_MESSAGE_AGE_MS;
use crate::state::DEFAULT_HISTORY_CAPACITY;

/// Per-room settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Messages at least this old (ms) are not delivered to message
    /// observers. 0 delivers every message.
    #[serde(default = "default_max_message_age_ms")]
    pub max_message_age_ms: u64,

    /// Pre-allocated size of the message history
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_message_age_ms: default_max_message_age_ms(),
            history_capacity: default_history_capacity(),
        }
    }
}

fn default_max_message_age_ms() -> u64 {
    DEFAULT_MAX_MESSAGE_AGE_MS
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl RoomConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading room config from {}", path.display());

        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
