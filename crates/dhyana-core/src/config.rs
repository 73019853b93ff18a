//! TOML-based session configuration.
//!
//! The phase list is fixed for the lifetime of a session; this module
//! only covers loading it once at startup. With no file present the
//! default guided meditation sequence applies.
//!
//! ```toml
//! completion_message = "Meditation session completed. Namaste."
//!
//! [[phases]]
//! name = "Preparation"
//! duration_secs = 60
//! start_message = "Preparation started"
//! end_message = "Preparation ended"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SequenceError};
use crate::session::phase::{default_phases, PhaseDefinition, DEFAULT_COMPLETION_MESSAGE};
use crate::session::PhaseSequence;

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_completion_message")]
    pub completion_message: String,
    #[serde(default = "default_phases")]
    pub phases: Vec<PhaseDefinition>,
}

fn default_completion_message() -> String {
    DEFAULT_COMPLETION_MESSAGE.to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            completion_message: default_completion_message(),
            phases: default_phases(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Validate into the immutable sequence the controller runs.
    pub fn into_sequence(self) -> Result<PhaseSequence, SequenceError> {
        PhaseSequence::new(self.phases, self.completion_message)
    }
}
