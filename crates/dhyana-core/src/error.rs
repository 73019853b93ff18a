//! Core error types for dhyana-core.
//!
//! Control operations reject calls made in a state that forbids them
//! instead of silently corrupting session progress; everything else
//! funnels into [`SessionError`] via `#[from]`.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for dhyana-core.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A control call was made in a state that forbids it.
    /// The session state is left unchanged.
    #[error("Invalid operation: cannot {op}: {reason}")]
    InvalidOperation {
        op: &'static str,
        reason: &'static str,
    },

    /// Phase sequence validation errors
    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Phase sequence validation errors.
#[derive(Error, Debug)]
pub enum SequenceError {
    /// A session needs at least one phase to run
    #[error("Phase sequence must contain at least one phase")]
    Empty,

    /// Phase durations are counted in whole seconds
    #[error("Phase '{name}' at index {index} must last at least one second")]
    ZeroDuration { index: usize, name: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read configuration from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Voice-output errors. The session controller never propagates these;
/// they are logged by the runtime and the timer keeps going.
#[derive(Error, Debug)]
pub enum AnnounceError {
    /// Stopping the current utterance failed
    #[error("Failed to interrupt current utterance: {0}")]
    Interrupt(String),

    /// Beginning a new utterance failed
    #[error("Failed to speak: {0}")]
    Speak(String),
}

/// Result type alias for SessionError
pub type Result<T, E = SessionError> = std::result::Result<T, E>;
