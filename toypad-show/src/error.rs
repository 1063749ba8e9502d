//! Error types for show playback

use std::io;

/// Failure reported by a [`PadActuator`](crate::PadActuator)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Pad actuator failed: {message}")]
pub struct ActuatorError {
    message: String,
}

impl ActuatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors that can occur while driving a show
#[derive(Debug, thiserror::Error)]
pub enum ShowError {
    /// Caller-level contract violation; engine state is unchanged
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Should be unreachable; indicates an engine bug
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Actuator(#[from] ActuatorError),

    #[error("Failed to spawn pad loop thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("Failed to read config file: {0}")]
    ConfigRead(#[source] io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
