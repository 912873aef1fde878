//! Error types for the enrollment assistant.
//!
//! The enrollment state machine itself never errors: input it cannot use is
//! answered with a reprompt. These types cover the layers around it.

use uuid::Uuid;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Session lookup errors, rendered by the HTTP layer as 400 or 404.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session {id} not found")]
    NotFound { id: Uuid },

    #[error("Invalid session id: {0}")]
    InvalidId(String),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
