//! Error types for the voice assistant

use thiserror::Error;

/// Result type alias for voice assistant operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the relay or the voice client
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Generative-language provider error (bad status, blocked or malformed output)
    #[error("provider error: {0}")]
    Provider(String),

    /// Relay returned a non-success response or an unusable body
    #[error("relay error: {0}")]
    Relay(String),

    /// Speech recognition or synthesis capability error
    #[error("speech error: {0}")]
    Speech(String),

    /// Client action not permitted in the current state
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: crate::voice::ClientState,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
