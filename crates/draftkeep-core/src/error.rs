//! Error types for draftkeep-core

use thiserror::Error;

/// Result type alias using draftkeep-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while managing drafts
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the host document or persistence medium
    #[error(transparent)]
    Host(#[from] draftkeep_host::Error),

    /// Stored drafts could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Conversation pattern failed to compile
    #[error("Invalid conversation pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Config file could not be parsed
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Config is readable but unusable
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Filesystem error while handling config
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error means the persistence context went away
    pub fn is_context_invalidated(&self) -> bool {
        match self {
            Error::Host(e) => e.is_context_invalidated(),
            _ => false,
        }
    }
}
