//! Error types for the intent and insight engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {

    // =============================
    // Engine Errors
    // =============================

    /// Caller supplied an empty message or malformed transaction records.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The completion provider failed (transport, status, or payload).
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider selection or remote endpoint settings are unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// True for errors raised by the provider boundary
    pub fn is_provider(&self) -> bool {
        matches!(self, EngineError::Provider(_))
    }
}
