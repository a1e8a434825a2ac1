//! Error types for the dialog orchestrator

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, DialogError>;

#[derive(Error, Debug)]
pub enum DialogError {

    // =============================
    // Oracle / Classification
    // =============================

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Oracle not configured: {0}")]
    OracleUnavailable(String),

    // =============================
    // Capability Providers
    // =============================

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid action input: {0}")]
    InvalidActionInput(String),

    #[error(transparent)]
    UnknownAction(#[from] crate::registry::UnknownAction),

    #[error("Operation not supported by {action}: {operation}")]
    UnsupportedOperation {
        action: String,
        operation: &'static str,
    },

    /// The provider declined the request for a reason the user can act on.
    #[error("{0}")]
    Rejected(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DialogError {
    pub fn unsupported(action: &str, operation: &'static str) -> Self {
        DialogError::UnsupportedOperation {
            action: action.to_string(),
            operation,
        }
    }
}
