//! Error types for todokv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using TodoError
pub type Result<T> = std::result::Result<T, TodoError>;

/// Unified error type for todokv operations
#[derive(Debug, Error)]
pub enum TodoError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    #[error("Log corruption detected: {0}")]
    LogCorruption(String),

    #[error("Log write failed: {0}")]
    LogWrite(String),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Item {0} not found")]
    NotFound(u64),

    #[error("{0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Malformed payload: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TodoError {
    /// True for errors caused by the caller's input rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TodoError::NotFound(_) | TodoError::Validation(_) | TodoError::Decode(_)
        )
    }
}
