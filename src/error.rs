//! Error types for CoralKV
//!
//! Provides a unified error type for all codec operations.
//!
//! Protocol-integrity errors (opaque mismatch, truncated bodies, unknown
//! wire formats) are fatal to the connection that produced them: the owning
//! endpoint is expected to tear the connection down and cancel everything
//! still in flight. Server-reported statuses are *not* errors; they travel
//! inside typed responses.

use thiserror::Error;

/// Result type alias using CoralError
pub type Result<T> = std::result::Result<T, CoralError>;

/// Unified error type for CoralKV codec operations
#[derive(Debug, Error)]
pub enum CoralError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol-Integrity Errors (fatal to the connection)
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Opaque mismatch: expected {expected}, response carried {actual}")]
    OpaqueMismatch { expected: u32, actual: u32 },

    #[error("Response arrived with opaque {0} but nothing is in flight")]
    NoRequestInFlight(u32),

    // -------------------------------------------------------------------------
    // Encoding Errors
    // -------------------------------------------------------------------------
    #[error("Encode error: {0}")]
    Encode(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoralError {
    /// Whether this error must tear down the connection it occurred on
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CoralError::Protocol(_)
                | CoralError::OpaqueMismatch { .. }
                | CoralError::NoRequestInFlight(_)
        )
    }
}
