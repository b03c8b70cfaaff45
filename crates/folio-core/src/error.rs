//! # AppError
//!
//! Centralized error handling for Folio.
//! Every failure is scoped to one user-initiated operation; nothing here is
//! fatal to the process.

use thiserror::Error;

/// Failure reported by a `MediaHost` upload or delete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// Network failure, timeout, aborted transfer or a 5xx from the host.
    /// Eligible for a single retry.
    #[error("transient media failure: {0}")]
    Transient(String),

    /// The host refused the file (4xx, unsupported type, bad preset).
    #[error("media rejected: {0}")]
    Rejected(String),
}

impl MediaError {
    pub fn is_transient(&self) -> bool {
        matches!(self, MediaError::Transient(_))
    }
}

/// The primary error type for all folio-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Thought, Comment)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., blank title, empty post, comment too long)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Missing or invalid admin credential
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Media upload failed; the whole save was aborted
    #[error("upload failed: {0}")]
    Upload(#[from] MediaError),

    /// Document store read/write failure
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Email-send API failure
    #[error("mail delivery failed: {0}")]
    Mail(String),

    /// Misconfiguration or any other unexpected failure
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(kind: &str, id: &str) -> Self {
        AppError::NotFound(kind.to_string(), id.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }
}

/// A specialized Result type for Folio logic.
pub type Result<T> = std::result::Result<T, AppError>;
