//! # AppError
//!
//! Centralized error handling for the marketplace workflow.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all rm-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Order, Dispute, Conversation)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty line items, rating out of range)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// No valid session — the caller must log in.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated but not entitled (wrong owner, not a participant).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// An invariant blocked the action (active dispute, duplicate review,
    /// illegal status transition). The message names the invariant.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A precondition on record state failed (e.g., review before delivery).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Infrastructure failure (e.g., DB down, store timeout)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// A specialized Result type for marketplace workflow logic.
pub type Result<T> = std::result::Result<T, AppError>;
