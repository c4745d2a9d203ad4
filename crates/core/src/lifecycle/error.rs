//! Lifecycle error types.

use thiserror::Error;
use uuid::Uuid;

use crate::lifecycle::types::AuditStatus;

/// Errors that can occur during audit lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// Audit does not exist.
    #[error("Audit {0} not found")]
    NotFound(Uuid),

    /// Requested status is not a known status token.
    #[error("Invalid audit status: {0}")]
    InvalidState(String),

    /// Attempted a transition outside the lifecycle graph.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: AuditStatus,
        /// The attempted target status.
        to: AuditStatus,
    },

    /// The store failed to read or commit.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl LifecycleError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidState(_) | Self::InvalidTransition { .. } => 400,
            Self::NotFound(_) => 404,
            Self::Persistence(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "AUDIT_NOT_FOUND",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}
