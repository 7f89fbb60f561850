//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic failures raised before any IO happens.
///
/// Provider and transport failures are not domain errors; they live in the
/// client (`FocusError`) and service (`EmissionError`) layers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Pre-flight check failed (missing emitter field, total mismatch, short
    /// justification). Nothing is sent to the provider.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested transition is not legal from the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
