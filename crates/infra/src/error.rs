//! Errors surfaced to the UI layer by `EmissionService`.

use thiserror::Error;

use fiscoerp_core::DomainError;
use fiscoerp_fiscal::ReferenceId;

use crate::registry::RegistryError;
use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum EmissionError {
    /// Local pre-flight check failed; nothing was sent to the provider.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Transition not allowed from the record's current state (or another
    /// operation on the same reference is running). No network call made.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Provider (or SEFAZ) rejected the request. The record is in `erro`
    /// (or still `emitida` for a refused cancellation).
    #[error("emission {reference} rejected by provider: {message}")]
    Provider {
        reference: ReferenceId,
        /// HTTP status when the rejection came as a non-2xx answer.
        status: Option<u16>,
        message: String,
    },

    /// Provider unreachable. The document may already exist on the provider.
    #[error(
        "emission {reference}: provider unreachable ({message}). Unknown state, verify with reconcile before reissuing"
    )]
    Transport {
        reference: ReferenceId,
        message: String,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl EmissionError {
    /// Reference id the failure belongs to, for retry/reconcile in the UI.
    pub fn reference(&self) -> Option<ReferenceId> {
        match self {
            EmissionError::Provider { reference, .. }
            | EmissionError::Transport { reference, .. } => Some(*reference),
            _ => None,
        }
    }
}

impl From<DomainError> for EmissionError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                EmissionError::Validation(msg)
            }
            DomainError::InvalidState(msg) => EmissionError::InvalidState(msg),
        }
    }
}
