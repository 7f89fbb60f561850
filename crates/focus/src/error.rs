//! Focus NFe client error types.

use fiscoerp_core::DomainError;

/// Errors from Focus NFe calls.
#[derive(Debug, thiserror::Error)]
pub enum FocusError {
    /// Rejected locally before any request was sent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Provider answered with a non-2xx status.
    #[error("Focus NFe {endpoint} returned {status}: {message}")]
    Provider {
        endpoint: String,
        status: u16,
        /// Provider error code (`codigo`), when given.
        code: Option<String>,
        message: String,
    },

    /// No response: timeout, DNS, connection reset.
    #[error("HTTP error calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },

    /// 2xx response whose body could not be read as a status record.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl FocusError {
    pub fn is_transport(&self) -> bool {
        matches!(self, FocusError::Transport { .. })
    }

    /// The request may or may not have been processed by the provider.
    pub fn is_unknown_outcome(&self) -> bool {
        matches!(self, FocusError::Transport { .. } | FocusError::Decode { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FocusError::Provider { status: 404, .. })
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            FocusError::Provider { status, .. } => Some(*status),
            FocusError::Transport { source, .. } | FocusError::Decode { source, .. } => {
                source.status().map(|s| s.as_u16())
            }
            _ => None,
        }
    }
}

impl From<DomainError> for FocusError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => FocusError::Validation(msg),
            other => FocusError::Validation(other.to_string()),
        }
    }
}
