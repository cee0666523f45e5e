//! Domain error types.

use thiserror::Error;

/// Errors raised by domain-level validation and state transitions.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unknown status literal: {0}")]
    UnknownStatus(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }
}
