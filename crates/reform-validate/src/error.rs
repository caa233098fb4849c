//! Error types for the rule pipeline.

use std::any::Any;
use thiserror::Error;

/// Error message produced by a failed rule or a validation step.
pub type ErrorMessage = String;

/// Failure raised while running a validation function.
///
/// A validation function that fails is not a validation *outcome*: the
/// pipeline catches it and turns [`ValidatorError::message`] into an error
/// entry so sibling rules keep running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorError {
    /// The validation function returned an error.
    #[error("{0}")]
    Failed(String),

    /// The validation function panicked.
    #[error("validator panicked: {0}")]
    Panicked(String),
}

impl ValidatorError {
    /// Create a failure from any displayable error.
    pub fn failed(err: impl std::fmt::Display) -> Self {
        Self::Failed(err.to_string())
    }

    /// Build a failure from a caught panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::Panicked(message)
    }

    /// The message recorded as the error entry.
    pub fn message(&self) -> ErrorMessage {
        self.to_string()
    }
}

pub type Result<T, E = ValidatorError> = std::result::Result<T, E>;
