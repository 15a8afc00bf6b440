//! crates/dream_path_core/src/error.rs
//!
//! The user-facing error taxonomy of the generation pipeline.

use crate::decode::DecodeError;
use crate::ports::PortError;

/// Every failure a submission can end in. Each variant renders as a single
/// human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// The request was rejected before anything was dispatched.
    #[error("{0}")]
    Validation(String),

    /// The provider credential is missing or still the placeholder value.
    #[error("{0}")]
    Configuration(String),

    #[error("Provider API error: {status} - {body}")]
    Provider { status: u16, body: String },

    #[error("Could not reach the provider: {0}")]
    Transport(String),

    #[error("Failed to parse AI response ({reason}). Please try again.")]
    Decode { reason: String, raw: String },

    #[error("Storage backend error: {0}")]
    Backend(String),

    /// A newer submission was dispatched while this one was in flight.
    #[error("Request {sequence} was superseded by a newer request")]
    Superseded { sequence: u64 },
}

impl GenerationError {
    pub fn empty_content() -> Self {
        Self::Validation("Please provide some lesson content.".to_string())
    }
}

impl From<PortError> for GenerationError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::Configuration(message) => Self::Configuration(message),
            PortError::Provider { status, body } => Self::Provider { status, body },
            PortError::Transport(message) => Self::Transport(message),
            other => Self::Backend(other.to_string()),
        }
    }
}

impl From<DecodeError> for GenerationError {
    fn from(error: DecodeError) -> Self {
        Self::Decode {
            reason: error.reason,
            raw: error.raw,
        }
    }
}
