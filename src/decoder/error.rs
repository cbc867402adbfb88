//! Decoder error types

use crate::decoder::types::DecoderFailure;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecoderError {
    /// Permission denied, no matching device, or acquisition failed
    #[error("Camera unavailable ({reason}): {detail}")]
    CameraUnavailable {
        reason: DecoderFailure,
        detail: String,
    },

    /// The adapter already has a live attachment
    #[error("Decoder '{adapter}' is already active")]
    AlreadyActive { adapter: String },
}

impl DecoderError {
    pub fn unavailable(reason: DecoderFailure, detail: impl Into<String>) -> Self {
        DecoderError::CameraUnavailable {
            reason,
            detail: detail.into(),
        }
    }

    /// Failure reason to report upward
    pub fn reason(&self) -> DecoderFailure {
        match self {
            DecoderError::CameraUnavailable { reason, .. } => *reason,
            DecoderError::AlreadyActive { .. } => DecoderFailure::Unknown,
        }
    }
}

impl crate::core::error_handling::ContextualError for DecoderError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            DecoderError::CameraUnavailable {
                reason: DecoderFailure::Denied | DecoderFailure::NoDevice,
                ..
            }
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            DecoderError::CameraUnavailable {
                reason: DecoderFailure::Denied,
                ..
            } => Some("Camera access denied. Check the scanner device permissions."),
            DecoderError::CameraUnavailable {
                reason: DecoderFailure::NoDevice,
                ..
            } => Some("No scanner device available."),
            _ => None,
        }
    }
}

pub type DecoderResult<T> = Result<T, DecoderError>;
