//! Session error types

use crate::decoder::api::{DecoderError, DecoderFailure};
use crate::session::types::SessionState;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The camera could not be acquired; the controller is back to `Idle`
    #[error("Camera unavailable ({reason}): {detail}")]
    CameraUnavailable {
        reason: DecoderFailure,
        detail: String,
    },

    /// A transition that would move a session backwards
    #[error("Invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },

    /// The task driving the controller has ended
    #[error("Scan session driver is no longer running")]
    DriverClosed,
}

impl From<DecoderError> for SessionError {
    fn from(error: DecoderError) -> Self {
        SessionError::CameraUnavailable {
            reason: error.reason(),
            detail: error.to_string(),
        }
    }
}

impl crate::core::error_handling::ContextualError for SessionError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, SessionError::CameraUnavailable { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            SessionError::CameraUnavailable { reason, .. } => {
                Some(crate::session::controller::unavailable_message(*reason))
            }
            _ => None,
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
