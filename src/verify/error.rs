//! Verification error types
//!
//! These stay inside the client; callers only see them as the diagnostic
//! text of a transport-error outcome, or when building the client.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("Invalid verification endpoint '{endpoint}'")]
    InvalidEndpoint { endpoint: String },

    #[error("Failed to create HTTP client: {reason}")]
    ClientBuild { reason: String },

    #[error("Network request failed: {reason}")]
    Transport { reason: String },

    #[error("Verification timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("HTTP {status} - {reason}")]
    HttpStatus { status: u16, reason: String },

    #[error("Malformed verification response: {reason}")]
    MalformedResponse { reason: String },
}

impl crate::core::error_handling::ContextualError for VerifyError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, VerifyError::InvalidEndpoint { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            VerifyError::InvalidEndpoint { .. } => {
                Some("The verification endpoint must be an http:// or https:// URL")
            }
            _ => None,
        }
    }
}

pub type VerifyResult<T> = Result<T, VerifyError>;
