//! Verification data types

use serde::Serialize;
use std::time::Duration;
use strum_macros::Display;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/ticket-verify";
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of one verification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// Request in flight; never produced by a completed verification
    Pending,
    /// Server asserted both `status` and `ticket.is_verify`
    Confirmed,
    /// Any other well-formed answer
    Rejected,
    /// Network failure, timeout or malformed answer
    TransportError,
}

/// Outcome plus what should be shown next to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub outcome: VerificationOutcome,
    /// `message` field of the server response, verbatim
    pub message: Option<String>,
    /// Transport diagnostic, only for `TransportError`
    pub diagnostic: Option<String>,
}

impl VerificationReport {
    pub fn confirmed(message: Option<String>) -> Self {
        Self {
            outcome: VerificationOutcome::Confirmed,
            message,
            diagnostic: None,
        }
    }

    pub fn rejected(message: Option<String>) -> Self {
        Self {
            outcome: VerificationOutcome::Rejected,
            message,
            diagnostic: None,
        }
    }

    pub fn transport_error(diagnostic: impl Into<String>) -> Self {
        Self {
            outcome: VerificationOutcome::TransportError,
            message: None,
            diagnostic: Some(diagnostic.into()),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.outcome == VerificationOutcome::Confirmed
    }

    /// Text for the operator: server message first, then the diagnostic
    pub fn display_message(&self) -> Option<String> {
        match (&self.message, &self.diagnostic) {
            (Some(message), _) => Some(message.clone()),
            (None, Some(diagnostic)) => Some(format!("Verification failed: {}", diagnostic)),
            (None, None) => None,
        }
    }
}

/// Where and how long to verify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_VERIFY_TIMEOUT,
        }
    }
}
