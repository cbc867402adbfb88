//! Session data types

use crate::decoder::api::{DecoderEvent, DecoderFailure, ScanOptions, ScanTarget, SessionToken};
use crate::session::error::{SessionError, SessionResult};
use crate::session::guard::Admission;
use crate::verify::api::{VerificationOutcome, VerificationReport, DEFAULT_VERIFY_TIMEOUT};
use serde::Serialize;
use std::time::Duration;
use strum_macros::Display;
use tokio::task::AbortHandle;
use tokio::time::Instant;

pub const DEFAULT_CAMERA_TIMEOUT: Duration = Duration::from_secs(15);

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Scanning,
    Verifying,
    Confirmed,
    Rejected,
    /// The decoder failed while scanning
    Failed,
}

impl SessionState {
    fn rank(self) -> u8 {
        match self {
            SessionState::Idle => 0,
            SessionState::Scanning => 1,
            SessionState::Verifying => 2,
            SessionState::Confirmed | SessionState::Rejected | SessionState::Failed => 3,
        }
    }

    /// Scanning or verifying: `start` is a no-op
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Scanning | SessionState::Verifying)
    }

    pub fn is_terminal(self) -> bool {
        self.rank() == 3
    }
}

/// Outcome shown to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VerifyStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl From<VerificationOutcome> for VerifyStatus {
    fn from(outcome: VerificationOutcome) -> Self {
        match outcome {
            VerificationOutcome::Pending => VerifyStatus::Pending,
            VerificationOutcome::Confirmed => VerifyStatus::Confirmed,
            VerificationOutcome::Rejected | VerificationOutcome::TransportError => {
                VerifyStatus::Rejected
            }
        }
    }
}

/// Everything a presentation layer needs to render the controller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStatus {
    /// Latest session started, if any
    pub session: Option<SessionToken>,
    pub state: SessionState,
    pub is_scanning: bool,
    pub verify_status: Option<VerifyStatus>,
    /// Text admitted for verification in this session
    pub scanned: Option<String>,
    /// Server message or diagnostic for the operator
    pub message: Option<String>,
}

impl ScanStatus {
    /// Neither scanning nor waiting for a verification
    pub fn is_settled(&self) -> bool {
        !self.state.is_active()
    }
}

/// Controller settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub target: ScanTarget,
    pub options: ScanOptions,
    /// Bound on camera acquisition in `start`
    pub camera_timeout: Duration,
    /// Bound on one verification round trip
    pub verify_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target: ScanTarget::Headless,
            options: ScanOptions::default(),
            camera_timeout: DEFAULT_CAMERA_TIMEOUT,
            verify_timeout: DEFAULT_VERIFY_TIMEOUT,
        }
    }
}

/// One start-to-outcome attempt
#[derive(Debug)]
pub struct Session {
    token: SessionToken,
    state: SessionState,
    raw_payload: Option<String>,
    outcome: Option<VerificationOutcome>,
    started_at: Instant,
    verification: Option<AbortHandle>,
}

impl Session {
    pub fn new(token: SessionToken) -> Self {
        Self {
            token,
            state: SessionState::Idle,
            raw_payload: None,
            outcome: None,
            started_at: Instant::now(),
            verification: None,
        }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn raw_payload(&self) -> Option<&str> {
        self.raw_payload.as_deref()
    }

    /// Outcome reported by the verifier, including `TransportError`
    pub fn outcome(&self) -> Option<VerificationOutcome> {
        self.outcome
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Move forward. States never repeat or go back within a session.
    pub fn advance(&mut self, next: SessionState) -> SessionResult<()> {
        if next.rank() <= self.state.rank() {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    pub(crate) fn record_payload(&mut self, text: String) {
        self.raw_payload = Some(text);
    }

    pub(crate) fn record_outcome(&mut self, outcome: VerificationOutcome) {
        self.outcome = Some(outcome);
    }

    pub(crate) fn attach_verification(&mut self, handle: AbortHandle) {
        self.verification = Some(handle);
    }

    pub(crate) fn take_verification(&mut self) -> Option<AbortHandle> {
        self.verification.take()
    }
}

/// Result of a verification task, tagged with its session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCompletion {
    pub token: SessionToken,
    pub report: VerificationReport,
}

/// Anything the controller reacts to besides direct calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    Decoder(DecoderEvent),
    Verified(VerificationCompletion),
}

/// Why an event had no effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// A later decode for a session that already admitted one
    AlreadyAdmitted,
    /// The event belongs to a session that was stopped or superseded
    StaleSession,
    NoSession,
    EmptyPayload,
    /// The session is not in the state the event applies to
    WrongState(SessionState),
}

impl From<Admission> for DiscardReason {
    fn from(admission: Admission) -> Self {
        match admission {
            Admission::AlreadyAdmitted => DiscardReason::AlreadyAdmitted,
            Admission::StaleSession => DiscardReason::StaleSession,
            Admission::NoSession | Admission::Admitted => DiscardReason::NoSession,
        }
    }
}

/// What handling one event did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Decode admitted; camera released and verification started
    Admitted { token: SessionToken },
    /// Verification finished and the session reached a terminal state
    Resolved {
        token: SessionToken,
        state: SessionState,
        outcome: VerificationOutcome,
    },
    /// Decoder failed while scanning
    Failed {
        token: SessionToken,
        reason: DecoderFailure,
    },
    Discarded(DiscardReason),
}
