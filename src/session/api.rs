//! Session API
//!
//! Public surface of the session subsystem.

pub use crate::decoder::types::SessionToken;
pub use crate::session::controller::{
    unavailable_message, ScanController, CAMERA_UNAVAILABLE_MESSAGE, SCANNER_CLOSED_MESSAGE,
};
pub use crate::session::driver::{spawn_controller, wait_for_settled, SessionCommand, SessionHandle};
pub use crate::session::error::{SessionError, SessionResult};
pub use crate::session::guard::{Admission, LifecycleGuard};
pub use crate::session::types::{
    ControllerEvent, DiscardReason, Disposition, ScanStatus, Session, SessionConfig, SessionState,
    VerificationCompletion, VerifyStatus, DEFAULT_CAMERA_TIMEOUT,
};
