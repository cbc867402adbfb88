//! Verification API
//!
//! Public surface of the verification subsystem.

pub use crate::verify::client::{VerificationClient, Verifier};
pub use crate::verify::error::{VerifyError, VerifyResult};
pub use crate::verify::payload::{VerificationPayload, FALLBACK_KEY};
pub use crate::verify::response::interpret_response;
pub use crate::verify::types::{
    VerificationOutcome, VerificationReport, VerifyConfig, DEFAULT_ENDPOINT,
    DEFAULT_VERIFY_TIMEOUT,
};
