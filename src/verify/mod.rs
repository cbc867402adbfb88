//! Verification Client
//!
//! Turns scanned text into a request body, posts it to the verification
//! endpoint and classifies the answer as confirmed or rejected. Transport
//! problems never escape as errors: they become
//! [`VerificationOutcome::TransportError`] with a diagnostic for display.

pub mod api;
pub mod client;
pub mod error;
pub mod payload;
pub mod response;
pub mod types;

#[cfg(test)]
mod tests;
