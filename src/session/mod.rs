//! Scan Session Controller
//!
//! Owns the decoder and the verification client and moves one session at a
//! time through `Idle -> Scanning -> Verifying -> Confirmed | Rejected | Failed`.
//!
//! ## Event model
//!
//! The controller is driven by one task. Decoder callbacks and verification
//! results arrive on channels and are handled one at a time, so the only
//! suspension points are camera acquisition in `start` and the verification
//! request, which runs in its own task and reports back as an event.
//!
//! Every event carries the token of the session it belongs to. The
//! [`LifecycleGuard`](guard::LifecycleGuard) admits the first decode of the
//! current session and refuses everything else, so a session is verified
//! at most once no matter how many callbacks fire or when.

pub mod api;
pub mod controller;
pub mod driver;
pub mod error;
pub mod guard;
pub mod types;

#[cfg(test)]
mod tests;
