//! Verification subsystem tests
