//! Session subsystem tests

mod helpers;
