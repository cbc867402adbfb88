//! Decoder subsystem tests

mod line;
