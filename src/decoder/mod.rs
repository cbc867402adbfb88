//! Decoder Adapter
//!
//! Wraps a camera/code-recognition capability behind [`DecoderAdapter`]:
//! `start` acquires the device and attaches a [`DecoderSink`], `stop`
//! detaches it, `dispose` releases the handle. Every event the sink emits
//! carries the token of the session it was started for, so callers can
//! drop events that arrive after the session ended.

pub mod api;
pub mod error;
pub mod lease;
pub mod line;
pub mod traits;
pub mod types;

#[cfg(test)]
mod tests;
