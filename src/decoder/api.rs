//! Decoder API
//!
//! Public surface of the decoder subsystem. Other modules import from here.

pub use crate::decoder::error::{DecoderError, DecoderResult};
pub use crate::decoder::lease::CameraLease;
pub use crate::decoder::line::{LineDecoder, LineSource};
pub use crate::decoder::traits::{DecoderAdapter, DecoderSink};
pub use crate::decoder::types::{
    CameraFacing, CameraHandle, DecodedPayload, DecoderEvent, DecoderEventKind, DecoderFailure,
    ScanOptions, ScanTarget, SessionToken,
};
