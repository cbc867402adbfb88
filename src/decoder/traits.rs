//! Decoder adapter trait and the sink it reports through

use crate::decoder::error::DecoderResult;
use crate::decoder::types::{
    CameraHandle, DecodedPayload, DecoderEvent, DecoderEventKind, DecoderFailure, ScanOptions,
    ScanTarget, SessionToken,
};
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

/// Callback pair handed to a decoder on `start`
///
/// Both callbacks stamp the session token the sink was created for.
/// Emitting after the session ended is allowed; the receiver decides
/// whether the event still matters.
#[derive(Debug, Clone)]
pub struct DecoderSink {
    token: SessionToken,
    events: UnboundedSender<DecoderEvent>,
}

impl DecoderSink {
    pub fn new(token: SessionToken, events: UnboundedSender<DecoderEvent>) -> Self {
        Self { token, events }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// Report a decoded code. Returns false if nobody is listening any more.
    pub fn decoded(&self, payload: impl Into<DecodedPayload>) -> bool {
        self.emit(DecoderEventKind::Decoded(payload.into()))
    }

    /// Report that the device stopped producing codes
    pub fn failed(&self, reason: DecoderFailure) -> bool {
        self.emit(DecoderEventKind::Failed(reason))
    }

    fn emit(&self, kind: DecoderEventKind) -> bool {
        self.events
            .send(DecoderEvent {
                token: self.token,
                kind,
            })
            .is_ok()
    }
}

/// Camera + code recognition capability
///
/// Contract:
/// - `start` must be followed by exactly one `dispose` of the returned handle
/// - `stop` is idempotent and safe on an already stopped handle
/// - the sink may still fire after `stop`; callers filter by token
#[async_trait]
pub trait DecoderAdapter: Send {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Acquire the camera and begin decoding into `sink`
    async fn start(
        &mut self,
        target: &ScanTarget,
        sink: DecoderSink,
        options: &ScanOptions,
    ) -> DecoderResult<CameraHandle>;

    /// Stop decoding. Idempotent.
    fn stop(&mut self, handle: &CameraHandle);

    /// Release everything held for `handle`
    fn dispose(&mut self, handle: CameraHandle);
}
