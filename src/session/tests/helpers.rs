//! Scripted decoder and verifier for driving the controller in tests

use crate::decoder::api::*;
use crate::session::api::*;
use crate::verify::api::{VerificationReport, Verifier};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
struct RecorderState {
    starts: usize,
    stops: Vec<u64>,
    disposals: Vec<u64>,
    live: HashSet<u64>,
    max_live: usize,
    sinks: Vec<DecoderSink>,
}

/// Shared view into what the controller did with a [`MockDecoder`]
#[derive(Clone, Default)]
pub struct DecoderRecorder(Arc<Mutex<RecorderState>>);

impl DecoderRecorder {
    pub fn starts(&self) -> usize {
        self.0.lock().unwrap().starts
    }

    pub fn stops(&self) -> usize {
        self.0.lock().unwrap().stops.len()
    }

    pub fn disposals(&self) -> usize {
        self.0.lock().unwrap().disposals.len()
    }

    pub fn live_cameras(&self) -> usize {
        self.0.lock().unwrap().live.len()
    }

    pub fn max_live_cameras(&self) -> usize {
        self.0.lock().unwrap().max_live
    }

    /// Sink handed over by the n-th successful start
    pub fn sink(&self, index: usize) -> DecoderSink {
        self.0.lock().unwrap().sinks[index].clone()
    }

    pub fn last_sink(&self) -> DecoderSink {
        let state = self.0.lock().unwrap();
        state.sinks.last().cloned().expect("decoder was started")
    }

    /// Decode `text` through the most recent sink
    pub fn decode(&self, text: &str) {
        self.last_sink().decoded(text);
    }

    pub fn fail(&self, reason: DecoderFailure) {
        self.last_sink().failed(reason);
    }
}

#[derive(Debug, Clone, Copy)]
pub enum StartBehaviour {
    Succeed,
    Fail(DecoderFailure),
    Hang,
}

pub struct MockDecoder {
    recorder: DecoderRecorder,
    behaviour: StartBehaviour,
    next_id: u64,
}

impl MockDecoder {
    pub fn new(behaviour: StartBehaviour) -> (Self, DecoderRecorder) {
        let recorder = DecoderRecorder::default();
        let decoder = Self {
            recorder: recorder.clone(),
            behaviour,
            next_id: 0,
        };
        (decoder, recorder)
    }
}

#[async_trait]
impl DecoderAdapter for MockDecoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start(
        &mut self,
        _target: &ScanTarget,
        sink: DecoderSink,
        _options: &ScanOptions,
    ) -> DecoderResult<CameraHandle> {
        match self.behaviour {
            StartBehaviour::Fail(reason) => {
                Err(DecoderError::unavailable(reason, "mock camera refused"))
            }
            StartBehaviour::Hang => std::future::pending().await,
            StartBehaviour::Succeed => {
                self.next_id += 1;
                let handle = CameraHandle::new(self.next_id, sink.token());
                let mut state = self.recorder.0.lock().unwrap();
                state.starts += 1;
                state.live.insert(handle.id());
                state.max_live = state.max_live.max(state.live.len());
                state.sinks.push(sink);
                Ok(handle)
            }
        }
    }

    fn stop(&mut self, handle: &CameraHandle) {
        self.recorder.0.lock().unwrap().stops.push(handle.id());
    }

    fn dispose(&mut self, handle: CameraHandle) {
        let mut state = self.recorder.0.lock().unwrap();
        state.live.remove(&handle.id());
        state.disposals.push(handle.id());
    }
}

enum Reply {
    Now(VerificationReport),
    Gated(Arc<Notify>, VerificationReport),
    Never,
}

/// Verifier with a scripted answer that records every text it was asked about
pub struct MockVerifier {
    reply: Reply,
    calls: Mutex<Vec<String>>,
}

impl MockVerifier {
    pub fn answering(report: VerificationReport) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Now(report),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn confirming() -> Arc<Self> {
        Self::answering(VerificationReport::confirmed(Some("Welcome".to_string())))
    }

    /// Answers only after the returned gate is notified
    pub fn gated(report: VerificationReport) -> (Arc<Self>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let verifier = Arc::new(Self {
            reply: Reply::Gated(Arc::clone(&gate), report),
            calls: Mutex::new(Vec::new()),
        });
        (verifier, gate)
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Never,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Verifier for MockVerifier {
    async fn verify(&self, scanned: &str) -> VerificationReport {
        self.calls.lock().unwrap().push(scanned.to_string());
        match &self.reply {
            Reply::Now(report) => report.clone(),
            Reply::Gated(gate, report) => {
                gate.notified().await;
                report.clone()
            }
            Reply::Never => std::future::pending().await,
        }
    }
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        camera_timeout: Duration::from_secs(1),
        verify_timeout: Duration::from_secs(2),
        ..SessionConfig::default()
    }
}

pub fn controller_with(
    behaviour: StartBehaviour,
    verifier: Arc<MockVerifier>,
) -> (ScanController, DecoderRecorder) {
    let (decoder, recorder) = MockDecoder::new(behaviour);
    let controller = ScanController::new(Box::new(decoder), verifier, test_config());
    (controller, recorder)
}

/// Handle events until the session leaves Scanning/Verifying
pub async fn settle(controller: &mut ScanController) -> Vec<Disposition> {
    let mut handled = Vec::new();
    while controller.state().is_active() {
        let event = tokio::time::timeout(Duration::from_secs(5), controller.next_event())
            .await
            .expect("controller event within timeout");
        handled.push(controller.handle_event(event));
    }
    handled
}
