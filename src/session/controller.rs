//! Scan session state machine

use crate::decoder::api::{
    CameraLease, DecodedPayload, DecoderAdapter, DecoderError, DecoderEvent, DecoderEventKind,
    DecoderFailure, DecoderSink, SessionToken,
};
use crate::session::error::SessionResult;
use crate::session::guard::{Admission, LifecycleGuard};
use crate::session::types::{
    ControllerEvent, DiscardReason, Disposition, ScanStatus, Session, SessionConfig, SessionState,
    VerificationCompletion, VerifyStatus,
};
use crate::verify::api::{
    VerificationOutcome, VerificationReport, Verifier, VerifyError,
};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::task::AbortHandle;

/// Shown when the camera cannot be acquired
pub const CAMERA_UNAVAILABLE_MESSAGE: &str = "Camera access denied or not available.";

/// Shown when the scanner input is missing or already closed
pub const SCANNER_CLOSED_MESSAGE: &str = "No scanner input available.";

/// Owns the decoder, the verifier and the single active session
///
/// At most one camera lease exists at a time and it is released on every
/// way out of `Scanning`: admitted decode, stop, decoder failure, dispose.
pub struct ScanController {
    decoder: Box<dyn DecoderAdapter>,
    verifier: Arc<dyn Verifier>,
    config: SessionConfig,
    guard: LifecycleGuard,
    session: Option<Session>,
    camera: Option<CameraLease>,
    last_token: SessionToken,
    decoder_tx: UnboundedSender<DecoderEvent>,
    decoder_rx: UnboundedReceiver<DecoderEvent>,
    verified_tx: UnboundedSender<VerificationCompletion>,
    verified_rx: UnboundedReceiver<VerificationCompletion>,
    status: watch::Sender<ScanStatus>,
}

impl ScanController {
    pub fn new(
        decoder: Box<dyn DecoderAdapter>,
        verifier: Arc<dyn Verifier>,
        config: SessionConfig,
    ) -> Self {
        let (decoder_tx, decoder_rx) = unbounded_channel();
        let (verified_tx, verified_rx) = unbounded_channel();
        let (status, _) = watch::channel(ScanStatus::default());

        Self {
            decoder,
            verifier,
            config,
            guard: LifecycleGuard::new(),
            session: None,
            camera: None,
            last_token: SessionToken::new(0),
            decoder_tx,
            decoder_rx,
            verified_tx,
            verified_rx,
            status,
        }
    }

    /// Receive every change of the observable state
    pub fn subscribe(&self) -> watch::Receiver<ScanStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> ScanStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map(Session::state)
            .unwrap_or(SessionState::Idle)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn current_token(&self) -> Option<SessionToken> {
        self.session.as_ref().map(Session::token)
    }

    /// True while a camera lease is held
    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    /// Start a new session
    ///
    /// Returns the active session's token unchanged if one is already
    /// scanning or verifying. A terminal session is superseded.
    pub async fn start(&mut self) -> SessionResult<SessionToken> {
        if let Some(session) = &self.session {
            if session.state().is_active() {
                log::debug!(
                    "Start ignored: session {} is {}",
                    session.token(),
                    session.state()
                );
                return Ok(session.token());
            }
        }

        self.end_session();

        let token = self.last_token.next();
        self.last_token = token;
        let mut session = Session::new(token);
        session.advance(SessionState::Scanning)?;
        self.session = Some(session);
        self.guard.open(token);
        self.publish(|status| {
            *status = ScanStatus {
                session: Some(token),
                state: SessionState::Scanning,
                is_scanning: true,
                ..ScanStatus::default()
            };
        });
        log::info!("Session {} scanning", token);

        let sink = DecoderSink::new(token, self.decoder_tx.clone());
        let acquisition = tokio::time::timeout(
            self.config.camera_timeout,
            self.decoder
                .start(&self.config.target, sink, &self.config.options),
        )
        .await;
        let acquired = acquisition.unwrap_or_else(|_| {
            Err(DecoderError::unavailable(
                DecoderFailure::Unknown,
                format!(
                    "camera acquisition timed out after {:?}",
                    self.config.camera_timeout
                ),
            ))
        });

        match acquired {
            Ok(handle) => {
                log::debug!("Session {} acquired {}", token, handle);
                self.camera = Some(CameraLease::new(handle));
                Ok(token)
            }
            Err(e) => {
                log::error!("Session {}: {}", token, e);
                self.session = None;
                self.guard.close();
                self.publish(|status| {
                    status.state = SessionState::Idle;
                    status.is_scanning = false;
                    status.message = Some(unavailable_message(e.reason()).to_string());
                });
                Err(e.into())
            }
        }
    }

    /// Cancel a scanning session. Returns false if nothing was scanning.
    pub fn stop(&mut self) -> bool {
        let token = match &self.session {
            Some(session) if session.state() == SessionState::Scanning => session.token(),
            Some(session) => {
                log::debug!("Stop ignored: session {} is {}", session.token(), session.state());
                return false;
            }
            None => return false,
        };

        self.release_camera();
        self.guard.close();
        self.session = None;
        self.publish(|status| {
            status.state = SessionState::Idle;
            status.is_scanning = false;
        });
        log::info!("Session {} cancelled", token);
        true
    }

    /// Tear down from any state
    ///
    /// Releases the camera, drops any verification in flight and returns
    /// to `Idle`. Safe to call any number of times.
    pub fn dispose(&mut self) {
        if let Some(token) = self.end_session() {
            log::info!("Session {} torn down", token);
        }
        self.status.send_if_modified(|status| {
            let idle = ScanStatus::default();
            if *status == idle {
                false
            } else {
                *status = idle;
                true
            }
        });
    }

    /// Wait for the next decoder or verification event
    pub async fn next_event(&mut self) -> ControllerEvent {
        tokio::select! {
            Some(event) = self.decoder_rx.recv() => ControllerEvent::Decoder(event),
            Some(done) = self.verified_rx.recv() => ControllerEvent::Verified(done),
            // Both senders live in `self`, so the channels never close
            else => std::future::pending().await,
        }
    }

    /// Take an already queued event without waiting
    pub fn try_next_event(&mut self) -> Option<ControllerEvent> {
        if let Ok(event) = self.decoder_rx.try_recv() {
            return Some(ControllerEvent::Decoder(event));
        }
        self.verified_rx.try_recv().ok().map(ControllerEvent::Verified)
    }

    pub fn handle_event(&mut self, event: ControllerEvent) -> Disposition {
        match event {
            ControllerEvent::Decoder(DecoderEvent {
                token,
                kind: DecoderEventKind::Decoded(payload),
            }) => self.on_decoded(token, payload),
            ControllerEvent::Decoder(DecoderEvent {
                token,
                kind: DecoderEventKind::Failed(reason),
            }) => self.on_decoder_failed(token, reason),
            ControllerEvent::Verified(completion) => self.on_verified(completion),
        }
    }

    pub async fn process_next_event(&mut self) -> Disposition {
        let event = self.next_event().await;
        self.handle_event(event)
    }

    /// Start a session and handle events until it settles
    pub async fn run_to_completion(&mut self) -> SessionResult<ScanStatus> {
        self.start().await?;
        while self.state().is_active() {
            self.process_next_event().await;
        }
        Ok(self.status())
    }

    fn on_decoded(&mut self, token: SessionToken, payload: DecodedPayload) -> Disposition {
        if payload.is_empty() {
            log::debug!("Ignoring empty decode for session {}", token);
            return Disposition::Discarded(DiscardReason::EmptyPayload);
        }

        match self.guard.admit(token) {
            Admission::Admitted => {}
            refused => {
                log::debug!("Discarding decode for session {}: {:?}", token, refused);
                return Disposition::Discarded(refused.into());
            }
        }

        // The camera must not stay open during network I/O
        self.release_camera();

        let text = payload.into_text();
        match self.session.as_mut() {
            Some(session) => {
                if let Err(e) = session.advance(SessionState::Verifying) {
                    log::warn!("Session {}: {}", token, e);
                    return Disposition::Discarded(DiscardReason::WrongState(session.state()));
                }
                session.record_payload(text.clone());
            }
            None => return Disposition::Discarded(DiscardReason::NoSession),
        }

        let verification = self.spawn_verification(token, text.clone());
        if let Some(session) = self.session.as_mut() {
            session.attach_verification(verification);
        }

        self.publish(|status| {
            status.state = SessionState::Verifying;
            status.is_scanning = false;
            status.verify_status = Some(VerifyStatus::Pending);
            status.scanned = Some(text);
        });
        log::info!("Session {} scanned a code; verifying", token);
        Disposition::Admitted { token }
    }

    fn on_decoder_failed(&mut self, token: SessionToken, reason: DecoderFailure) -> Disposition {
        let current = match &self.session {
            Some(session) if session.token() != token => {
                return Disposition::Discarded(DiscardReason::StaleSession)
            }
            Some(session) if session.state() != SessionState::Scanning => {
                return Disposition::Discarded(DiscardReason::WrongState(session.state()))
            }
            Some(session) => session.token(),
            None => return Disposition::Discarded(DiscardReason::NoSession),
        };

        log::warn!("Session {}: scanner failed ({})", current, reason);
        self.release_camera();
        self.guard.close();
        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.advance(SessionState::Failed) {
                log::warn!("Session {}: {}", current, e);
            }
        }
        self.publish(|status| {
            status.state = SessionState::Failed;
            status.is_scanning = false;
            status.verify_status = None;
            status.message = Some(failure_message(reason).to_string());
        });
        Disposition::Failed {
            token: current,
            reason,
        }
    }

    fn on_verified(&mut self, completion: VerificationCompletion) -> Disposition {
        let VerificationCompletion { token, report } = completion;

        let session = match self.session.as_mut() {
            Some(session) if session.token() == token => session,
            _ => {
                log::debug!("Discarding late verification result for session {}", token);
                return Disposition::Discarded(DiscardReason::StaleSession);
            }
        };
        if session.state() != SessionState::Verifying {
            return Disposition::Discarded(DiscardReason::WrongState(session.state()));
        }

        let next = match report.outcome {
            VerificationOutcome::Confirmed => SessionState::Confirmed,
            VerificationOutcome::Rejected | VerificationOutcome::TransportError => {
                SessionState::Rejected
            }
            VerificationOutcome::Pending => {
                log::warn!("Session {}: verifier returned without a decision", token);
                SessionState::Rejected
            }
        };

        if let Err(e) = session.advance(next) {
            log::warn!("Session {}: {}", token, e);
            return Disposition::Discarded(DiscardReason::WrongState(session.state()));
        }
        session.take_verification();
        session.record_outcome(report.outcome);
        let elapsed = session.elapsed();

        let verify_status = match next {
            SessionState::Confirmed => VerifyStatus::Confirmed,
            _ => VerifyStatus::Rejected,
        };
        let message = report.display_message();
        self.publish(|status| {
            status.state = next;
            status.is_scanning = false;
            status.verify_status = Some(verify_status);
            status.message = message;
        });

        log::info!(
            "Session {} {} ({}) after {:?}",
            token,
            next,
            report.outcome,
            elapsed
        );
        Disposition::Resolved {
            token,
            state: next,
            outcome: report.outcome,
        }
    }

    fn spawn_verification(&self, token: SessionToken, text: String) -> AbortHandle {
        let verifier = Arc::clone(&self.verifier);
        let completions = self.verified_tx.clone();
        let limit = self.config.verify_timeout;

        tokio::spawn(async move {
            let report = match tokio::time::timeout(limit, verifier.verify(&text)).await {
                Ok(report) => report,
                Err(_) => {
                    let diagnostic = VerifyError::Timeout { after: limit }.to_string();
                    log::warn!("Session {}: {}", token, diagnostic);
                    VerificationReport::transport_error(diagnostic)
                }
            };
            let _ = completions.send(VerificationCompletion { token, report });
        })
        .abort_handle()
    }

    /// Drop the current session, its verification and its camera
    fn end_session(&mut self) -> Option<SessionToken> {
        let ended = self.session.take().map(|mut session| {
            if let Some(verification) = session.take_verification() {
                verification.abort();
            }
            session.token()
        });
        self.release_camera();
        self.guard.close();
        ended
    }

    fn release_camera(&mut self) -> bool {
        match self.camera.take() {
            Some(mut lease) => lease.release(self.decoder.as_mut()),
            None => false,
        }
    }

    fn publish(&self, update: impl FnOnce(&mut ScanStatus)) {
        self.status.send_modify(update);
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for ScanController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanController")
            .field("decoder", &self.decoder.name())
            .field("session", &self.session)
            .field("camera", &self.camera)
            .field("guard", &self.guard)
            .finish()
    }
}

/// Operator message for a decoder that could not be started
pub fn unavailable_message(reason: DecoderFailure) -> &'static str {
    match reason {
        DecoderFailure::NoDevice => SCANNER_CLOSED_MESSAGE,
        DecoderFailure::Denied | DecoderFailure::Unknown => CAMERA_UNAVAILABLE_MESSAGE,
    }
}

fn failure_message(reason: DecoderFailure) -> &'static str {
    match reason {
        DecoderFailure::Denied => CAMERA_UNAVAILABLE_MESSAGE,
        DecoderFailure::NoDevice => "Scanner disconnected.",
        DecoderFailure::Unknown => "Scanner stopped unexpectedly.",
    }
}
