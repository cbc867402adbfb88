//! Task that owns a [`ScanController`] and feeds it commands and events

use crate::decoder::api::SessionToken;
use crate::session::controller::ScanController;
use crate::session::error::{SessionError, SessionResult};
use crate::session::types::ScanStatus;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// Requests from the presentation layer
#[derive(Debug)]
pub enum SessionCommand {
    /// Start a session; the reply carries its token or the camera error
    Start(oneshot::Sender<SessionResult<SessionToken>>),
    Stop,
    Dispose,
}

/// Front end of a spawned controller
///
/// Commands are handled in the order sent. A command that arrives while
/// `start` is acquiring the camera waits until acquisition finishes.
#[derive(Debug)]
pub struct SessionHandle {
    commands: UnboundedSender<SessionCommand>,
    status: watch::Receiver<ScanStatus>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub async fn start(&self) -> SessionResult<SessionToken> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::Start(reply))?;
        response.await.map_err(|_| SessionError::DriverClosed)?
    }

    pub fn stop(&self) -> SessionResult<()> {
        self.send(SessionCommand::Stop)
    }

    pub fn dispose(&self) -> SessionResult<()> {
        self.send(SessionCommand::Dispose)
    }

    pub fn status(&self) -> ScanStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScanStatus> {
        self.status.clone()
    }

    /// Dispose the controller and wait for its task to end
    pub async fn shutdown(self) {
        let SessionHandle { commands, task, .. } = self;
        let _ = commands.send(SessionCommand::Dispose);
        drop(commands);
        if let Err(e) = task.await {
            log::warn!("Scan session driver ended abnormally: {}", e);
        }
    }

    fn send(&self, command: SessionCommand) -> SessionResult<()> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::DriverClosed)
    }
}

/// Move the controller into its own task
pub fn spawn_controller(controller: ScanController) -> SessionHandle {
    let (commands, command_rx) = unbounded_channel();
    let status = controller.subscribe();
    let task = tokio::spawn(drive(controller, command_rx));

    SessionHandle {
        commands,
        status,
        task,
    }
}

async fn drive(mut controller: ScanController, mut commands: UnboundedReceiver<SessionCommand>) {
    log::trace!("Scan session driver started");
    loop {
        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(SessionCommand::Start(reply)) => {
                    let _ = reply.send(controller.start().await);
                }
                Some(SessionCommand::Stop) => {
                    controller.stop();
                }
                Some(SessionCommand::Dispose) => controller.dispose(),
                None => break,
            },

            event = controller.next_event() => {
                let disposition = controller.handle_event(event);
                log::trace!("Handled controller event: {:?}", disposition);
            }
        }
    }
    controller.dispose();
    log::trace!("Scan session driver stopped");
}

/// Wait until the session started as `token` (or a later one) has settled
///
/// Also returns once the controller was disposed, since nothing is active
/// then either.
pub async fn wait_for_settled(
    status: &mut watch::Receiver<ScanStatus>,
    token: SessionToken,
) -> SessionResult<ScanStatus> {
    let settled = status
        .wait_for(|current| {
            current.is_settled() && current.session.map_or(true, |session| session >= token)
        })
        .await
        .map_err(|_| SessionError::DriverClosed)?;
    Ok(settled.clone())
}
