//! Session worker
//!
//! Runs one [`Session`] on its own tokio task. Commands are applied strictly
//! in arrival order; everything the session reports comes back as
//! [`SessionEvent`]s. A fatal error ends that worker only.

use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::TerminalConfig;
use crate::error::{SessionError, TN3270Result};
use crate::lib3270::buffer::Address;
use crate::lib3270::keyboard::KeyEvent;
use crate::lib3270::status::Status;
use crate::session::{Session, TerminalObserver};

const COMMAND_QUEUE_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// One outbound frame from the host
    Outbound(Vec<u8>),
    Keystroke(KeyEvent),
    Focus(bool),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Inbound frame for the host
    Inbound(Vec<u8>),
    Render,
    RenderDeltas(Vec<Address>),
    Status(Status),
    /// Fatal error; no further events follow
    Panic(String),
}

struct ChannelObserver {
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelObserver {
    fn emit(&self, event: SessionEvent) {
        // The receiver may be gone; the session keeps running regardless
        let _ = self.events.send(event);
    }
}

impl TerminalObserver for ChannelObserver {
    fn on_inbound(&self, frame: &[u8]) {
        self.emit(SessionEvent::Inbound(frame.to_vec()));
    }

    fn on_render(&self) {
        self.emit(SessionEvent::Render);
    }

    fn on_render_deltas(&self, deltas: &[Address]) {
        self.emit(SessionEvent::RenderDeltas(deltas.to_vec()));
    }

    fn on_status(&self, status: &Status) {
        self.emit(SessionEvent::Status(status.clone()));
    }

    fn on_panic(&self, reason: &str) {
        self.emit(SessionEvent::Panic(reason.to_string()));
    }
}

/// Handle to a running session task
#[derive(Debug)]
pub struct SessionWorker {
    id: Uuid,
    commands: mpsc::Sender<SessionCommand>,
    handle: JoinHandle<()>,
}

impl SessionWorker {
    /// Start a session on the current tokio runtime
    ///
    /// The event receiver yields `None` once the worker has stopped.
    pub fn spawn(
        config: TerminalConfig,
    ) -> TN3270Result<(Self, mpsc::UnboundedReceiver<SessionEvent>)> {
        let mut session = Session::new(config)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        session.add_observer(Box::new(ChannelObserver { events: events_tx }));

        let id = session.id();
        let (commands, commands_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let handle = tokio::spawn(run(session, commands_rx));
        debug!("session {} worker started", id);
        Ok((Self { id, commands, handle }, events_rx))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn send(&self, command: SessionCommand) -> TN3270Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Closed { id: self.id.to_string() }.into())
    }

    pub async fn outbound(&self, frame: Vec<u8>) -> TN3270Result<()> {
        self.send(SessionCommand::Outbound(frame)).await
    }

    pub async fn keystroke(&self, event: KeyEvent) -> TN3270Result<()> {
        self.send(SessionCommand::Keystroke(event)).await
    }

    pub async fn focus(&self, focussed: bool) -> TN3270Result<()> {
        self.send(SessionCommand::Focus(focussed)).await
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the worker and wait for it to exit
    pub async fn shutdown(self) {
        // Already stopped if the send fails
        let _ = self.commands.send(SessionCommand::Shutdown).await;
        if let Err(err) = self.handle.await {
            warn!("session {} worker did not stop cleanly: {}", self.id, err);
        }
    }
}

async fn run(mut session: Session, mut commands: mpsc::Receiver<SessionCommand>) {
    while let Some(command) = commands.recv().await {
        let result = match command {
            SessionCommand::Outbound(frame) => session.outbound(&frame).map(drop),
            SessionCommand::Keystroke(event) => session.keystroke(&event).map(drop),
            SessionCommand::Focus(focussed) => {
                session.focus(focussed);
                Ok(())
            }
            SessionCommand::Shutdown => break,
        };
        if let Err(err) = result {
            if session.is_closed() {
                break;
            }
            warn!("session {}: {}", session.id(), err);
        }
    }
    drop(commands);
    session.close();
    debug!("session {} worker stopped", session.id());
}
