//! Runtime for executing a chat session
//!
//! The session lives on its own task. Callers talk to it through a
//! [`SessionHandle`]; observers follow it through a `watch` of the latest
//! [`SessionSnapshot`] and a `broadcast` of incremental [`SessionUpdate`]s.
//! Updates are numbered; a snapshot records the last number it includes.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::gateway::{CompletionGateway, GatewayError};
use crate::session::{
    Attachment, AttachmentId, AttachmentStaging, AttachmentSummary, Configuration,
    ConfigurationError, ConfigurationState, MessageStore, SessionSnapshot, Turn, TurnId,
};
use crate::state_machine::SessionStatus;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Tuning knobs supplied by the owner of a session
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Upper bound on a single gateway call. `None` waits as long as the
    /// gateway does.
    pub request_timeout: Option<Duration>,
}

/// Errors returned to callers of a [`SessionHandle`]
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("A response is still in progress; wait for it to finish")]
    Busy,
    #[error("Attachment not staged: {0}")]
    UnknownAttachment(AttachmentId),
    #[error("Session runtime has stopped")]
    Closed,
}

/// Outcome of `send` / `regenerate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Dispatch {
    /// A gateway call is now outstanding
    Submitted { generation: u64 },
    /// Nothing to do (empty message, nothing to regenerate)
    Ignored,
}

/// Incremental change notifications
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionUpdate {
    Turn(Turn),
    Truncated { after: TurnId },
    Status(SessionStatus),
    Config(Configuration),
    Attachments(Vec<AttachmentSummary>),
}

impl SessionUpdate {
    pub fn event_name(&self) -> &'static str {
        match self {
            SessionUpdate::Turn(_) => "turn",
            SessionUpdate::Truncated { .. } => "truncated",
            SessionUpdate::Status(_) => "status",
            SessionUpdate::Config(_) => "config",
            SessionUpdate::Attachments(_) => "attachments",
        }
    }
}

/// A [`SessionUpdate`] with its position in the session's update order
#[derive(Debug, Clone)]
pub struct SequencedUpdate {
    pub sequence: u64,
    pub update: SessionUpdate,
}

/// Commands accepted by the runtime
#[derive(Debug)]
pub enum Command {
    Send {
        text: String,
        attachments: Vec<Attachment>,
        reply: oneshot::Sender<Result<Dispatch, SessionError>>,
    },
    Regenerate {
        reply: oneshot::Sender<Result<Dispatch, SessionError>>,
    },
    SetModel {
        model: String,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    SetWebSearch {
        enabled: bool,
        reply: oneshot::Sender<()>,
    },
    StageAttachment {
        attachment: Attachment,
        reply: oneshot::Sender<AttachmentId>,
    },
    UnstageAttachment {
        id: AttachmentId,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
}

/// Result of one gateway call, tagged with the dispatch it answers
#[derive(Debug)]
pub struct Completion {
    pub generation: u64,
    pub result: Result<String, GatewayError>,
}

/// Cloneable client for a running session
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    update_tx: broadcast::Sender<SequencedUpdate>,
}

/// Start a session on the current tokio runtime
pub fn spawn_session<G>(
    gateway: G,
    config: ConfigurationState,
    options: SessionOptions,
) -> SessionHandle
where
    G: CompletionGateway + 'static,
{
    let (command_tx, command_rx) = mpsc::channel(32);
    let (update_tx, _) = broadcast::channel(128);
    let initial = SessionSnapshot::capture(
        &MessageStore::new(),
        SessionStatus::Idle,
        &config,
        &AttachmentStaging::new(),
        0,
    );
    let (snapshot_tx, snapshot_rx) = watch::channel(initial);

    let runtime = SessionRuntime::new(
        gateway,
        config,
        options,
        command_rx,
        snapshot_tx,
        update_tx.clone(),
    );
    tokio::spawn(runtime.run());

    SessionHandle {
        command_tx,
        snapshot_rx,
        update_tx,
    }
}

impl SessionHandle {
    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(build(reply))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Send a user message. `attachments` are staged alongside anything
    /// already staged and go out with this turn.
    pub async fn send(
        &self,
        text: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> Result<Dispatch, SessionError> {
        let text = text.into();
        self.call(|reply| Command::Send {
            text,
            attachments,
            reply,
        })
        .await?
    }

    /// Re-issue the last user turn, replacing what followed it
    pub async fn regenerate(&self) -> Result<Dispatch, SessionError> {
        self.call(|reply| Command::Regenerate { reply }).await?
    }

    pub async fn set_model(&self, model: impl Into<String>) -> Result<(), SessionError> {
        let model = model.into();
        self.call(|reply| Command::SetModel { model, reply }).await?
    }

    pub async fn set_web_search(&self, enabled: bool) -> Result<(), SessionError> {
        self.call(|reply| Command::SetWebSearch { enabled, reply }).await
    }

    pub async fn stage_attachment(
        &self,
        attachment: Attachment,
    ) -> Result<AttachmentId, SessionError> {
        self.call(|reply| Command::StageAttachment { attachment, reply })
            .await
    }

    pub async fn unstage_attachment(&self, id: AttachmentId) -> Result<(), SessionError> {
        self.call(|reply| Command::UnstageAttachment { id, reply }).await?
    }

    /// Latest published state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SequencedUpdate> {
        self.update_tx.subscribe()
    }

    /// Wait until no gateway call is outstanding
    pub async fn settled(&self) -> Result<SessionSnapshot, SessionError> {
        let mut rx = self.snapshot_rx.clone();
        let snapshot = rx
            .wait_for(|s| !s.status.is_busy())
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok(snapshot.clone())
    }
}
