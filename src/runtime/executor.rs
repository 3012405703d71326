//! Session runtime executor

use super::{
    Command, Completion, Dispatch, SequencedUpdate, SessionError, SessionOptions, SessionUpdate,
};
use crate::gateway::{CompletionGateway, GatewayError};
use crate::session::{
    Attachment, AttachmentStaging, ConfigurationState, MessageStore, SessionSnapshot, Turn,
};
use crate::state_machine::{
    transition, Effect, Event, SessionContext, SessionStatus, TransitionError,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Owns all state of one session and applies commands one at a time.
///
/// Gateway calls run on their own tasks and report back through the
/// completion channel, so the loop never waits on the network.
pub struct SessionRuntime<G>
where
    G: CompletionGateway + 'static,
{
    store: MessageStore,
    status: SessionStatus,
    staging: AttachmentStaging,
    config: ConfigurationState,
    /// Generation of the most recent dispatch
    generation: u64,
    /// Number of updates broadcast so far
    sequence: u64,
    gateway: Arc<G>,
    options: SessionOptions,
    command_rx: mpsc::Receiver<Command>,
    completion_tx: mpsc::Sender<Completion>,
    completion_rx: mpsc::Receiver<Completion>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    update_tx: broadcast::Sender<SequencedUpdate>,
}

impl<G> SessionRuntime<G>
where
    G: CompletionGateway + 'static,
{
    pub fn new(
        gateway: G,
        config: ConfigurationState,
        options: SessionOptions,
        command_rx: mpsc::Receiver<Command>,
        snapshot_tx: watch::Sender<SessionSnapshot>,
        update_tx: broadcast::Sender<SequencedUpdate>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(8);
        Self {
            store: MessageStore::new(),
            status: SessionStatus::Idle,
            staging: AttachmentStaging::new(),
            config,
            generation: 0,
            sequence: 0,
            gateway: Arc::new(gateway),
            options,
            command_rx,
            completion_tx,
            completion_rx,
            snapshot_tx,
            update_tx,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(
            &self.store,
            self.status,
            &self.config,
            &self.staging,
            self.sequence,
        )
    }

    pub async fn run(mut self) {
        tracing::info!(model = %self.config.current().model, "Starting session runtime");

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    // Every handle is gone; outstanding calls are abandoned
                    None => break,
                },
                Some(completion) = self.completion_rx.recv() => self.handle_completion(completion),
            }
        }

        tracing::info!(turns = self.store.len(), "Session runtime stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Send {
                text,
                attachments,
                reply,
            } => {
                let result = self.send(text, attachments);
                let _ = reply.send(result);
            }
            Command::Regenerate { reply } => {
                let result = self.request(Event::Regenerate, Vec::new());
                let _ = reply.send(result);
            }
            Command::SetModel { model, reply } => {
                let result = self.config.set_model(model).map_err(SessionError::from);
                if result.is_ok() {
                    tracing::info!(model = %self.config.current().model, "Model changed");
                    self.broadcast(SessionUpdate::Config(self.config.current().clone()));
                    self.publish_snapshot();
                }
                let _ = reply.send(result);
            }
            Command::SetWebSearch { enabled, reply } => {
                self.config.set_web_search(enabled);
                tracing::info!(enabled, "Web search toggled");
                self.broadcast(SessionUpdate::Config(self.config.current().clone()));
                self.publish_snapshot();
                let _ = reply.send(());
            }
            Command::StageAttachment { attachment, reply } => {
                tracing::debug!(
                    name = %attachment.name,
                    size = attachment.data.len(),
                    "Staging attachment"
                );
                let id = self.staging.stage(attachment);
                self.broadcast(SessionUpdate::Attachments(self.staging.summaries()));
                self.publish_snapshot();
                let _ = reply.send(id);
            }
            Command::UnstageAttachment { id, reply } => {
                let result = match self.staging.unstage(id) {
                    Some(_) => {
                        self.broadcast(SessionUpdate::Attachments(self.staging.summaries()));
                        self.publish_snapshot();
                        Ok(())
                    }
                    None => Err(SessionError::UnknownAttachment(id)),
                };
                let _ = reply.send(result);
            }
        }
    }

    fn send(
        &mut self,
        text: String,
        attachments: Vec<Attachment>,
    ) -> Result<Dispatch, SessionError> {
        self.request(Event::Send { text }, attachments)
    }

    /// Run a user-initiated event. `attachments` join staging only if the
    /// transition is accepted, so a rejected request leaves no trace.
    fn request(
        &mut self,
        event: Event,
        attachments: Vec<Attachment>,
    ) -> Result<Dispatch, SessionError> {
        let event_name = event.name();
        let context = SessionContext::new(
            &self.store,
            self.staging.len() + attachments.len(),
            self.generation,
        );

        let result = match transition(self.status, &context, event) {
            Ok(result) => result,
            Err(TransitionError::Busy) => {
                tracing::warn!(
                    event = event_name,
                    status = %self.status,
                    "Rejecting request while busy"
                );
                return Err(SessionError::Busy);
            }
            // Stale completions only come from the completion channel
            Err(e) => {
                debug_assert!(e.is_silent(), "unexpected rejection: {e}");
                tracing::debug!(event = event_name, reason = %e, "Ignoring request");
                return Ok(Dispatch::Ignored);
            }
        };

        // Model is re-checked at dispatch so an unknown id never reaches the gateway
        if let Err(e) = self.config.validated() {
            tracing::warn!(
                event = event_name,
                error = %e,
                "Rejecting request with invalid configuration"
            );
            return Err(e.into());
        }

        for attachment in attachments {
            self.staging.stage(attachment);
        }

        self.apply(result.new_status, result.effects);
        Ok(Dispatch::Submitted {
            generation: self.generation,
        })
    }

    fn handle_completion(&mut self, completion: Completion) {
        let event = match completion.result {
            Ok(text) => Event::CompletionSucceeded {
                generation: completion.generation,
                text,
            },
            Err(e) => Event::CompletionFailed {
                generation: completion.generation,
                message: e.message,
            },
        };

        let context = SessionContext::new(&self.store, self.staging.len(), self.generation);
        match transition(self.status, &context, event) {
            Ok(result) => self.apply(result.new_status, result.effects),
            Err(e) => {
                tracing::debug!(error = %e, "Dropping completion");
            }
        }
    }

    fn apply(&mut self, new_status: SessionStatus, effects: Vec<Effect>) {
        let old_status = std::mem::replace(&mut self.status, new_status);

        for effect in effects {
            self.execute_effect(effect);
        }

        if old_status != new_status {
            tracing::debug!(from = %old_status, to = %new_status, "Status changed");
            self.broadcast(SessionUpdate::Status(new_status));
        }
        self.publish_snapshot();
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendTurn { role, parts } => {
                let Some(turn) = Turn::new(role, parts) else {
                    tracing::error!(?role, "Refusing to append a turn without parts");
                    return;
                };
                self.store.append(turn.clone());
                self.broadcast(SessionUpdate::Turn(turn));
            }
            Effect::TruncateAfter { turn_id } => match self.store.truncate_after(turn_id) {
                Ok(removed) => {
                    tracing::debug!(%turn_id, removed, "Truncated history for regeneration");
                    self.broadcast(SessionUpdate::Truncated { after: turn_id });
                }
                Err(e) => tracing::error!(error = %e, "Failed to truncate history"),
            },
            Effect::DrainAttachments => {
                let drained = self.staging.drain();
                if !drained.is_empty() {
                    tracing::debug!(count = drained.len(), "Attachments sent with turn");
                    self.broadcast(SessionUpdate::Attachments(Vec::new()));
                }
            }
            Effect::DispatchCompletion { generation, prompt } => {
                self.generation = generation;
                self.dispatch(generation, prompt);
            }
        }
    }

    /// Spawn the gateway call. Configuration is read now, not when the
    /// command was issued.
    fn dispatch(&self, generation: u64, prompt: String) {
        let config = self.config.current().clone();
        let gateway = self.gateway.clone();
        let completion_tx = self.completion_tx.clone();
        let timeout = self.options.request_timeout;

        tracing::info!(
            generation,
            model = %config.model,
            web_search = config.web_search_enabled,
            prompt_chars = prompt.chars().count(),
            "Dispatching completion"
        );

        tokio::spawn(async move {
            let start = std::time::Instant::now();
            let call = gateway.complete(&prompt, &config);
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
                    Err(GatewayError::network(format!(
                        "Request timed out after {}s",
                        limit.as_secs_f64()
                    )))
                }),
                None => call.await,
            };

            match &result {
                Ok(text) => tracing::info!(
                    generation,
                    duration_ms = %start.elapsed().as_millis(),
                    reply_chars = text.chars().count(),
                    "Completion succeeded"
                ),
                Err(e) => tracing::warn!(
                    generation,
                    duration_ms = %start.elapsed().as_millis(),
                    error = %e,
                    "Completion failed"
                ),
            }

            if completion_tx.send(Completion { generation, result }).await.is_err() {
                tracing::debug!(generation, "Session gone before completion arrived");
            }
        });
    }

    /// Numbers every update, whether or not anyone is subscribed
    fn broadcast(&mut self, update: SessionUpdate) {
        self.sequence += 1;
        let _ = self.update_tx.send(SequencedUpdate {
            sequence: self.sequence,
            update,
        });
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}
