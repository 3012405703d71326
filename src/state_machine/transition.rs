//! Pure state transition function
//!
//! Given the same status, context, and event this always produces the same
//! result. Turn creation, store mutation, and gateway calls are left to the
//! runtime through [`Effect`]s.

use super::{Effect, Event, SessionContext, SessionStatus};
use thiserror::Error;

/// Prompt used when a turn carries attachments but no text
pub const ATTACHMENT_ONLY_PROMPT: &str = "Sent with attachments";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_status: SessionStatus,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(status: SessionStatus) -> Self {
        Self {
            new_status: status,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("A response is still in progress; wait for it to finish")]
    Busy,
    #[error("Nothing to send")]
    EmptyMessage,
    #[error("Nothing to regenerate")]
    NothingToRegenerate,
    #[error("Discarding completion for generation {received} (current is {current})")]
    StaleCompletion { received: u64, current: u64 },
}

impl TransitionError {
    /// Rejections the caller should not hear about
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            TransitionError::EmptyMessage | TransitionError::NothingToRegenerate
        )
    }
}

pub fn transition(
    status: SessionStatus,
    context: &SessionContext<'_>,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (status, event) {
        // ============================================================
        // Reentrancy guard: nothing new starts while a call is out
        // ============================================================
        (
            SessionStatus::Submitted | SessionStatus::Streaming,
            Event::Send { .. } | Event::Regenerate,
        ) => Err(TransitionError::Busy),

        // ============================================================
        // Sending
        // ============================================================
        (SessionStatus::Idle | SessionStatus::Error, Event::Send { text }) => {
            if text.is_empty() && context.staged_attachments == 0 {
                return Err(TransitionError::EmptyMessage);
            }
            let prompt = if text.is_empty() {
                ATTACHMENT_ONLY_PROMPT.to_string()
            } else {
                text
            };
            let generation = context.generation + 1;

            Ok(TransitionResult::new(SessionStatus::Submitted)
                .with_effect(Effect::append_user_text(prompt.clone()))
                .with_effect(Effect::DrainAttachments)
                .with_effect(Effect::dispatch(generation, prompt)))
        }

        // ============================================================
        // Regeneration: resubmit the last user turn's text
        // ============================================================
        (SessionStatus::Idle | SessionStatus::Error, Event::Regenerate) => {
            let turn = context
                .store
                .latest_user_turn()
                .ok_or(TransitionError::NothingToRegenerate)?;
            let prompt = turn.text();
            if prompt.is_empty() {
                return Err(TransitionError::NothingToRegenerate);
            }
            let generation = context.generation + 1;

            Ok(TransitionResult::new(SessionStatus::Submitted)
                .with_effect(Effect::TruncateAfter { turn_id: turn.id() })
                .with_effect(Effect::dispatch(generation, prompt)))
        }

        // ============================================================
        // Gateway resolution
        // ============================================================
        (
            SessionStatus::Submitted | SessionStatus::Streaming,
            Event::CompletionSucceeded { generation, text },
        ) if generation == context.generation => Ok(TransitionResult::new(SessionStatus::Idle)
            .with_effect(Effect::append_assistant_text(text))),

        (
            SessionStatus::Submitted | SessionStatus::Streaming,
            Event::CompletionFailed {
                generation,
                message,
            },
        ) if generation == context.generation => Ok(TransitionResult::new(SessionStatus::Error)
            .with_effect(Effect::append_assistant_text(message))),

        (
            _,
            Event::CompletionSucceeded { generation, .. }
            | Event::CompletionFailed { generation, .. },
        ) => Err(TransitionError::StaleCompletion {
            received: generation,
            current: context.generation,
        }),
    }
}
