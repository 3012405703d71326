//! Effects produced by state transitions

use crate::session::{Part, Role, TurnId};

/// Effects to be executed by the runtime after a transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Create a turn with a fresh id and append it to the store
    AppendTurn { role: Role, parts: Vec<Part> },

    /// Drop every turn after the given one
    TruncateAfter { turn_id: TurnId },

    /// Empty attachment staging; its contents went out with this turn
    DrainAttachments,

    /// Start a gateway call in the background
    DispatchCompletion { generation: u64, prompt: String },
}

impl Effect {
    pub fn append_user_text(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            role: Role::User,
            parts: vec![Part::text(text)],
        }
    }

    pub fn append_assistant_text(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            role: Role::Assistant,
            parts: vec![Part::text(text)],
        }
    }

    pub fn dispatch(generation: u64, prompt: impl Into<String>) -> Self {
        Effect::DispatchCompletion {
            generation,
            prompt: prompt.into(),
        }
    }
}
