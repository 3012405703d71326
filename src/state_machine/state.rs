//! Session status and the read-only context transitions consult

use crate::session::MessageStore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Single process-wide status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Initial and resting state
    #[default]
    Idle,
    /// Request dispatched, awaiting the reply
    Submitted,
    /// Reserved for incremental delivery
    Streaming,
    /// Resting state after a failed exchange
    Error,
}

impl SessionStatus {
    /// A gateway call is outstanding
    pub fn is_busy(self) -> bool {
        matches!(self, SessionStatus::Submitted | SessionStatus::Streaming)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Submitted => "submitted",
            SessionStatus::Streaming => "streaming",
            SessionStatus::Error => "error",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session facts a transition may read but never modify
#[derive(Debug, Clone, Copy)]
pub struct SessionContext<'a> {
    pub store: &'a MessageStore,
    pub staged_attachments: usize,
    /// Generation of the most recent dispatch (0 before the first one)
    pub generation: u64,
}

impl<'a> SessionContext<'a> {
    pub fn new(store: &'a MessageStore, staged_attachments: usize, generation: u64) -> Self {
        Self {
            store,
            staged_attachments,
            generation,
        }
    }
}
