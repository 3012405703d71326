//! Session data: turn history, staged attachments, and configuration

pub mod attachments;
pub mod config;
pub mod store;
pub mod turn;

pub use attachments::{Attachment, AttachmentId, AttachmentStaging, AttachmentSummary};
pub use config::{Configuration, ConfigurationError, ConfigurationState};
pub use store::MessageStore;
pub use turn::{Part, Role, Turn, TurnId};

use crate::state_machine::SessionStatus;
use serde::Serialize;

/// Everything the rendering layer needs to draw the chat screen
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub turns: Vec<Turn>,
    pub status: SessionStatus,
    pub config: Configuration,
    pub attachments: Vec<AttachmentSummary>,
    pub can_regenerate: bool,
    /// Sequence of the last update folded into this snapshot
    pub sequence: u64,
}

impl SessionSnapshot {
    pub fn capture(
        store: &MessageStore,
        status: SessionStatus,
        config: &ConfigurationState,
        staging: &AttachmentStaging,
        sequence: u64,
    ) -> Self {
        Self {
            turns: store.turns().to_vec(),
            status,
            config: config.current().clone(),
            attachments: staging.summaries(),
            can_regenerate: store.has_any_user_turn() && !status.is_busy(),
            sequence,
        }
    }
}
