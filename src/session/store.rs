//! Ordered, in-memory turn history

use super::turn::{Role, Turn, TurnId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Turn not found: {0}")]
    NotFound(TurnId),
}

/// Append-only turn history. The only removal is [`MessageStore::truncate_after`],
/// which regeneration uses to drop everything following a user turn.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    turns: Vec<Turn>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        debug_assert!(
            self.position(turn.id()).is_none(),
            "turn ids must be unique within a session"
        );
        self.turns.push(turn);
    }

    /// Remove every turn strictly after `id`. Returns how many were removed.
    pub fn truncate_after(&mut self, id: TurnId) -> Result<usize, StoreError> {
        let index = self.position(id).ok_or(StoreError::NotFound(id))?;
        let removed = self.turns.len() - (index + 1);
        self.turns.truncate(index + 1);
        Ok(removed)
    }

    pub fn latest_user_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role() == Role::User)
    }

    pub fn has_any_user_turn(&self) -> bool {
        self.turns.iter().any(|t| t.role() == Role::User)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn position(&self, id: TurnId) -> Option<usize> {
        self.turns.iter().position(|t| t.id() == id)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }
}
