//! Conversation turns and their typed parts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque, never-reused turn identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One typed fragment of a turn's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Part {
    Text { content: String },
    Reasoning { content: String },
    SourceUrl { url: String },
}

impl Part {
    pub fn text(content: impl Into<String>) -> Self {
        Part::Text {
            content: content.into(),
        }
    }
}

/// A single message in the conversation.
///
/// Turns are immutable once created; the fields are only reachable through
/// accessors so the non-empty `parts` guarantee cannot be broken later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    id: TurnId,
    role: Role,
    parts: Vec<Part>,
    created_at: DateTime<Utc>,
}

impl Turn {
    /// Create a turn with a fresh id. Returns `None` when `parts` is empty.
    pub fn new(role: Role, parts: Vec<Part>) -> Option<Self> {
        if parts.is_empty() {
            return None;
        }
        Some(Self {
            id: TurnId::new(),
            role,
            parts,
            created_at: Utc::now(),
        })
    }

    #[cfg(test)]
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::with_text(Role::User, text)
    }

    #[cfg(test)]
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::with_text(Role::Assistant, text)
    }

    #[cfg(test)]
    fn with_text(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            role,
            parts: vec![Part::text(text)],
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Concatenation of all `text` parts, in order
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { content } => Some(content.as_str()),
                Part::Reasoning { .. } | Part::SourceUrl { .. } => None,
            })
            .collect()
    }
}
