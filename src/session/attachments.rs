//! Files queued for the next outgoing turn

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(Uuid);

impl AttachmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttachmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque file handle. The session never looks inside `data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: AttachmentId,
    pub name: String,
    pub media_type: Option<String>,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, media_type: Option<String>, data: Vec<u8>) -> Self {
        Self {
            id: AttachmentId::new(),
            name: name.into(),
            media_type,
            data,
        }
    }

    pub fn summary(&self) -> AttachmentSummary {
        AttachmentSummary {
            id: self.id,
            name: self.name.clone(),
            media_type: self.media_type.clone(),
            size: self.data.len(),
        }
    }
}

/// What observers see of a staged attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentSummary {
    pub id: AttachmentId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    pub size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AttachmentStaging {
    staged: Vec<Attachment>,
}

impl AttachmentStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, attachment: Attachment) -> AttachmentId {
        let id = attachment.id;
        self.staged.push(attachment);
        id
    }

    pub fn unstage(&mut self, id: AttachmentId) -> Option<Attachment> {
        let index = self.staged.iter().position(|a| a.id == id)?;
        Some(self.staged.remove(index))
    }

    /// Take the whole staged set, leaving staging empty
    pub fn drain(&mut self) -> Vec<Attachment> {
        std::mem::take(&mut self.staged)
    }

    pub fn summaries(&self) -> Vec<AttachmentSummary> {
        self.staged.iter().map(Attachment::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }
}
