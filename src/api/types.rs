//! API request and response types

use crate::session::{Attachment, AttachmentId};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentUpload>,
}

/// File sent over HTTP; `data` is base64
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentUpload {
    pub name: String,
    #[serde(default)]
    pub media_type: Option<String>,
    pub data: String,
}

impl AttachmentUpload {
    pub fn decode(self) -> Result<Attachment, base64::DecodeError> {
        let data = base64::engine::general_purpose::STANDARD.decode(self.data.as_bytes())?;
        Ok(Attachment::new(self.name, self.media_type, data))
    }
}

/// Request to change the model
#[derive(Debug, Deserialize)]
pub struct ModelRequest {
    pub model: String,
}

/// Request to toggle web search
#[derive(Debug, Deserialize)]
pub struct WebSearchRequest {
    pub enabled: bool,
}

/// Response for a staged attachment
#[derive(Debug, Serialize)]
pub struct StageAttachmentResponse {
    pub id: AttachmentId,
}

/// Response for actions with nothing else to report
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Model information with metadata
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub context_window: usize,
}

/// Response for model list
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub default: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
