//! JSON bodies exchanged with the completion endpoint

use serde::{Deserialize, Serialize};

/// Request body: `{ input, model, webSearch }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub web_search: bool,
}

/// Any reply body. Success carries `text` (or the older `output_text`),
/// failure carries `error` or `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CompletionReplyBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CompletionReplyBody {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Text of a successful reply; empty strings count as absent
    pub fn success_text(self) -> Option<String> {
        non_empty(self.text).or_else(|| non_empty(self.output_text))
    }

    /// Message of a failed reply; empty strings count as absent
    pub fn failure_message(self) -> Option<String> {
        non_empty(self.error).or_else(|| non_empty(self.message))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
