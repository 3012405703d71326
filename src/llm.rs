//! Text-generation provider abstraction
//!
//! Backs the `/api/chat` completion endpoint and the in-process gateway.

mod gemini;
mod models;
mod registry;
mod types;

pub use gemini::GeminiService;
pub use models::{all_models, find_model, DEFAULT_MODEL_ID};
pub use registry::{LlmConfig, ModelRegistry, GEMINI_API_KEY_ENV};
pub use types::*;

use crate::gateway::GatewayError;
use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for text-generation providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, GatewayError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for provider services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, GatewayError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    web_search = request.web_search,
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "Provider request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    status = ?e.status,
                    transient = e.kind.is_transient(),
                    "Provider request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
