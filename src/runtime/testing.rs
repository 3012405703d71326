//! Mock gateways for exercising the session runtime without I/O

use crate::gateway::{CompletionGateway, GatewayError};
use crate::session::{Configuration, ConfigurationState};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Semaphore;

// ============================================================================
// Mock Gateway
// ============================================================================

/// Gateway that answers from a queue and records every call
#[derive(Default)]
pub struct MockGateway {
    responses: Mutex<VecDeque<Result<String, GatewayError>>>,
    /// Prompt and configuration of each call, in order
    pub calls: Mutex<Vec<(String, Configuration)>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_reply(&self, text: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn queue_error(&self, error: GatewayError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_calls(&self) -> Vec<(String, Configuration)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next(&self, prompt: &str, config: &Configuration) -> Result<String, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), config.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::network("No mock response queued")))
    }
}

#[async_trait]
impl CompletionGateway for MockGateway {
    async fn complete(&self, prompt: &str, config: &Configuration) -> Result<String, GatewayError> {
        self.next(prompt, config)
    }
}

// ============================================================================
// Gated Gateway (holds calls open until released)
// ============================================================================

/// Gateway whose calls block until the test releases them, one permit per call
pub struct GatedGateway {
    inner: MockGateway,
    gate: Semaphore,
}

impl GatedGateway {
    pub fn new() -> Self {
        Self {
            inner: MockGateway::new(),
            gate: Semaphore::new(0),
        }
    }

    pub fn queue_reply(&self, text: impl Into<String>) {
        self.inner.queue_reply(text);
    }

    pub fn queue_error(&self, error: GatewayError) {
        self.inner.queue_error(error);
    }

    /// Let `n` pending or future calls finish
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn call_count(&self) -> usize {
        self.inner.call_count()
    }
}

impl Default for GatedGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionGateway for GatedGateway {
    async fn complete(&self, prompt: &str, config: &Configuration) -> Result<String, GatewayError> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| GatewayError::network("gate closed"))?;
        permit.forget();
        self.inner.next(prompt, config)
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub const TEST_MODELS: [&str; 3] = ["gemini-3-flash-preview", "gemini-2.5-flash", "gemini-2.5-pro"];

/// Configuration with the usual model allow-list and the first model selected
pub fn test_config() -> ConfigurationState {
    ConfigurationState::new(
        TEST_MODELS[0],
        TEST_MODELS.iter().map(|m| (*m).to_string()).collect(),
    )
    .unwrap()
}
