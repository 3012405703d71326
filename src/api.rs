//! HTTP API for the chat session and the completion endpoint

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::llm::ModelRegistry;
use crate::runtime::SessionHandle;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub registry: Arc<ModelRegistry>,
}

impl AppState {
    pub fn new(session: SessionHandle, registry: Arc<ModelRegistry>) -> Self {
        Self { session, registry }
    }
}
