//! Completion gateway: the boundary to the remote text-generation service
//!
//! A gateway takes a prompt plus the configuration in force at dispatch time
//! and returns either the reply text or a [`GatewayError`]. It performs
//! exactly one outbound call per invocation and never retries.

mod error;
mod http;
mod provider;
pub mod wire;

pub use error::{GatewayError, GatewayErrorKind};
pub use http::HttpGateway;
pub use provider::ProviderGateway;

use crate::session::Configuration;
use async_trait::async_trait;
use std::sync::Arc;

/// Placeholder shown when a successful reply carried no usable text
pub const NO_RESPONSE_TEXT: &str = "(No response)";

#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, prompt: &str, config: &Configuration) -> Result<String, GatewayError>;
}

#[async_trait]
impl<T: CompletionGateway + ?Sized> CompletionGateway for Arc<T> {
    async fn complete(&self, prompt: &str, config: &Configuration) -> Result<String, GatewayError> {
        (**self).complete(prompt, config).await
    }
}
