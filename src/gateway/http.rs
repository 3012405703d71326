//! Gateway that POSTs to a remote completion endpoint

use super::wire::{CompletionReplyBody, CompletionRequestBody};
use super::{CompletionGateway, GatewayError, NO_RESPONSE_TEXT};
use crate::session::Configuration;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Talks to an endpoint implementing the `/api/chat` contract
pub struct HttpGateway {
    client: Client,
    endpoint: String,
}

impl HttpGateway {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionGateway for HttpGateway {
    async fn complete(&self, prompt: &str, config: &Configuration) -> Result<String, GatewayError> {
        let request = CompletionRequestBody {
            input: Some(prompt.to_string()),
            model: Some(config.model.clone()),
            web_search: config.web_search_enabled,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    GatewayError::network(format!("Connection failed: {e}"))
                } else {
                    GatewayError::network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::network(format!("Failed to read response: {e}")))?;

        // Bodies that are not the expected JSON are tolerated on both paths
        let reply = serde_json::from_str::<CompletionReplyBody>(&body).ok();

        if !status.is_success() {
            let message = reply
                .and_then(CompletionReplyBody::failure_message)
                .unwrap_or_else(|| format!("Request failed ({})", status.as_u16()));
            tracing::debug!(
                status = status.as_u16(),
                message = %message,
                "Completion endpoint returned failure"
            );
            return Err(GatewayError::from_status(status.as_u16(), message));
        }

        Ok(reply
            .and_then(CompletionReplyBody::success_text)
            .unwrap_or_else(|| NO_RESPONSE_TEXT.to_string()))
    }
}
