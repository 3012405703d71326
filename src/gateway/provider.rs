//! Gateway that calls the provider in-process

use super::{CompletionGateway, GatewayError, NO_RESPONSE_TEXT};
use crate::llm::{LlmRequest, ModelRegistry};
use crate::session::Configuration;
use async_trait::async_trait;
use std::sync::Arc;

/// Skips the HTTP hop and resolves the provider service from the registry
pub struct ProviderGateway {
    registry: Arc<ModelRegistry>,
}

impl ProviderGateway {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl CompletionGateway for ProviderGateway {
    async fn complete(&self, prompt: &str, config: &Configuration) -> Result<String, GatewayError> {
        // Credential and model problems surface here, before anything goes out
        let service = self.registry.service(&config.model)?;

        let request = LlmRequest::new(prompt).with_web_search(config.web_search_enabled);
        let response = service.complete(&request).await?;

        if response.text.is_empty() {
            Ok(NO_RESPONSE_TEXT.to_string())
        } else {
            Ok(response.text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayErrorKind;
    use crate::llm::{LlmConfig, LlmResponse, LlmService};
    use std::sync::Mutex;

    struct CannedService {
        model_id: String,
        reply: Result<String, GatewayError>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    #[async_trait]
    impl LlmService for CannedService {
        async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, GatewayError> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply.clone().map(|text| LlmResponse {
                text,
                ..LlmResponse::default()
            })
        }

        fn model_id(&self) -> &str {
            &self.model_id
        }
    }

    fn canned(reply: Result<String, GatewayError>) -> Arc<CannedService> {
        Arc::new(CannedService {
            model_id: "gemini-2.5-flash".to_string(),
            reply,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn config() -> Configuration {
        Configuration {
            model: "gemini-2.5-flash".to_string(),
            web_search_enabled: true,
        }
    }

    #[tokio::test]
    async fn test_forwards_prompt_and_web_search() {
        let service = canned(Ok("Hi there".to_string()));
        let registry = ModelRegistry::from_services(
            "gemini-2.5-flash",
            [service.clone() as Arc<dyn LlmService>],
        );
        let gateway = ProviderGateway::new(Arc::new(registry));

        let text = gateway.complete("Hello", &config()).await.unwrap();

        assert_eq!(text, "Hi there");
        let requests = service.requests.lock().unwrap().clone();
        assert_eq!(requests, vec![LlmRequest::new("Hello").with_web_search(true)]);
    }

    #[tokio::test]
    async fn test_empty_reply_is_placeholder() {
        let service = canned(Ok(String::new()));
        let registry =
            ModelRegistry::from_services("gemini-2.5-flash", [service as Arc<dyn LlmService>]);
        let gateway = ProviderGateway::new(Arc::new(registry));

        assert_eq!(gateway.complete("Hello", &config()).await.unwrap(), "(No response)");
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_any_call() {
        let gateway = ProviderGateway::new(Arc::new(ModelRegistry::new(&LlmConfig::default())));
        let err = gateway.complete("Hello", &config()).await.unwrap_err();

        assert_eq!(err.kind, GatewayErrorKind::Configuration);
        assert_eq!(err.status, Some(500));
        assert_eq!(err.message, "Missing GEMINI_API_KEY in environment.");
    }

    #[tokio::test]
    async fn test_provider_failure_passes_through() {
        let service = canned(Err(GatewayError::from_status(429, "quota exhausted")));
        let registry =
            ModelRegistry::from_services("gemini-2.5-flash", [service as Arc<dyn LlmService>]);
        let gateway = ProviderGateway::new(Arc::new(registry));

        let err = gateway.complete("Hello", &config()).await.unwrap_err();
        assert_eq!(err.message, "quota exhausted");
        assert_eq!(err.kind, GatewayErrorKind::RateLimit);
    }
}
