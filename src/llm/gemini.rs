//! Google Gemini provider implementation

use super::types::{LlmRequest, LlmResponse, Usage};
use super::LlmService;
use crate::gateway::GatewayError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini `generateContent` client for one model
pub struct GeminiService {
    client: Client,
    api_key: String,
    url: String,
    model_id: String,
}

impl GeminiService {
    pub fn new(
        api_key: String,
        model_id: &str,
        base_url: Option<&str>,
    ) -> Result<Self, GatewayError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/'),
            model_id
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| GatewayError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            url,
            model_id: model_id.to_string(),
        })
    }

    fn translate_request(request: &LlmRequest) -> GeminiRequest {
        let tools = if request.web_search {
            Some(vec![GeminiTool {
                google_search: GoogleSearch {},
            }])
        } else {
            None
        };

        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(request.prompt.clone()),
                    thought: None,
                }],
            }],
            tools,
        }
    }

    /// Join the text parts of the first candidate. No candidate means an
    /// empty reply rather than an error; callers render a placeholder.
    fn normalize_response(resp: GeminiResponse) -> LlmResponse {
        let text = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|part| part.thought != Some(true))
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        let usage = resp
            .usage_metadata
            .map(|u| Usage {
                input_tokens: u64::from(u.prompt_token_count),
                output_tokens: u64::from(u.candidates_token_count),
            })
            .unwrap_or_default();

        LlmResponse { text, usage }
    }
}

#[async_trait]
impl LlmService for GeminiService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, GatewayError> {
        let gemini_request = Self::translate_request(request);

        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    GatewayError::network(format!("Connection failed: {e}"))
                } else {
                    GatewayError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map(|resp| resp.error.message)
                .unwrap_or_else(|_| format!("HTTP {status} error: {body}"));
            return Err(GatewayError::from_status(status.as_u16(), message));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            GatewayError::unknown(format!("Failed to parse response: {e}"))
        })?;

        Ok(Self::normalize_response(gemini_response))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    /// Set on reasoning summaries, which are not part of the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

#[derive(Debug, Serialize)]
struct GeminiTool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayErrorKind;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_translate_request_with_web_search() {
        let request = LlmRequest::new("Hello").with_web_search(true);
        let value = serde_json::to_value(GeminiService::translate_request(&request)).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "Hello"}]}],
                "tools": [{"google_search": {}}]
            })
        );
    }

    #[test]
    fn test_translate_request_without_web_search() {
        let request = LlmRequest::new("Hello");
        let value = serde_json::to_value(GeminiService::translate_request(&request)).unwrap();
        assert!(value.get("tools").is_none());
        assert_eq!(value["contents"][0]["parts"][0]["text"], "Hello");
    }

    #[test]
    fn test_normalize_skips_thoughts_and_joins_text() {
        let resp: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "pondering", "thought": true},
                    {"text": "Hi "},
                    {"text": "there"}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 3,
                "candidatesTokenCount": 2,
                "totalTokenCount": 5
            }
        }))
        .unwrap();

        let normalized = GeminiService::normalize_response(resp);
        assert_eq!(normalized.text, "Hi there");
        assert_eq!(normalized.usage.input_tokens, 3);
        assert_eq!(normalized.usage.output_tokens, 2);
    }

    #[test]
    fn test_normalize_without_candidates_is_empty() {
        let resp: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        let normalized = GeminiService::normalize_response(resp);
        assert!(normalized.text.is_empty());
        assert_eq!(normalized.usage, Usage::default());
    }

    #[tokio::test]
    async fn test_complete_sends_key_header_and_model_path() {
        let seen: Arc<Mutex<Option<(String, Value)>>> = Arc::default();
        let recorder = seen.clone();
        let base = serve(Router::new().route(
            "/v1beta/models/gemini-2.5-flash:generateContent",
            post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
                let key = headers
                    .get("x-goog-api-key")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                *recorder.lock().unwrap() = Some((key, body));
                Json(json!({"candidates": [{"content": {"parts": [{"text": "Hi there"}]}}]}))
            }),
        ))
        .await;

        let service =
            GeminiService::new("secret".to_string(), "gemini-2.5-flash", Some(&base)).unwrap();
        let response = service.complete(&LlmRequest::new("Hello")).await.unwrap();

        assert_eq!(response.text, "Hi there");
        let (key, body) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(key, "secret");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hello");
    }

    #[tokio::test]
    async fn test_complete_maps_provider_errors() {
        let base = serve(Router::new().route(
            "/v1beta/models/gemini-2.5-pro:generateContent",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({"error": {
                        "code": 429,
                        "message": "quota exhausted",
                        "status": "RESOURCE_EXHAUSTED"
                    }})),
                )
                    .into_response()
            }),
        ))
        .await;

        let service =
            GeminiService::new("secret".to_string(), "gemini-2.5-pro", Some(&base)).unwrap();
        let err = service.complete(&LlmRequest::new("Hello")).await.unwrap_err();

        assert_eq!(err.kind, GatewayErrorKind::RateLimit);
        assert_eq!(err.status, Some(429));
        assert_eq!(err.message, "quota exhausted");
    }
}
