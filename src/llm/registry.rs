//! Model registry for the Gemini-backed provider services

use super::{all_models, find_model, GeminiService, LlmService, LoggingService, DEFAULT_MODEL_ID};
use crate::session::ConfigurationError;
use std::collections::HashMap;
use std::sync::Arc;

/// Environment variable holding the provider credential
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Configuration for the provider
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub gemini_api_key: Option<String>,
    /// Override for the Gemini API origin (proxies, tests)
    pub gemini_base_url: Option<String>,
    /// Default model ID
    pub default_model: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            gemini_api_key: lookup(GEMINI_API_KEY_ENV),
            gemini_base_url: lookup("GEMINI_BASE_URL"),
            default_model: lookup("CHAT_DEFAULT_MODEL"),
        }
    }
}

/// Registry of provider services, keyed by model ID.
///
/// Every catalog model is selectable whether or not a credential is present;
/// a missing credential is reported when a model is actually used.
pub struct ModelRegistry {
    services: HashMap<String, Arc<dyn LlmService>>,
    default_model: String,
}

impl ModelRegistry {
    pub fn new(config: &LlmConfig) -> Self {
        let mut services: HashMap<String, Arc<dyn LlmService>> = HashMap::new();

        if let Some(api_key) = config.gemini_api_key.as_ref().filter(|k| !k.is_empty()) {
            for model_def in all_models() {
                match GeminiService::new(
                    api_key.clone(),
                    model_def.id,
                    config.gemini_base_url.as_deref(),
                ) {
                    Ok(service) => {
                        services.insert(
                            model_def.id.to_string(),
                            Arc::new(LoggingService::new(Arc::new(service))),
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            model = model_def.id,
                            error = %e,
                            "Failed to create provider service"
                        );
                    }
                }
            }
        }

        let default_model = match config.default_model.as_deref() {
            Some(id) if find_model(id).is_some() => id.to_string(),
            Some(id) => {
                tracing::warn!(
                    model = id,
                    fallback = DEFAULT_MODEL_ID,
                    "Ignoring unknown default model"
                );
                DEFAULT_MODEL_ID.to_string()
            }
            None => DEFAULT_MODEL_ID.to_string(),
        };

        Self {
            services,
            default_model,
        }
    }

    /// Build a registry around existing services. Used to plug in fakes.
    pub fn from_services(
        default_model: impl Into<String>,
        services: impl IntoIterator<Item = Arc<dyn LlmService>>,
    ) -> Self {
        Self {
            services: services
                .into_iter()
                .map(|s| (s.model_id().to_string(), s))
                .collect(),
            default_model: default_model.into(),
        }
    }

    /// Look up the service for a model, distinguishing unknown models from
    /// a missing credential
    pub fn service(&self, model_id: &str) -> Result<Arc<dyn LlmService>, ConfigurationError> {
        if find_model(model_id).is_none() && !self.services.contains_key(model_id) {
            return Err(ConfigurationError::UnknownModel(model_id.to_string()));
        }
        self.services
            .get(model_id)
            .cloned()
            .ok_or(ConfigurationError::MissingCredential(GEMINI_API_KEY_ENV))
    }

    pub fn default_model_id(&self) -> &str {
        &self.default_model
    }

    /// Model allow-list, in catalog order
    pub fn available_models(&self) -> Vec<String> {
        let mut models: Vec<String> = all_models().iter().map(|m| m.id.to_string()).collect();
        let mut extra: Vec<String> = self
            .services
            .keys()
            .filter(|id| find_model(id).is_none())
            .cloned()
            .collect();
        extra.sort();
        models.extend(extra);
        models
    }

    /// Whether any provider service could be built
    pub fn has_credential(&self) -> bool {
        !self.services.is_empty()
    }
}
