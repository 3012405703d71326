//! Model selection and feature toggles read at dispatch time

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),
    #[error("Missing {0} in environment.")]
    MissingCredential(&'static str),
}

/// Settings consulted by every outgoing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub model: String,
    pub web_search_enabled: bool,
}

/// Mutable configuration cell guarded by a model allow-list
#[derive(Debug, Clone)]
pub struct ConfigurationState {
    current: Configuration,
    allowed_models: Vec<String>,
}

impl ConfigurationState {
    pub fn new(
        model: impl Into<String>,
        allowed_models: Vec<String>,
    ) -> Result<Self, ConfigurationError> {
        let model = model.into();
        if !allowed_models.contains(&model) {
            return Err(ConfigurationError::UnknownModel(model));
        }
        Ok(Self {
            current: Configuration {
                model,
                web_search_enabled: false,
            },
            allowed_models,
        })
    }

    pub fn current(&self) -> &Configuration {
        &self.current
    }

    pub fn set_model(&mut self, model: impl Into<String>) -> Result<(), ConfigurationError> {
        let model = model.into();
        if !self.allowed_models.contains(&model) {
            return Err(ConfigurationError::UnknownModel(model));
        }
        self.current.model = model;
        Ok(())
    }

    pub fn set_web_search(&mut self, enabled: bool) {
        self.current.web_search_enabled = enabled;
    }

    /// Configuration to dispatch with, re-checked against the allow-list
    pub fn validated(&self) -> Result<&Configuration, ConfigurationError> {
        if self.allowed_models.contains(&self.current.model) {
            Ok(&self.current)
        } else {
            Err(ConfigurationError::UnknownModel(self.current.model.clone()))
        }
    }
}
