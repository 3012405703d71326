//! Process configuration, read once from the environment at startup

use crate::llm::LlmConfig;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub llm: LlmConfig,
    /// Completion endpoint for the session. Unset means call the provider in-process.
    pub gateway_url: Option<String>,
    pub port: u16,
    pub request_timeout: Option<Duration>,
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("CHAT_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let request_timeout = lookup("CHAT_REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            llm: LlmConfig::from_lookup(&lookup),
            gateway_url: lookup("CHAT_GATEWAY_URL").filter(|u| !u.is_empty()),
            port,
            request_timeout,
        }
    }
}
