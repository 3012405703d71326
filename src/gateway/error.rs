//! Gateway error types

use crate::session::ConfigurationError;
use thiserror::Error;

/// Failure of a completion call, carrying the message shown to the user
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    /// HTTP status of the failed exchange, when there was one
    pub status: Option<u16>,
    pub message: String,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            400 | 404 | 422 => GatewayErrorKind::InvalidRequest,
            401 | 403 => GatewayErrorKind::Auth,
            429 => GatewayErrorKind::RateLimit,
            500..=599 => GatewayErrorKind::ServerError,
            _ => GatewayErrorKind::Unknown,
        };
        Self::new(kind, message).with_status(status)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Network, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Unknown, message)
    }
}

impl From<ConfigurationError> for GatewayError {
    fn from(err: ConfigurationError) -> Self {
        let status = match err {
            ConfigurationError::MissingCredential(_) => 500,
            ConfigurationError::UnknownModel(_) => 400,
        };
        Self::new(GatewayErrorKind::Configuration, err.to_string()).with_status(status)
    }
}

/// Error classification, used for logging and HTTP status mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// Network issues, timeouts
    Network,
    /// Rate limited (429)
    RateLimit,
    /// Server error (5xx)
    ServerError,
    /// Authentication failed (401, 403)
    Auth,
    /// Bad request (400)
    InvalidRequest,
    /// Missing credential or unusable model, raised before any outbound call
    Configuration,
    Unknown,
}

impl GatewayErrorKind {
    /// Whether a later manual retry has a chance of succeeding
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }
}
