use std::time::Duration;
use thiserror::Error;

use super::retry::Retryable;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("No provider API key configured: {hint}")]
    CredentialMissing { hint: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Upstream server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Upstream connection failed: {0}")]
    Network(String),

    #[error("Upstream rejected request ({status}): {message}")]
    Client { status: u16, message: String },

    #[error("Upstream still failing after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<GatewayError>,
    },

    #[error("Failed to parse upstream response: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    #[must_use]
    pub fn credential_missing() -> Self {
        Self::CredentialMissing {
            hint: "set MOONSHOT_API_KEY or OPENAI_API_KEY".to_string(),
        }
    }

    #[must_use]
    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after: None,
        }
    }

    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by the failure, if the upstream answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::Server { status, .. } | Self::Client { status, .. } => Some(*status),
            Self::Exhausted { source, .. } => source.status(),
            _ => None,
        }
    }

    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error")?.get("message")?.as_str().map(String::from))
            .unwrap_or_else(|| format!("HTTP {status}"));

        match status {
            429 => Self::RateLimited {
                message,
                retry_after: None,
            },
            500..=599 => Self::Server { status, message },
            _ => Self::Client { status, message },
        }
    }
}

impl Retryable for GatewayError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Server { .. } | Self::Network(_)
        )
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(status.as_u16(), &err.to_string());
        }
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else if err.is_builder() {
            Self::Configuration(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for GatewayError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            reqwest_middleware::Error::Middleware(e) => Self::Network(e.to_string()),
        }
    }
}
