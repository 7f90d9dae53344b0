use std::fmt;
use std::time::Duration;

use super::client::ChatBackend;
use super::credential::KeyFormat;
use super::retry::{RetryPolicy, with_retry};
use super::wire::{ChatCompletionRequest, ChatMessage};

pub const PROBE_POLICY: RetryPolicy = RetryPolicy::new(2, Duration::from_millis(2000));
const PROBE_PROMPT: &str = "Test connection";
const PROBE_MAX_TOKENS: u32 = 5;

/// Outcome of the startup connectivity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// Mock mode is on; no upstream call was made.
    MockEnabled,
    /// No usable credential (missing or malformed), so the upstream was
    /// never contacted.
    Disabled,
    Connected,
    /// Credential present but the probe request failed.
    Degraded,
}

impl Connectivity {
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::MockEnabled | Self::Connected)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MockEnabled => "mock",
            Self::Disabled => "disabled",
            Self::Connected => "connected",
            Self::Degraded => "degraded",
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConnectivityProber {
    mock_mode: bool,
    policy: RetryPolicy,
}

impl ConnectivityProber {
    #[must_use]
    pub const fn new(mock_mode: bool) -> Self {
        Self {
            mock_mode,
            policy: PROBE_POLICY,
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn probe(&self, backend: &dyn ChatBackend) -> Connectivity {
        tracing::info!("Verifying upstream LLM connectivity");

        if self.mock_mode {
            tracing::warn!("Mock mode enabled (MOCK_OPENAI); chat will use local mock responses");
            return Connectivity::MockEnabled;
        }

        let credential = backend.credential();
        match credential.format() {
            KeyFormat::Missing => {
                tracing::warn!("No provider API key set; upstream chat is unavailable");
                return Connectivity::Disabled;
            }
            KeyFormat::Unrecognized => {
                tracing::warn!(
                    key = %credential.raw_key.masked(),
                    "API key format not recognized (expected an 'sk-' prefix); upstream chat is unavailable"
                );
                return Connectivity::Disabled;
            }
            format => tracing::info!(
                key = %credential.raw_key.masked(),
                "Detected {}",
                format.describe()
            ),
        }

        let profile = backend.profile();
        tracing::info!(provider = %profile.kind, model = %profile.default_model, "Sending probe request");

        let request = ChatCompletionRequest::new(
            profile.default_model.as_str(),
            vec![ChatMessage::user(PROBE_PROMPT)],
        )
        .with_max_tokens(PROBE_MAX_TOKENS);

        match with_retry(self.policy, || backend.chat_completion(&request)).await {
            Ok(response) => {
                tracing::info!(
                    reply = response.first_content().unwrap_or_default(),
                    "Upstream connection verified"
                );
                Connectivity::Connected
            }
            Err(err) => {
                tracing::error!(status = ?err.status(), "Upstream connectivity probe failed: {err}");
                tracing::warn!("Continuing in degraded mode; chat will fall back to mock responses");
                Connectivity::Degraded
            }
        }
    }
}
