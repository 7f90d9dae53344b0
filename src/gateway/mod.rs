//! Upstream LLM gateway: credential resolution, provider selection, retry
//! policy, startup connectivity probe and the mock fallback.

pub mod client;
pub mod credential;
pub mod error;
pub mod http;
pub mod mock;
pub mod probe;
pub mod profile;
pub mod retry;
pub mod settings;
pub mod types;
pub mod wire;

pub use client::{ChatBackend, ClientHandle, build_client};
pub use credential::{CredentialSource, KeyFormat, ProviderCredential, resolve_credential};
pub use error::GatewayError;
pub use mock::mock_completion;
pub use probe::{Connectivity, ConnectivityProber};
pub use profile::{ProviderKind, ProviderProfile};
pub use retry::{RetryPolicy, Retryable, with_retry};
pub use settings::GatewaySettings;
pub use wire::{ChatCompletionRequest, ChatMessage, CompletionResult};

/// Process-scoped gateway state, assembled once during startup and shared by
/// reference with every request handler.
#[derive(Debug)]
pub struct Gateway {
    client: ClientHandle,
    connectivity: Connectivity,
    mock_mode: bool,
    retry_policy: RetryPolicy,
}

impl Gateway {
    /// Resolves the credential, builds the client and probes the upstream.
    /// A failed probe leaves the gateway in degraded mode rather than
    /// returning an error.
    pub async fn initialize(settings: &GatewaySettings) -> Result<Self, GatewayError> {
        let credential = resolve_credential(settings);
        let client = build_client(credential, settings)?;
        let connectivity = ConnectivityProber::new(settings.mock_openai)
            .probe(&client)
            .await;
        tracing::info!(%connectivity, "LLM gateway ready");
        Ok(Self::from_parts(client, connectivity, settings.mock_openai))
    }

    #[must_use]
    pub fn from_parts(client: ClientHandle, connectivity: Connectivity, mock_mode: bool) -> Self {
        Self {
            client,
            connectivity,
            mock_mode,
            retry_policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// The shared upstream client; fails when no credential was resolved.
    pub fn client(&self) -> Result<&ClientHandle, GatewayError> {
        if self.client.credential().is_unset() {
            Err(GatewayError::credential_missing())
        } else {
            Ok(&self.client)
        }
    }

    #[must_use]
    pub const fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.connectivity.is_available()
    }

    /// True when requests go to the upstream rather than the mock responder.
    #[must_use]
    pub const fn uses_upstream(&self) -> bool {
        !self.mock_mode && matches!(self.connectivity, Connectivity::Connected)
    }

    /// Answers a conversation, using the mock responder when the upstream is
    /// in mock, disabled or degraded mode.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<CompletionResult, GatewayError> {
        if !self.uses_upstream() {
            let last_user = messages
                .iter()
                .rev()
                .find(|m| m.role == "user")
                .map_or("", |m| m.content.as_str());
            tracing::debug!(connectivity = %self.connectivity, "Serving mock completion");
            return Ok(mock_completion(last_user));
        }

        let client = self.client()?;
        let request = ChatCompletionRequest::new(client.model(), messages);

        with_retry(self.retry_policy, || client.chat_completion(&request))
            .await
            .map_err(|err| {
                if err.is_retryable() {
                    GatewayError::Exhausted {
                        attempts: self.retry_policy.max_attempts(),
                        source: Box::new(err),
                    }
                } else {
                    err
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(connectivity: Connectivity, mock_mode: bool) -> Gateway {
        let client =
            build_client(ProviderCredential::unset(), &GatewaySettings::default()).expect("client");
        Gateway::from_parts(client, connectivity, mock_mode)
    }

    #[test]
    fn test_client_requires_credential() {
        let gateway = gateway(Connectivity::Disabled, false);
        assert!(matches!(
            gateway.client(),
            Err(GatewayError::CredentialMissing { .. })
        ));
    }

    #[tokio::test]
    async fn test_initialize_in_mock_mode() {
        let settings = GatewaySettings {
            mock_openai: true,
            ..Default::default()
        };
        let gateway = Gateway::initialize(&settings).await.expect("gateway");
        assert_eq!(gateway.connectivity(), Connectivity::MockEnabled);
        assert!(gateway.is_available());
        assert!(!gateway.uses_upstream());
    }

    #[tokio::test]
    async fn test_initialize_without_key_is_disabled() {
        let gateway = Gateway::initialize(&GatewaySettings::default())
            .await
            .expect("gateway");
        assert_eq!(gateway.connectivity(), Connectivity::Disabled);
        assert!(!gateway.is_available());
    }

    #[tokio::test]
    async fn test_chat_falls_back_to_mock() {
        for connectivity in [
            Connectivity::MockEnabled,
            Connectivity::Disabled,
            Connectivity::Degraded,
        ] {
            let gateway = gateway(connectivity, false);
            let messages = vec![
                ChatMessage::system("You answer from the knowledge base."),
                ChatMessage::user("first question"),
                ChatMessage::assistant("first answer"),
                ChatMessage::user("what is a vector index?"),
            ];
            let response = gateway.chat(messages).await.expect("mock response");
            assert_eq!(response.model, mock::MOCK_MODEL);
            assert!(
                response
                    .first_content()
                    .unwrap()
                    .contains("what is a vector index?")
            );
        }
    }

    #[tokio::test]
    async fn test_mock_mode_wins_over_connected() {
        let gateway = gateway(Connectivity::Connected, true);
        assert!(!gateway.uses_upstream());
        let response = gateway.chat(vec![ChatMessage::user("hi")]).await.unwrap();
        assert_eq!(response.model, mock::MOCK_MODEL);
    }
}
