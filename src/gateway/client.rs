use async_trait::async_trait;

use super::credential::ProviderCredential;
use super::error::GatewayError;
use super::http::{HttpClient, HttpConfig};
use super::profile::ProviderProfile;
use super::settings::GatewaySettings;
use super::wire::{ChatCompletionRequest, ChatCompletionResponse};

/// Anything that can answer a chat-completion request for a resolved
/// credential and provider.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn credential(&self) -> &ProviderCredential;
    fn profile(&self) -> &ProviderProfile;
    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, GatewayError>;
}

/// The process-wide upstream client. Built once at startup, never mutated.
#[derive(Clone)]
pub struct ClientHandle {
    credential: ProviderCredential,
    profile: ProviderProfile,
    http: HttpClient,
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandle")
            .field("provider", &self.profile.kind)
            .field("base_url", &self.profile.base_url)
            .field("model", &self.profile.default_model)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

pub fn build_client(
    credential: ProviderCredential,
    settings: &GatewaySettings,
) -> Result<ClientHandle, GatewayError> {
    let http_config = HttpConfig::default().accept_invalid_certs(settings.accept_invalid_certs);
    build_client_with(credential, settings, http_config)
}

pub fn build_client_with(
    credential: ProviderCredential,
    settings: &GatewaySettings,
    http_config: HttpConfig,
) -> Result<ClientHandle, GatewayError> {
    let profile = ProviderProfile::resolve(&credential, settings);
    tracing::info!(
        provider = %profile.kind,
        base_url = %profile.base_url,
        model = %profile.default_model,
        "Upstream client configured"
    );

    Ok(ClientHandle {
        credential,
        profile,
        http: HttpClient::with_config(http_config)?,
    })
}

impl ClientHandle {
    #[must_use]
    pub fn model(&self) -> &str {
        self.profile.default_model.as_str()
    }

    fn endpoint(&self) -> String {
        self.profile.base_url.join("/chat/completions")
    }
}

#[async_trait]
impl ChatBackend for ClientHandle {
    fn credential(&self) -> &ProviderCredential {
        &self.credential
    }

    fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, GatewayError> {
        if self.credential.is_unset() {
            return Err(GatewayError::credential_missing());
        }

        let body = serde_json::to_string(request).map_err(|e| GatewayError::Parse(e.to_string()))?;

        let response = self
            .http
            .inner()
            .post(self.endpoint())
            .header(
                "Authorization",
                format!("Bearer {}", self.credential.raw_key.as_str()),
            )
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), %body, "Upstream returned an error");
            return Err(GatewayError::from_status(status.as_u16(), &body));
        }

        response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }
}
