use std::fmt;

use super::credential::{
    CredentialSource, LEGACY_SECONDARY_PREFIX, LONG_KEY_THRESHOLD, ProviderCredential,
};
use super::settings::GatewaySettings;
use super::types::{BaseUrl, ModelId};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const MOONSHOT_BASE_URL: &str = "https://api.moonshot.cn/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const MOONSHOT_DEFAULT_MODEL: &str = "moonshot-v1-8k";

const MOONSHOT_DOMAIN_MARKER: &str = "moonshot";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAI,
    Moonshot,
}

impl ProviderKind {
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Moonshot => "Moonshot",
        }
    }

    #[must_use]
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAI => OPENAI_BASE_URL,
            Self::Moonshot => MOONSHOT_BASE_URL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Rules that route a credential to the secondary provider, in the order
/// they are evaluated. The first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondarySignal {
    ProviderSpecificVar,
    LongKey,
    LegacyPrefix,
    BaseUrlDomain,
}

#[must_use]
pub fn secondary_signal(
    credential: &ProviderCredential,
    base_url_override: Option<&str>,
) -> Option<SecondarySignal> {
    let key = credential.raw_key.as_str();

    if credential.source == CredentialSource::PrimaryEnvVar {
        Some(SecondarySignal::ProviderSpecificVar)
    } else if key.len() > LONG_KEY_THRESHOLD {
        Some(SecondarySignal::LongKey)
    } else if key.starts_with(LEGACY_SECONDARY_PREFIX) {
        Some(SecondarySignal::LegacyPrefix)
    } else if base_url_override.is_some_and(|url| url.contains(MOONSHOT_DOMAIN_MARKER)) {
        Some(SecondarySignal::BaseUrlDomain)
    } else {
        None
    }
}

#[must_use]
pub fn infer_provider(
    credential: &ProviderCredential,
    base_url_override: Option<&str>,
) -> ProviderKind {
    match secondary_signal(credential, base_url_override) {
        Some(signal) => {
            tracing::debug!(?signal, "Routing to secondary provider");
            ProviderKind::Moonshot
        }
        None => ProviderKind::OpenAI,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub kind: ProviderKind,
    pub base_url: BaseUrl,
    pub default_model: ModelId,
}

impl ProviderProfile {
    #[must_use]
    pub fn resolve(credential: &ProviderCredential, settings: &GatewaySettings) -> Self {
        let base_url_override = settings.base_url_override();
        let kind = infer_provider(credential, base_url_override);

        let base_url = base_url_override.map_or_else(
            || BaseUrl::new(kind.default_base_url()),
            |url| BaseUrl::new(url.to_string()),
        );

        let model_override = match kind {
            ProviderKind::OpenAI => settings.openai_model(),
            ProviderKind::Moonshot => settings.moonshot_model(),
        };
        let default_model = match (kind, model_override) {
            (_, Some(model)) => ModelId::new(model.to_string()),
            (ProviderKind::OpenAI, None) => ModelId::new(OPENAI_DEFAULT_MODEL),
            (ProviderKind::Moonshot, None) => ModelId::new(MOONSHOT_DEFAULT_MODEL),
        };

        Self {
            kind,
            base_url,
            default_model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::types::ApiKey;

    fn credential(key: &str, source: CredentialSource) -> ProviderCredential {
        ProviderCredential {
            raw_key: ApiKey::new(key.to_string()),
            source,
        }
    }

    #[test]
    fn test_long_key_is_secondary_regardless_of_prefix() {
        for prefix in ["sk-", "sk-proj-", "sk-org-", "xyz"] {
            let key = format!("{prefix}{}", "k".repeat(41));
            let cred = credential(&key, CredentialSource::FallbackEnvVar);
            assert_eq!(infer_provider(&cred, None), ProviderKind::Moonshot);
        }
    }

    #[test]
    fn test_signal_precedence() {
        let long_legacy = format!("sk-ant-{}", "k".repeat(40));
        let cred = credential(&long_legacy, CredentialSource::PrimaryEnvVar);
        assert_eq!(
            secondary_signal(&cred, Some("https://api.moonshot.cn/v1")),
            Some(SecondarySignal::ProviderSpecificVar)
        );

        let cred = credential(&long_legacy, CredentialSource::FallbackEnvVar);
        assert_eq!(secondary_signal(&cred, None), Some(SecondarySignal::LongKey));

        let cred = credential("sk-ant-short", CredentialSource::FallbackEnvVar);
        assert_eq!(
            secondary_signal(&cred, None),
            Some(SecondarySignal::LegacyPrefix)
        );

        let cred = credential("sk-abc", CredentialSource::FallbackEnvVar);
        assert_eq!(
            secondary_signal(&cred, Some("https://proxy.moonshot.example/v1")),
            Some(SecondarySignal::BaseUrlDomain)
        );
        assert_eq!(secondary_signal(&cred, None), None);
    }

    #[test]
    fn test_unset_credential_is_primary() {
        let profile = ProviderProfile::resolve(&ProviderCredential::unset(), &GatewaySettings::default());
        assert_eq!(profile.kind, ProviderKind::OpenAI);
        assert_eq!(profile.base_url.as_str(), OPENAI_BASE_URL);
        assert_eq!(profile.default_model.as_str(), OPENAI_DEFAULT_MODEL);
    }

    #[test]
    fn test_override_base_url_wins() {
        let settings = GatewaySettings {
            openai_base_url: Some("https://llm.internal/v1/".into()),
            ..Default::default()
        };
        let cred = credential("sk-moon", CredentialSource::PrimaryEnvVar);
        let profile = ProviderProfile::resolve(&cred, &settings);
        assert_eq!(profile.kind, ProviderKind::Moonshot);
        assert_eq!(profile.base_url.as_str(), "https://llm.internal/v1");
        assert_eq!(profile.default_model.as_str(), MOONSHOT_DEFAULT_MODEL);
    }

    #[test]
    fn test_inferred_secondary_base_url() {
        let cred = credential("sk-moon", CredentialSource::PrimaryEnvVar);
        let profile = ProviderProfile::resolve(&cred, &GatewaySettings::default());
        assert_eq!(profile.base_url.as_str(), MOONSHOT_BASE_URL);
    }

    #[test]
    fn test_model_override_applies_to_matching_provider_only() {
        let settings = GatewaySettings {
            moonshot_model: Some("moonshot-v1-32k".into()),
            openai_model: Some("gpt-4o-mini".into()),
            ..Default::default()
        };

        let cred = credential("sk-moon", CredentialSource::PrimaryEnvVar);
        let profile = ProviderProfile::resolve(&cred, &settings);
        assert_eq!(profile.default_model.as_str(), "moonshot-v1-32k");

        let cred = credential("sk-open", CredentialSource::FallbackEnvVar);
        let profile = ProviderProfile::resolve(&cred, &settings);
        assert_eq!(profile.default_model.as_str(), "gpt-4o-mini");
    }
}
