use super::settings::{GatewaySettings, non_blank};
use super::types::ApiKey;

pub const PROVIDER_KEY_VAR: &str = "MOONSHOT_API_KEY";
pub const FALLBACK_KEY_VAR: &str = "OPENAI_API_KEY";

/// Keys longer than this are treated as the secondary provider's format.
pub const LONG_KEY_THRESHOLD: usize = 40;

/// Prefix historically used by another vendor; still routed to the
/// secondary provider.
pub const LEGACY_SECONDARY_PREFIX: &str = "sk-ant-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// The provider-specific variable.
    PrimaryEnvVar,
    /// The generic fallback variable.
    FallbackEnvVar,
    Unset,
}

impl CredentialSource {
    #[must_use]
    pub const fn var_name(self) -> Option<&'static str> {
        match self {
            Self::PrimaryEnvVar => Some(PROVIDER_KEY_VAR),
            Self::FallbackEnvVar => Some(FALLBACK_KEY_VAR),
            Self::Unset => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCredential {
    pub raw_key: ApiKey,
    pub source: CredentialSource,
}

impl ProviderCredential {
    #[must_use]
    pub fn unset() -> Self {
        Self {
            raw_key: ApiKey::default(),
            source: CredentialSource::Unset,
        }
    }

    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.source == CredentialSource::Unset
    }

    #[must_use]
    pub fn format(&self) -> KeyFormat {
        KeyFormat::classify(self.raw_key.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    Missing,
    LongSecondary,
    OpenAiOrganization,
    OpenAiProject,
    LegacySecondary,
    Standard,
    Unrecognized,
}

impl KeyFormat {
    #[must_use]
    pub fn classify(key: &str) -> Self {
        if key.is_empty() {
            return Self::Missing;
        }
        if key.len() > LONG_KEY_THRESHOLD {
            return Self::LongSecondary;
        }
        if !key.starts_with("sk-") {
            return Self::Unrecognized;
        }
        if key.starts_with("sk-org-") {
            Self::OpenAiOrganization
        } else if key.starts_with("sk-proj-") {
            Self::OpenAiProject
        } else if key.starts_with(LEGACY_SECONDARY_PREFIX) {
            Self::LegacySecondary
        } else {
            Self::Standard
        }
    }

    #[must_use]
    pub const fn is_recognized(self) -> bool {
        !matches!(self, Self::Missing | Self::Unrecognized)
    }

    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::LongSecondary => "long secondary-provider key",
            Self::OpenAiOrganization => "OpenAI organization key",
            Self::OpenAiProject => "OpenAI project key",
            Self::LegacySecondary => "legacy secondary-provider key",
            Self::Standard => "standard key",
            Self::Unrecognized => "unrecognized format",
        }
    }
}

#[must_use]
pub fn resolve_credential(settings: &GatewaySettings) -> ProviderCredential {
    let candidates = [
        (
            settings.moonshot_api_key.as_deref(),
            CredentialSource::PrimaryEnvVar,
        ),
        (
            settings.openai_api_key.as_deref(),
            CredentialSource::FallbackEnvVar,
        ),
    ];

    for (value, source) in candidates {
        if let Some(key) = non_blank(value) {
            tracing::info!(
                source = source.var_name().unwrap_or_default(),
                "Using provider API key"
            );
            return ProviderCredential {
                raw_key: ApiKey::new(key.to_string()),
                source,
            };
        }
    }

    tracing::warn!(
        "Neither {PROVIDER_KEY_VAR} nor {FALLBACK_KEY_VAR} is set; upstream calls will be unavailable"
    );
    ProviderCredential::unset()
}
