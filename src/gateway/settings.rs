use serde::{Deserialize, Serialize};

/// Named values the gateway reads from the configuration source.
///
/// Every field is optional; an absent or blank value means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySettings {
    pub moonshot_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub moonshot_model: Option<String>,
    pub openai_model: Option<String>,
    #[serde(default)]
    pub mock_openai: bool,
    /// Disables TLS certificate validation for the upstream connection.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl GatewaySettings {
    #[must_use]
    pub fn base_url_override(&self) -> Option<&str> {
        non_blank(self.openai_base_url.as_deref())
    }

    #[must_use]
    pub fn moonshot_model(&self) -> Option<&str> {
        non_blank(self.moonshot_model.as_deref())
    }

    #[must_use]
    pub fn openai_model(&self) -> Option<&str> {
        non_blank(self.openai_model.as_deref())
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
