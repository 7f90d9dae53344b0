use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{fs, io};

use crate::gateway::GatewaySettings;

pub const DEFAULT_CONFIG_FILE: &str = "kbchat.toml";
pub const DEFAULT_PORT: u16 = 3001;

const fn default_port() -> u16 {
    DEFAULT_PORT
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    pub database_url: Option<String>,

    pub moonshot_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub moonshot_model: Option<String>,
    pub openai_model: Option<String>,
    #[serde(default)]
    pub mock_openai: bool,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            moonshot_api_key: None,
            openai_api_key: None,
            openai_base_url: None,
            moonshot_model: None,
            openai_model: None,
            mock_openai: false,
            accept_invalid_certs: false,
        }
    }
}

impl AppConfig {
    /// Loads the optional config file, then overlays the process environment.
    /// Falls back to defaults when the sources cannot be read.
    #[must_use]
    pub fn load(path: Option<&Path>) -> Self {
        Self::try_load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {e}");
            Self::default()
        })
    }

    pub fn try_load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::try_load_with(path, Environment::default())
    }

    fn try_load_with(
        path: Option<&Path>,
        environment: Environment,
    ) -> Result<Self, config::ConfigError> {
        let path = path.map_or_else(Self::get_config_path, Path::to_path_buf);

        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(environment)
            .build()
            .and_then(Config::try_deserialize)
    }

    #[must_use]
    pub fn get_config_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    pub fn init_default(path: &Path) -> Result<(), io::Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        if path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Config file already exists at {}", path.display()),
            ));
        }

        fs::write(path, include_str!("config.template.toml"))
    }

    #[must_use]
    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            moonshot_api_key: self.moonshot_api_key.clone(),
            openai_api_key: self.openai_api_key.clone(),
            openai_base_url: self.openai_base_url.clone(),
            moonshot_model: self.moonshot_model.clone(),
            openai_model: self.openai_model.clone(),
            mock_openai: self.mock_openai,
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: Map<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Environment::default().source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.port, 3001);
        assert!(!config.mock_openai);
        assert!(!config.accept_invalid_certs);
        assert_eq!(config.gateway_settings(), GatewaySettings::default());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("kbchat.toml");
        fs::write(
            &path,
            "port = 8080\nopenai_api_key = \"sk-from-file\"\nmoonshot_model = \"moonshot-v1-32k\"\nmock_openai = true\n",
        )
        .expect("write config");

        let config = AppConfig::try_load_with(Some(&path), env(&[])).expect("load");
        assert_eq!(config.port, 8080);
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-from-file"));

        let settings = config.gateway_settings();
        assert!(settings.mock_openai);
        assert_eq!(settings.moonshot_model(), Some("moonshot-v1-32k"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("kbchat.toml");
        fs::write(&path, "port = 8080\nopenai_api_key = \"sk-from-file\"\n").expect("write config");

        let config = AppConfig::try_load_with(
            Some(&path),
            env(&[
                ("OPENAI_API_KEY", "sk-from-env"),
                ("MOONSHOT_API_KEY", "sk-moon"),
                ("PORT", "9000"),
                ("MOCK_OPENAI", "true"),
                ("ACCEPT_INVALID_CERTS", "false"),
            ]),
        )
        .expect("load");

        assert_eq!(config.port, 9000);
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-from-env"));
        assert_eq!(config.moonshot_api_key.as_deref(), Some("sk-moon"));
        assert!(config.mock_openai);
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("absent.toml");
        let config = AppConfig::try_load_with(Some(&path), env(&[])).expect("load");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_init_default_writes_template_once() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested").join("kbchat.toml");

        AppConfig::init_default(&path).expect("first init");
        let content = fs::read_to_string(&path).expect("read template");
        assert!(content.contains("accept_invalid_certs"));

        let err = AppConfig::init_default(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);

        let config = AppConfig::try_load_with(Some(&path), env(&[])).expect("load template");
        assert_eq!(config, AppConfig::default());
    }
}
