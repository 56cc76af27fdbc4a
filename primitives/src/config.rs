use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::api::ApiUrl;

pub use toml::de::Error as TomlError;

/// The built-in configuration, used when no configuration file is provided.
pub static DEFAULT_CONFIG: Lazy<Config> = Lazy::new(|| {
    Config::try_toml(include_str!("../docs/config/default.toml"))
        .expect("Failed to parse default.toml config file")
});

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub autosave: AutosaveConfig,
    pub storage: StorageConfig,
    pub utm: UtmDefaults,
    pub identity: IdentityConfig,
    pub export: ExportConfig,
}

impl Config {
    /// Utility method that will deserialize a Toml file content into a [`Config`].
    ///
    /// Instead of relying on the `toml` crate directly, use this method instead.
    pub fn try_toml(toml: &str) -> Result<Self, TomlError> {
        toml::from_str(toml)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: ApiUrl,
    /// Timeout of every gateway request.
    /// In milliseconds
    pub timeout: u32,
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout.into())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AutosaveConfig {
    /// The quiet period after the last change before the draft is saved locally.
    /// In milliseconds
    pub debounce: u32,
    /// The local storage key of the draft snapshot
    pub storage_key: String,
}

impl AutosaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce.into())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Maximum bytes the local storage may hold, unlimited when not set.
    pub quota: Option<u64>,
}

/// UTM parameters a new draft starts with
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UtmDefaults {
    pub campaign: String,
    pub medium: String,
    pub source: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    /// Avatar of a url-derived identity, `{slug}` is replaced by the page slug.
    pub avatar_url: String,
}

impl IdentityConfig {
    pub fn avatar_url(&self, slug: &str) -> String {
        self.avatar_url.replace("{slug}", slug)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Archive name used when the ad has no name
    pub archive_prefix: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Toml parsing: {0}")]
    Toml(#[from] TomlError),
    #[error("File reading: {0}")]
    InvalidFile(#[from] std::io::Error),
}

/// If no `config_file` path is provided it will load the [`DEFAULT_CONFIG`].
/// If `config_file` path is provided it will try to read and parse the file in Toml format.
pub fn configuration(config_file: Option<&str>) -> Result<Config, ConfigError> {
    match config_file {
        Some(config_file) => {
            let content = std::fs::read_to_string(config_file)?;

            Ok(Config::try_toml(&content)?)
        }
        None => Ok(DEFAULT_CONFIG.clone()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = DEFAULT_CONFIG.clone();

        assert_eq!(Duration::from_secs(2), config.autosave.debounce());
        assert_eq!("Ignite", config.utm.campaign);
        assert_eq!(Some(5 * 1024 * 1024), config.storage.quota);
        assert_eq!(
            "https://graph.facebook.com/ignitemarketing/picture?type=large",
            config.identity.avatar_url("ignitemarketing")
        );
        assert_eq!(
            "http://127.0.0.1:8005/api/upload-asset",
            config
                .gateway
                .base_url
                .join("upload-asset")
                .expect("Should join")
                .as_str()
        );
    }

    #[test]
    fn unlimited_storage_when_quota_is_missing() {
        let toml = include_str!("../docs/config/default.toml").replace("quota = 5242880", "");

        let config = Config::try_toml(&toml).expect("Should parse");
        assert_eq!(None, config.storage.quota);
    }
}
