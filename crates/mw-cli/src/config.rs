//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

const DEFAULT_API_BASE_URL: &str = "https://www.bungie.net";
const DEFAULT_MANIFEST_INDEX_PATH: &str = "/Platform/Destiny2/Manifest/";
const DEFAULT_MILESTONE_PATH: &str = "/Platform/Destiny2/Milestones/";
const DEFAULT_NOTIFY_COMMAND: &str = "sendmail";

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the cache database file.
    pub database_path: PathBuf,
    /// Directory the manifest archive is extracted into.
    pub manifest_dir: PathBuf,
    /// API key for the game-data service.
    pub api_key: Option<String>,
    /// Base URL of the game-data service.
    pub api_base_url: String,
    /// Path of the manifest index endpoint.
    pub manifest_index_path: String,
    /// Path of the milestone feed endpoint.
    pub milestone_path: String,
    /// Default notification address.
    pub recipient: Option<String>,
    /// Mail command the notification is piped into.
    pub notify_command: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("manifest_dir", &self.manifest_dir)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base_url", &self.api_base_url)
            .field("manifest_index_path", &self.manifest_index_path)
            .field("milestone_path", &self.milestone_path)
            .field("recipient", &self.recipient)
            .field("notify_command", &self.notify_command)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("cache.db"),
            manifest_dir: data_dir.join("manifest"),
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            manifest_index_path: DEFAULT_MANIFEST_INDEX_PATH.to_string(),
            milestone_path: DEFAULT_MILESTONE_PATH.to_string(),
            recipient: None,
            notify_command: DEFAULT_NOTIFY_COMMAND.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (MW_*)
        figment = figment.merge(Env::prefixed("MW_"));

        figment.extract()
    }

    /// Returns the API key, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Returns the platform-specific config directory for mw.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("mw"))
}

/// Returns the platform-specific data directory for mw.
///
/// On Linux: `~/.local/share/mw`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("mw"))
}
