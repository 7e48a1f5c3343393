use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::credentials::CredentialConfig;
use crate::duration::{deserialize_duration, serialize_duration};
use crate::sync::kbank::{ClientOptions, Endpoints, KBankError};

const CONFIG_FILE_NAME: &str = "kbank.toml";

fn default_request_timeout() -> Duration {
    ClientOptions::default().timeout
}

fn default_time_zone() -> String {
    ClientOptions::default().time_zone.name().to_string()
}

fn default_locale() -> String {
    ClientOptions::default().locale
}

fn default_user_agent() -> String {
    ClientOptions::default().user_agent
}

/// Application configuration, read from `kbank.toml`.
///
/// Every field has a default, so an empty or missing file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bound on each HTTP request, e.g. "30s".
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub request_timeout: Duration,

    /// IANA zone the portal renders timestamps in.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Portal language posted at login.
    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Host base URLs; override to point at a test server.
    #[serde(default)]
    pub endpoints: Endpoints,

    /// Where username, password and account number come from.
    #[serde(default)]
    pub credentials: CredentialConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            time_zone: default_time_zone(),
            locale: default_locale(),
            user_agent: default_user_agent(),
            endpoints: Endpoints::default(),
            credentials: CredentialConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Client settings derived from this config.
    pub fn client_options(&self) -> Result<ClientOptions, KBankError> {
        let time_zone: Tz = self
            .time_zone
            .parse()
            .map_err(|_| KBankError::InvalidTimeZone(self.time_zone.clone()))?;

        Ok(ClientOptions {
            endpoints: self.endpoints.clone(),
            timeout: self.request_timeout,
            time_zone,
            locale: self.locale.clone(),
            user_agent: self.user_agent.clone(),
        })
    }
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./kbank.toml` if it exists in current directory
/// 2. `<config dir>/kbank/kbank.toml` (e.g. `~/.config/kbank/kbank.toml`)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from(CONFIG_FILE_NAME);
    if local_config.exists() {
        return local_config;
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("kbank").join(CONFIG_FILE_NAME);
    }

    local_config
}
