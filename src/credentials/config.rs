//! Selection of the credential backend.

use serde::{Deserialize, Serialize};

use super::env::EnvCredentialStore;
use super::pass::{PassConfig, PassCredentialStore};
use super::CredentialStore;

/// The `[credentials]` table of the config file.
///
/// ```toml
/// [credentials]
/// backend = "env"
/// prefix = "KBANK"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum CredentialConfig {
    /// Environment variables `<prefix>_USERNAME` and friends.
    Env {
        #[serde(default = "default_prefix")]
        prefix: String,
    },
    /// Password-store (pass) entry.
    Pass {
        #[serde(flatten)]
        config: PassConfig,
    },
}

fn default_prefix() -> String {
    EnvCredentialStore::DEFAULT_PREFIX.to_string()
}

impl Default for CredentialConfig {
    fn default() -> Self {
        CredentialConfig::Env {
            prefix: default_prefix(),
        }
    }
}

impl CredentialConfig {
    /// Build a credential store from this configuration.
    pub fn build(&self) -> Box<dyn CredentialStore> {
        match self {
            CredentialConfig::Env { prefix } => Box::new(EnvCredentialStore::new(prefix.clone())),
            CredentialConfig::Pass { config } => Box::new(PassCredentialStore::new(config.clone())),
        }
    }
}
