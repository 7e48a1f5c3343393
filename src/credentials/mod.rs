//! Credential supply.
//!
//! The client needs a username, a password and the account number to read.
//! They come from a [`CredentialStore`] chosen in the `[credentials]` table
//! of the config file:
//!
//! ```toml
//! [credentials]
//! backend = "pass"
//! path = "bank/kbank"
//!
//! [credentials.fields]
//! account_no = "account"
//! ```

mod config;
mod env;
mod pass;

pub use config::CredentialConfig;
pub use env::EnvCredentialStore;
pub use pass::{PassConfig, PassCredentialStore};

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::models::AccountNumber;
use crate::sync::kbank::KBankError;

/// Logical key for the login name.
pub const USERNAME: &str = "username";
/// Logical key for the password.
pub const PASSWORD: &str = "password";
/// Logical key for the ten-digit account number.
pub const ACCOUNT_NO: &str = "account_no";

/// A read-only key-value source of secrets.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Retrieve a credential by logical key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist and `Err` if the backend
    /// could not be read.
    async fn get(&self, key: &str) -> Result<Option<SecretString>>;
}

/// Everything needed to log in and pick the statement account.
///
/// Immutable once built. `Debug` never shows the password.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub account_no: AccountNumber,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        account_no: impl Into<String>,
    ) -> Result<Self, KBankError> {
        Ok(Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            account_no: AccountNumber::parse(account_no)?,
        })
    }

    /// Load and validate all three values from `store`.
    pub async fn from_store(store: &dyn CredentialStore) -> Result<Self> {
        let username = required(store, USERNAME).await?;
        let password = required(store, PASSWORD).await?;
        let account_no = required(store, ACCOUNT_NO).await?;

        Ok(Self {
            username: username.expose_secret().to_string(),
            password,
            account_no: AccountNumber::parse(account_no.expose_secret())?,
        })
    }
}

async fn required(store: &dyn CredentialStore, key: &str) -> Result<SecretString> {
    store
        .get(key)
        .await
        .with_context(|| format!("Failed to read credential {key:?}"))?
        .with_context(|| format!("Missing credential {key:?}"))
}
