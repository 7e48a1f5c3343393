//! Environment-variable credential backend.

use anyhow::Result;
use async_trait::async_trait;
use secrecy::SecretString;

use super::CredentialStore;

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads `<PREFIX>_<KEY>` variables, e.g. `KBANK_USERNAME`,
/// `KBANK_PASSWORD` and `KBANK_ACCOUNT_NO`.
pub struct EnvCredentialStore {
    prefix: String,
    lookup: Lookup,
}

impl EnvCredentialStore {
    pub const DEFAULT_PREFIX: &'static str = "KBANK";

    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_lookup(prefix, |name| std::env::var(name).ok())
    }

    /// Use `lookup` instead of the process environment.
    pub fn with_lookup(
        prefix: impl Into<String>,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            lookup: Box::new(lookup),
        }
    }

    fn var_name(&self, key: &str) -> String {
        format!("{}_{}", self.prefix, key.to_ascii_uppercase())
    }
}

impl Default for EnvCredentialStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<SecretString>> {
        Ok((self.lookup)(&self.var_name(key))
            .filter(|v| !v.is_empty())
            .map(SecretString::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn maps_keys_to_prefixed_uppercase_names() -> Result<()> {
        let store = EnvCredentialStore::with_lookup("BANK", |name| {
            (name == "BANK_ACCOUNT_NO").then(|| "1234567890".to_string())
        });

        let value = store.get("account_no").await?.expect("present");
        assert_eq!(value.expose_secret(), "1234567890");
        assert!(store.get("username").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn empty_values_count_as_missing() -> Result<()> {
        let store = EnvCredentialStore::with_lookup("KBANK", |_| Some(String::new()));
        assert!(store.get("password").await?.is_none());
        Ok(())
    }
}
