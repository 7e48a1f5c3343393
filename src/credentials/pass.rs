//! Password-store (pass) credential backend.
//!
//! The first line of the entry is the password; further lines are read as
//! `field-name: value`.

use std::collections::HashMap;
use std::process::Command;

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::CredentialStore;

/// Configuration for a pass credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassConfig {
    /// The pass entry path (e.g., "bank/kbank").
    pub path: String,

    /// Mapping from logical key names to field names in the pass entry.
    /// Unmapped keys are looked up under their own name.
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

/// Credential store backed by one pass entry.
pub struct PassCredentialStore {
    config: PassConfig,
}

impl PassCredentialStore {
    pub fn new(config: PassConfig) -> Self {
        Self { config }
    }

    fn field_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.config
            .fields
            .get(key)
            .map(String::as_str)
            .unwrap_or(key)
    }

    fn read_entry(&self) -> Result<HashMap<String, String>> {
        let output = Command::new("pass")
            .arg("show")
            .arg(&self.config.path)
            .output()
            .context("Failed to run pass command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("pass command failed: {}", stderr.trim());
        }

        let content = String::from_utf8(output.stdout).context("Invalid UTF-8 in pass output")?;
        Ok(parse_entry(&content))
    }
}

#[async_trait]
impl CredentialStore for PassCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<SecretString>> {
        let field = self.field_name(key).to_string();
        let mut entry = self.read_entry()?;
        Ok(entry.remove(&field).map(SecretString::from))
    }
}

/// Fields of a pass entry; the first line is exposed as `password`.
fn parse_entry(content: &str) -> HashMap<String, String> {
    let mut lines = content.lines();
    let mut fields = HashMap::new();

    if let Some(first) = lines.next() {
        fields.insert("password".to_string(), first.to_string());
    }
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            fields.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_is_password_and_rest_are_fields() {
        let fields = parse_entry("s3cret\nusername: somchai\naccount: 123-4-56789-0\n");
        assert_eq!(fields.get("password").map(String::as_str), Some("s3cret"));
        assert_eq!(fields.get("username").map(String::as_str), Some("somchai"));
        assert_eq!(fields.get("account").map(String::as_str), Some("123-4-56789-0"));
    }

    #[test]
    fn lines_without_separator_are_ignored() {
        let fields = parse_entry("pw\nnotes go here\n");
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn field_mapping_falls_back_to_key() {
        let store = PassCredentialStore::new(PassConfig {
            path: "bank/kbank".to_string(),
            fields: HashMap::from([("account_no".to_string(), "account".to_string())]),
        });
        assert_eq!(store.field_name("account_no"), "account");
        assert_eq!(store.field_name("username"), "username");
    }
}
