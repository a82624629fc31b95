//! TOML-based configuration system for Keywarden.

use crate::error::{KeywardenError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level Keywarden configuration, deserialized from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywardenConfig {
    pub keywarden: KeywardenSection,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Target realm settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywardenSection {
    /// Base URL of the Keycloak server, e.g. `https://sso.example.com`.
    pub server_url: String,
    /// Realm whose users and clients are administered.
    pub realm: String,
}

/// Admin credentials for the OAuth password grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// OAuth client used for the token request.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Client secret, only needed for confidential admin clients.
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            client_id: default_client_id(),
            client_secret: None,
        }
    }
}

fn default_client_id() -> String {
    "admin-cli".into()
}

impl KeywardenConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| KeywardenError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Validate the configuration, returning an error for invalid combinations.
    pub fn validate(&self) -> Result<()> {
        if self.keywarden.server_url.is_empty() {
            return Err(KeywardenError::Config(
                "keywarden.server_url must not be empty".into(),
            ));
        }

        if self.keywarden.realm.is_empty() {
            return Err(KeywardenError::Config(
                "keywarden.realm must not be empty".into(),
            ));
        }

        if self.auth.username.is_empty() {
            return Err(KeywardenError::Config(
                "auth.username must not be empty".into(),
            ));
        }

        if self.auth.password.is_empty() {
            return Err(KeywardenError::Config(
                "auth.password must not be empty".into(),
            ));
        }

        Ok(())
    }
}
