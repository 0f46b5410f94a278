//! Configuration loading and management

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.json";

/// Settings read from `<data-path>/config.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP Basic credentials required on every request
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_password")]
    pub password: String,

    /// Realm advertised in the `WWW-Authenticate` challenge
    #[serde(default = "default_realm")]
    pub realm: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
            realm: default_realm(),
        }
    }
}

fn default_username() -> String {
    "username".to_string()
}

fn default_password() -> String {
    "password".to_string()
}

fn default_realm() -> String {
    "Authorization Required".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("auth username must not be empty")]
    EmptyUsername,
    #[error("auth password must not be empty")]
    EmptyPassword,
}

impl Config {
    /// Read `config.json` from the data directory shared with `notes.json`.
    ///
    /// A missing file yields the defaults, which are written back so the
    /// credentials in use are visible on disk.
    pub fn load(data_path: &Path) -> Result<Self> {
        let config_file = data_path.join(CONFIG_FILE);

        match std::fs::read_to_string(&config_file) {
            Ok(content) => {
                let config = serde_json::from_str(&content)
                    .with_context(|| format!("Malformed {:?}", config_file))?;
                tracing::info!("Using credentials from {:?}", config_file);
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Config::default();
                std::fs::create_dir_all(data_path)
                    .with_context(|| format!("Cannot create data directory {:?}", data_path))?;
                std::fs::write(&config_file, serde_json::to_string_pretty(&config)?)
                    .with_context(|| format!("Cannot write {:?}", config_file))?;
                tracing::info!("Wrote default credentials to {:?}", config_file);
                Ok(config)
            }
            Err(e) => Err(e).with_context(|| format!("Cannot read {:?}", config_file)),
        }
    }

    /// Apply command-line / environment overrides on top of the file values
    pub fn with_overrides(mut self, username: Option<String>, password: Option<String>) -> Self {
        if let Some(username) = username {
            self.auth.username = username;
        }
        if let Some(password) = password {
            self.auth.password = password;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.username.is_empty() {
            return Err(ConfigError::EmptyUsername);
        }
        if self.auth.password.is_empty() {
            return Err(ConfigError::EmptyPassword);
        }
        Ok(())
    }
}
