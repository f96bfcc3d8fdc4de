//! TOML-based configuration system for Warden.

use crate::error::{Result, WardenError};
use crate::models::ca::CaConfiguration;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Client-side timeout applied to every directory call unless configured otherwise.
pub const DEFAULT_DIRECTORY_TIMEOUT_SECS: u64 = 15;

/// Top-level Warden configuration, deserialized from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub ca: CaConfiguration,
}

/// Directory service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// LDAP URL of a domain controller, e.g. `ldaps://dc01.example.com:636`.
    pub server: String,
    /// Global catalog URL used for forest-wide lookups.
    /// Defaults to `ldap://<forest_root>:3268` when unset.
    #[serde(default)]
    pub global_catalog: Option<String>,
    /// DNS name of the forest root domain.
    pub forest_root: String,
    #[serde(default)]
    pub bind_dn: String,
    #[serde(default)]
    pub bind_password: String,
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_tls_verify() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_DIRECTORY_TIMEOUT_SECS
}

impl DirectoryConfig {
    /// The global catalog URL for `forest_root`, used when none is configured.
    pub fn global_catalog_url(&self, forest_root: &str) -> String {
        match self.global_catalog {
            Some(ref url) => url.clone(),
            None => format!("ldap://{forest_root}:3268"),
        }
    }
}

impl WardenConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| WardenError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Validate the configuration, returning an error for invalid combinations.
    pub fn validate(&self) -> Result<()> {
        if self.directory.server.is_empty() {
            return Err(WardenError::Config(
                "directory.server must not be empty".into(),
            ));
        }

        if !self.directory.server.starts_with("ldap://")
            && !self.directory.server.starts_with("ldaps://")
        {
            return Err(WardenError::Config(format!(
                "directory.server must be an ldap:// or ldaps:// URL, got {}",
                self.directory.server
            )));
        }

        if self.directory.forest_root.is_empty() {
            return Err(WardenError::Config(
                "directory.forest_root must not be empty".into(),
            ));
        }

        if self.directory.timeout_secs == 0 {
            return Err(WardenError::Config(
                "directory.timeout_secs must be greater than zero".into(),
            ));
        }

        if !self.directory.bind_dn.is_empty() && self.directory.bind_password.is_empty() {
            return Err(WardenError::Config(
                "directory.bind_password is required when bind_dn is set".into(),
            ));
        }

        Ok(())
    }

    /// Generate a sensible default configuration.
    pub fn generate_default() -> Self {
        Self {
            directory: DirectoryConfig {
                server: "ldaps://dc01.example.com:636".into(),
                global_catalog: None,
                forest_root: "example.com".into(),
                bind_dn: String::new(),
                bind_password: String::new(),
                tls_verify: true,
                timeout_secs: DEFAULT_DIRECTORY_TIMEOUT_SECS,
            },
            ca: CaConfiguration::default(),
        }
    }
}
