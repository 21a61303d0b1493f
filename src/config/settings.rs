use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::git::repository::{RepositoryEntry, RepositorySnapshot};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub repositories: Vec<RepositoryEntry>,
}

/// Process-wide limits applied to every invocation
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GatewaySettings {
    pub timeout_ms: u64,
    pub max_output_bytes: usize,
    pub max_command_length: usize,
    pub git_binary: String,
}

impl GatewaySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_output_bytes: 10 * 1024 * 1024,
            max_command_length: 1000,
            git_binary: "git".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::DirectoryNotFound)?;
        Ok(home.join(".config").join("shadowgit-gateway"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ReadError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Config file not found: {}", path.display()),
            )));
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        // Set permissions to 600 (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Config {
            gateway: GatewaySettings::default(),
            audit: AuditConfig::default(),
            repositories: Vec::new(),
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.gateway.max_output_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "max_output_bytes must be greater than 0".to_string(),
            ));
        }

        if self.gateway.max_command_length == 0 {
            return Err(ConfigError::InvalidValue(
                "max_command_length must be greater than 0".to_string(),
            ));
        }

        if self.gateway.git_binary.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "git_binary must not be empty".to_string(),
            ));
        }

        for (index, repo) in self.repositories.iter().enumerate() {
            if repo.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "repository #{} has an empty name",
                    index + 1
                )));
            }
            if repo.path.trim().is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "repository '{}' has an empty path",
                    repo.name
                )));
            }
        }

        Ok(())
    }

    /// Path of the audit log, falling back to the config directory
    pub fn audit_log_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.audit.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("audit.log")),
        }
    }

    /// Freeze the repository list into the snapshot the gateway resolves against
    pub fn snapshot(&self) -> RepositorySnapshot {
        RepositorySnapshot::new(self.repositories.clone())
    }
}
