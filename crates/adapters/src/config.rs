//! Application configuration.
//!
//! Loaded once at startup from a YAML file (`FAENA_CONFIG` path, or
//! `faena.yaml` in the working directory) and validated before any
//! component is constructed.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use faena_core::{DomainError, GeneratorSettings, JobStrategy};

pub const CONFIG_PATH_ENV: &str = "FAENA_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "faena.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] DomainError),
}

/// Top-level configuration for the server and worker binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bus endpoint, e.g. `nats://localhost:4222`.
    pub broker: String,

    /// Persistence connection string, e.g. `sqlite://faena.db`.
    pub dsn: String,

    /// Root directory for fabricated file content.
    #[serde(default = "AppConfig::default_repository_path")]
    pub repository_path: String,

    pub generator: GeneratorSettings,

    pub job_strategy: JobStrategy,
}

impl AppConfig {
    fn default_repository_path() -> String {
        "var/files".to_string()
    }

    /// Load from `FAENA_CONFIG` or the default path.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    /// Load and validate a specific config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker.trim().is_empty() {
            return Err(DomainError::validation("broker must not be empty").into());
        }
        if self.dsn.trim().is_empty() {
            return Err(DomainError::validation("dsn must not be empty").into());
        }
        self.generator.validate()?;
        Ok(())
    }
}
