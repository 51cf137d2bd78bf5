//! Configuration loading: YAML file plus environment overrides, merged with
//! the file taking the base and the environment taking precedence (the same
//! `from_file` → `from_env` → `merge` shape the gateway this crate is
//! modeled on uses).

pub mod models;

pub use models::{CorsConfig, OrchestratorConfigModel, ServerConfig, StoreConfig};

use crate::error::{OrchestratorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Root configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// State store backend.
    #[serde(default)]
    pub store: StoreConfig,
    /// Orchestrator tuning.
    #[serde(default)]
    pub orchestrator: OrchestratorConfigModel,
}

impl Config {
    /// Load and validate a YAML config file.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| OrchestratorError::Config(format!("failed to read config file: {e}")))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| OrchestratorError::Config(format!("failed to parse config: {e}")))?;

        config.validate()?;
        debug!("configuration loaded from file");
        Ok(config)
    }

    /// Build configuration from `DIOGENES_*` environment variables, layered
    /// over defaults. Unset variables keep the default value.
    pub fn from_env() -> Result<Self> {
        info!("loading configuration from environment");
        let mut config = Config::default();

        if let Ok(host) = std::env::var("DIOGENES_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("DIOGENES_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| OrchestratorError::Config(format!("invalid DIOGENES_PORT: {port}")))?;
        }
        if let Ok(database_url) = std::env::var("DIOGENES_DATABASE_URL") {
            config.store = StoreConfig::Database { database_url };
        }

        config.validate()?;
        Ok(config)
    }

    /// `other` wins field-by-field where it diverges from default; used to
    /// layer environment overrides on top of a file-based config.
    pub fn merge(mut self, other: Self) -> Self {
        self.server = self.server.merge(other.server);
        if !matches!(other.store, StoreConfig::Memory) {
            self.store = other.store;
        }
        self.orchestrator = other.orchestrator;
        self
    }

    /// Validate every sub-section.
    pub fn validate(&self) -> Result<()> {
        self.server
            .validate()
            .map_err(|e| OrchestratorError::Config(format!("server config error: {e}")))?;
        self.server
            .cors
            .validate()
            .map_err(|e| OrchestratorError::Config(format!("cors config error: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[tokio::test]
    async fn loads_from_yaml_file() {
        let yaml = "server:\n  host: \"127.0.0.1\"\n  port: 9100\nstore:\n  backend: memory\n";
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).await.unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn merge_prefers_database_store_from_other() {
        let base = Config::default();
        let other = Config {
            store: StoreConfig::Database {
                database_url: "sqlite://diogenes.db?mode=rwc".to_string(),
            },
            ..Config::default()
        };
        let merged = base.merge(other);
        assert!(matches!(merged.store, StoreConfig::Database { .. }));
    }
}
