//! `ServerBuilder` and the `run_server` convenience entrypoint used by `main`.

use crate::compute::ComputeBackend;
use crate::config::Config;
use crate::error::{OrchestratorError, Result};
use crate::server::server::HttpServer;
use std::sync::Arc;
use tracing::info;

/// Fluent construction of an [`HttpServer`].
#[derive(Default)]
pub struct ServerBuilder {
    config: Option<Config>,
    compute: Option<Arc<dyn ComputeBackend>>,
}

impl ServerBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` instead of loading one at `build()` time.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// The compute backend the orchestrator provisions nodes through.
    pub fn with_compute(mut self, compute: Arc<dyn ComputeBackend>) -> Self {
        self.compute = Some(compute);
        self
    }

    /// Assemble the server. Requires a compute backend; config falls back
    /// to [`Config::default`].
    pub async fn build(self) -> Result<HttpServer> {
        let config = self.config.unwrap_or_default();
        let compute = self
            .compute
            .ok_or_else(|| OrchestratorError::Config("compute backend is required".to_string()))?;
        HttpServer::new(&config, compute).await
    }
}

/// Load configuration (file, falling back to environment, falling back to
/// defaults) and run the server until it stops.
pub async fn run_server(compute: Arc<dyn ComputeBackend>) -> Result<()> {
    info!("starting diogenes control plane");

    let config_path = "config/diogenes.yaml";
    let config = match Config::from_file(config_path).await {
        Ok(config) => {
            info!(path = config_path, "configuration file loaded");
            config
        }
        Err(e) => {
            info!(error = %e, "no usable configuration file, falling back to environment/defaults");
            Config::from_env().unwrap_or_default()
        }
    };

    let server = HttpServer::new(&config, compute).await?;
    info!(
        host = %server.config().host,
        port = server.config().port,
        "server assembled"
    );
    server.start().await
}
