//! HTTP server core: `App` assembly and the bind/run loop.

use crate::compute::ComputeBackend;
use crate::config::{Config, ServerConfig};
use crate::error::{OrchestratorError, Result};
use crate::monitoring::background::start_reaper;
use crate::orchestrator::Orchestrator;
use crate::server::handlers::health_check;
use crate::server::middleware::BearerAuth;
use crate::server::routes;
use crate::server::state::AppState;
use crate::store::{MemoryStateStore, SeaOrmStateStore, StateStore};
use actix_cors::Cors;
use actix_web::{App, HttpServer as ActixHttpServer, middleware::DefaultHeaders, web};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;

/// Owns the bound application state; `start()` consumes it to run forever.
pub struct HttpServer {
    config: ServerConfig,
    state: AppState,
}

impl HttpServer {
    /// Build the store, orchestrator and app state from `config`, start the
    /// background reaper, and wire up the server (not yet bound/listening).
    pub async fn new(config: &Config, compute: Arc<dyn ComputeBackend>) -> Result<Self> {
        info!("assembling control plane server");

        let store: Arc<dyn StateStore> = match &config.store {
            crate::config::StoreConfig::Memory => Arc::new(MemoryStateStore::new()),
            crate::config::StoreConfig::Database { database_url } => {
                Arc::new(SeaOrmStateStore::connect(database_url).await?)
            }
        };

        let orchestrator = Arc::new(Orchestrator::new(
            store.clone(),
            compute,
            config.orchestrator.settings(),
        ));

        start_reaper(orchestrator.clone(), config.orchestrator.reap_interval_secs);

        let state = AppState::new(config.clone(), store, orchestrator);

        Ok(Self {
            config: config.server.clone(),
            state,
        })
    }

    fn create_app(
        state: web::Data<AppState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let cors_config = state.config.server.cors.clone();
        let mut cors = Cors::default();
        if cors_config.enabled {
            if cors_config.allows_all_origins() {
                cors = cors.allow_any_origin();
            } else {
                for origin in &cors_config.allowed_origins {
                    cors = cors.allowed_origin(origin);
                }
            }
            let methods: Vec<actix_web::http::Method> = cors_config
                .allowed_methods
                .iter()
                .filter_map(|m| m.parse().ok())
                .collect();
            if !methods.is_empty() {
                cors = cors.allowed_methods(methods);
            }
            cors = cors.max_age(cors_config.max_age as usize);
        }

        App::new()
            .app_data(state)
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(DefaultHeaders::new().add(("Server", "diogenes")))
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("")
                    .wrap(BearerAuth)
                    .configure(routes::inference::configure_routes)
                    .configure(routes::keys::configure_routes)
                    .configure(routes::cluster::configure_routes)
                    .configure(routes::models::configure_routes),
            )
    }

    /// Bind and serve until the process is signalled to stop.
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.address();
        info!(addr = %bind_addr, "binding HTTP server");

        let state = web::Data::new(self.state);
        let workers = self.config.workers;

        let mut server = ActixHttpServer::new(move || Self::create_app(state.clone())).bind(&bind_addr).map_err(|e| {
            OrchestratorError::Config(format!("failed to bind {bind_addr}: {e}"))
        })?;
        if let Some(workers) = workers {
            server = server.workers(workers);
        }

        info!(addr = %bind_addr, "HTTP server listening");
        server
            .run()
            .await
            .map_err(|e| OrchestratorError::Internal(anyhow::anyhow!("server error: {e}")))?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// The effective server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The shared application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
