//! Shared application state handed to every HTTP handler.

use crate::auth::AuthSystem;
use crate::config::Config;
use crate::orchestrator::Orchestrator;
use crate::router::Router;
use crate::store::StateStore;
use std::sync::Arc;

/// Resources shared across handlers, cloned cheaply per-worker (everything
/// is `Arc`-wrapped).
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration (read-only after startup).
    pub config: Arc<Config>,
    /// API key issuance/validation.
    pub auth: Arc<AuthSystem>,
    /// Inference request routing and cold-start triggering.
    pub router: Arc<Router>,
    /// Scale-up/scale-down state machine, shared with the background reaper.
    pub orchestrator: Arc<Orchestrator>,
    /// Direct store access, for the cluster-state and model-seeding routes.
    pub store: Arc<dyn StateStore>,
    /// Shared client for the worker proxy hop, 120s request timeout
    /// (SPEC_FULL.md §4.3). Reused across requests rather than built
    /// per-call, so connections to warm workers are pooled.
    pub proxy_client: reqwest::Client,
}

/// `proxy`'s per-request timeout to the worker (SPEC_FULL.md §4.3).
const PROXY_TIMEOUT_SECS: u64 = 120;

impl AppState {
    /// Assemble application state from its already-constructed parts.
    pub fn new(
        config: Config,
        store: Arc<dyn StateStore>,
        orchestrator: Arc<Orchestrator>,
    ) -> Self {
        let auth = Arc::new(AuthSystem::new(store.clone()));
        let router = Arc::new(Router::new(store.clone(), orchestrator.clone()));
        let proxy_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(PROXY_TIMEOUT_SECS))
            .build()
            .expect("proxy client configuration is valid");
        Self {
            config: Arc::new(config),
            auth,
            router,
            orchestrator,
            store,
            proxy_client,
        }
    }
}
