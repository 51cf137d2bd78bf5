//! Request-time routing: which instance serves a model, and the
//! fire-and-forget cold-start trigger (SPEC_FULL.md §4.3).

use crate::domain::{Instance, InstanceStatus, ModelConfig};
use crate::error::{OrchestratorError, Result};
use crate::orchestrator::Orchestrator;
use crate::store::{InstanceFilter, StateStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything the inference route handlers need: the store for the
/// ready-instance lookup, and a trigger for the cold-start side effect.
pub struct Router {
    store: Arc<dyn StateStore>,
    orchestrator: Arc<Orchestrator>,
}

/// The outcome of [`Router::route`]: either a ready instance to proxy to,
/// or cold-start has been triggered and the caller should respond 503.
pub enum RouteOutcome {
    /// A healthy instance to proxy the request to.
    Ready(Instance),
    /// No ready instance; `scaleUp` has been dispatched in the background.
    ColdStarting,
}

impl Router {
    /// Build a router over `store`, dispatching cold starts through
    /// `orchestrator`.
    pub fn new(store: Arc<dyn StateStore>, orchestrator: Arc<Orchestrator>) -> Self {
        Self { store, orchestrator }
    }

    /// Resolve `model` to a ready instance, or trigger cold start.
    ///
    /// Mirrors `handleInference`'s routing half: looks for a `ready`
    /// instance and on a miss fires `scaleUp` without awaiting it
    /// (SPEC_FULL.md §4.3, `triggerScaleUp`). Deliberately does *not* check
    /// whether `model` is configured — an unknown model just has no ready
    /// instances, so it cold-starts and `scaleUp` fails with `UnknownModel`
    /// on its own, in the background. `UnknownModel`'s 400 is scoped to the
    /// cluster API (SPEC_FULL.md §7), not this path.
    pub async fn route(&self, model: &str) -> Result<RouteOutcome> {
        if model.is_empty() {
            return Err(OrchestratorError::InvalidInput("model must not be empty".to_string()));
        }

        let ready = self
            .store
            .list_instances(InstanceFilter::model_status(model, InstanceStatus::Ready))
            .await?;

        if let Some(instance) = ready.into_iter().next() {
            return Ok(RouteOutcome::Ready(instance));
        }

        self.trigger_scale_up(model);
        Ok(RouteOutcome::ColdStarting)
    }

    /// Fire-and-forget cold start. Production wiring spawns a detached task;
    /// the orchestrator's own idempotency (fast-path + optimistic claim)
    /// makes repeated triggers for the same model harmless.
    fn trigger_scale_up(&self, model: &str) {
        let orchestrator = self.orchestrator.clone();
        let model = model.to_string();
        tokio::spawn(async move {
            info!(model = %model, "cold start triggered");
            if let Err(e) = orchestrator.scale_up(&model).await {
                warn!(model = %model, error = %e, "background scale-up failed");
            }
        });
    }

    /// Every configured model, for `GET /v1/models`.
    pub async fn list_models(&self) -> Result<Vec<ModelConfig>> {
        self.store.list_model_configs().await
    }

    /// Record that `instance` just served a request, so `scaleDown`'s idle
    /// clock resets (SPEC_FULL.md §4.3, `updateInstance(last_request_at)`).
    pub async fn touch(&self, instance_id: &str, now: i64) -> Result<()> {
        self.store
            .update_instance(
                instance_id,
                crate::store::InstanceUpdate {
                    last_request_at: Some(now),
                    ..Default::default()
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::MockComputeBackend;
    use crate::orchestrator::OrchestratorSettings;
    use crate::store::MemoryStateStore;

    async fn router_over(store: Arc<MemoryStateStore>) -> Router {
        let compute = Arc::new(MockComputeBackend::new());
        let orchestrator = Arc::new(Orchestrator::new(store.clone(), compute, OrchestratorSettings::default()));
        Router::new(store, orchestrator)
    }

    #[tokio::test]
    async fn route_cold_starts_an_unconfigured_model_instead_of_rejecting() {
        // No config lookup on the inference path (SPEC_FULL.md §4.3 step 2):
        // an unknown model just has nothing ready, so it cold-starts. The
        // background `scaleUp` is the one that eventually fails with
        // `UnknownModel`, not `route` itself.
        let store = Arc::new(MemoryStateStore::new());
        let router = router_over(store).await;

        match router.route("nope").await.unwrap() {
            RouteOutcome::ColdStarting => {}
            RouteOutcome::Ready(_) => panic!("nothing should be ready for an unconfigured model"),
        }
    }

    #[tokio::test]
    async fn route_returns_ready_instance_without_triggering_cold_start() {
        let store = Arc::new(MemoryStateStore::new());
        store
            .put_model_config(ModelConfig {
                name: "m".to_string(),
                instance_type: "g5.xlarge".to_string(),
                vllm_args: String::new(),
                idle_timeout: None,
            })
            .await
            .unwrap();
        let mut ready = Instance::claim_placeholder("m", "g5.xlarge", 1_000);
        ready.status = InstanceStatus::Ready;
        store.put_instance(ready).await.unwrap();

        let router = router_over(store).await;
        match router.route("m").await.unwrap() {
            RouteOutcome::Ready(instance) => assert_eq!(instance.model, "m"),
            RouteOutcome::ColdStarting => panic!("expected a ready instance"),
        }
    }

    #[tokio::test]
    async fn route_triggers_cold_start_when_no_instance_is_ready() {
        let store = Arc::new(MemoryStateStore::new());
        store
            .put_model_config(ModelConfig {
                name: "m".to_string(),
                instance_type: "g5.xlarge".to_string(),
                vllm_args: String::new(),
                idle_timeout: None,
            })
            .await
            .unwrap();

        let router = router_over(store.clone()).await;
        match router.route("m").await.unwrap() {
            RouteOutcome::ColdStarting => {}
            RouteOutcome::Ready(_) => panic!("nothing should be ready yet"),
        }
    }
}
