//! The per-model instance lifecycle state machine (SPEC_FULL.md §4.2).
//!
//! `scaleUp` cold-starts a model with at-most-one concurrent launch per
//! model, enforced by an optimistic conditional write against the shared
//! `StateStore`. `scaleDown` reaps instances idle past their model's
//! `idle_timeout`. Both are store-agnostic: this struct only ever talks to
//! `dyn StateStore` and `dyn ComputeBackend`.

pub mod clock;

use crate::compute::ComputeBackend;
use crate::domain::{Instance, InstanceStatus, slot_id};
use crate::error::{OrchestratorError, Result};
use crate::store::{InstanceFilter, InstanceUpdate, StateStore};
use clock::{Clock, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Wall-clock budget for [`Orchestrator::poll_health`] (SPEC_FULL.md §4.2).
pub const DEFAULT_POLL_HEALTH_TIMEOUT_SECS: u64 = 800;
/// Interval between health probes.
pub const DEFAULT_POLL_HEALTH_INTERVAL_SECS: u64 = 10;
/// Per-probe HTTP timeout.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;
/// Port the worker's `/health` and `/v1/*` endpoints are reached on.
pub const DEFAULT_WORKER_PORT: u16 = 8000;

/// Tunable knobs for the orchestrator, normally sourced from
/// [`crate::config::OrchestratorConfig`].
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    /// Wall-clock deadline for the health gate.
    pub poll_health_timeout_secs: u64,
    /// Interval between health probes.
    pub poll_health_interval_secs: u64,
    /// Per-probe HTTP timeout.
    pub probe_timeout_secs: u64,
    /// Port the worker is reached on.
    pub worker_port: u16,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            poll_health_timeout_secs: DEFAULT_POLL_HEALTH_TIMEOUT_SECS,
            poll_health_interval_secs: DEFAULT_POLL_HEALTH_INTERVAL_SECS,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            worker_port: DEFAULT_WORKER_PORT,
        }
    }
}

/// Owns the instance state machine for every model.
pub struct Orchestrator {
    store: Arc<dyn StateStore>,
    compute: Arc<dyn ComputeBackend>,
    http: reqwest::Client,
    clock: Arc<dyn Clock>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    /// Build an orchestrator with the real system clock.
    pub fn new(
        store: Arc<dyn StateStore>,
        compute: Arc<dyn ComputeBackend>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self::with_clock(store, compute, settings, Arc::new(SystemClock))
    }

    /// Build an orchestrator with an injected clock, for deterministic tests.
    pub fn with_clock(
        store: Arc<dyn StateStore>,
        compute: Arc<dyn ComputeBackend>,
        settings: OrchestratorSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            compute,
            http: reqwest::Client::new(),
            clock,
            settings,
        }
    }

    fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Instances for `model` currently occupying the slot (`starting` or
    /// `ready`). Used by `scaleUp`'s fast path and by its claim-loser branch.
    async fn live_instances(&self, model: &str) -> Result<Vec<Instance>> {
        let mut starting = self
            .store
            .list_instances(InstanceFilter::model_status(model, InstanceStatus::Starting))
            .await?;
        let mut ready = self
            .store
            .list_instances(InstanceFilter::model_status(model, InstanceStatus::Ready))
            .await?;
        starting.append(&mut ready);
        Ok(starting)
    }

    /// An orphaned `starting` row: the process that claimed it died before
    /// transitioning to `ready`/`terminated`. Not in the distilled spec —
    /// SPEC_FULL.md §9 flags this open question and resolves it with this
    /// age-out so a dead claim doesn't block the model forever.
    fn is_orphaned(&self, inst: &Instance) -> bool {
        inst.status == InstanceStatus::Starting
            && self.now() - inst.launched_at > 2 * self.settings.poll_health_timeout_secs as i64
    }

    /// Idempotent cold-start. See SPEC_FULL.md §4.2 for the numbered steps;
    /// the comments below point back at each one.
    pub async fn scale_up(&self, model_name: &str) -> Result<Instance> {
        let slot = slot_id(model_name);

        // Step 1: fast-path idempotency, with the orphan age-out folded in.
        let live = self.live_instances(model_name).await?;
        if let Some(existing) = live.into_iter().next() {
            if !self.is_orphaned(&existing) {
                return Ok(existing);
            }
            warn!(model = model_name, slot = %slot, "orphaned starting row aged out, reclaiming slot");
            self.store.update_instance(&slot, InstanceUpdate::status(InstanceStatus::Terminated)).await?;
            self.store.delete_instance(&slot).await?;
        }

        // Step 2: tombstone cleanup. Delete-then-claim, never claim-then-delete
        // (SPEC_FULL.md §9) so a peer's live claim is never torn down.
        let tombstones = self
            .store
            .list_instances(InstanceFilter::model_status(model_name, InstanceStatus::Terminated))
            .await?;
        for tombstone in tombstones {
            self.store.delete_instance(&tombstone.instance_id).await?;
        }

        // Step 3: config lookup.
        let config = self
            .store
            .get_model_config(model_name)
            .await?
            .ok_or_else(|| OrchestratorError::UnknownModel(model_name.to_string()))?;

        // Step 4: optimistic claim.
        let now = self.now();
        let placeholder = Instance::claim_placeholder(model_name, &config.instance_type, now);
        let won = self.store.put_instance_if_absent(placeholder.clone()).await?;
        if !won {
            info!(model = model_name, slot = %slot, "claim lost, another actor is provisioning");
            let live = self.live_instances(model_name).await?;
            return Ok(live.into_iter().next().unwrap_or(placeholder));
        }
        info!(model = model_name, slot = %slot, "claim won, provisioning");

        // Step 5: provision.
        let launched = match self.compute.launch(&config.instance_type, &config.vllm_args).await {
            Ok(launched) => launched,
            Err(e) => {
                warn!(model = model_name, slot = %slot, error = %e, "launch failed");
                self.store
                    .update_instance(&slot, InstanceUpdate::status(InstanceStatus::Terminated))
                    .await?;
                return Err(OrchestratorError::ProvisioningFailure(e.to_string()));
            }
        };
        self.store
            .update_instance(
                &slot,
                InstanceUpdate {
                    provider_instance_id: Some(launched.provider_instance_id.clone()),
                    ip: Some(launched.ip.clone()),
                    ..Default::default()
                },
            )
            .await?;

        // Step 6: health gate.
        let healthy = self
            .poll_health(&launched.ip, self.settings.worker_port)
            .await;

        // Step 7: finalize.
        if healthy {
            info!(model = model_name, slot = %slot, "health check passed, instance ready");
            self.store
                .update_instance(
                    &slot,
                    InstanceUpdate {
                        status: Some(InstanceStatus::Ready),
                        last_request_at: Some(self.now()),
                        ..Default::default()
                    },
                )
                .await?;
        } else {
            warn!(model = model_name, slot = %slot, "health check timed out, terminating");
            self.compute.terminate(&launched.provider_instance_id).await?;
            self.store
                .update_instance(&slot, InstanceUpdate::status(InstanceStatus::Terminated))
                .await?;
        }

        Ok(self
            .store
            .get_instance(&slot)
            .await?
            .expect("slot written by this call"))
    }

    /// `GET http://ip:port/health`, polling every `poll_health_interval_secs`
    /// until a 200 response or the wall-clock deadline expires. Probe errors
    /// (including timeouts) are swallowed and retried; the loop itself never
    /// returns an error, only `false` on expiry.
    async fn poll_health(&self, ip: &str, port: u16) -> bool {
        let url = format!("http://{ip}:{port}/health");
        let deadline = self.now() + self.settings.poll_health_timeout_secs as i64;
        loop {
            let probe = self
                .http
                .get(&url)
                .timeout(Duration::from_secs(self.settings.probe_timeout_secs))
                .send()
                .await;
            if let Ok(resp) = probe {
                if resp.status().as_u16() == 200 {
                    return true;
                }
            }
            if self.now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_secs(self.settings.poll_health_interval_secs)).await;
        }
    }

    /// Periodic reaping, driven by an external timer (see
    /// [`crate::monitoring::background`]). Returns the slot ids terminated.
    pub async fn scale_down(&self) -> Result<Vec<String>> {
        let ready = self
            .store
            .list_instances(InstanceFilter::status(InstanceStatus::Ready))
            .await?;

        let mut reaped = Vec::new();
        for inst in ready {
            let idle_timeout = self.idle_timeout_for(&inst.model).await?;
            let now = self.now();
            if inst.idle_seconds(now) <= idle_timeout {
                continue;
            }

            info!(model = %inst.model, slot = %inst.instance_id, idle = inst.idle_seconds(now), "reaping idle instance");

            // Publish intent before the side effect so a concurrent router
            // listing (model, status=ready) never observes a node mid-teardown.
            self.store
                .update_instance(&inst.instance_id, InstanceUpdate::status(InstanceStatus::Draining))
                .await?;

            let terminate_target = inst
                .provider_instance_id
                .as_deref()
                .unwrap_or(&inst.instance_id);
            self.compute.terminate(terminate_target).await?;

            self.store
                .update_instance(&inst.instance_id, InstanceUpdate::status(InstanceStatus::Terminated))
                .await?;

            reaped.push(inst.instance_id);
        }
        Ok(reaped)
    }

    /// Force-reap `model`'s live instance (ready or starting) regardless of
    /// idle time, for the operator-facing `POST /api/cluster/scale {action:
    /// "down"}` surface (SPEC_FULL.md §6). Unlike `scale_down`'s sweep, this
    /// is a single targeted terminate and is not gated by `idle_timeout`.
    pub async fn scale_down_model(&self, model: &str) -> Result<Option<String>> {
        let live = self.live_instances(model).await?;
        let Some(inst) = live.into_iter().next() else {
            return Ok(None);
        };

        self.store
            .update_instance(&inst.instance_id, InstanceUpdate::status(InstanceStatus::Draining))
            .await?;

        if let Some(provider_id) = &inst.provider_instance_id {
            self.compute.terminate(provider_id).await?;
        }

        self.store
            .update_instance(&inst.instance_id, InstanceUpdate::status(InstanceStatus::Terminated))
            .await?;

        Ok(Some(inst.instance_id))
    }

    async fn idle_timeout_for(&self, model: &str) -> Result<i64> {
        Ok(self
            .store
            .get_model_config(model)
            .await?
            .map(|c| c.idle_timeout_secs())
            .unwrap_or(crate::domain::DEFAULT_IDLE_TIMEOUT_SECS))
    }
}
