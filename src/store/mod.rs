//! The state store contract (SPEC_FULL.md §4.1): the sole synchronization
//! primitive shared by every orchestrator/router process.

pub mod memory;
pub mod sea_orm;

use crate::domain::{ApiKey, Instance, InstanceStatus, ModelConfig};
use crate::error::Result;
use async_trait::async_trait;

pub use memory::MemoryStateStore;
pub use sea_orm::SeaOrmStateStore;

/// Filter applied to [`StateStore::list_instances`].
#[derive(Debug, Clone, Default)]
pub struct InstanceFilter {
    /// Restrict to a single model's instances.
    pub model: Option<String>,
    /// Restrict to a single lifecycle state. Terminated rows are only ever
    /// returned when this is explicitly `Some(Terminated)` (I3).
    pub status: Option<InstanceStatus>,
}

impl InstanceFilter {
    /// `(model=X, status=Y)`
    pub fn model_status(model: impl Into<String>, status: InstanceStatus) -> Self {
        Self {
            model: Some(model.into()),
            status: Some(status),
        }
    }

    /// `(status=Y)`, unfiltered by model.
    pub fn status(status: InstanceStatus) -> Self {
        Self {
            model: None,
            status: Some(status),
        }
    }
}

/// Partial update to an `Instance` row. `None` fields are left untouched —
/// the store must never round-trip a whole record, or a concurrent writer's
/// update could be clobbered (SPEC_FULL.md §9, "dictionary payloads").
#[derive(Debug, Clone, Default)]
pub struct InstanceUpdate {
    /// New lifecycle status.
    pub status: Option<InstanceStatus>,
    /// New compute backend node id.
    pub provider_instance_id: Option<String>,
    /// New network address.
    pub ip: Option<String>,
    /// New `last_request_at` epoch seconds.
    pub last_request_at: Option<i64>,
}

impl InstanceUpdate {
    /// Update only `status`.
    pub fn status(status: InstanceStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// The state store contract. Every method races against peer processes
/// through the same backing store; only [`StateStore::put_instance_if_absent`]
/// provides cross-process mutual exclusion.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Point read by `instance_id`.
    async fn get_instance(&self, id: &str) -> Result<Option<Instance>>;

    /// Indexed listing by `(model, status)`; supports the filters
    /// `(model, status)`, `(model)`, `(status)`, and unfiltered.
    async fn list_instances(&self, filter: InstanceFilter) -> Result<Vec<Instance>>;

    /// Unconditional upsert.
    async fn put_instance(&self, instance: Instance) -> Result<()>;

    /// Succeeds (returns `true`) iff no row with the same `instance_id`
    /// exists. Never fails on contention; contention is reported as `false`.
    async fn put_instance_if_absent(&self, instance: Instance) -> Result<bool>;

    /// Partial update; creates no row if `id` is absent.
    async fn update_instance(&self, id: &str, update: InstanceUpdate) -> Result<()>;

    /// Delete by `instance_id`. A no-op if already absent.
    async fn delete_instance(&self, id: &str) -> Result<()>;

    /// Point read by model name.
    async fn get_model_config(&self, name: &str) -> Result<Option<ModelConfig>>;

    /// Unconditional upsert, used by the `/api/models` seeding surface.
    async fn put_model_config(&self, config: ModelConfig) -> Result<()>;

    /// Every configured model, in no particular order.
    async fn list_model_configs(&self) -> Result<Vec<ModelConfig>>;

    /// Point read by `key_hash`.
    async fn get_api_key(&self, key_hash: &str) -> Result<Option<ApiKey>>;

    /// Unconditional upsert.
    async fn put_api_key(&self, key: ApiKey) -> Result<()>;

    /// Delete by `key_hash`. A no-op if already absent.
    async fn delete_api_key(&self, key_hash: &str) -> Result<()>;

    /// Every key owned by `email`, in no particular order (callers sort).
    async fn list_api_keys(&self, email: &str) -> Result<Vec<ApiKey>>;

    /// Bump `last_used_at` on a successful `validate_api_key`. A no-op if the
    /// row is absent (the caller already checked existence).
    async fn update_api_key_last_used(&self, key_hash: &str, ts: i64) -> Result<()>;
}
