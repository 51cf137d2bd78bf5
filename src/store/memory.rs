//! In-process `StateStore`, backed by `dashmap`.
//!
//! Used as the zero-dependency default and in every unit/integration test.
//! `put_instance_if_absent` is the one primitive that must be atomic: it is
//! implemented via `DashMap::entry().or_insert_with()`, which holds the
//! shard lock for the whole check-then-insert (SPEC_FULL.md §9).

use crate::domain::{ApiKey, Instance, ModelConfig};
use crate::error::Result;
use crate::store::{InstanceFilter, InstanceUpdate, StateStore};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// In-memory implementation of the state store contract.
#[derive(Default)]
pub struct MemoryStateStore {
    instances: DashMap<String, Instance>,
    model_configs: DashMap<String, ModelConfig>,
    api_keys: DashMap<String, ApiKey>,
}

impl MemoryStateStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_instance(&self, id: &str) -> Result<Option<Instance>> {
        Ok(self.instances.get(id).map(|r| r.clone()))
    }

    async fn list_instances(&self, filter: InstanceFilter) -> Result<Vec<Instance>> {
        Ok(self
            .instances
            .iter()
            .map(|r| r.clone())
            .filter(|inst| {
                filter
                    .model
                    .as_ref()
                    .is_none_or(|model| &inst.model == model)
            })
            .filter(|inst| filter.status.is_none_or(|status| inst.status == status))
            .collect())
    }

    async fn put_instance(&self, instance: Instance) -> Result<()> {
        self.instances.insert(instance.instance_id.clone(), instance);
        Ok(())
    }

    async fn put_instance_if_absent(&self, instance: Instance) -> Result<bool> {
        match self.instances.entry(instance.instance_id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(instance);
                Ok(true)
            }
        }
    }

    async fn update_instance(&self, id: &str, update: InstanceUpdate) -> Result<()> {
        if let Some(mut inst) = self.instances.get_mut(id) {
            if let Some(status) = update.status {
                inst.status = status;
            }
            if let Some(provider_instance_id) = update.provider_instance_id {
                inst.provider_instance_id = Some(provider_instance_id);
            }
            if let Some(ip) = update.ip {
                inst.ip = Some(ip);
            }
            if let Some(last_request_at) = update.last_request_at {
                inst.last_request_at = last_request_at;
            }
        }
        Ok(())
    }

    async fn delete_instance(&self, id: &str) -> Result<()> {
        self.instances.remove(id);
        Ok(())
    }

    async fn get_model_config(&self, name: &str) -> Result<Option<ModelConfig>> {
        Ok(self.model_configs.get(name).map(|r| r.clone()))
    }

    async fn put_model_config(&self, config: ModelConfig) -> Result<()> {
        self.model_configs.insert(config.name.clone(), config);
        Ok(())
    }

    async fn list_model_configs(&self) -> Result<Vec<ModelConfig>> {
        Ok(self.model_configs.iter().map(|r| r.clone()).collect())
    }

    async fn get_api_key(&self, key_hash: &str) -> Result<Option<ApiKey>> {
        Ok(self.api_keys.get(key_hash).map(|r| r.clone()))
    }

    async fn put_api_key(&self, key: ApiKey) -> Result<()> {
        self.api_keys.insert(key.key_hash.clone(), key);
        Ok(())
    }

    async fn delete_api_key(&self, key_hash: &str) -> Result<()> {
        self.api_keys.remove(key_hash);
        Ok(())
    }

    async fn list_api_keys(&self, email: &str) -> Result<Vec<ApiKey>> {
        Ok(self
            .api_keys
            .iter()
            .map(|r| r.clone())
            .filter(|k| k.email == email)
            .collect())
    }

    async fn update_api_key_last_used(&self, key_hash: &str, ts: i64) -> Result<()> {
        if let Some(mut key) = self.api_keys.get_mut(key_hash) {
            key.last_used_at = ts;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InstanceStatus, slot_id};

    fn instance(model: &str, status: InstanceStatus) -> Instance {
        let mut inst = Instance::claim_placeholder(model, "g5.xlarge", 1_000);
        inst.status = status;
        inst
    }

    #[tokio::test]
    async fn put_if_absent_is_exclusive() {
        let store = MemoryStateStore::new();
        let a = instance("m", InstanceStatus::Starting);
        let b = instance("m", InstanceStatus::Starting);

        assert!(store.put_instance_if_absent(a).await.unwrap());
        assert!(!store.put_instance_if_absent(b).await.unwrap());
    }

    #[tokio::test]
    async fn list_instances_filters_by_model_and_status() {
        let store = MemoryStateStore::new();
        store
            .put_instance(instance("a", InstanceStatus::Ready))
            .await
            .unwrap();
        store
            .put_instance(instance("b", InstanceStatus::Starting))
            .await
            .unwrap();

        let ready_a = store
            .list_instances(InstanceFilter::model_status("a", InstanceStatus::Ready))
            .await
            .unwrap();
        assert_eq!(ready_a.len(), 1);

        let all_starting = store
            .list_instances(InstanceFilter::status(InstanceStatus::Starting))
            .await
            .unwrap();
        assert_eq!(all_starting.len(), 1);
        assert_eq!(all_starting[0].instance_id, slot_id("b"));
    }

    #[tokio::test]
    async fn update_instance_touches_only_named_fields() {
        let store = MemoryStateStore::new();
        let inst = instance("m", InstanceStatus::Starting);
        let id = inst.instance_id.clone();
        store.put_instance(inst).await.unwrap();

        store
            .update_instance(&id, InstanceUpdate::status(InstanceStatus::Ready))
            .await
            .unwrap();

        let updated = store.get_instance(&id).await.unwrap().unwrap();
        assert_eq!(updated.status, InstanceStatus::Ready);
        assert_eq!(updated.launched_at, 1_000);
    }
}
