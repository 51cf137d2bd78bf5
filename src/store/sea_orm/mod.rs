//! Database-backed `StateStore`, for durability across process restarts.
//!
//! Backs `put_instance_if_absent` with a unique index on `instance_id` plus
//! catching the resulting constraint-violation error as the `false` outcome,
//! as specified in SPEC_FULL.md §9.

pub mod entities;
pub mod migration;

use crate::domain::{ApiKey, Instance, InstanceStatus, ModelConfig};
use crate::error::{OrchestratorError, Result};
use crate::store::{InstanceFilter, InstanceUpdate, StateStore};
use async_trait::async_trait;
use entities::{api_key, instance, model_config};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter};

/// Database-backed implementation of the state store contract.
pub struct SeaOrmStateStore {
    conn: DatabaseConnection,
}

impl SeaOrmStateStore {
    /// Connect to `database_url` (e.g. `sqlite://path/to/db.sqlite?mode=rwc`)
    /// and run pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let conn = Database::connect(database_url)
            .await
            .map_err(|e| OrchestratorError::Storage(e.to_string()))?;
        Migrator::up(&conn, None)
            .await
            .map_err(|e| OrchestratorError::Storage(e.to_string()))?;
        Ok(Self { conn })
    }
}

fn row_to_instance(row: instance::Model) -> Instance {
    Instance {
        instance_id: row.instance_id,
        model: row.model,
        status: InstanceStatus::parse(&row.status),
        provider_instance_id: row.provider_instance_id,
        ip: row.ip,
        instance_type: row.instance_type,
        launched_at: row.launched_at,
        last_request_at: row.last_request_at,
    }
}

fn instance_to_active(inst: Instance) -> instance::ActiveModel {
    instance::ActiveModel {
        instance_id: Set(inst.instance_id),
        model: Set(inst.model),
        status: Set(inst.status.as_str().to_string()),
        provider_instance_id: Set(inst.provider_instance_id),
        ip: Set(inst.ip),
        instance_type: Set(inst.instance_type),
        launched_at: Set(inst.launched_at),
        last_request_at: Set(inst.last_request_at),
    }
}

fn row_to_model_config(row: model_config::Model) -> ModelConfig {
    ModelConfig {
        name: row.name,
        instance_type: row.instance_type,
        vllm_args: row.vllm_args,
        idle_timeout: row.idle_timeout,
    }
}

fn row_to_api_key(row: api_key::Model) -> ApiKey {
    ApiKey {
        key_hash: row.key_hash,
        email: row.email,
        name: row.name,
        created_at: row.created_at,
        last_used_at: row.last_used_at,
    }
}

#[async_trait]
impl StateStore for SeaOrmStateStore {
    async fn get_instance(&self, id: &str) -> Result<Option<Instance>> {
        Ok(instance::Entity::find_by_id(id.to_string())
            .one(&self.conn)
            .await?
            .map(row_to_instance))
    }

    async fn list_instances(&self, filter: InstanceFilter) -> Result<Vec<Instance>> {
        let mut query = instance::Entity::find();
        if let Some(model) = &filter.model {
            query = query.filter(instance::Column::Model.eq(model.clone()));
        }
        if let Some(status) = filter.status {
            query = query.filter(instance::Column::Status.eq(status.as_str()));
        }
        Ok(query
            .all(&self.conn)
            .await?
            .into_iter()
            .map(row_to_instance)
            .collect())
    }

    async fn put_instance(&self, instance: Instance) -> Result<()> {
        instance_to_active(instance).insert(&self.conn).await?;
        Ok(())
    }

    async fn put_instance_if_absent(&self, instance: Instance) -> Result<bool> {
        let id = instance.instance_id.clone();
        match instance_to_active(instance).insert(&self.conn).await {
            Ok(_) => Ok(true),
            Err(insert_err) => {
                // A primary-key conflict means a peer won the race; any
                // other error is a genuine storage failure.
                if self.get_instance(&id).await?.is_some() {
                    Ok(false)
                } else {
                    Err(OrchestratorError::Storage(insert_err.to_string()))
                }
            }
        }
    }

    async fn update_instance(&self, id: &str, update: InstanceUpdate) -> Result<()> {
        let Some(existing) = instance::Entity::find_by_id(id.to_string())
            .one(&self.conn)
            .await?
        else {
            return Ok(());
        };
        let mut active: instance::ActiveModel = existing.into();
        if let Some(status) = update.status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(provider_instance_id) = update.provider_instance_id {
            active.provider_instance_id = Set(Some(provider_instance_id));
        }
        if let Some(ip) = update.ip {
            active.ip = Set(Some(ip));
        }
        if let Some(last_request_at) = update.last_request_at {
            active.last_request_at = Set(last_request_at);
        }
        active.update(&self.conn).await?;
        Ok(())
    }

    async fn delete_instance(&self, id: &str) -> Result<()> {
        instance::Entity::delete_by_id(id.to_string())
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    async fn get_model_config(&self, name: &str) -> Result<Option<ModelConfig>> {
        Ok(model_config::Entity::find_by_id(name.to_string())
            .one(&self.conn)
            .await?
            .map(row_to_model_config))
    }

    async fn put_model_config(&self, config: ModelConfig) -> Result<()> {
        let active = model_config::ActiveModel {
            name: Set(config.name),
            instance_type: Set(config.instance_type),
            vllm_args: Set(config.vllm_args),
            idle_timeout: Set(config.idle_timeout),
        };
        // Upsert: delete-then-insert keeps this backend-agnostic (sqlite's
        // ON CONFLICT support varies by feature set).
        model_config::Entity::delete_by_id(active.name.clone().unwrap())
            .exec(&self.conn)
            .await?;
        active.insert(&self.conn).await?;
        Ok(())
    }

    async fn list_model_configs(&self) -> Result<Vec<ModelConfig>> {
        Ok(model_config::Entity::find()
            .all(&self.conn)
            .await?
            .into_iter()
            .map(row_to_model_config)
            .collect())
    }

    async fn get_api_key(&self, key_hash: &str) -> Result<Option<ApiKey>> {
        Ok(api_key::Entity::find_by_id(key_hash.to_string())
            .one(&self.conn)
            .await?
            .map(row_to_api_key))
    }

    async fn put_api_key(&self, key: ApiKey) -> Result<()> {
        let active = api_key::ActiveModel {
            key_hash: Set(key.key_hash),
            email: Set(key.email),
            name: Set(key.name),
            created_at: Set(key.created_at),
            last_used_at: Set(key.last_used_at),
        };
        active.insert(&self.conn).await?;
        Ok(())
    }

    async fn delete_api_key(&self, key_hash: &str) -> Result<()> {
        api_key::Entity::delete_by_id(key_hash.to_string())
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    async fn list_api_keys(&self, email: &str) -> Result<Vec<ApiKey>> {
        Ok(api_key::Entity::find()
            .filter(api_key::Column::Email.eq(email.to_string()))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(row_to_api_key)
            .collect())
    }

    async fn update_api_key_last_used(&self, key_hash: &str, ts: i64) -> Result<()> {
        let Some(existing) = api_key::Entity::find_by_id(key_hash.to_string())
            .one(&self.conn)
            .await?
        else {
            return Ok(());
        };
        let mut active: api_key::ActiveModel = existing.into();
        active.last_used_at = Set(ts);
        active.update(&self.conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Instance;

    async fn store() -> SeaOrmStateStore {
        SeaOrmStateStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn put_if_absent_rejects_a_second_claim() {
        let store = store().await;
        let a = Instance::claim_placeholder("m", "g5.xlarge", 1_000);
        let b = Instance::claim_placeholder("m", "g5.xlarge", 1_000);

        assert!(store.put_instance_if_absent(a).await.unwrap());
        assert!(!store.put_instance_if_absent(b).await.unwrap());
    }

    #[tokio::test]
    async fn model_config_round_trips() {
        let store = store().await;
        store
            .put_model_config(ModelConfig {
                name: "m".to_string(),
                instance_type: "g5.xlarge".to_string(),
                vllm_args: String::new(),
                idle_timeout: Some(60),
            })
            .await
            .unwrap();

        let cfg = store.get_model_config("m").await.unwrap().unwrap();
        assert_eq!(cfg.idle_timeout_secs(), 60);
    }
}
