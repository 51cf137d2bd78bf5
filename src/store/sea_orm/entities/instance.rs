//! SeaORM entity for the `instances` table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Instance database model, one row per slot (`model#<name>`), plus
/// transient terminated tombstones.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "instances")]
pub struct Model {
    /// The stable slot identifier `"model#<name>"`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub instance_id: String,

    /// Back-reference to `model_configs.name`.
    #[sea_orm(indexed)]
    pub model: String,

    /// Lifecycle state, stored as its lowercase string form.
    #[sea_orm(indexed)]
    pub status: String,

    /// The compute backend's node identifier, absent until `launch` returns.
    pub provider_instance_id: Option<String>,

    /// Network address reachable from the router process.
    pub ip: Option<String>,

    /// Mirrored from config, for observability only.
    pub instance_type: String,

    /// Epoch seconds.
    pub launched_at: i64,

    /// Epoch seconds.
    pub last_request_at: i64,
}

/// No foreign relations: instances reference models by name only, since a
/// model's config may be seeded after an instance tombstone already exists.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
