//! SeaORM entity for the `model_configs` table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Model config database model; written out-of-band by operators.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "model_configs")]
pub struct Model {
    /// Logical model identifier, used verbatim in API requests.
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,

    /// Opaque string handed to the compute backend.
    pub instance_type: String,

    /// Opaque string passed to the worker bootstrap.
    pub vllm_args: String,

    /// Seconds; `NULL` means the documented default applies.
    pub idle_timeout: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
