//! SeaORM entity for the `api_keys` table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// API key database model. The raw token is never stored, only its hash.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "api_keys")]
pub struct Model {
    /// Hex SHA-256 of the raw token.
    #[sea_orm(primary_key, auto_increment = false)]
    pub key_hash: String,

    /// Owner identity.
    #[sea_orm(indexed)]
    pub email: String,

    /// Human-friendly label.
    pub name: String,

    /// Epoch seconds.
    pub created_at: i64,

    /// Epoch seconds.
    pub last_used_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
