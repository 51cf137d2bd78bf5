//! SeaORM migrator, run at startup against the configured database.

pub use sea_orm_migration::prelude::*;

mod m20260101_000001_create_instances_table;
mod m20260101_000002_create_model_configs_table;
mod m20260101_000003_create_api_keys_table;

/// The crate's migrator.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_instances_table::Migration),
            Box::new(m20260101_000002_create_model_configs_table::Migration),
            Box::new(m20260101_000003_create_api_keys_table::Migration),
        ]
    }
}
