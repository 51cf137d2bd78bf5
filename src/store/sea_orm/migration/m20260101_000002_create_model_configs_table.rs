use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ModelConfigs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ModelConfigs::Name)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ModelConfigs::InstanceType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ModelConfigs::VllmArgs).string().not_null())
                    .col(ColumnDef::new(ModelConfigs::IdleTimeout).big_integer().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ModelConfigs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ModelConfigs {
    Table,
    Name,
    InstanceType,
    VllmArgs,
    IdleTimeout,
}
