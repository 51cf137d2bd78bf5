use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Instances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Instances::InstanceId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Instances::Model).string().not_null())
                    .col(ColumnDef::new(Instances::Status).string().not_null())
                    .col(ColumnDef::new(Instances::ProviderInstanceId).string().null())
                    .col(ColumnDef::new(Instances::Ip).string().null())
                    .col(ColumnDef::new(Instances::InstanceType).string().not_null())
                    .col(ColumnDef::new(Instances::LaunchedAt).big_integer().not_null())
                    .col(
                        ColumnDef::new(Instances::LastRequestAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_instances_model_status")
                    .table(Instances::Table)
                    .col(Instances::Model)
                    .col(Instances::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_instances_status")
                    .table(Instances::Table)
                    .col(Instances::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Instances::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Instances {
    Table,
    InstanceId,
    Model,
    Status,
    ProviderInstanceId,
    Ip,
    InstanceType,
    LaunchedAt,
    LastRequestAt,
}
