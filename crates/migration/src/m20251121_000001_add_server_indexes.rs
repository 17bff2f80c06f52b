use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Servers: owner lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_servers_user_id")
                    .table(Servers::Table)
                    .col(Servers::UserId)
                    .to_owned(),
            )
            .await?;

        // Servers: status counts
        manager
            .create_index(
                Index::create()
                    .name("idx_servers_status")
                    .table(Servers::Table)
                    .col(Servers::ServerStatus)
                    .to_owned(),
            )
            .await?;

        // Servers: expiring-soon scans
        manager
            .create_index(
                Index::create()
                    .name("idx_servers_expiry_date")
                    .table(Servers::Table)
                    .col(Servers::ExpiryDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_servers_user_id").table(Servers::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_servers_status").table(Servers::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_servers_expiry_date").table(Servers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Servers { Table, UserId, ServerStatus, ExpiryDate }
