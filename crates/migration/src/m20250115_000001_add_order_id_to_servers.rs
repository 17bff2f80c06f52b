//! Link servers to the order that purchased them.
//!
//! Adds nullable `servers.order_id`, FK `fk_servers_order_id` to `orders(id)`
//! and lookup index `idx_servers_order_id`.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Servers::Table)
                    .add_column(ColumnDef::new(Servers::OrderId).integer().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_servers_order_id")
                    .from(Servers::Table, Servers::OrderId)
                    .to(Orders::Table, Orders::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_servers_order_id")
                    .table(Servers::Table)
                    .col(Servers::OrderId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_servers_order_id").table(Servers::Table).to_owned())
            .await?;
        manager
            .drop_foreign_key(ForeignKey::drop().name("fk_servers_order_id").table(Servers::Table).to_owned())
            .await?;
        manager
            .alter_table(Table::alter().table(Servers::Table).drop_column(Servers::OrderId).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Servers { Table, OrderId }

#[derive(DeriveIden)]
enum Orders { Table, Id }
