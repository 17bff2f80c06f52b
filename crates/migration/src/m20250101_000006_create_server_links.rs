//! Create `server_addons` and `server_services` link tables.
//!
//! Addons and services attached to a server live here rather than inside
//! `servers.specs`; rows disappear with their server.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServerAddons::Table)
                    .if_not_exists()
                    .col(integer(ServerAddons::ServerId))
                    .col(integer(ServerAddons::AddonId))
                    .primary_key(
                        Index::create()
                            .col(ServerAddons::ServerId)
                            .col(ServerAddons::AddonId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_server_addons_server")
                            .from(ServerAddons::Table, ServerAddons::ServerId)
                            .to(Servers::Table, Servers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_server_addons_addon")
                            .from(ServerAddons::Table, ServerAddons::AddonId)
                            .to(Addons::Table, Addons::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ServerServices::Table)
                    .if_not_exists()
                    .col(integer(ServerServices::ServerId))
                    .col(integer(ServerServices::ServiceId))
                    .primary_key(
                        Index::create()
                            .col(ServerServices::ServerId)
                            .col(ServerServices::ServiceId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_server_services_server")
                            .from(ServerServices::Table, ServerServices::ServerId)
                            .to(Servers::Table, Servers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_server_services_service")
                            .from(ServerServices::Table, ServerServices::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ServerServices::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(ServerAddons::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ServerAddons { Table, ServerId, AddonId }

#[derive(DeriveIden)]
enum ServerServices { Table, ServerId, ServiceId }

#[derive(DeriveIden)]
enum Servers { Table, Id }

#[derive(DeriveIden)]
enum Addons { Table, Id }

#[derive(DeriveIden)]
enum Services { Table, Id }
