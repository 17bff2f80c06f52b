//! Create `hosting_plans` table.
//! Catalog of sellable plans; capacity and price act as defaults for new servers.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HostingPlans::Table)
                    .if_not_exists()
                    .col(pk_auto(HostingPlans::Id))
                    .col(string_len(HostingPlans::Name, 128))
                    .col(integer(HostingPlans::Vcpu))
                    .col(integer(HostingPlans::RamGb))
                    .col(integer(HostingPlans::StorageGb))
                    .col(integer(HostingPlans::BandwidthGb))
                    .col(decimal_len(HostingPlans::MonthlyPrice, 10, 2))
                    .col(boolean(HostingPlans::IsActive).default(true))
                    .col(timestamp_with_time_zone(HostingPlans::CreatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(HostingPlans::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum HostingPlans {
    Table,
    Id,
    Name,
    Vcpu,
    RamGb,
    StorageGb,
    BandwidthGb,
    MonthlyPrice,
    IsActive,
    CreatedAt,
}
