//! Create `servers` table.
//!
//! One row per provisioned VM. `order_id` is added later by
//! `m20250115_000001_add_order_id_to_servers`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Servers::Table)
                    .if_not_exists()
                    .col(pk_auto(Servers::Id))
                    .col(integer(Servers::UserId))
                    .col(string_len(Servers::ServerName, 128))
                    .col(string_len_null(Servers::Hostname, 255))
                    .col(string_len_null(Servers::IpAddress, 64))
                    .col(string_len(Servers::ServerStatus, 32).default("active"))
                    .col(string_len_null(Servers::ServerType, 32))
                    .col(integer_null(Servers::Vcpu))
                    .col(integer(Servers::RamGb))
                    .col(integer(Servers::StorageGb))
                    .col(integer_null(Servers::BandwidthGb))
                    .col(string_len(Servers::OperatingSystem, 128))
                    .col(integer_null(Servers::PlanId))
                    .col(string_len_null(Servers::PlanName, 128))
                    .col(decimal_len_null(Servers::MonthlyCost, 10, 2))
                    .col(string_len_null(Servers::BillingCycle, 32))
                    .col(timestamp_with_time_zone_null(Servers::CreatedDate))
                    .col(timestamp_with_time_zone_null(Servers::ExpiryDate))
                    .col(json_binary_null(Servers::Specs))
                    .col(text_null(Servers::Notes))
                    .col(timestamp_with_time_zone(Servers::CreatedAt))
                    .col(timestamp_with_time_zone(Servers::UpdatedAt))
                    // Plan is a creation-time reference only; deleting a plan keeps its servers
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_servers_plan_id")
                            .from(Servers::Table, Servers::PlanId)
                            .to(HostingPlans::Table, HostingPlans::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Servers::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Servers {
    Table,
    Id,
    UserId,
    ServerName,
    Hostname,
    IpAddress,
    ServerStatus,
    ServerType,
    Vcpu,
    RamGb,
    StorageGb,
    BandwidthGb,
    OperatingSystem,
    PlanId,
    PlanName,
    MonthlyCost,
    BillingCycle,
    CreatedDate,
    ExpiryDate,
    Specs,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum HostingPlans { Table, Id }
