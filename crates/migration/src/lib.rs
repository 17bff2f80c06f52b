//! Migrator registering table migrations in dependency order.
//! Schema changes to existing tables follow, indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_hosting_plans;
mod m20250101_000002_create_orders;
mod m20250101_000003_create_addons;
mod m20250101_000004_create_services;
mod m20250101_000005_create_servers;
mod m20250101_000006_create_server_links;
mod m20250115_000001_add_order_id_to_servers;
mod m20251120_000001_add_cpu_to_addon_category;
mod m20251121_000001_add_server_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_hosting_plans::Migration),
            Box::new(m20250101_000002_create_orders::Migration),
            Box::new(m20250101_000003_create_addons::Migration),
            Box::new(m20250101_000004_create_services::Migration),
            Box::new(m20250101_000005_create_servers::Migration),
            Box::new(m20250101_000006_create_server_links::Migration),
            Box::new(m20250115_000001_add_order_id_to_servers::Migration),
            Box::new(m20251120_000001_add_cpu_to_addon_category::Migration),
            // Indexes should always be applied last
            Box::new(m20251121_000001_add_server_indexes::Migration),
        ]
    }
}
