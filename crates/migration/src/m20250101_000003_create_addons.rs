//! Create the `addoncategory` enum type and the `addons` catalog table.
//!
//! `cpu` is not part of the initial value set; see
//! `m20251120_000001_add_cpu_to_addon_category`.
use sea_orm_migration::sea_orm::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(AddonCategory::Enum)
                    .values([
                        AddonCategory::Storage,
                        AddonCategory::Bandwidth,
                        AddonCategory::Ip,
                        AddonCategory::Backup,
                        AddonCategory::Security,
                        AddonCategory::Ram,
                        AddonCategory::Support,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Addons::Table)
                    .if_not_exists()
                    .col(pk_auto(Addons::Id))
                    .col(string_len(Addons::Name, 128))
                    .col(ColumnDef::new(Addons::Category).custom(AddonCategory::Enum).not_null())
                    .col(decimal_len(Addons::Price, 10, 2))
                    .col(text_null(Addons::Description))
                    .col(boolean(Addons::IsActive).default(true))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Addons::Table).to_owned()).await?;
        manager
            .drop_type(Type::drop().if_exists().name(AddonCategory::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Addons { Table, Id, Name, Category, Price, Description, IsActive }

#[derive(DeriveIden)]
enum AddonCategory {
    #[sea_orm(iden = "addoncategory")]
    Enum,
    Storage,
    Bandwidth,
    Ip,
    Backup,
    Security,
    Ram,
    Support,
}
