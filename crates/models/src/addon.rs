use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use serde::{Deserialize, Serialize};

use crate::errors;

/// Postgres `addoncategory` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "addoncategory")]
#[serde(rename_all = "lowercase")]
pub enum AddonCategory {
    #[sea_orm(string_value = "storage")]
    Storage,
    #[sea_orm(string_value = "bandwidth")]
    Bandwidth,
    #[sea_orm(string_value = "ip")]
    Ip,
    #[sea_orm(string_value = "backup")]
    Backup,
    #[sea_orm(string_value = "security")]
    Security,
    #[sea_orm(string_value = "ram")]
    Ram,
    #[sea_orm(string_value = "support")]
    Support,
    #[sea_orm(string_value = "cpu")]
    Cpu,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "addons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub category: AddonCategory,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(db: &DatabaseConnection, name: &str, category: AddonCategory, price: Decimal) -> Result<Model, errors::ModelError> {
    if name.trim().is_empty() { return Err(errors::ModelError::Validation("addon name required".into())); }
    let am = ActiveModel {
        name: Set(name.to_string()),
        category: Set(category),
        price: Set(price),
        description: Set(None),
        is_active: Set(true),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
