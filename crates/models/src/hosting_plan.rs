use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hosting_plans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub vcpu: i32,
    pub ram_gb: i32,
    pub storage_gb: i32,
    pub bandwidth_gb: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub monthly_price: Decimal,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Plan defaults as a plain struct, used to seed catalog rows.
#[derive(Debug, Clone)]
pub struct NewPlan<'a> {
    pub name: &'a str,
    pub vcpu: i32,
    pub ram_gb: i32,
    pub storage_gb: i32,
    pub bandwidth_gb: i32,
    pub monthly_price: Decimal,
}

pub async fn create(db: &DatabaseConnection, plan: NewPlan<'_>) -> Result<Model, errors::ModelError> {
    if plan.name.trim().is_empty() { return Err(errors::ModelError::Validation("plan name required".into())); }
    if plan.ram_gb <= 0 || plan.storage_gb <= 0 {
        return Err(errors::ModelError::Validation("plan ram_gb and storage_gb must be > 0".into()));
    }
    let am = ActiveModel {
        name: Set(plan.name.to_string()),
        vcpu: Set(plan.vcpu),
        ram_gb: Set(plan.ram_gb),
        storage_gb: Set(plan.storage_gb),
        bandwidth_gb: Set(plan.bandwidth_gb),
        monthly_price: Set(plan.monthly_price),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
