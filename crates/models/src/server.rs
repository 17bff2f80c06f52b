//! `servers` entity: a provisioned VM owned by exactly one user.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{addon, catalog_service, errors, hosting_plan, order, server_addon, server_service};
pub use crate::status::ServerStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "servers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub order_id: Option<i32>,
    pub server_name: String,
    pub hostname: Option<String>,
    pub ip_address: Option<String>,
    pub server_status: ServerStatus,
    pub server_type: Option<String>,
    pub vcpu: Option<i32>,
    pub ram_gb: i32,
    pub storage_gb: i32,
    pub bandwidth_gb: Option<i32>,
    pub operating_system: String,
    pub plan_id: Option<i32>,
    pub plan_name: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub monthly_cost: Option<Decimal>,
    pub billing_cycle: Option<String>,
    pub created_date: Option<DateTimeWithTimeZone>,
    pub expiry_date: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub specs: Option<Json>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Plan,
    Order,
    ServerAddon,
    ServerService,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Plan => Entity::belongs_to(hosting_plan::Entity)
                .from(Column::PlanId)
                .to(hosting_plan::Column::Id)
                .into(),
            Relation::Order => Entity::belongs_to(order::Entity)
                .from(Column::OrderId)
                .to(order::Column::Id)
                .into(),
            Relation::ServerAddon => Entity::has_many(server_addon::Entity).into(),
            Relation::ServerService => Entity::has_many(server_service::Entity).into(),
        }
    }
}

impl Related<hosting_plan::Entity> for Entity {
    fn to() -> RelationDef { Relation::Plan.def() }
}

impl Related<order::Entity> for Entity {
    fn to() -> RelationDef { Relation::Order.def() }
}

impl Related<addon::Entity> for Entity {
    fn to() -> RelationDef { server_addon::Relation::Addon.def() }
    fn via() -> Option<RelationDef> { Some(server_addon::Relation::Server.def().rev()) }
}

impl Related<catalog_service::Entity> for Entity {
    fn to() -> RelationDef { server_service::Relation::Service.def() }
    fn via() -> Option<RelationDef> { Some(server_service::Relation::Server.def().rev()) }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() {
        return Err(errors::ModelError::Validation("server_name required".into()));
    }
    if name.len() > 128 {
        return Err(errors::ModelError::Validation("server_name too long (<=128)".into()));
    }
    Ok(())
}
