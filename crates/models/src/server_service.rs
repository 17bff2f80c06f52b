use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{catalog_service, server};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "server_services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub server_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub service_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Server,
    Service,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Server => Entity::belongs_to(server::Entity)
                .from(Column::ServerId)
                .to(server::Column::Id)
                .into(),
            Relation::Service => Entity::belongs_to(catalog_service::Entity)
                .from(Column::ServiceId)
                .to(catalog_service::Column::Id)
                .into(),
        }
    }
}

impl Related<server::Entity> for Entity {
    fn to() -> RelationDef { Relation::Server.def() }
}

impl Related<catalog_service::Entity> for Entity {
    fn to() -> RelationDef { Relation::Service.def() }
}

impl ActiveModelBehavior for ActiveModel {}
