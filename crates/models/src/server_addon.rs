use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{addon, server};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "server_addons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub server_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub addon_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Server,
    Addon,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Server => Entity::belongs_to(server::Entity)
                .from(Column::ServerId)
                .to(server::Column::Id)
                .into(),
            Relation::Addon => Entity::belongs_to(addon::Entity)
                .from(Column::AddonId)
                .to(addon::Column::Id)
                .into(),
        }
    }
}

impl Related<server::Entity> for Entity {
    fn to() -> RelationDef { Relation::Server.def() }
}

impl Related<addon::Entity> for Entity {
    fn to() -> RelationDef { Relation::Addon.def() }
}

impl ActiveModelBehavior for ActiveModel {}
