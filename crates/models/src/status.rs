//! Server lifecycle status and the actions that move between statuses.
use std::{fmt, str::FromStr};

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "stopped")]
    Stopped,
    #[sea_orm(string_value = "provisioning")]
    Provisioning,
    #[sea_orm(string_value = "terminated")]
    Terminated,
}

impl ServerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerStatus::Active => "active",
            ServerStatus::Stopped => "stopped",
            ServerStatus::Provisioning => "provisioning",
            ServerStatus::Terminated => "terminated",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator/customer action on a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerAction {
    Start,
    Stop,
    Restart,
    Terminate,
}

impl ServerAction {
    /// Status a server ends up in after the action.
    pub fn resulting_status(&self) -> ServerStatus {
        match self {
            ServerAction::Start | ServerAction::Restart => ServerStatus::Active,
            ServerAction::Stop => ServerStatus::Stopped,
            ServerAction::Terminate => ServerStatus::Terminated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown server action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for ServerAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(ServerAction::Start),
            "stop" => Ok(ServerAction::Stop),
            "restart" => Ok(ServerAction::Restart),
            "terminate" => Ok(ServerAction::Terminate),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}
