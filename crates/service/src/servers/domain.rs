use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Deserializer, Serialize};

use models::{addon, catalog_service, errors::ModelError, server, status::ServerStatus};

/// Provisioning request for a new server.
///
/// Capacity and cost fields left out fall back to the hosting plan's values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCreate {
    pub server_name: String,
    pub hostname: Option<String>,
    pub server_type: Option<String>,
    pub operating_system: String,
    pub vcpu: Option<i32>,
    pub ram_gb: Option<i32>,
    pub storage_gb: Option<i32>,
    pub bandwidth_gb: Option<i32>,
    pub plan_id: i32,
    pub monthly_cost: Option<Decimal>,
    pub billing_cycle: Option<String>,
    #[serde(default)]
    pub addon_ids: Vec<i32>,
    #[serde(default)]
    pub service_ids: Vec<i32>,
    pub notes: Option<String>,
}

/// Distinguishes "field absent" (`None`) from "field set to null" (`Some(None)`).
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Partial update. Only fields present in the payload are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub hostname: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_status: Option<ServerStatus>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub server_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub vcpu: Option<Option<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_gb: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_gb: Option<i32>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub bandwidth_gb: Option<Option<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub plan_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub monthly_cost: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub billing_cycle: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<Option<DateTimeWithTimeZone>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub specs: Option<Option<serde_json::Value>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Option<i32>>,
}

impl ServerUpdate {
    /// Write the supplied fields into `server`; everything else is left as is.
    pub fn apply_to(self, server: &mut server::Model) -> Result<(), ModelError> {
        if let Some(name) = self.server_name {
            server::validate_name(&name)?;
            server.server_name = name;
        }
        if let Some(v) = self.hostname { server.hostname = v; }
        if let Some(v) = self.ip_address { server.ip_address = v; }
        if let Some(v) = self.server_status { server.server_status = v; }
        if let Some(v) = self.server_type { server.server_type = v; }
        if let Some(v) = self.vcpu { server.vcpu = v; }
        if let Some(v) = self.ram_gb {
            if v <= 0 { return Err(ModelError::Validation("ram_gb must be > 0".into())); }
            server.ram_gb = v;
        }
        if let Some(v) = self.storage_gb {
            if v <= 0 { return Err(ModelError::Validation("storage_gb must be > 0".into())); }
            server.storage_gb = v;
        }
        if let Some(v) = self.bandwidth_gb { server.bandwidth_gb = v; }
        if let Some(v) = self.operating_system { server.operating_system = v; }
        if let Some(v) = self.plan_name { server.plan_name = v; }
        if let Some(v) = self.monthly_cost { server.monthly_cost = v; }
        if let Some(v) = self.billing_cycle { server.billing_cycle = v; }
        if let Some(v) = self.expiry_date { server.expiry_date = v; }
        if let Some(v) = self.specs { server.specs = v; }
        if let Some(v) = self.notes { server.notes = v; }
        if let Some(v) = self.order_id { server.order_id = v; }
        Ok(())
    }
}

/// Row to insert plus the catalog items to link to it.
#[derive(Debug, Clone)]
pub struct NewServer {
    /// `id` is assigned by the store and ignored here.
    pub server: server::Model,
    pub addon_ids: Vec<i32>,
    pub service_ids: Vec<i32>,
}

/// Row filter shared by listing and counting queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerFilter {
    pub user_id: Option<i32>,
    pub status: Option<ServerStatus>,
}

impl ServerFilter {
    pub fn all() -> Self { Self::default() }

    pub fn user(user_id: i32) -> Self { Self { user_id: Some(user_id), status: None } }

    pub fn status(status: ServerStatus) -> Self { Self { user_id: None, status: Some(status) } }

    pub fn with_status(mut self, status: ServerStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, server: &server::Model) -> bool {
        self.user_id.map_or(true, |u| server.user_id == u)
            && self.status.map_or(true, |s| server.server_status == s)
    }
}

/// Addons and services linked to a set of servers, keyed by server id.
#[derive(Debug, Clone, Default)]
pub struct Attachments {
    pub addons: HashMap<i32, Vec<addon::Model>>,
    pub services: HashMap<i32, Vec<catalog_service::Model>>,
}

impl Attachments {
    pub fn take(&mut self, server_id: i32) -> (Vec<addon::Model>, Vec<catalog_service::Model>) {
        (
            self.addons.remove(&server_id).unwrap_or_default(),
            self.services.remove(&server_id).unwrap_or_default(),
        )
    }
}

/// Server row enriched with its linked catalog items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerDetail {
    #[serde(flatten)]
    pub server: server::Model,
    pub addons: Vec<addon::Model>,
    pub services: Vec<catalog_service::Model>,
}

/// Dashboard summary of a recently created server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentServer {
    pub id: i32,
    pub name: String,
    pub hostname: Option<String>,
    pub status: ServerStatus,
    pub ip: Option<String>,
    pub plan: Option<String>,
}

impl From<server::Model> for RecentServer {
    fn from(s: server::Model) -> Self {
        Self {
            id: s.id,
            name: s.server_name,
            hostname: s.hostname,
            status: s.server_status,
            ip: s.ip_address,
            plan: s.plan_name,
        }
    }
}

/// Fleet-wide statistics for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStats {
    pub total_servers: u64,
    pub active_servers: u64,
    pub stopped_servers: u64,
    pub provisioning_servers: u64,
    pub terminated_servers: u64,
    /// Placeholder figure, not metered.
    pub total_bandwidth_used: Decimal,
    pub average_monthly_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserServerStats {
    pub total_servers: u64,
    pub active_servers: u64,
    pub total_monthly_cost: Decimal,
    pub bandwidth_used: Decimal,
}
