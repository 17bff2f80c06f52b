use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

/// Decimal amounts travel as strings, e.g. `"19.99"`.
#[derive(ToSchema)]
pub struct CreateServerDoc {
    pub server_name: String,
    pub hostname: Option<String>,
    /// Defaults to `vps`.
    pub server_type: Option<String>,
    pub operating_system: String,
    pub vcpu: Option<i32>,
    pub ram_gb: Option<i32>,
    pub storage_gb: Option<i32>,
    pub bandwidth_gb: Option<i32>,
    pub plan_id: i32,
    pub monthly_cost: Option<String>,
    /// monthly, quarterly, semiannually, annually, biennially or triennially.
    pub billing_cycle: Option<String>,
    pub addon_ids: Option<Vec<i32>>,
    pub service_ids: Option<Vec<i32>>,
    pub notes: Option<String>,
    pub order_id: Option<i32>,
}

/// Only keys present are applied; `null` clears a nullable field.
#[derive(ToSchema)]
pub struct UpdateServerDoc {
    pub server_name: Option<String>,
    pub hostname: Option<String>,
    pub ip_address: Option<String>,
    /// active, stopped, provisioning or terminated.
    pub server_status: Option<String>,
    pub server_type: Option<String>,
    pub vcpu: Option<i32>,
    pub ram_gb: Option<i32>,
    pub storage_gb: Option<i32>,
    pub bandwidth_gb: Option<i32>,
    pub operating_system: Option<String>,
    pub plan_name: Option<String>,
    pub monthly_cost: Option<String>,
    pub billing_cycle: Option<String>,
    pub expiry_date: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub specs: Option<serde_json::Value>,
    pub notes: Option<String>,
    pub order_id: Option<i32>,
}

#[derive(ToSchema)]
pub struct ActionDoc {
    /// start, stop, restart or terminate.
    pub action: String,
}

#[derive(ToSchema)]
pub struct RenewDoc {
    /// Defaults to 1.
    pub months: Option<u32>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::servers::list,
        crate::routes::servers::create,
        crate::routes::servers::get,
        crate::routes::servers::update,
        crate::routes::servers::delete,
        crate::routes::servers::action,
        crate::routes::servers::recent,
        crate::routes::servers::stats,
        crate::routes::admin_servers::list,
        crate::routes::admin_servers::get,
        crate::routes::admin_servers::update,
        crate::routes::admin_servers::delete,
        crate::routes::admin_servers::action,
        crate::routes::admin_servers::renew,
        crate::routes::admin_servers::expiring,
        crate::routes::admin_servers::stats,
    ),
    components(
        schemas(
            HealthResponse,
            CreateServerDoc,
            UpdateServerDoc,
            ActionDoc,
            RenewDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "servers"),
        (name = "admin")
    )
)]
pub struct ApiDoc;
