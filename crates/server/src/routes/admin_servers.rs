//! Administrative routes over every server regardless of owner.
use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use models::server;
use service::servers::{service::DEFAULT_EXPIRING_DAYS, ServerDetail, ServerStats, ServerUpdate};

use crate::{errors::JsonApiError, routes::servers::{action_failure, ActionRequest}, state::ServerState};

fn default_months() -> u32 { 1 }

#[derive(Debug, Deserialize, Serialize)]
pub struct RenewRequest {
    #[serde(default = "default_months")]
    pub months: u32,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ExpiringQuery {
    /// Look-ahead window in days, defaults to 7.
    pub days: Option<i64>,
}

#[utoipa::path(
    get, path = "/admin/servers", tag = "admin",
    responses((status = 200, description = "Every server with addons and services"))
)]
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<ServerDetail>>, JsonApiError> {
    let list = state.servers.get_all_servers().await?;
    info!(count = list.len(), "list all servers");
    Ok(Json(list))
}

#[utoipa::path(
    get, path = "/admin/servers/{id}", tag = "admin",
    params(("id" = i32, Path, description = "Server ID")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not Found"))
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<i32>) -> Result<Json<server::Model>, JsonApiError> {
    state.servers
        .get_server_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found("server"))
}

#[utoipa::path(
    patch, path = "/admin/servers/{id}", tag = "admin",
    params(("id" = i32, Path, description = "Server ID")),
    request_body = crate::openapi::UpdateServerDoc,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    Json(input): Json<ServerUpdate>,
) -> Result<Json<server::Model>, JsonApiError> {
    state.servers
        .update_server(id, input)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found("server"))
}

#[utoipa::path(
    delete, path = "/admin/servers/{id}", tag = "admin",
    params(("id" = i32, Path, description = "Server ID")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i32>) -> Result<StatusCode, JsonApiError> {
    if state.servers.delete_server(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(JsonApiError::not_found("server"))
    }
}

#[utoipa::path(
    post, path = "/admin/servers/{id}/actions", tag = "admin",
    params(("id" = i32, Path, description = "Server ID")),
    request_body = crate::openapi::ActionDoc,
    responses(
        (status = 200, description = "Action applied"),
        (status = 400, description = "Unknown action"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn action(
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    Json(input): Json<ActionRequest>,
) -> Result<Json<server::Model>, JsonApiError> {
    if state.servers.perform_server_action(id, &input.action).await? {
        if let Some(s) = state.servers.get_server_by_id(id).await? {
            return Ok(Json(s));
        }
    }
    let exists = state.servers.get_server_by_id(id).await?.is_some();
    Err(action_failure(&input.action, exists))
}

#[utoipa::path(
    post, path = "/admin/servers/{id}/renew", tag = "admin",
    params(("id" = i32, Path, description = "Server ID")),
    request_body = crate::openapi::RenewDoc,
    responses(
        (status = 200, description = "Renewed"),
        (status = 400, description = "Expiry out of range"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn renew(
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    Json(input): Json<RenewRequest>,
) -> Result<Json<server::Model>, JsonApiError> {
    if !state.servers.renew_server(id, input.months).await? {
        return Err(JsonApiError::not_found("server"));
    }
    state.servers
        .get_server_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found("server"))
}

#[utoipa::path(
    get, path = "/admin/expiring-servers", tag = "admin",
    params(ExpiringQuery),
    responses(
        (status = 200, description = "Active servers expiring within the window"),
        (status = 400, description = "Window out of range")
    )
)]
pub async fn expiring(State(state): State<ServerState>, Query(q): Query<ExpiringQuery>) -> Result<Json<Vec<server::Model>>, JsonApiError> {
    let days = q.days.unwrap_or(DEFAULT_EXPIRING_DAYS);
    Ok(Json(state.servers.get_servers_expiring_soon(days).await?))
}

#[utoipa::path(
    get, path = "/admin/stats", tag = "admin",
    responses((status = 200, description = "Fleet statistics"))
)]
pub async fn stats(State(state): State<ServerState>) -> Result<Json<ServerStats>, JsonApiError> {
    Ok(Json(state.servers.get_server_stats().await?))
}
