//! Customer-facing routes, always scoped to the `user_id` in the path.
use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use models::{server, status::ServerAction};
use service::servers::{service::DEFAULT_RECENT_LIMIT, RecentServer, ServerCreate, ServerDetail, ServerUpdate, UserServerStats};

use crate::{errors::JsonApiError, state::ServerState};

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateServerRequest {
    #[serde(flatten)]
    pub server: ServerCreate,
    #[serde(default)]
    pub order_id: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ActionRequest {
    pub action: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct RecentQuery {
    /// Defaults to 5, capped at 100.
    pub limit: Option<u64>,
}

/// Status for a `false` action result: 400 when the server exists but the action is unknown.
pub(crate) fn action_failure(action: &str, exists: bool) -> JsonApiError {
    match action.parse::<ServerAction>() {
        Err(e) if exists => JsonApiError::bad_request(e.to_string()),
        _ => JsonApiError::not_found("server"),
    }
}

#[utoipa::path(
    get, path = "/users/{user_id}/servers", tag = "servers",
    params(("user_id" = i32, Path, description = "Owner ID")),
    responses((status = 200, description = "Servers with addons and services"), (status = 500, description = "Internal Error"))
)]
pub async fn list(State(state): State<ServerState>, Path(user_id): Path<i32>) -> Result<Json<Vec<ServerDetail>>, JsonApiError> {
    let list = state.servers.get_user_servers(user_id).await?;
    info!(user_id, count = list.len(), "list user servers");
    Ok(Json(list))
}

#[utoipa::path(
    post, path = "/users/{user_id}/servers", tag = "servers",
    params(("user_id" = i32, Path, description = "Owner ID")),
    request_body = crate::openapi::CreateServerDoc,
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Validation Error"),
        (status = 500, description = "Create Failed")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
    Json(input): Json<CreateServerRequest>,
) -> Result<(StatusCode, Json<server::Model>), JsonApiError> {
    let created = state.servers.create_user_server(user_id, input.server, input.order_id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get, path = "/users/{user_id}/servers/{id}", tag = "servers",
    params(("user_id" = i32, Path, description = "Owner ID"), ("id" = i32, Path, description = "Server ID")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not Found"))
)]
pub async fn get(State(state): State<ServerState>, Path((user_id, id)): Path<(i32, i32)>) -> Result<Json<ServerDetail>, JsonApiError> {
    state.servers
        .get_user_server(user_id, id)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found("server"))
}

#[utoipa::path(
    patch, path = "/users/{user_id}/servers/{id}", tag = "servers",
    params(("user_id" = i32, Path, description = "Owner ID"), ("id" = i32, Path, description = "Server ID")),
    request_body = crate::openapi::UpdateServerDoc,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Path((user_id, id)): Path<(i32, i32)>,
    Json(input): Json<ServerUpdate>,
) -> Result<Json<server::Model>, JsonApiError> {
    state.servers
        .update_user_server(user_id, id, input)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found("server"))
}

#[utoipa::path(
    delete, path = "/users/{user_id}/servers/{id}", tag = "servers",
    params(("user_id" = i32, Path, description = "Owner ID"), ("id" = i32, Path, description = "Server ID")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete(State(state): State<ServerState>, Path((user_id, id)): Path<(i32, i32)>) -> Result<StatusCode, JsonApiError> {
    if state.servers.delete_user_server(user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(JsonApiError::not_found("server"))
    }
}

#[utoipa::path(
    post, path = "/users/{user_id}/servers/{id}/actions", tag = "servers",
    params(("user_id" = i32, Path, description = "Owner ID"), ("id" = i32, Path, description = "Server ID")),
    request_body = crate::openapi::ActionDoc,
    responses(
        (status = 200, description = "Action applied"),
        (status = 400, description = "Unknown action"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn action(
    State(state): State<ServerState>,
    Path((user_id, id)): Path<(i32, i32)>,
    Json(input): Json<ActionRequest>,
) -> Result<Json<ServerDetail>, JsonApiError> {
    if state.servers.perform_user_server_action(user_id, id, &input.action).await? {
        if let Some(detail) = state.servers.get_user_server(user_id, id).await? {
            return Ok(Json(detail));
        }
    }
    let exists = state.servers.get_user_server(user_id, id).await?.is_some();
    Err(action_failure(&input.action, exists))
}

#[utoipa::path(
    get, path = "/users/{user_id}/recent-servers", tag = "servers",
    params(("user_id" = i32, Path, description = "Owner ID"), RecentQuery),
    responses((status = 200, description = "Newest servers first"))
)]
pub async fn recent(
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
    Query(q): Query<RecentQuery>,
) -> Result<Json<Vec<RecentServer>>, JsonApiError> {
    let limit = q.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    Ok(Json(state.servers.get_user_recent_servers(user_id, limit).await?))
}

#[utoipa::path(
    get, path = "/users/{user_id}/stats", tag = "servers",
    params(("user_id" = i32, Path, description = "Owner ID")),
    responses((status = 200, description = "Counts, monthly cost and bandwidth"))
)]
pub async fn stats(State(state): State<ServerState>, Path(user_id): Path<i32>) -> Result<Json<UserServerStats>, JsonApiError> {
    Ok(Json(state.servers.get_user_server_stats(user_id).await?))
}
