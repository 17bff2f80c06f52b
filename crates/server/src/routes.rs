pub mod admin_servers;
pub mod servers;

use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::{openapi::ApiDoc, state::ServerState};

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: customer, admin and docs routes
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let user_routes = Router::new()
        .route("/users/:user_id/servers", get(servers::list).post(servers::create))
        .route(
            "/users/:user_id/servers/:id",
            get(servers::get).patch(servers::update).delete(servers::delete),
        )
        .route("/users/:user_id/servers/:id/actions", post(servers::action))
        .route("/users/:user_id/recent-servers", get(servers::recent))
        .route("/users/:user_id/stats", get(servers::stats));

    let admin_routes = Router::new()
        .route("/admin/servers", get(admin_servers::list))
        .route(
            "/admin/servers/:id",
            get(admin_servers::get).patch(admin_servers::update).delete(admin_servers::delete),
        )
        .route("/admin/servers/:id/actions", post(admin_servers::action))
        .route("/admin/servers/:id/renew", post(admin_servers::renew))
        .route("/admin/expiring-servers", get(admin_servers::expiring))
        .route("/admin/stats", get(admin_servers::stats));

    Router::new()
        .route("/health", get(health))
        .merge(user_routes)
        .merge(admin_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
