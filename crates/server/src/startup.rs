use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, ServerConfig};
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::servers::{repo::SeaOrmServerRepository, ServerRepository};

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &ServerConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address {}:{}: {}", cfg.host, cfg.port, e)))
}

/// Connect, migrate if configured, then serve until `shutdown` resolves.
pub async fn run_until<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = bind_addr(&cfg.server)?;

    let db = models::db::connect_with_config(&models::db::DatabaseConfig::from(&cfg.database)).await?;
    if cfg.database.auto_migrate {
        migration::Migrator::up(&db, None).await?;
        info!("migrations_applied");
    }

    let repo: Arc<dyn ServerRepository> = Arc::new(SeaOrmServerRepository::new(db));
    let app: Router = routes::build_router(ServerState::new(repo), build_cors());

    info!(%addr, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("server stopped");
    Ok(())
}

/// Public entry: run until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    run_until(cfg, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_rejects_bad_host() {
        let mut cfg = ServerConfig::default();
        cfg.host = "not a host".into();
        cfg.port = 8080;
        assert!(matches!(bind_addr(&cfg), Err(StartupError::InvalidConfig(_))));

        cfg.host = "127.0.0.1".into();
        assert_eq!(bind_addr(&cfg).unwrap().port(), 8080);
    }
}
