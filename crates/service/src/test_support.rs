#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use models::db::{connect_with_config, DatabaseConfig};

// Migrations run once per test process; `false` means no usable database.
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

fn config() -> DatabaseConfig {
    let mut cfg = DatabaseConfig::from_file().unwrap_or_else(|_| DatabaseConfig::from_env());
    cfg.max_connections = cfg.max_connections.max(10);
    cfg.min_connections = cfg.min_connections.min(1);
    cfg.connect_timeout = std::time::Duration::from_secs(5);
    cfg.acquire_timeout = std::time::Duration::from_secs(5);
    cfg
}

/// Connection to a migrated test database, or `None` when DB tests are disabled
/// (`SKIP_DB_TESTS`) or no database is reachable.
pub async fn get_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let ready = *MIGRATED
        .get_or_init(|| async {
            let Ok(db) = connect_with_config(&config()).await else {
                eprintln!("database unreachable, skipping DB tests");
                return false;
            };
            match migration::Migrator::up(&db, None).await {
                Ok(()) => true,
                Err(e) => {
                    eprintln!("migrate up failed: {e}");
                    false
                }
            }
        })
        .await;
    if !ready {
        return None;
    }
    // fresh connection for the current test's runtime
    connect_with_config(&config()).await.ok()
}
