use std::time::Duration;

use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use tokio::sync::OnceCell;

use crate::db::{connect_with_config, DatabaseConfig};




// Migrations run once per test process; `false` means no usable database.
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

fn test_config() -> DatabaseConfig {
    let mut cfg = DatabaseConfig::from_file().unwrap_or_else(|_| DatabaseConfig::from_env());
    cfg.connect_timeout = Duration::from_secs(5);
    cfg.acquire_timeout = Duration::from_secs(5);
    cfg
}

/// Migrated connection, or `None` when `SKIP_DB_TESTS` is set or no database answers.
pub(crate) async fn setup_test_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        println!("Skipping database tests (SKIP_DB_TESTS is set)");
        return None;
    }
    let ready = *MIGRATED
        .get_or_init(|| async {
            match connect_with_config(&test_config()).await {
                Ok(db) => migration::Migrator::up(&db, None).await.is_ok(),
                Err(e) => {
                    println!("Skipping database tests: {e}");
                    false
                }
            }
        })
        .await;
    if !ready {
        return None;
    }
    // fresh connection for the current test's runtime
    connect_with_config(&test_config()).await.ok()
}
