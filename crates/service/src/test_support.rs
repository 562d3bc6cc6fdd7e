#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use models::db::{config_from_env, connect_with_config};

// Migrations run once per test process; `false` means the database is unusable.
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

/// Fresh connection to the test database, or `None` when DB tests should be skipped
/// (`SKIP_DB_TESTS` set, connection refused or migrations failing).
pub async fn get_db() -> Result<Option<DatabaseConnection>, anyhow::Error> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(None);
    }
    let ready = *MIGRATED
        .get_or_init(|| async {
            let mut cfg = config_from_env();
            cfg.min_connections = 1;
            cfg.connect_timeout_secs = 5;
            let db = match connect_with_config(&cfg).await {
                Ok(db) => db,
                Err(e) => {
                    eprintln!("skip: cannot connect to db: {e}");
                    return false;
                }
            };
            if let Err(e) = migration::Migrator::up(&db, None).await {
                eprintln!("skip: migrate up failed: {e}");
                return false;
            }
            true
        })
        .await;
    if !ready {
        return Ok(None);
    }

    // each #[tokio::test] has its own runtime, so the pool cannot be shared
    let mut cfg = config_from_env();
    cfg.max_connections = cfg.max_connections.max(5);
    cfg.min_connections = 1;
    cfg.acquire_timeout_secs = 10;
    Ok(Some(connect_with_config(&cfg).await?))
}
