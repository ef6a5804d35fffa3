//! Database connections
//!
//! Every tunable comes from [`DatabaseConfig`]; nothing here reads the
//! global config.

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::errors::{Result, TokenlinkError};
use migration::{Migrator, MigratorTrait};

/// 连接 SQLite（文件不存在时自动创建，启用 WAL）
pub async fn connect_sqlite(
    database_url: &str,
    config: &DatabaseConfig,
) -> Result<DatabaseConnection> {
    use sea_orm::SqlxSqliteConnector;
    use sea_orm::sqlx::sqlite::{
        SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
    };
    use std::str::FromStr;

    let busy_timeout = Duration::from_millis(config.sqlite_busy_timeout_ms);
    let opt = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| TokenlinkError::database_config(format!("invalid SQLite URL: {}", e)))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(busy_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.pool_size.max(1))
        .acquire_timeout(Duration::from_secs(config.timeout.max(1)))
        .connect_with(opt)
        .await
        .map_err(|e| {
            TokenlinkError::database_connection(format!("failed to open SQLite database: {}", e))
        })?;

    debug!(
        "SQLite pool ready (max {} connections, busy_timeout {:?})",
        config.pool_size.max(1),
        busy_timeout
    );
    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// 连接 MySQL / PostgreSQL
pub async fn connect_generic(
    database_url: &str,
    backend_name: &str,
    config: &DatabaseConfig,
) -> Result<DatabaseConnection> {
    let timeout = Duration::from_secs(config.timeout.max(1));

    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(config.pool_size)
        .min_connections(config.pool_size.min(2))
        .connect_timeout(timeout)
        .acquire_timeout(timeout)
        .idle_timeout(Duration::from_secs(config.idle_timeout))
        .sqlx_logging(false);

    Database::connect(opt).await.map_err(|e| {
        TokenlinkError::database_connection(format!(
            "failed to connect to {} database: {}",
            backend_name.to_uppercase(),
            e
        ))
    })
}

/// Bring the `links` schema up to date
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .map_err(|e| TokenlinkError::database_operation(format!("migration failed: {}", e)))?;

    info!("Database migrations completed");
    Ok(())
}
