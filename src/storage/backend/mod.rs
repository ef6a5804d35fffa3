//! SeaORM storage backend
//!
//! Link records live in a single `links` table on SQLite, MySQL/MariaDB
//! or PostgreSQL.

mod connection;
mod converters;
mod mutations;
mod query;
pub mod retry;
mod visit_sink;

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::errors::{Result, TokenlinkError};
use crate::storage::LinkStore;
use crate::storage::models::Link;
use crate::visits::VisitSink;

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{link_to_active_model, model_to_link};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(TokenlinkError::database_config(format!(
            "cannot infer database type from URL: {} (supported: sqlite://, *.db, mysql://, mariadb://, postgres://)",
            database_url
        )))
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(TokenlinkError::database_config("database_url is empty"));
        }

        let config = crate::config::get_config();
        let retry_config = retry::RetryConfig::from_database_config(&config.database);

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url, &config.database).await?
        } else {
            connect_generic(database_url, backend_name, &config.database).await?
        };

        Self::from_connection(db, backend_name, retry_config).await
    }

    /// 基于已建立的连接构造存储并执行迁移
    pub async fn from_connection(
        db: DatabaseConnection,
        backend_name: &str,
        retry_config: retry::RetryConfig,
    ) -> Result<Self> {
        run_migrations(&db).await?;

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            retry_config,
        };

        info!(
            "{} storage initialized",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    /// `sqlite`, `mysql` or `postgres`
    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    pub fn as_visit_sink(&self) -> Arc<dyn VisitSink> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl LinkStore for SeaOrmStorage {
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>> {
        self.get(code).await
    }

    async fn find_by_token(&self, token: &str) -> Result<Vec<Link>> {
        self.list_by_token(token).await
    }

    async fn insert(&self, link: &Link) -> Result<()> {
        self.insert_new(link).await
    }

    async fn delete_owned(&self, code: &str, token: &str) -> Result<u64> {
        self.remove_owned(code, token).await
    }

    async fn count(&self) -> Result<u64> {
        self.count_links().await
    }

    async fn evict_oldest(&self, limit: u64) -> Result<u64> {
        self.remove_oldest(limit).await
    }
}
