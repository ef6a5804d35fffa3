//! Read-only queries for SeaOrmStorage

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::debug;

use super::SeaOrmStorage;
use super::converters::model_to_link;
use super::retry;
use crate::errors::{Result, TokenlinkError};
use crate::storage::Link;

use migration::entities::link;

impl SeaOrmStorage {
    pub(super) async fn get(&self, code: &str) -> Result<Option<Link>> {
        let db = &self.db;

        let model = retry::with_retry(&format!("get({})", code), self.retry_config, || async {
            link::Entity::find_by_id(code.to_string()).one(db).await
        })
        .await
        .map_err(|e| TokenlinkError::database_operation(format!("failed to query link: {}", e)))?;

        Ok(model.map(model_to_link))
    }

    pub(super) async fn list_by_token(&self, token: &str) -> Result<Vec<Link>> {
        let db = &self.db;

        let models = retry::with_retry("list_by_token", self.retry_config, || async {
            link::Entity::find()
                .filter(link::Column::Token.eq(token))
                .order_by_desc(link::Column::CreatedAt)
                .order_by_asc(link::Column::ShortCode)
                .all(db)
                .await
        })
        .await
        .map_err(|e| TokenlinkError::database_operation(format!("failed to list links: {}", e)))?;

        debug!("Found {} links for token", models.len());
        Ok(models.into_iter().map(model_to_link).collect())
    }

    pub(super) async fn count_links(&self) -> Result<u64> {
        let db = &self.db;

        retry::with_retry("count", self.retry_config, || async {
            link::Entity::find().count(db).await
        })
        .await
        .map_err(|e| TokenlinkError::database_operation(format!("failed to count links: {}", e)))
    }
}
