//! Write operations for SeaOrmStorage

use sea_orm::sea_query::{Alias, Order, Query, SelectStatement};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, SqlErr};
use tracing::{debug, info};

use super::SeaOrmStorage;
use super::converters::link_to_active_model;
use super::retry;
use crate::errors::{Result, TokenlinkError};
use crate::storage::Link;

use migration::entities::link;

impl SeaOrmStorage {
    /// 插入新链接，主键冲突映射为 `LinkAlreadyExists`
    pub(super) async fn insert_new(&self, new_link: &Link) -> Result<()> {
        let db = &self.db;
        let active_model = link_to_active_model(new_link);

        let result = retry::with_retry(
            &format!("insert({})", new_link.short_code),
            self.retry_config,
            || async {
                link::Entity::insert(active_model.clone())
                    .exec_without_returning(db)
                    .await
            },
        )
        .await;

        match result {
            Ok(_) => {
                debug!("Link inserted: {}", new_link.short_code);
                Ok(())
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
                TokenlinkError::link_already_exists(format!(
                    "short code already taken: {}",
                    new_link.short_code
                )),
            ),
            Err(e) => Err(TokenlinkError::database_operation(format!(
                "failed to insert link: {}",
                e
            ))),
        }
    }

    /// 只删除短码和 token 同时匹配的记录
    pub(super) async fn remove_owned(&self, code: &str, token: &str) -> Result<u64> {
        let db = &self.db;

        let result = retry::with_retry(&format!("delete({})", code), self.retry_config, || async {
            link::Entity::delete_many()
                .filter(link::Column::ShortCode.eq(code))
                .filter(link::Column::Token.eq(token))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| TokenlinkError::database_operation(format!("failed to delete link: {}", e)))?;

        if result.rows_affected > 0 {
            info!("Link deleted: {}", code);
        }
        Ok(result.rows_affected)
    }

    /// 删除最早创建的 `limit` 条记录，创建时间相同时按短码排序
    ///
    /// 单条语句：待删短码由子查询选出，绑定参数个数与 `limit` 无关。
    /// 派生表那一层是 MySQL 需要的（IN 子查询不能带 LIMIT）。
    pub(super) async fn remove_oldest(&self, limit: u64) -> Result<u64> {
        if limit == 0 {
            return Ok(0);
        }

        let db = &self.db;

        let result = retry::with_retry("evict_oldest", self.retry_config, || async {
            link::Entity::delete_many()
                .filter(link::Column::ShortCode.in_subquery(oldest_codes(limit)))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| TokenlinkError::database_operation(format!("failed to evict links: {}", e)))?;

        info!(
            "Evicted {} oldest links from {} storage",
            result.rows_affected,
            self.backend_name.to_uppercase()
        );
        Ok(result.rows_affected)
    }
}

/// `SELECT short_code FROM (SELECT short_code FROM links ORDER BY created_at, short_code LIMIT ?) AS oldest`
fn oldest_codes(limit: u64) -> SelectStatement {
    let inner = Query::select()
        .column(link::Column::ShortCode)
        .from(link::Entity)
        .order_by(link::Column::CreatedAt, Order::Asc)
        .order_by(link::Column::ShortCode, Order::Asc)
        .limit(limit)
        .to_owned();

    Query::select()
        .column(link::Column::ShortCode)
        .from_subquery(inner, Alias::new("oldest"))
        .to_owned()
}
