use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::SeaOrmStorage;
pub use models::Link;

/// 链接记录存储接口
///
/// 生命周期管理只通过这个接口访问持久化层，具体实现负责自身的并发控制。
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// 按短码查询
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>>;

    /// 按 token 查询该 token 拥有的全部链接（按创建时间倒序）
    async fn find_by_token(&self, token: &str) -> Result<Vec<Link>>;

    /// 插入新链接；短码已存在时返回 `LinkAlreadyExists`
    async fn insert(&self, link: &Link) -> Result<()>;

    /// 删除短码与 token 同时匹配的记录，返回删除的行数
    async fn delete_owned(&self, code: &str, token: &str) -> Result<u64>;

    /// 当前记录总数
    async fn count(&self) -> Result<u64>;

    /// 按创建时间升序删除最旧的 `limit` 条记录，返回删除的行数
    async fn evict_oldest(&self, limit: u64) -> Result<u64>;
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create() -> Result<Arc<SeaOrmStorage>> {
        let config = crate::config::get_config();
        let database_url = &config.database.database_url;

        // 从 URL 自动推断数据库类型
        let backend_type = backend::infer_backend_from_url(database_url)?;

        let storage = backend::SeaOrmStorage::new(database_url, &backend_type).await?;
        Ok(Arc::new(storage))
    }
}
