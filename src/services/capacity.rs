//! 容量控制
//!
//! 链接数量只做尽力而为的限制：创建请求按计数周期触发清理，超出上限时删除
//! 最早创建的记录。清理失败只记日志，不影响触发它的请求。

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::LinksConfig;
use crate::errors::Result;
use crate::storage::LinkStore;

/// 一次清理的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// 记录数未超过上限
    WithinCeiling { count: u64 },
    /// 删除了 `evicted` 条最旧记录
    Evicted { count: u64, evicted: u64 },
    /// 已有清理在进行
    Skipped,
}

pub struct CapacityGuard {
    /// 距上次检查以来的创建次数
    creations: AtomicI64,
    threshold: i64,
    ceiling: u64,
    sweep_lock: Mutex<()>,
}

impl CapacityGuard {
    pub fn new(threshold: i64, ceiling: u64) -> Self {
        Self {
            creations: AtomicI64::new(0),
            threshold,
            ceiling,
            sweep_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &LinksConfig) -> Self {
        Self::new(config.sweep_threshold, config.capacity_ceiling)
    }

    /// 记录一次创建尝试，返回本次是否应当清理
    ///
    /// 计数为 0 或超过阈值时触发并把计数置为 1，所以首次调用必定触发，
    /// 之后每 `threshold + 1` 次触发一次。
    pub fn observe_creation(&self) -> bool {
        let threshold = self.threshold;
        let previous = self
            .creations
            // 触发后从 1 重新计数，不是 0：置 0 的话每次调用都满足 `<= 0`
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| {
                if c > threshold || c <= 0 {
                    Some(1)
                } else {
                    Some(c + 1)
                }
            })
            .unwrap_or(0);

        previous > threshold || previous <= 0
    }

    /// 创建路径调用：按计数决定是否清理，错误只记录不返回
    pub async fn on_creation(&self, store: &dyn LinkStore) {
        if !self.observe_creation() {
            return;
        }

        debug!("CapacityGuard: creation-triggered sweep");
        if let Err(e) = self.sweep(store).await {
            error!("CapacityGuard: sweep failed: {}", e);
        }
    }

    /// 记录数超过上限时删除最旧的 `count - ceiling` 条
    pub async fn sweep(&self, store: &dyn LinkStore) -> Result<SweepOutcome> {
        let Ok(_guard) = self.sweep_lock.try_lock() else {
            debug!("CapacityGuard: sweep already running, skipped");
            return Ok(SweepOutcome::Skipped);
        };

        let count = store.count().await?;
        if count <= self.ceiling {
            return Ok(SweepOutcome::WithinCeiling { count });
        }

        let evicted = store.evict_oldest(count - self.ceiling).await?;
        info!(
            "CapacityGuard: {} links over ceiling {}, evicted {} oldest",
            count, self.ceiling, evicted
        );
        Ok(SweepOutcome::Evicted { count, evicted })
    }

    /// 固定间隔清理，与请求量无关
    pub async fn start_background_task(self: Arc<Self>, store: Arc<dyn LinkStore>, interval: Duration) {
        info!(
            "CapacityGuard: periodic sweep every {}s (ceiling {})",
            interval.as_secs(),
            self.ceiling
        );
        let mut ticker = tokio::time::interval(interval);
        // interval 的第一次 tick 立即完成
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep(store.as_ref()).await {
                error!("CapacityGuard: periodic sweep failed: {}", e);
            }
        }
    }
}
