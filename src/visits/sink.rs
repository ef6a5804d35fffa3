use std::fmt;

use async_trait::async_trait;

/// 刷盘失败的两种结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitFlushError {
    /// 存储确认没有写入，这批计数可以放回缓冲区
    NotApplied(String),
    /// 写入是否生效未知（例如超时），放回会有重复计数的风险
    Indeterminate(String),
}

impl VisitFlushError {
    /// 只有确认未写入的批次才能放回缓冲区
    pub fn is_safe_to_retry(&self) -> bool {
        matches!(self, VisitFlushError::NotApplied(_))
    }
}

impl fmt::Display for VisitFlushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisitFlushError::NotApplied(msg) => write!(f, "visit flush not applied: {}", msg),
            VisitFlushError::Indeterminate(msg) => {
                write!(f, "visit flush outcome unknown: {}", msg)
            }
        }
    }
}

impl std::error::Error for VisitFlushError {}

/// 访问计数的持久化目标
#[async_trait]
pub trait VisitSink: Send + Sync {
    /// 把每个短码累计的访问数加到已存储的计数上
    ///
    /// 不存在的短码直接忽略。
    async fn flush_visits(&self, updates: Vec<(String, u64)>) -> Result<(), VisitFlushError>;
}
