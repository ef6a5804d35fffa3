use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 短链接记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub short_code: String,
    pub destination: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub visits: u64,
}

impl Link {
    /// 新建一条访问数为 0 的记录
    pub fn new(
        short_code: impl Into<String>,
        destination: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            short_code: short_code.into(),
            destination: destination.into(),
            token: token.into(),
            created_at: Utc::now(),
            visits: 0,
        }
    }

    pub fn is_owned_by(&self, token: &str) -> bool {
        self.token == token
    }
}
