// ==========================================
// MRP 对账系统 - 外部数据源错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 本层不做重试，重试策略属于外部连接器
// ==========================================

use thiserror::Error;

/// 外部数据源错误类型
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("外部数据源不可用: {0}")]
    Unavailable(String),

    #[error("外部数据源超时: operation={operation}, timeout={timeout_secs}s")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },

    #[error("外部数据无法解析: {0}")]
    InvalidPayload(String),

    #[error("外部数据读取失败: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::InvalidPayload(err.to_string())
    }
}

/// Result 类型别名
pub type SourceResult<T> = Result<T, SourceError>;
