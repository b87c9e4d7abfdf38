// ==========================================
// MRP 对账系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 外部数据源错误与仓储错误原样透传，由 API 层分类
// ==========================================

use crate::repository::error::RepositoryError;
use crate::source::error::SourceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// 业务前置条件不满足（无规格、非草稿状态修改规格等）
    #[error("业务校验失败: {0}")]
    Validation(String),

    #[error("{entity}不存在: {id}")]
    NotFound { entity: String, id: String },

    #[error("外部数据源错误: {0}")]
    ExternalSource(#[from] SourceError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    pub fn report_not_found(report_id: &str) -> Self {
        EngineError::NotFound {
            entity: "Report".to_string(),
            id: report_id.to_string(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
