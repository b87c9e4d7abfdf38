// ==========================================
// MRP 对账系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将引擎/仓储/数据源错误转换为可区分的业务错误
// 约定: “无可计算内容” / “外部数据不可用” / “报告不存在” 必须是不同的错误
// ==========================================

use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use crate::source::error::SourceError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 外部数据源错误
    // ==========================================
    #[error("外部数据不可用: {message}")]
    ExternalSourceError { message: String, timed_out: bool },

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("乐观锁冲突: report_id={report_id}, expected_revision={expected}, actual_revision={actual}")]
    OptimisticLockFailure {
        report_id: String,
        expected: i32,
        actual: i32,
    },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::OptimisticLockFailure {
                report_id,
                expected,
                actual,
            } => ApiError::OptimisticLockFailure {
                report_id,
                expected,
                actual,
            },

            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ValidationError(format!("外键约束违反: {}", msg))
            }
        }
    }
}

// ==========================================
// 从 SourceError 转换
// ==========================================
impl From<SourceError> for ApiError {
    fn from(err: SourceError) -> Self {
        let timed_out = matches!(err, SourceError::Timeout { .. });
        ApiError::ExternalSourceError {
            message: err.to_string(),
            timed_out,
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => ApiError::ValidationError(msg),
            EngineError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            EngineError::ExternalSource(err) => err.into(),
            EngineError::Repository(err) => err.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
