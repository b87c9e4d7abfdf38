use crate::api::error::ApiError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// 公共工具：错误映射、日期解析、序列化
// ==========================================

/// 错误响应（返回给调用方）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

/// 将ApiError转换为JSON字符串
pub fn map_api_error(err: ApiError) -> String {
    let error_response = ErrorResponse {
        code: match &err {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::ExternalSourceError { .. } => "EXTERNAL_SOURCE_ERROR",
            ApiError::OptimisticLockFailure { .. } => "OPTIMISTIC_LOCK_FAILURE",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
            ApiError::DatabaseTransactionError(_) => "DATABASE_TRANSACTION_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
        .to_string(),
        message: err.to_string(),
        details: match &err {
            ApiError::ExternalSourceError { timed_out, .. } => {
                Some(serde_json::json!({ "timed_out": timed_out }))
            }
            ApiError::OptimisticLockFailure {
                report_id,
                expected,
                actual,
            } => Some(serde_json::json!({
                "report_id": report_id,
                "expected_revision": expected,
                "actual_revision": actual,
            })),
            _ => None,
        },
    };

    serde_json::to_string(&error_response).unwrap_or_else(|_| err.to_string())
}

/// 解析日期字符串
pub(super) fn parse_date(date_str: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|e| map_api_error(ApiError::InvalidInput(format!("日期格式错误（应为YYYY-MM-DD）: {}", e))))
}

/// 序列化成功结果
pub(super) fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value)
        .map_err(|e| map_api_error(ApiError::InternalError(format!("序列化失败: {}", e))))
}
