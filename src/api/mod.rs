// ==========================================
// MRP 对账系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令层调用
// ==========================================

pub mod error;
pub mod report_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use report_api::ReportApi;
