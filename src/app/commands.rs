// ==========================================
// MRP 对账系统 - 命令层（按域拆分）
// ==========================================
// 职责: 对外命令入口，参数为原始字符串，返回 JSON 字符串
// 约定: 成功 Ok(JSON)，失败 Err(ErrorResponse JSON)
// ==========================================

mod common;
mod config;
mod report;

pub use common::{map_api_error, ErrorResponse};
pub use config::*;
pub use report::*;
