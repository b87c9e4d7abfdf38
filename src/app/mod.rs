// ==========================================
// MRP 对账系统 - 应用层
// ==========================================
// 职责: 组装应用状态,提供命令入口
// ==========================================

pub mod commands;
pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
