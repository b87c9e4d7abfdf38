// ==========================================
// MRP 对账系统 - 领域模型层
// ==========================================
// 职责: 定义报告实体、物料条目、库存树等领域类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod material;
pub mod report;
pub mod types;
pub mod warehouse;

// 重导出核心类型
pub use material::{DemandEntry, MaterialEntry, RawSpecification};
pub use report::{
    Report, ReportDetail, ReportPeriod, ReportResult, ReportSpecification, ReportSummary,
};
pub use types::ReportStatus;
pub use warehouse::{BalanceLeaf, BalanceNode, StockRow, Warehouse};
