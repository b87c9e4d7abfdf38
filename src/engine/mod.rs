// ==========================================
// MRP 对账系统 - 引擎层
// ==========================================
// 职责: 实现对账业务规则,不拼 SQL
// 组成:
// - 纯函数: 编码规范化、规格物料提取、库存树归约、需求汇总、对账、溯源
// - 编排: 报告生命周期（外部数据拉取 + 事务提交）
// 红线: Engine 不拼 SQL
// ==========================================

pub mod aggregator;
pub mod balance_tree;
pub mod breakdown;
pub mod error;
pub mod extractor;
pub mod lifecycle;
pub mod normalizer;
pub mod reconciliation;
pub mod report_policy;
pub mod repositories;

// 重导出核心引擎
pub use aggregator::{aggregate, DemandAggregator, DemandMap};
pub use balance_tree::{
    build_lookup, filter_to_warehouse, flatten_to_map, resolve_warehouse_name, NomenclatureLookup,
};
pub use breakdown::{BreakdownResolver, BreakdownRow, SpecificationMaterials};
pub use error::{EngineError, EngineResult};
pub use extractor::{extract_materials, SpecificationExtractor};
pub use lifecycle::{CalculationOutcome, ReportLifecycleManager};
pub use normalizer::{codes_match, normalize_code};
pub use reconciliation::{BalanceView, ReconciledRow, ReconciliationEngine};
pub use report_policy::{build_report_title, DraftDeduplicator, ListingDeduplicator};
pub use repositories::ReportRepositories;
