// ==========================================
// MRP 对账系统 - 核心库
// ==========================================
// 职责: 规格需求汇总 → 主仓库存对账 → 采购需求生成
// 技术栈: Rust + SQLite + tokio
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 外部数据源 - ERP 接口
pub mod source;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装与命令入口
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::ReportStatus;

// 领域实体
pub use domain::{
    BalanceNode, DemandEntry, MaterialEntry, RawSpecification, Report, ReportDetail,
    ReportResult, ReportSpecification, ReportSummary, Warehouse,
};

// 引擎
pub use engine::{
    normalize_code, BreakdownResolver, CalculationOutcome, DemandAggregator,
    ReconciliationEngine, ReportLifecycleManager, SpecificationExtractor,
};

// API
pub use api::{ApiError, ReportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "MRP 对账系统";
