// ==========================================
// MRP 对账系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合报告生命周期所需的所有 Repository
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{ReportRepository, ReportResultRepository, ReportSpecificationRepository};

/// 报告仓储集合
///
/// # 包含的仓储
/// - `report_repo`: 报告头、结果提交、级联删除
/// - `spec_repo`: 报告规格
/// - `result_repo`: 报告结果（只读）
#[derive(Clone)]
pub struct ReportRepositories {
    pub report_repo: Arc<ReportRepository>,
    pub spec_repo: Arc<ReportSpecificationRepository>,
    pub result_repo: Arc<ReportResultRepository>,
}

impl ReportRepositories {
    /// 基于同一连接创建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            report_repo: Arc::new(ReportRepository::new(conn.clone())),
            spec_repo: Arc::new(ReportSpecificationRepository::new(conn.clone())),
            result_repo: Arc::new(ReportResultRepository::new(conn)),
        }
    }
}
