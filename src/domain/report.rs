// ==========================================
// MRP 对账系统 - 报告领域模型
// ==========================================
// 对齐: report / report_specification / report_result 三张表
// 所有权: Report 独占其规格与结果（级联删除）
// ==========================================

use crate::domain::types::ReportStatus;
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Report - MRP 报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub report_id: String,         // 报告ID (UUID)
    pub title: String,             // 标题（用户数据，仅去重时比较）
    pub status: ReportStatus,      // 状态
    pub owner_id: String,          // 所有人
    pub created_at: NaiveDateTime, // 创建时间
    pub updated_at: NaiveDateTime, // 更新时间
    pub revision: i32,             // 乐观锁：修订号
}

impl Report {
    pub fn is_draft(&self) -> bool {
        self.status == ReportStatus::Draft
    }

    pub fn is_computed(&self) -> bool {
        self.status == ReportStatus::Computed
    }

    /// 是否参与按标题去重（空标题不参与）
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

// ==========================================
// ReportSpecification - 报告关联的规格
// ==========================================
// 唯一约束: (report_id, spec_code)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSpecification {
    pub id: String,                // 主键
    pub report_id: String,         // 所属报告
    pub spec_code: String,         // 外部规格编码
    pub spec_name: Option<String>, // 缓存的显示名称
    pub created_at: NaiveDateTime, // 添加时间
}

impl ReportSpecification {
    /// 显示名称：缓存名称优先，否则回退到编码
    pub fn display_name(&self) -> &str {
        self.spec_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.spec_code)
    }
}

// ==========================================
// ReportResult - 对账结果行
// ==========================================
// 红线: purchase_qty = max(0, demand_qty - balance_qty)，恒非负
// 红线: 每次计算整体替换，不做增量修补
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResult {
    pub id: String,                         // 主键
    pub report_id: String,                  // 所属报告
    pub material_code: String,              // 物料编码（规范化后）
    pub material_name: String,              // 物料名称
    pub unit: Option<String>,               // 计量单位
    pub nomenclature_group: Option<String>, // 物料分组
    pub demand_qty: f64,                    // 需求数量
    pub balance_qty: f64,                   // 主仓库存
    pub purchase_qty: f64,                  // 采购数量
}

impl ReportResult {
    /// 由需求与库存重新推导采购数量
    pub fn recomputed_purchase_qty(&self) -> f64 {
        (self.demand_qty - self.balance_qty).max(0.0)
    }
}

// ==========================================
// ReportPeriod - 报告周期（用于自动标题）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl ReportPeriod {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    /// 从起始日期起 days 天的周期（超出日期范围时截止到 NaiveDate::MAX）
    pub fn starting_at(from: NaiveDate, days: u32) -> Self {
        let to = from
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        Self { from, to }
    }
}

// ==========================================
// ReportSummary - 列表视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub report: Report,
    pub spec_count: usize,
    pub result_count: usize,
}

// ==========================================
// ReportDetail - 详情视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDetail {
    pub report: Report,
    pub specifications: Vec<ReportSpecification>,
    pub results: Vec<ReportResult>,
}
