// ==========================================
// MRP 对账系统 - 报告生命周期管理
// ==========================================
// 状态机: DRAFT --calculate--> COMPUTED --calculate--> COMPUTED（结果整体替换）
// 职责:
// 1. 创建报告（自动标题）
// 2. 规格增删（仅草稿）
// 3. 计算: 并发拉取外部数据 → 汇总需求 → 主仓对账 → 事务提交
// 4. 计算成功后清理同名草稿（独立步骤）
// 5. 物料需求溯源
// 红线:
// - 任一外部调用失败则整体中止，不写任何数据
// - 提交以计算开始时读取的 revision 为条件，并发修改即冲突
// - 数据库锁不跨 .await 持有
// ==========================================

use crate::config::MrpSettings;
use crate::domain::report::{Report, ReportPeriod, ReportResult, ReportSpecification};
use crate::domain::types::ReportStatus;
use crate::domain::warehouse::{BalanceNode, Warehouse};
use crate::engine::aggregator::{DemandAggregator, DemandMap};
use crate::engine::breakdown::{BreakdownResolver, BreakdownRow, SpecificationMaterials};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::extractor::SpecificationExtractor;
use crate::engine::reconciliation::ReconciliationEngine;
use crate::engine::report_policy::{build_report_title, DraftDeduplicator};
use crate::engine::repositories::ReportRepositories;
use crate::repository::error::RepositoryError;
use crate::source::{
    with_timeout, Credentials, SourceResult, SpecificationQuery, SpecificationSource,
    WarehouseSource,
};
use chrono::Local;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const MSG_NO_SPECIFICATIONS: &str = "add at least one specification";
pub const MSG_NOT_DRAFT: &str = "specifications can only be modified on a draft";

/// 一次计算的结果摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationOutcome {
    pub report: Report,
    pub result_count: usize,
    pub purchase_count: usize,
    /// 实际用于过滤的主仓显示名称（None 表示未过滤）
    pub warehouse_name: Option<String>,
    pub removed_drafts: usize,
}

// ==========================================
// ReportLifecycleManager
// ==========================================
pub struct ReportLifecycleManager {
    repos: ReportRepositories,
    spec_source: Arc<dyn SpecificationSource>,
    warehouse_source: Arc<dyn WarehouseSource>,
}

impl ReportLifecycleManager {
    pub fn new(
        repos: ReportRepositories,
        spec_source: Arc<dyn SpecificationSource>,
        warehouse_source: Arc<dyn WarehouseSource>,
    ) -> Self {
        Self {
            repos,
            spec_source,
            warehouse_source,
        }
    }

    pub fn repositories(&self) -> &ReportRepositories {
        &self.repos
    }

    /// 读取报告并校验所有人；他人的报告按不存在处理
    pub fn load_owned(&self, owner_id: &str, report_id: &str) -> EngineResult<Report> {
        match self.repos.report_repo.find_by_id(report_id)? {
            Some(report) if report.owner_id == owner_id => Ok(report),
            _ => Err(EngineError::report_not_found(report_id)),
        }
    }

    // ==========================================
    // 创建
    // ==========================================

    /// 创建草稿报告
    ///
    /// 标题为空时自动生成: `MRP report #N for period ...`，N 为该所有人的报告数 + 1，
    /// 周期缺省为 今天 … 今天 + report_period_days
    pub fn create_report(
        &self,
        owner_id: &str,
        title: Option<&str>,
        period: Option<ReportPeriod>,
        settings: &MrpSettings,
    ) -> EngineResult<Report> {
        let owner_id = owner_id.trim();
        if owner_id.is_empty() {
            return Err(EngineError::Validation("owner is required".to_string()));
        }

        let title = match title.map(str::trim).filter(|t| !t.is_empty()) {
            Some(title) => title.to_string(),
            None => {
                let seq_no = self.repos.report_repo.count_by_owner(owner_id)? + 1;
                let period = period.unwrap_or_else(|| {
                    ReportPeriod::starting_at(
                        Local::now().date_naive(),
                        settings.report_period_days,
                    )
                });
                build_report_title(seq_no, &period)
            }
        };

        let now = Local::now().naive_local();
        let report = Report {
            report_id: Uuid::new_v4().to_string(),
            title,
            status: ReportStatus::Draft,
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
            revision: 0,
        };

        self.repos.report_repo.create(&report)?;
        info!(report_id = %report.report_id, owner_id = %owner_id, title = %report.title, "报告已创建");
        Ok(report)
    }

    // ==========================================
    // 规格增删（仅草稿）
    // ==========================================

    pub fn add_specification(
        &self,
        owner_id: &str,
        report_id: &str,
        spec_code: &str,
        spec_name: Option<&str>,
    ) -> EngineResult<ReportSpecification> {
        let spec_code = spec_code.trim();
        if spec_code.is_empty() {
            return Err(EngineError::Validation(
                "specification code is required".to_string(),
            ));
        }

        let report = self.load_owned(owner_id, report_id)?;
        if !report.status.allows_spec_edit() {
            return Err(EngineError::Validation(MSG_NOT_DRAFT.to_string()));
        }

        let duplicate = || {
            EngineError::Validation(format!(
                "specification {} is already in the report",
                spec_code
            ))
        };
        if self.repos.spec_repo.find_by_code(report_id, spec_code)?.is_some() {
            return Err(duplicate());
        }

        let spec = ReportSpecification {
            id: Uuid::new_v4().to_string(),
            report_id: report_id.to_string(),
            spec_code: spec_code.to_string(),
            spec_name: spec_name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            created_at: Local::now().naive_local(),
        };

        match self.repos.spec_repo.add(&spec, report.revision) {
            Ok(()) => {
                info!(report_id = %report_id, spec_code = %spec_code, "规格已添加");
                Ok(spec)
            }
            Err(RepositoryError::UniqueConstraintViolation(_)) => Err(duplicate()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn remove_specification(
        &self,
        owner_id: &str,
        report_id: &str,
        spec_code: &str,
    ) -> EngineResult<()> {
        let report = self.load_owned(owner_id, report_id)?;
        if !report.status.allows_spec_edit() {
            return Err(EngineError::Validation(MSG_NOT_DRAFT.to_string()));
        }

        let removed = self.repos.spec_repo.remove(
            report_id,
            spec_code.trim(),
            report.revision,
            Local::now().naive_local(),
        )?;

        if !removed {
            return Err(EngineError::NotFound {
                entity: "ReportSpecification".to_string(),
                id: spec_code.trim().to_string(),
            });
        }

        info!(report_id = %report_id, spec_code = %spec_code.trim(), "规格已移除");
        Ok(())
    }

    // ==========================================
    // 计算
    // ==========================================

    /// 计算报告
    ///
    /// # 错误
    /// - `EngineError::Validation`: 报告没有规格
    /// - `EngineError::ExternalSource`: 任一外部调用失败或超时（不写任何数据）
    /// - `EngineError::Repository(OptimisticLockFailure)`: 计算期间报告被并发修改
    #[instrument(skip(self, credentials, settings), fields(report_id = %report_id, owner_id = %owner_id))]
    pub async fn calculate(
        &self,
        owner_id: &str,
        report_id: &str,
        credentials: &Credentials,
        settings: &MrpSettings,
    ) -> EngineResult<CalculationOutcome> {
        let report = self.load_owned(owner_id, report_id)?;
        let specs = self.repos.spec_repo.find_by_report(report_id)?;
        if specs.is_empty() {
            return Err(EngineError::Validation(MSG_NO_SPECIFICATIONS.to_string()));
        }

        let expected_revision = report.revision;
        let timeout = settings.source_timeout();

        let (materials, (tree, warehouses)) = tokio::try_join!(
            self.fetch_materials(credentials, &specs, timeout),
            self.fetch_balances(credentials, timeout),
        )?;

        let mut demand = DemandMap::new();
        for spec in &materials {
            DemandAggregator::merge_into(&mut demand, &spec.materials);
        }

        let view = ReconciliationEngine::prepare_balances(
            &tree,
            &warehouses,
            &settings.main_warehouse_code,
        );
        let rows = ReconciliationEngine::reconcile_view(&demand, &view);

        let results: Vec<ReportResult> = rows
            .into_iter()
            .map(|row| ReportResult {
                id: Uuid::new_v4().to_string(),
                report_id: report_id.to_string(),
                material_code: row.material_code,
                material_name: row.material_name,
                unit: row.unit,
                nomenclature_group: row.nomenclature_group,
                demand_qty: row.demand_qty,
                balance_qty: row.balance_qty,
                purchase_qty: row.purchase_qty,
            })
            .collect();

        let computed_at = Local::now().naive_local();
        let new_revision = self.repos.report_repo.commit_computation(
            report_id,
            expected_revision,
            &results,
            computed_at,
        )?;

        // 取库期间标题可能被修改（重命名不改 revision），以提交后的记录为准
        let computed = match self.repos.report_repo.find_by_id(report_id)? {
            Some(stored) => stored,
            None => Report {
                status: ReportStatus::Computed,
                revision: new_revision,
                updated_at: computed_at,
                ..report
            },
        };

        let purchase_count = results.iter().filter(|r| r.purchase_qty > 0.0).count();
        info!(
            spec_count = specs.len(),
            result_count = results.len(),
            purchase_count,
            revision = new_revision,
            "报告计算完成"
        );

        // 结果已提交；同名草稿清理失败不影响本次计算
        let removed_drafts = match self.remove_duplicate_drafts(&computed) {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "同名草稿清理失败");
                0
            }
        };

        Ok(CalculationOutcome {
            report: computed,
            result_count: results.len(),
            purchase_count,
            warehouse_name: view.warehouse_name,
            removed_drafts,
        })
    }

    /// 删除同一所有人下与已计算报告同名的草稿
    pub fn remove_duplicate_drafts(&self, kept: &Report) -> EngineResult<usize> {
        let candidates = self.repos.report_repo.find_by_owner(&kept.owner_id)?;
        let to_remove = DraftDeduplicator::select_for_removal(kept, &candidates);
        if to_remove.is_empty() {
            return Ok(0);
        }

        let removed = self.repos.report_repo.delete_many(&to_remove)?;
        info!(report_id = %kept.report_id, removed, "已清理同名草稿");
        Ok(removed)
    }

    // ==========================================
    // 溯源
    // ==========================================

    /// 指定物料在报告各规格中的需求构成（任意状态可用，只读）
    #[instrument(skip(self, credentials, settings), fields(report_id = %report_id, material_code = %material_code))]
    pub async fn breakdown(
        &self,
        owner_id: &str,
        report_id: &str,
        material_code: &str,
        credentials: &Credentials,
        settings: &MrpSettings,
    ) -> EngineResult<Vec<BreakdownRow>> {
        if material_code.trim().is_empty() {
            return Err(EngineError::Validation(
                "material code is required".to_string(),
            ));
        }

        self.load_owned(owner_id, report_id)?;
        let specs = self.repos.spec_repo.find_by_report(report_id)?;
        if specs.is_empty() {
            return Ok(Vec::new());
        }

        let materials = self
            .fetch_materials(credentials, &specs, settings.source_timeout())
            .await?;
        Ok(BreakdownResolver::resolve(&materials, material_code))
    }

    // ==========================================
    // 外部数据拉取
    // ==========================================

    /// 并发拉取全部规格明细，任一失败整体失败
    async fn fetch_materials(
        &self,
        credentials: &Credentials,
        specs: &[ReportSpecification],
        timeout: Duration,
    ) -> SourceResult<Vec<SpecificationMaterials>> {
        try_join_all(
            specs
                .iter()
                .map(|spec| self.fetch_specification(credentials, spec, timeout)),
        )
        .await
    }

    async fn fetch_specification(
        &self,
        credentials: &Credentials,
        spec: &ReportSpecification,
        timeout: Duration,
    ) -> SourceResult<SpecificationMaterials> {
        let query = SpecificationQuery::full_by_code(spec.spec_code.clone());
        let records = with_timeout(
            "get_specifications",
            timeout,
            self.spec_source.get_specifications(credentials, &query),
        )
        .await?;

        let cached_name = spec
            .spec_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let Some(raw) = records.first() else {
            warn!(spec_code = %spec.spec_code, "外部系统未返回该规格，按无物料处理");
            return Ok(SpecificationMaterials {
                spec_code: spec.spec_code.clone(),
                spec_name: spec.display_name().to_string(),
                materials: Vec::new(),
            });
        };

        if records.len() > 1 {
            warn!(spec_code = %spec.spec_code, count = records.len(), "规格编码返回多条记录，使用第一条");
        }

        Ok(SpecificationMaterials {
            spec_code: spec.spec_code.clone(),
            spec_name: cached_name
                .or_else(|| SpecificationExtractor::spec_name(raw))
                .unwrap_or_else(|| spec.spec_code.clone()),
            materials: SpecificationExtractor::extract_materials(raw),
        })
    }

    /// 并发拉取库存树与仓库目录
    async fn fetch_balances(
        &self,
        credentials: &Credentials,
        timeout: Duration,
    ) -> SourceResult<(Vec<BalanceNode>, Vec<Warehouse>)> {
        tokio::try_join!(
            with_timeout(
                "get_warehouse_balances",
                timeout,
                self.warehouse_source.get_warehouse_balances(credentials),
            ),
            with_timeout(
                "get_warehouses",
                timeout,
                self.warehouse_source.get_warehouses(credentials),
            ),
        )
    }
}
