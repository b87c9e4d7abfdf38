// ==========================================
// MRP 对账系统 - 报告 API
// ==========================================
// 职责: 报告请求入口（参数校验 + 所有人隔离 + 调用生命周期引擎）
// 约定: 所有操作按 owner_id 隔离；他人的报告按“不存在”处理
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::report::{
    Report, ReportDetail, ReportPeriod, ReportSpecification, ReportSummary,
};
use crate::engine::breakdown::BreakdownRow;
use crate::engine::lifecycle::{CalculationOutcome, ReportLifecycleManager};
use crate::engine::report_policy::ListingDeduplicator;
use crate::source::Credentials;
use chrono::Local;
use std::sync::Arc;
use tracing::info;

pub struct ReportApi {
    lifecycle: Arc<ReportLifecycleManager>,
    config: Arc<ConfigManager>,
}

fn require(value: &str, what: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", what)));
    }
    Ok(())
}

impl ReportApi {
    pub fn new(lifecycle: Arc<ReportLifecycleManager>, config: Arc<ConfigManager>) -> Self {
        Self { lifecycle, config }
    }

    // ==========================================
    // 报告管理
    // ==========================================

    /// 创建草稿报告
    ///
    /// # 参数
    /// - owner_id: 所有人
    /// - title: 标题（为空时自动生成）
    /// - period: 自动标题使用的周期（为空时取 今天 … 今天+N天）
    pub fn create_report(
        &self,
        owner_id: &str,
        title: Option<&str>,
        period: Option<ReportPeriod>,
    ) -> ApiResult<Report> {
        require(owner_id, "所有人")?;
        let settings = self.config.load_settings()?;
        Ok(self
            .lifecycle
            .create_report(owner_id, title, period, &settings)?)
    }

    /// 报告列表（按标题去重，新的在前）
    pub fn list_reports(&self, owner_id: &str) -> ApiResult<Vec<ReportSummary>> {
        require(owner_id, "所有人")?;
        let summaries = self
            .lifecycle
            .repositories()
            .report_repo
            .list_summaries_by_owner(owner_id)?;
        Ok(ListingDeduplicator::dedup(summaries))
    }

    /// 报告详情（结果按物料编码排序）
    pub fn get_report(&self, owner_id: &str, report_id: &str) -> ApiResult<ReportDetail> {
        let report = self.lifecycle.load_owned(owner_id, report_id)?;
        let repos = self.lifecycle.repositories();

        Ok(ReportDetail {
            specifications: repos.spec_repo.find_by_report(report_id)?,
            results: repos.result_repo.find_by_report(report_id)?,
            report,
        })
    }

    /// 修改标题（任意状态）
    pub fn rename_report(&self, owner_id: &str, report_id: &str, title: &str) -> ApiResult<Report> {
        require(title, "标题")?;
        let report = self.lifecycle.load_owned(owner_id, report_id)?;

        let updated_at = Local::now().naive_local();
        let title = title.trim().to_string();
        self.lifecycle
            .repositories()
            .report_repo
            .update_title(report_id, &title, updated_at)?;

        info!(report_id = %report_id, title = %title, "报告已重命名");
        Ok(Report {
            title,
            updated_at,
            ..report
        })
    }

    /// 删除报告（级联删除规格与结果）
    pub fn delete_report(&self, owner_id: &str, report_id: &str) -> ApiResult<()> {
        self.lifecycle.load_owned(owner_id, report_id)?;

        if !self.lifecycle.repositories().report_repo.delete(report_id)? {
            return Err(ApiError::NotFound(format!("Report(id={})不存在", report_id)));
        }

        info!(report_id = %report_id, "报告已删除");
        Ok(())
    }

    // ==========================================
    // 规格管理
    // ==========================================

    pub fn add_specification(
        &self,
        owner_id: &str,
        report_id: &str,
        spec_code: &str,
        spec_name: Option<&str>,
    ) -> ApiResult<ReportSpecification> {
        require(spec_code, "规格编码")?;
        Ok(self
            .lifecycle
            .add_specification(owner_id, report_id, spec_code, spec_name)?)
    }

    pub fn remove_specification(
        &self,
        owner_id: &str,
        report_id: &str,
        spec_code: &str,
    ) -> ApiResult<()> {
        require(spec_code, "规格编码")?;
        Ok(self
            .lifecycle
            .remove_specification(owner_id, report_id, spec_code)?)
    }

    // ==========================================
    // 计算与溯源
    // ==========================================

    /// 计算报告（每次调用重新读取配置）
    pub async fn calculate(
        &self,
        owner_id: &str,
        report_id: &str,
        credentials: &Credentials,
    ) -> ApiResult<CalculationOutcome> {
        let settings = self.config.load_settings()?;
        Ok(self
            .lifecycle
            .calculate(owner_id, report_id, credentials, &settings)
            .await?)
    }

    /// 物料需求溯源
    pub async fn breakdown(
        &self,
        owner_id: &str,
        report_id: &str,
        material_code: &str,
        credentials: &Credentials,
    ) -> ApiResult<Vec<BreakdownRow>> {
        require(material_code, "物料编码")?;
        let settings = self.config.load_settings()?;
        Ok(self
            .lifecycle
            .breakdown(owner_id, report_id, material_code, credentials, &settings)
            .await?)
    }
}
