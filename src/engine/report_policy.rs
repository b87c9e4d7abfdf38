// ==========================================
// MRP 对账系统 - 报告标题与去重策略
// ==========================================
// 职责:
// 1. 自动生成报告标题
// 2. 计算成功后清理同名草稿（与对账计算分离，可单独测试）
// 3. 列表视图按标题去重
// 红线: 标题是用户数据，策略只做选择，不改写标题
// ==========================================

use crate::domain::report::{Report, ReportPeriod, ReportSummary};
use std::cmp::Ordering;
use std::collections::HashMap;

/// 生成自动标题: `MRP report #N for period DD.MM.YY–DD.MM.YY`
pub fn build_report_title(seq_no: usize, period: &ReportPeriod) -> String {
    format!(
        "MRP report #{} for period {}–{}",
        seq_no,
        period.from.format("%d.%m.%y"),
        period.to.format("%d.%m.%y")
    )
}

fn same_title(a: &str, b: &str) -> bool {
    a.trim() == b.trim()
}

// ==========================================
// DraftDeduplicator - 同名草稿清理
// ==========================================
pub struct DraftDeduplicator;

impl DraftDeduplicator {
    /// 选出需要删除的草稿ID
    ///
    /// 条件: 同一所有人、标题完全相同（非空）、状态为草稿、且不是刚计算的报告本身
    pub fn select_for_removal(kept: &Report, candidates: &[Report]) -> Vec<String> {
        if !kept.has_title() {
            return Vec::new();
        }

        candidates
            .iter()
            .filter(|r| r.report_id != kept.report_id)
            .filter(|r| r.owner_id == kept.owner_id)
            .filter(|r| r.is_draft())
            .filter(|r| same_title(&r.title, &kept.title))
            .map(|r| r.report_id.clone())
            .collect()
    }
}

// ==========================================
// ListingDeduplicator - 列表按标题去重
// ==========================================
pub struct ListingDeduplicator;

impl ListingDeduplicator {
    /// 比较两个同名报告的优劣: 已计算 > 草稿，其次规格数多者，再次更新时间新者
    pub fn compare(a: &ReportSummary, b: &ReportSummary) -> Ordering {
        a.report
            .status
            .rank()
            .cmp(&b.report.status.rank())
            .then_with(|| a.spec_count.cmp(&b.spec_count))
            .then_with(|| a.report.updated_at.cmp(&b.report.updated_at))
    }

    /// 同名报告只保留最优的一个；空标题不参与去重
    ///
    /// 输出按更新时间倒序
    pub fn dedup(summaries: Vec<ReportSummary>) -> Vec<ReportSummary> {
        let mut best: HashMap<String, ReportSummary> = HashMap::new();
        let mut untitled = Vec::new();

        for summary in summaries {
            if !summary.report.has_title() {
                untitled.push(summary);
                continue;
            }

            let key = summary.report.title.trim().to_string();
            match best.get(&key) {
                Some(current) if Self::compare(&summary, current) != Ordering::Greater => {}
                _ => {
                    best.insert(key, summary);
                }
            }
        }

        let mut result: Vec<ReportSummary> = best.into_values().chain(untitled).collect();
        result.sort_by(|a, b| {
            b.report
                .updated_at
                .cmp(&a.report.updated_at)
                .then_with(|| a.report.report_id.cmp(&b.report.report_id))
        });
        result
    }
}
