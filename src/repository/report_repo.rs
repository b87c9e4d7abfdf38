// ==========================================
// MRP 对账系统 - 报告数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 并发: 计算结果提交以 revision 为乐观锁条件
// 事务: 结果替换、级联删除均在单个事务内完成
// ==========================================

use crate::domain::report::{Report, ReportResult, ReportSummary};
use crate::domain::types::ReportStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

/// 时间戳存储格式（微秒精度，保证同秒内的更新顺序可比较）
pub(crate) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const TS_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub(crate) fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

pub(crate) fn parse_ts(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TS_PARSE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

const REPORT_COLUMNS: &str =
    "report_id, title, status, owner_id, created_at, updated_at, revision";

// ==========================================
// ReportRepository - 报告仓储
// ==========================================
pub struct ReportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReportRepository {
    /// 创建新的ReportRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建报告
    ///
    /// # 返回
    /// - `Ok(report_id)`: 成功
    pub fn create(&self, report: &Report) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO report (
                report_id, title, status, owner_id, created_at, updated_at, revision
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &report.report_id,
                &report.title,
                report.status.to_db_str(),
                &report.owner_id,
                format_ts(&report.created_at),
                format_ts(&report.updated_at),
                report.revision,
            ],
        )?;

        Ok(report.report_id.clone())
    }

    /// 按report_id查询报告
    ///
    /// # 返回
    /// - `Ok(Some(Report))`: 找到
    /// - `Ok(None)`: 未找到
    pub fn find_by_id(&self, report_id: &str) -> RepositoryResult<Option<Report>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("SELECT {} FROM report WHERE report_id = ?", REPORT_COLUMNS),
            params![report_id],
            map_row,
        ) {
            Ok(report) => Ok(Some(report)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询某所有人的全部报告，按更新时间倒序
    pub fn find_by_owner(&self, owner_id: &str) -> RepositoryResult<Vec<Report>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM report WHERE owner_id = ? ORDER BY updated_at DESC, report_id",
            REPORT_COLUMNS
        ))?;

        let reports = stmt
            .query_map(params![owner_id], map_row)?
            .collect::<Result<Vec<Report>, _>>()?;

        Ok(reports)
    }

    /// 某所有人的报告数量（自动标题序号）
    pub fn count_by_owner(&self, owner_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM report WHERE owner_id = ?",
            params![owner_id],
            |row| row.get(0),
        )?;

        Ok(count.max(0) as usize)
    }

    /// 列表摘要（带规格数、结果数）
    pub fn list_summaries_by_owner(&self, owner_id: &str) -> RepositoryResult<Vec<ReportSummary>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT r.report_id, r.title, r.status, r.owner_id,
                      r.created_at, r.updated_at, r.revision,
                      (SELECT COUNT(*) FROM report_specification s WHERE s.report_id = r.report_id),
                      (SELECT COUNT(*) FROM report_result x WHERE x.report_id = r.report_id)
               FROM report r
               WHERE r.owner_id = ?
               ORDER BY r.updated_at DESC, r.report_id"#,
        )?;

        let summaries = stmt
            .query_map(params![owner_id], |row| {
                Ok(ReportSummary {
                    report: map_row(row)?,
                    spec_count: row.get::<_, i64>(7)?.max(0) as usize,
                    result_count: row.get::<_, i64>(8)?.max(0) as usize,
                })
            })?
            .collect::<Result<Vec<ReportSummary>, _>>()?;

        Ok(summaries)
    }

    /// 修改标题（任意状态）
    ///
    /// # 错误
    /// - `RepositoryError::NotFound`: report_id不存在
    pub fn update_title(
        &self,
        report_id: &str,
        title: &str,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let rows_affected = conn.execute(
            "UPDATE report SET title = ?, updated_at = ? WHERE report_id = ?",
            params![title, format_ts(&updated_at), report_id],
        )?;

        if rows_affected == 0 {
            return Err(RepositoryError::not_found("Report", report_id));
        }
        Ok(())
    }

    /// 删除报告及其规格、结果
    ///
    /// # 返回
    /// - `Ok(true)`: 已删除
    /// - `Ok(false)`: 报告不存在
    pub fn delete(&self, report_id: &str) -> RepositoryResult<bool> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let deleted = delete_cascade(&tx, report_id)?;
        tx.commit()?;
        Ok(deleted)
    }

    /// 批量删除（同名草稿清理），单事务
    ///
    /// # 返回
    /// - 实际删除的报告数量
    pub fn delete_many(&self, report_ids: &[String]) -> RepositoryResult<usize> {
        if report_ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut deleted = 0;
        for report_id in report_ids {
            if delete_cascade(&tx, report_id)? {
                deleted += 1;
            }
        }
        tx.commit()?;
        Ok(deleted)
    }

    /// 提交一次计算结果（带乐观锁检查）
    ///
    /// 单事务内: 校验 revision → 置为 COMPUTED、revision+1 → 删除旧结果 → 写入新结果。
    /// 任一步失败整体回滚，旧结果保持不变。
    ///
    /// # 返回
    /// - `Ok(new_revision)`
    ///
    /// # 错误
    /// - `RepositoryError::OptimisticLockFailure`: revision不匹配（并发计算或规格被修改）
    /// - `RepositoryError::NotFound`: report_id不存在
    pub fn commit_computation(
        &self,
        report_id: &str,
        expected_revision: i32,
        results: &[ReportResult],
        computed_at: NaiveDateTime,
    ) -> RepositoryResult<i32> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let rows_affected = tx.execute(
            r#"UPDATE report
               SET status = ?, revision = revision + 1, updated_at = ?
               WHERE report_id = ? AND revision = ?"#,
            params![
                ReportStatus::Computed.to_db_str(),
                format_ts(&computed_at),
                report_id,
                expected_revision,
            ],
        )?;

        if rows_affected == 0 {
            return Err(revision_conflict(&tx, report_id, expected_revision));
        }

        tx.execute(
            "DELETE FROM report_result WHERE report_id = ?",
            params![report_id],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO report_result (
                    id, report_id, material_code, material_name, unit,
                    nomenclature_group, demand_qty, balance_qty, purchase_qty
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )?;

            for result in results {
                stmt.execute(params![
                    &result.id,
                    report_id,
                    &result.material_code,
                    &result.material_name,
                    &result.unit,
                    &result.nomenclature_group,
                    result.demand_qty,
                    result.balance_qty,
                    result.purchase_qty,
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(expected_revision + 1)
    }
}

/// 级联删除（外键 ON DELETE CASCADE 之外再显式删除子表，不依赖 PRAGMA 状态）
fn delete_cascade(tx: &Transaction, report_id: &str) -> RepositoryResult<bool> {
    tx.execute(
        "DELETE FROM report_result WHERE report_id = ?",
        params![report_id],
    )?;
    tx.execute(
        "DELETE FROM report_specification WHERE report_id = ?",
        params![report_id],
    )?;
    let deleted = tx.execute("DELETE FROM report WHERE report_id = ?", params![report_id])?;
    Ok(deleted > 0)
}

/// 更新0行时区分“记录不存在”与“revision冲突”
pub(crate) fn revision_conflict(conn: &Connection, report_id: &str, expected: i32) -> RepositoryError {
    let actual: Result<i32, _> = conn.query_row(
        "SELECT revision FROM report WHERE report_id = ?",
        params![report_id],
        |row| row.get(0),
    );

    match actual {
        Ok(actual) => RepositoryError::OptimisticLockFailure {
            report_id: report_id.to_string(),
            expected,
            actual,
        },
        Err(rusqlite::Error::QueryReturnedNoRows) => RepositoryError::not_found("Report", report_id),
        Err(e) => e.into(),
    }
}

/// 映射数据库行到Report对象
fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Report> {
    Ok(Report {
        report_id: row.get(0)?,
        title: row.get(1)?,
        status: ReportStatus::from_str(&row.get::<_, String>(2)?),
        owner_id: row.get(3)?,
        created_at: parse_ts(row, 4)?,
        updated_at: parse_ts(row, 5)?,
        revision: row.get(6)?,
    })
}
