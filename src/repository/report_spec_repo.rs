// ==========================================
// MRP 对账系统 - 报告规格数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: (report_id, spec_code) 唯一
// 并发: 规格增删同时推进报告 revision，使进行中的计算提交失败
// ==========================================

use crate::domain::report::ReportSpecification;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::report_repo::{format_ts, parse_ts, revision_conflict};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ReportSpecificationRepository - 报告规格仓储
// ==========================================
pub struct ReportSpecificationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReportSpecificationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 添加规格（带乐观锁检查）
    ///
    /// # 错误
    /// - `RepositoryError::UniqueConstraintViolation`: 规格已存在
    /// - `RepositoryError::OptimisticLockFailure`: 报告已被并发修改
    pub fn add(&self, spec: &ReportSpecification, expected_revision: i32) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO report_specification (
                id, report_id, spec_code, spec_name, created_at
            ) VALUES (?, ?, ?, ?, ?)"#,
            params![
                &spec.id,
                &spec.report_id,
                &spec.spec_code,
                &spec.spec_name,
                format_ts(&spec.created_at),
            ],
        )?;

        touch_report(&tx, &spec.report_id, expected_revision, &spec.created_at)?;
        tx.commit()?;
        Ok(())
    }

    /// 移除规格（带乐观锁检查）
    ///
    /// # 返回
    /// - `Ok(true)`: 已移除
    /// - `Ok(false)`: 报告中没有该规格
    pub fn remove(
        &self,
        report_id: &str,
        spec_code: &str,
        expected_revision: i32,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let deleted = tx.execute(
            "DELETE FROM report_specification WHERE report_id = ? AND spec_code = ?",
            params![report_id, spec_code],
        )?;

        if deleted == 0 {
            return Ok(false);
        }

        touch_report(&tx, report_id, expected_revision, &updated_at)?;
        tx.commit()?;
        Ok(true)
    }

    /// 查询报告的全部规格，按添加顺序
    pub fn find_by_report(&self, report_id: &str) -> RepositoryResult<Vec<ReportSpecification>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT id, report_id, spec_code, spec_name, created_at
               FROM report_specification
               WHERE report_id = ?
               ORDER BY created_at, spec_code"#,
        )?;

        let specs = stmt
            .query_map(params![report_id], map_row)?
            .collect::<Result<Vec<ReportSpecification>, _>>()?;

        Ok(specs)
    }

    /// 按规格编码查询
    pub fn find_by_code(
        &self,
        report_id: &str,
        spec_code: &str,
    ) -> RepositoryResult<Option<ReportSpecification>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT id, report_id, spec_code, spec_name, created_at
               FROM report_specification
               WHERE report_id = ? AND spec_code = ?"#,
            params![report_id, spec_code],
            map_row,
        ) {
            Ok(spec) => Ok(Some(spec)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn count_by_report(&self, report_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM report_specification WHERE report_id = ?",
            params![report_id],
            |row| row.get(0),
        )?;

        Ok(count.max(0) as usize)
    }
}

/// 推进报告 revision 与 updated_at
fn touch_report(
    conn: &Connection,
    report_id: &str,
    expected_revision: i32,
    updated_at: &NaiveDateTime,
) -> RepositoryResult<()> {
    let rows_affected = conn.execute(
        r#"UPDATE report
           SET revision = revision + 1, updated_at = ?
           WHERE report_id = ? AND revision = ?"#,
        params![format_ts(updated_at), report_id, expected_revision],
    )?;

    if rows_affected == 0 {
        return Err(revision_conflict(conn, report_id, expected_revision));
    }
    Ok(())
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ReportSpecification> {
    Ok(ReportSpecification {
        id: row.get(0)?,
        report_id: row.get(1)?,
        spec_code: row.get(2)?,
        spec_name: row.get(3)?,
        created_at: parse_ts(row, 4)?,
    })
}
