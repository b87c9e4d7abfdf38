// ==========================================
// MRP 对账系统 - 报告结果数据仓储（只读）
// ==========================================
// 写入统一走 ReportRepository::commit_computation（事务内整体替换）
// ==========================================

use crate::domain::report::ReportResult;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct ReportResultRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReportResultRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询报告结果，按物料编码排序
    pub fn find_by_report(&self, report_id: &str) -> RepositoryResult<Vec<ReportResult>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT id, report_id, material_code, material_name, unit,
                      nomenclature_group, demand_qty, balance_qty, purchase_qty
               FROM report_result
               WHERE report_id = ?
               ORDER BY material_code"#,
        )?;

        let results = stmt
            .query_map(params![report_id], |row| {
                Ok(ReportResult {
                    id: row.get(0)?,
                    report_id: row.get(1)?,
                    material_code: row.get(2)?,
                    material_name: row.get(3)?,
                    unit: row.get(4)?,
                    nomenclature_group: row.get(5)?,
                    demand_qty: row.get(6)?,
                    balance_qty: row.get(7)?,
                    purchase_qty: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<ReportResult>, _>>()?;

        Ok(results)
    }

    pub fn count_by_report(&self, report_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM report_result WHERE report_id = ?",
            params![report_id],
            |row| row.get(0),
        )?;

        Ok(count.max(0) as usize)
    }
}
