// ==========================================
// MRP 对账系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 说明: 计算参数以 MrpSettings 显式传入引擎，不使用全局变量
// ==========================================

use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 对账
    pub const MAIN_WAREHOUSE_CODE: &str = "mrp/main_warehouse_code";
    pub const SOURCE_TIMEOUT_SECS: &str = "mrp/source_timeout_secs";
    pub const REPORT_PERIOD_DAYS: &str = "mrp/report_period_days";

    // 日志
    pub const LOG_DEFAULT_LEVEL: &str = "log/default_level";
    pub const LOG_JSON: &str = "log/json";
}

pub const DEFAULT_MAIN_WAREHOUSE_CODE: &str = "000000001";
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REPORT_PERIOD_DAYS: u32 = 30;
/// 自动标题周期上限（天）
pub const MAX_REPORT_PERIOD_DAYS: u32 = 3660;
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ==========================================
// MrpSettings - 单次计算使用的参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrpSettings {
    pub main_warehouse_code: String,
    pub source_timeout_secs: u64,
    pub report_period_days: u32,
}

impl MrpSettings {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }
}

impl Default for MrpSettings {
    fn default() -> Self {
        Self {
            main_warehouse_code: DEFAULT_MAIN_WAREHOUSE_CODE.to_string(),
            source_timeout_secs: DEFAULT_SOURCE_TIMEOUT_SECS,
            report_period_days: DEFAULT_REPORT_PERIOD_DAYS,
        }
    }
}

// ==========================================
// LogSettings - 日志参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    pub default_level: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            default_level: DEFAULT_LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（打开数据库并确保表结构存在）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        tracing::info!(config_key = key, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置（按键排序）
    pub fn get_config_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    /// 读取配置值并解析，缺失或格式错误时使用默认值
    fn get_parsed_or_default<T: FromStr>(&self, key: &str, default: T) -> RepositoryResult<T> {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    // ===== 对账配置 =====

    /// 主仓编码（空值视为未配置）
    pub fn get_main_warehouse_code(&self) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(config_keys::MAIN_WAREHOUSE_CODE)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_MAIN_WAREHOUSE_CODE.to_string()))
    }

    /// 外部数据源单次调用超时（秒，0 视为未配置）
    pub fn get_source_timeout_secs(&self) -> RepositoryResult<u64> {
        let secs = self.get_parsed_or_default(
            config_keys::SOURCE_TIMEOUT_SECS,
            DEFAULT_SOURCE_TIMEOUT_SECS,
        )?;
        Ok(if secs == 0 { DEFAULT_SOURCE_TIMEOUT_SECS } else { secs })
    }

    /// 自动标题默认周期天数（0 或超过上限视为未配置）
    pub fn get_report_period_days(&self) -> RepositoryResult<u32> {
        let days = self
            .get_parsed_or_default(config_keys::REPORT_PERIOD_DAYS, DEFAULT_REPORT_PERIOD_DAYS)?;
        if days == 0 || days > MAX_REPORT_PERIOD_DAYS {
            tracing::warn!(
                config_key = config_keys::REPORT_PERIOD_DAYS,
                days,
                max = MAX_REPORT_PERIOD_DAYS,
                "周期天数超出范围，使用默认值"
            );
            return Ok(DEFAULT_REPORT_PERIOD_DAYS);
        }
        Ok(days)
    }

    /// 加载本次计算使用的参数
    pub fn load_settings(&self) -> RepositoryResult<MrpSettings> {
        Ok(MrpSettings {
            main_warehouse_code: self.get_main_warehouse_code()?,
            source_timeout_secs: self.get_source_timeout_secs()?,
            report_period_days: self.get_report_period_days()?,
        })
    }

    // ===== 日志配置 =====

    pub fn load_log_settings(&self) -> RepositoryResult<LogSettings> {
        let default_level = self
            .get_global_config_value(config_keys::LOG_DEFAULT_LEVEL)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(LogSettings {
            default_level,
            json: self.get_parsed_or_default(config_keys::LOG_JSON, false)?,
        })
    }
}
