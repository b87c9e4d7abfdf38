// ==========================================
// MRP 对账系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 外部数据源（ERP 连接器）由调用方注入
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::ReportApi;
use crate::config::config_manager::ConfigManager;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::engine::{ReportLifecycleManager, ReportRepositories};
use crate::source::{SpecificationSource, WarehouseSource};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径（内存库为 ":memory:"）
    pub db_path: String,

    /// 报告API
    pub report_api: Arc<ReportApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并幂等建表
    /// 2. 初始化所有Repository
    /// 3. 创建生命周期引擎与API实例
    pub fn new(
        db_path: String,
        spec_source: Arc<dyn SpecificationSource>,
        warehouse_source: Arc<dyn WarehouseSource>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let mut state = Self::from_connection(conn, spec_source, warehouse_source)?;
        state.db_path = db_path;
        Ok(state)
    }

    /// 基于已打开的连接创建（测试、内存库）
    pub fn from_connection(
        conn: Connection,
        spec_source: Arc<dyn SpecificationSource>,
        warehouse_source: Arc<dyn WarehouseSource>,
    ) -> Result<Self, String> {
        ensure_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层与配置
        // ==========================================
        let repos = ReportRepositories::from_connection(conn.clone());
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层与API层
        // ==========================================
        let lifecycle = Arc::new(ReportLifecycleManager::new(
            repos,
            spec_source,
            warehouse_source,
        ));
        let report_api = Arc::new(ReportApi::new(lifecycle, config_manager.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path: ":memory:".to_string(),
            report_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("MRP_RECONCILE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./mrp_reconcile.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("mrp-reconcile");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("mrp_reconcile.db");
        }
    }

    path.to_string_lossy().to_string()
}
