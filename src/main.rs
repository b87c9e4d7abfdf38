// ==========================================
// MRP 对账系统 - 命令行入口
// ==========================================
// 用法:
//   mrp-reconcile <snapshot.json> <owner_id> <spec_code>...
//
// 读取 ERP 快照 → 创建报告 → 添加规格 → 计算 → 输出报告详情 JSON
// 数据库路径: MRP_RECONCILE_DB_PATH 或用户数据目录
// ERP 凭据: MRP_ERP_LOGIN / MRP_ERP_SECRET
// ==========================================

use anyhow::{bail, Context};
use mrp_reconcile::app::{get_default_db_path, AppState};
use mrp_reconcile::config::ConfigManager;
use mrp_reconcile::logging;
use mrp_reconcile::source::{Credentials, SnapshotSource};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(snapshot_path), Some(owner_id)) = (args.next(), args.next()) else {
        bail!("usage: mrp-reconcile <snapshot.json> <owner_id> <spec_code>...");
    };
    let spec_codes: Vec<String> = args.collect();

    // 先初始化日志，AppState 初始化过程的日志才能输出
    let db_path = get_default_db_path();
    let log_settings = ConfigManager::new(&db_path)
        .and_then(|config| config.load_log_settings())
        .with_context(|| format!("无法读取日志配置: {}", db_path))?;
    logging::init(&log_settings);
    tracing::info!("==================================================");
    tracing::info!("{} v{}", mrp_reconcile::APP_NAME, mrp_reconcile::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let snapshot = Arc::new(
        SnapshotSource::from_json_file(&snapshot_path)
            .await
            .with_context(|| format!("无法加载ERP快照: {}", snapshot_path))?,
    );

    let state = AppState::new(db_path, snapshot.clone(), snapshot).map_err(anyhow::Error::msg)?;

    let credentials = Credentials::new(
        std::env::var("MRP_ERP_LOGIN").unwrap_or_default(),
        std::env::var("MRP_ERP_SECRET").unwrap_or_default(),
    );

    let api = &state.report_api;
    let report = api.create_report(&owner_id, None, None)?;
    for code in &spec_codes {
        api.add_specification(&owner_id, &report.report_id, code, None)?;
    }

    let outcome = api
        .calculate(&owner_id, &report.report_id, &credentials)
        .await?;
    tracing::info!(
        result_count = outcome.result_count,
        purchase_count = outcome.purchase_count,
        "计算完成"
    );

    let detail = api.get_report(&owner_id, &report.report_id)?;
    println!("{}", serde_json::to_string_pretty(&detail)?);
    Ok(())
}
