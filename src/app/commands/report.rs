use crate::app::state::AppState;
use crate::domain::report::ReportPeriod;
use crate::source::Credentials;

use super::common::{map_api_error, parse_date, to_json};

// ==========================================
// 报告相关命令
// ==========================================

/// 创建报告
///
/// period_from / period_to 需同时提供（YYYY-MM-DD），否则使用默认周期
pub async fn create_report(
    state: &AppState,
    owner_id: String,
    title: Option<String>,
    period_from: Option<String>,
    period_to: Option<String>,
) -> Result<String, String> {
    let period = match (period_from.as_deref(), period_to.as_deref()) {
        (Some(from), Some(to)) => Some(ReportPeriod::new(parse_date(from)?, parse_date(to)?)),
        _ => None,
    };

    let report = state
        .report_api
        .create_report(&owner_id, title.as_deref(), period)
        .map_err(map_api_error)?;

    to_json(&report)
}

/// 报告列表
pub async fn list_reports(state: &AppState, owner_id: String) -> Result<String, String> {
    let result = state
        .report_api
        .list_reports(&owner_id)
        .map_err(map_api_error)?;

    to_json(&result)
}

/// 报告详情
pub async fn get_report(
    state: &AppState,
    owner_id: String,
    report_id: String,
) -> Result<String, String> {
    let result = state
        .report_api
        .get_report(&owner_id, &report_id)
        .map_err(map_api_error)?;

    to_json(&result)
}

/// 修改标题
pub async fn rename_report(
    state: &AppState,
    owner_id: String,
    report_id: String,
    title: String,
) -> Result<String, String> {
    let result = state
        .report_api
        .rename_report(&owner_id, &report_id, &title)
        .map_err(map_api_error)?;

    to_json(&result)
}

/// 删除报告
pub async fn delete_report(
    state: &AppState,
    owner_id: String,
    report_id: String,
) -> Result<String, String> {
    state
        .report_api
        .delete_report(&owner_id, &report_id)
        .map_err(map_api_error)?;

    to_json(&serde_json::json!({ "report_id": report_id, "deleted": true }))
}

/// 添加规格
pub async fn add_specification(
    state: &AppState,
    owner_id: String,
    report_id: String,
    spec_code: String,
    spec_name: Option<String>,
) -> Result<String, String> {
    let result = state
        .report_api
        .add_specification(&owner_id, &report_id, &spec_code, spec_name.as_deref())
        .map_err(map_api_error)?;

    to_json(&result)
}

/// 移除规格
pub async fn remove_specification(
    state: &AppState,
    owner_id: String,
    report_id: String,
    spec_code: String,
) -> Result<String, String> {
    state
        .report_api
        .remove_specification(&owner_id, &report_id, &spec_code)
        .map_err(map_api_error)?;

    to_json(&serde_json::json!({ "report_id": report_id, "spec_code": spec_code.trim() }))
}

/// 计算报告
pub async fn calculate_report(
    state: &AppState,
    owner_id: String,
    report_id: String,
    login: String,
    secret: String,
) -> Result<String, String> {
    let credentials = Credentials::new(login, secret);
    let result = state
        .report_api
        .calculate(&owner_id, &report_id, &credentials)
        .await
        .map_err(map_api_error)?;

    to_json(&result)
}

/// 物料需求溯源
pub async fn get_material_breakdown(
    state: &AppState,
    owner_id: String,
    report_id: String,
    material_code: String,
    login: String,
    secret: String,
) -> Result<String, String> {
    let credentials = Credentials::new(login, secret);
    let result = state
        .report_api
        .breakdown(&owner_id, &report_id, &material_code, &credentials)
        .await
        .map_err(map_api_error)?;

    to_json(&result)
}
