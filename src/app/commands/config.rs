use crate::api::error::ApiError;
use crate::app::state::AppState;

use super::common::{map_api_error, to_json};

// ==========================================
// 配置管理相关命令
// ==========================================

/// 查询当前生效的对账参数
pub async fn get_mrp_settings(state: &AppState) -> Result<String, String> {
    let settings = state
        .config_manager
        .load_settings()
        .map_err(|e| map_api_error(ApiError::from(e)))?;

    to_json(&settings)
}

/// 查询所有 global 配置
pub async fn list_configs(state: &AppState) -> Result<String, String> {
    let snapshot = state
        .config_manager
        .get_config_snapshot()
        .map_err(|e| map_api_error(ApiError::from(e)))?;

    to_json(&snapshot)
}

/// 更新 global 配置
pub async fn update_config(state: &AppState, key: String, value: String) -> Result<String, String> {
    if key.trim().is_empty() {
        return Err(map_api_error(ApiError::InvalidInput("配置键不能为空".to_string())));
    }

    state
        .config_manager
        .set_global_config_value(key.trim(), &value)
        .map_err(|e| map_api_error(ApiError::from(e)))?;

    to_json(&serde_json::json!({ "key": key.trim(), "value": value }))
}
