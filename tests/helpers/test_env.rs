// ==========================================
// 集成测试环境
// ==========================================
// 职责: 临时数据库 + Mock ERP + AppState 一站式组装
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use super::mock_source::MockErpSource;
use mrp_reconcile::app::AppState;
use mrp_reconcile::config::config_keys;
use mrp_reconcile::source::Credentials;
use std::sync::Arc;
use tempfile::NamedTempFile;

pub const OWNER: &str = "buyer-01";
pub const OTHER_OWNER: &str = "buyer-02";

pub struct TestEnv {
    _temp_file: NamedTempFile,
    pub db_path: String,
    pub state: AppState,
    pub source: Arc<MockErpSource>,
}

impl TestEnv {
    /// 标准 Mock 数据
    pub fn new() -> Self {
        Self::with_source(MockErpSource::standard())
    }

    pub fn with_source(source: MockErpSource) -> Self {
        let (temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
        let source = Arc::new(source);
        let state = AppState::new(db_path.clone(), source.clone(), source.clone())
            .expect("初始化AppState失败");

        Self {
            _temp_file: temp_file,
            db_path,
            state,
            source,
        }
    }

    pub fn credentials() -> Credentials {
        Credentials::new("erp-user", "erp-secret")
    }

    /// 设置单次外部调用超时（秒）
    pub fn set_timeout_secs(&self, secs: u64) {
        self.state
            .config_manager
            .set_global_config_value(config_keys::SOURCE_TIMEOUT_SECS, &secs.to_string())
            .expect("写入配置失败");
    }

    /// 创建草稿并添加规格
    pub fn draft_with_specs(&self, title: &str, specs: &[&str]) -> String {
        let api = &self.state.report_api;
        let report = api
            .create_report(OWNER, Some(title), None)
            .expect("创建报告失败");
        for code in specs {
            api.add_specification(OWNER, &report.report_id, code, None)
                .expect("添加规格失败");
        }
        report.report_id
    }
}
