// ==========================================
// 报告生命周期端到端测试
// ==========================================
// 测试范围:
// 1. 典型场景: 跨规格汇总、主仓过滤、部分采购、零采购、需求溯源
// 2. 重算整体替换（不合并）
// 3. 外部数据失败/超时: 不写入任何数据
// 4. 计算期间并发修改: 乐观锁冲突
// 5. 计算成功后清理同名草稿
// ==========================================

mod helpers;

use helpers::mock_source::{spec, MockErpSource};
use helpers::test_env::{TestEnv, OTHER_OWNER, OWNER};
use mrp_reconcile::api::ApiError;
use mrp_reconcile::config::config_keys;
use mrp_reconcile::domain::types::ReportStatus;
use mrp_reconcile::domain::warehouse::{BalanceNode, StockRow, Warehouse};
use mrp_reconcile::logging;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_scenarios_a_to_d_end_to_end() {
    logging::init_test();
    let env = TestEnv::new();
    let api = &env.state.report_api;
    let report_id = env.draft_with_specs("端到端", &["SPEC-1", "SPEC-2"]);

    let outcome = api
        .calculate(OWNER, &report_id, &TestEnv::credentials())
        .await
        .unwrap();
    assert_eq!(outcome.report.status, ReportStatus::Computed);
    assert_eq!(outcome.warehouse_name.as_deref(), Some("Main"));
    assert_eq!(outcome.result_count, 2);
    assert_eq!(outcome.purchase_count, 1);

    let detail = api.get_report(OWNER, &report_id).unwrap();
    assert_eq!(detail.results.len(), 2);

    // 结果按编码排序: "123" < "18218"
    let bolt = &detail.results[0];
    assert_eq!(bolt.material_code, "123");
    assert_eq!(bolt.material_name, "螺栓");
    assert_eq!(bolt.demand_qty, 3.0);
    assert_eq!(bolt.balance_qty, 10.0);
    assert_eq!(bolt.purchase_qty, 0.0);

    let pipe = &detail.results[1];
    assert_eq!(pipe.material_code, "18218");
    assert_eq!(pipe.material_name, "钢管");
    assert_eq!(pipe.unit.as_deref(), Some("m"));
    assert_eq!(pipe.demand_qty, 15.0);
    assert_eq!(pipe.balance_qty, 7.0);
    assert_eq!(pipe.purchase_qty, 8.0);

    for row in &detail.results {
        assert!(row.purchase_qty >= 0.0);
        assert_eq!(row.purchase_qty, row.recomputed_purchase_qty());
    }
}

#[tokio::test]
async fn test_scenario_e_breakdown() {
    let env = TestEnv::new();
    let api = &env.state.report_api;
    let report_id = env.draft_with_specs("溯源", &["SPEC-1", "SPEC-2", "SPEC-3"]);

    let rows = api
        .breakdown(OWNER, &report_id, "00018218", &TestEnv::credentials())
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].spec_code, "SPEC-1");
    assert_eq!(rows[0].spec_name, "框架");
    assert_eq!(rows[0].quantity, 10.0);
    assert_eq!(rows[1].spec_code, "SPEC-2");
    assert_eq!(rows[1].quantity, 5.0);
    let total: f64 = rows.iter().map(|r| r.quantity).sum();
    assert_eq!(total, 15.0);

    // 溯源只读，不改变状态
    let detail = api.get_report(OWNER, &report_id).unwrap();
    assert!(detail.report.is_draft());
    assert!(detail.results.is_empty());
}

#[tokio::test]
async fn test_recalculate_replaces_results() {
    let env = TestEnv::new();
    let api = &env.state.report_api;
    let report_id = env.draft_with_specs("重算", &["SPEC-1", "SPEC-2"]);
    let creds = TestEnv::credentials();

    let first = api.calculate(OWNER, &report_id, &creds).await.unwrap();

    // 外部数据变化: SPEC-1 只剩一种新物料
    env.source.set_specifications(vec![
        spec("SPEC-1", "框架", &[("555", 4.0)]),
        spec("SPEC-2", "车轮", &[("18218", 5.0)]),
    ]);

    let second = api.calculate(OWNER, &report_id, &creds).await.unwrap();
    assert_eq!(second.report.status, ReportStatus::Computed);
    assert_eq!(second.report.revision, first.report.revision + 1);

    let detail = api.get_report(OWNER, &report_id).unwrap();
    let codes: Vec<&str> = detail
        .results
        .iter()
        .map(|r| r.material_code.as_str())
        .collect();
    assert_eq!(codes, vec!["18218", "555"]);
    assert_eq!(detail.results[0].demand_qty, 5.0);
    assert_eq!(detail.results[0].purchase_qty, 0.0);
    assert_eq!(detail.results[1].purchase_qty, 4.0);
}

#[tokio::test]
async fn test_recalculate_is_idempotent() {
    let env = TestEnv::new();
    let api = &env.state.report_api;
    let report_id = env.draft_with_specs("幂等", &["SPEC-1", "SPEC-2", "SPEC-3"]);
    let creds = TestEnv::credentials();

    api.calculate(OWNER, &report_id, &creds).await.unwrap();
    let first: Vec<_> = api
        .get_report(OWNER, &report_id)
        .unwrap()
        .results
        .into_iter()
        .map(|r| (r.material_code, r.demand_qty, r.balance_qty, r.purchase_qty))
        .collect();

    api.calculate(OWNER, &report_id, &creds).await.unwrap();
    let second: Vec<_> = api
        .get_report(OWNER, &report_id)
        .unwrap()
        .results
        .into_iter()
        .map(|r| (r.material_code, r.demand_qty, r.balance_qty, r.purchase_qty))
        .collect();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_source_failure_keeps_draft() {
    let env = TestEnv::new();
    let api = &env.state.report_api;
    let report_id = env.draft_with_specs("故障", &["SPEC-1"]);

    env.source.fail_warehouses(true);
    let err = api
        .calculate(OWNER, &report_id, &TestEnv::credentials())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::ExternalSourceError { timed_out: false, .. }
    ));

    let detail = api.get_report(OWNER, &report_id).unwrap();
    assert!(detail.report.is_draft());
    assert!(detail.results.is_empty());
}

#[tokio::test]
async fn test_source_failure_keeps_previous_results() {
    let env = TestEnv::new();
    let api = &env.state.report_api;
    let report_id = env.draft_with_specs("保留旧结果", &["SPEC-1", "SPEC-2"]);
    let creds = TestEnv::credentials();

    api.calculate(OWNER, &report_id, &creds).await.unwrap();
    let before = api.get_report(OWNER, &report_id).unwrap();

    env.source.fail_specifications(true);
    let err = api.calculate(OWNER, &report_id, &creds).await.unwrap_err();
    assert!(matches!(err, ApiError::ExternalSourceError { .. }));

    let after = api.get_report(OWNER, &report_id).unwrap();
    assert_eq!(after.report.status, ReportStatus::Computed);
    assert_eq!(after.report.revision, before.report.revision);
    assert_eq!(after.results, before.results);
}

#[tokio::test]
async fn test_source_timeout_keeps_draft() {
    let env = TestEnv::new();
    env.set_timeout_secs(1);
    let api = &env.state.report_api;
    let report_id = env.draft_with_specs("超时", &["SPEC-1"]);

    env.source.set_delay(Some(Duration::from_millis(1500)));
    let err = api
        .calculate(OWNER, &report_id, &TestEnv::credentials())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::ExternalSourceError { timed_out: true, .. }
    ));

    let detail = api.get_report(OWNER, &report_id).unwrap();
    assert!(detail.report.is_draft());
    assert!(detail.results.is_empty());
}

#[tokio::test]
async fn test_calculate_requires_specification() {
    let env = TestEnv::new();
    let api = &env.state.report_api;
    let report_id = env.draft_with_specs("空报告", &[]);

    let err = api
        .calculate(OWNER, &report_id, &TestEnv::credentials())
        .await
        .unwrap_err();
    match err {
        ApiError::ValidationError(msg) => assert!(msg.contains("add at least one specification")),
        other => panic!("Expected ValidationError, got {:?}", other),
    }
    // 无规格时不访问外部系统
    assert_eq!(env.source.spec_calls.load(Ordering::SeqCst), 0);
    assert_eq!(env.source.balance_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrent_modification_detected() {
    let env = TestEnv::new();
    let api = env.state.report_api.clone();
    let report_id = env.draft_with_specs("并发", &["SPEC-1"]);

    // 拉取库存期间，另一个请求修改了规格列表
    let hook_api = api.clone();
    let hook_report = report_id.clone();
    env.source.set_before_balances(Some(Arc::new(move || {
        let _ = hook_api.add_specification(OWNER, &hook_report, "SPEC-2", None);
    })));

    let err = api
        .calculate(OWNER, &report_id, &TestEnv::credentials())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::OptimisticLockFailure { .. }));

    env.source.set_before_balances(None);
    let detail = api.get_report(OWNER, &report_id).unwrap();
    assert!(detail.report.is_draft());
    assert!(detail.results.is_empty());
    assert_eq!(detail.specifications.len(), 2);

    // 重新计算即可使用最新规格
    let outcome = api
        .calculate(OWNER, &report_id, &TestEnv::credentials())
        .await
        .unwrap();
    assert!(outcome.report.is_computed());
}

#[tokio::test]
async fn test_duplicate_drafts_removed_after_compute() {
    let env = TestEnv::new();
    let api = &env.state.report_api;

    let kept = env.draft_with_specs("周报", &["SPEC-1"]);
    let abandoned = env.draft_with_specs("周报", &[]);
    let other_title = env.draft_with_specs("月报", &[]);
    let other_owner = api
        .create_report(OTHER_OWNER, Some("周报"), None)
        .unwrap()
        .report_id;

    let outcome = api
        .calculate(OWNER, &kept, &TestEnv::credentials())
        .await
        .unwrap();
    assert_eq!(outcome.removed_drafts, 1);

    assert!(matches!(
        api.get_report(OWNER, &abandoned),
        Err(ApiError::NotFound(_))
    ));
    assert!(api.get_report(OWNER, &kept).is_ok());
    assert!(api.get_report(OWNER, &other_title).is_ok());
    assert!(api.get_report(OTHER_OWNER, &other_owner).is_ok());
}

#[tokio::test]
async fn test_duplicate_drafts_follow_title_renamed_during_compute() {
    let env = TestEnv::new();
    let api = env.state.report_api.clone();

    let kept = env.draft_with_specs("旧标题", &["SPEC-1"]);
    let old_title_draft = env.draft_with_specs("旧标题", &[]);
    let new_title_draft = env.draft_with_specs("新标题", &[]);

    // 拉取库存期间报告被重命名
    let hook_api = api.clone();
    let hook_report = kept.clone();
    env.source.set_before_balances(Some(Arc::new(move || {
        let _ = hook_api.rename_report(OWNER, &hook_report, "新标题");
    })));

    let outcome = api
        .calculate(OWNER, &kept, &TestEnv::credentials())
        .await
        .unwrap();
    env.source.set_before_balances(None);

    assert_eq!(outcome.report.title, "新标题");
    assert!(outcome.report.is_computed());
    assert_eq!(outcome.removed_drafts, 1);

    assert!(matches!(
        api.get_report(OWNER, &new_title_draft),
        Err(ApiError::NotFound(_))
    ));
    assert!(api.get_report(OWNER, &old_title_draft).is_ok());
    assert_eq!(api.get_report(OWNER, &kept).unwrap().report.title, "新标题");
}

#[tokio::test]
async fn test_unknown_main_warehouse_uses_all_stock() {
    let env = TestEnv::new();
    env.state
        .config_manager
        .set_global_config_value(config_keys::MAIN_WAREHOUSE_CODE, "000000099")
        .unwrap();
    let api = &env.state.report_api;
    let report_id = env.draft_with_specs("未知主仓", &["SPEC-2"]);

    let outcome = api
        .calculate(OWNER, &report_id, &TestEnv::credentials())
        .await
        .unwrap();
    assert_eq!(outcome.warehouse_name, None);

    let detail = api.get_report(OWNER, &report_id).unwrap();
    assert_eq!(detail.results[0].balance_qty, 107.0);
    assert_eq!(detail.results[0].purchase_qty, 0.0);
}

#[tokio::test]
async fn test_configured_secondary_warehouse() {
    let source = MockErpSource::standard();
    source.set_balances(vec![BalanceNode::leaf(
        "18218",
        "钢管",
        vec![StockRow::new("Main", 1.0), StockRow::new("Secondary", 2.0)],
    )]);
    source.set_warehouses(vec![
        Warehouse::new("000000001", "Main"),
        Warehouse::new("000000002", "Secondary"),
    ]);
    let env = TestEnv::with_source(source);
    env.state
        .config_manager
        .set_global_config_value(config_keys::MAIN_WAREHOUSE_CODE, "2")
        .unwrap();

    let report_id = env.draft_with_specs("副仓", &["SPEC-2"]);
    let outcome = env
        .state
        .report_api
        .calculate(OWNER, &report_id, &TestEnv::credentials())
        .await
        .unwrap();
    assert_eq!(outcome.warehouse_name.as_deref(), Some("Secondary"));

    let detail = env.state.report_api.get_report(OWNER, &report_id).unwrap();
    assert_eq!(detail.results[0].balance_qty, 2.0);
    assert_eq!(detail.results[0].purchase_qty, 3.0);
}

#[tokio::test]
async fn test_missing_external_specification_contributes_nothing() {
    let env = TestEnv::new();
    let api = &env.state.report_api;
    let report_id = env.draft_with_specs("缺失规格", &["SPEC-2", "SPEC-404"]);

    let outcome = api
        .calculate(OWNER, &report_id, &TestEnv::credentials())
        .await
        .unwrap();
    assert_eq!(outcome.result_count, 1);

    let detail = api.get_report(OWNER, &report_id).unwrap();
    assert_eq!(detail.results[0].material_code, "18218");
    assert_eq!(detail.results[0].demand_qty, 5.0);
}
