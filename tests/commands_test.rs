// ==========================================
// 命令层集成测试
// ==========================================
// 测试范围: 参数解析、JSON 成功响应、结构化错误响应
// ==========================================

mod helpers;

use helpers::test_env::{TestEnv, OWNER};
use mrp_reconcile::app::commands::{self, ErrorResponse};
use mrp_reconcile::config::config_keys;
use serde_json::Value;

fn error_of(raw: String) -> ErrorResponse {
    serde_json::from_str(&raw).expect("错误响应应为 JSON")
}

async fn create(env: &TestEnv, title: &str) -> String {
    let raw = commands::create_report(
        &env.state,
        OWNER.to_string(),
        Some(title.to_string()),
        None,
        None,
    )
    .await
    .unwrap();
    let value: Value = serde_json::from_str(&raw).unwrap();
    value["report_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_full_flow_through_commands() {
    let env = TestEnv::new();
    let report_id = create(&env, "命令流程").await;

    for code in ["SPEC-1", "SPEC-2"] {
        commands::add_specification(
            &env.state,
            OWNER.to_string(),
            report_id.clone(),
            code.to_string(),
            None,
        )
        .await
        .unwrap();
    }

    let raw = commands::calculate_report(
        &env.state,
        OWNER.to_string(),
        report_id.clone(),
        "erp-user".to_string(),
        "erp-secret".to_string(),
    )
    .await
    .unwrap();
    let outcome: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(outcome["result_count"], 2);
    assert_eq!(outcome["purchase_count"], 1);

    let raw = commands::get_report(&env.state, OWNER.to_string(), report_id.clone())
        .await
        .unwrap();
    let detail: Value = serde_json::from_str(&raw).unwrap();
    let results = detail["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[1]["material_code"], "18218");
    assert_eq!(results[1]["purchase_qty"], 8.0);

    let raw = commands::get_material_breakdown(
        &env.state,
        OWNER.to_string(),
        report_id.clone(),
        "18218".to_string(),
        "erp-user".to_string(),
        "erp-secret".to_string(),
    )
    .await
    .unwrap();
    let rows: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 2);

    let raw = commands::delete_report(&env.state, OWNER.to_string(), report_id.clone())
        .await
        .unwrap();
    let deleted: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(deleted["deleted"], true);
    assert_eq!(deleted["report_id"], report_id.as_str());
}

#[tokio::test]
async fn test_create_report_with_period() {
    let env = TestEnv::new();
    let raw = commands::create_report(
        &env.state,
        OWNER.to_string(),
        None,
        Some("2026-03-01".to_string()),
        Some("2026-03-31".to_string()),
    )
    .await
    .unwrap();
    let report: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(report["title"], "MRP report #1 for period 01.03.26–31.03.26");
    assert_eq!(report["status"], "DRAFT");
}

#[tokio::test]
async fn test_invalid_date_is_invalid_input() {
    let env = TestEnv::new();
    let raw = commands::create_report(
        &env.state,
        OWNER.to_string(),
        None,
        Some("01.03.2026".to_string()),
        Some("2026-03-31".to_string()),
    )
    .await
    .unwrap_err();
    assert_eq!(error_of(raw).code, "INVALID_INPUT");
}

#[tokio::test]
async fn test_error_codes() {
    let env = TestEnv::new();
    let report_id = create(&env, "错误码").await;

    // 无规格计算
    let raw = commands::calculate_report(
        &env.state,
        OWNER.to_string(),
        report_id.clone(),
        "erp-user".to_string(),
        "erp-secret".to_string(),
    )
    .await
    .unwrap_err();
    let err = error_of(raw);
    assert_eq!(err.code, "VALIDATION_ERROR");
    assert!(err.message.contains("add at least one specification"));

    // 不存在的报告
    let raw = commands::get_report(&env.state, OWNER.to_string(), "missing".to_string())
        .await
        .unwrap_err();
    assert_eq!(error_of(raw).code, "NOT_FOUND");

    // 空规格编码
    let raw = commands::add_specification(
        &env.state,
        OWNER.to_string(),
        report_id.clone(),
        "  ".to_string(),
        None,
    )
    .await
    .unwrap_err();
    assert_eq!(error_of(raw).code, "INVALID_INPUT");

    // 外部系统失败
    commands::add_specification(
        &env.state,
        OWNER.to_string(),
        report_id.clone(),
        "SPEC-1".to_string(),
        None,
    )
    .await
    .unwrap();
    env.source.fail_specifications(true);
    let raw = commands::calculate_report(
        &env.state,
        OWNER.to_string(),
        report_id,
        "erp-user".to_string(),
        "erp-secret".to_string(),
    )
    .await
    .unwrap_err();
    let err = error_of(raw);
    assert_eq!(err.code, "EXTERNAL_SOURCE_ERROR");
    assert_eq!(err.details.unwrap()["timed_out"], false);
}

#[tokio::test]
async fn test_config_commands() {
    let env = TestEnv::new();

    let raw = commands::get_mrp_settings(&env.state).await.unwrap();
    let settings: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(settings["main_warehouse_code"], "000000001");

    commands::update_config(
        &env.state,
        config_keys::MAIN_WAREHOUSE_CODE.to_string(),
        "000000002".to_string(),
    )
    .await
    .unwrap();

    let raw = commands::list_configs(&env.state).await.unwrap();
    let snapshot: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(snapshot[config_keys::MAIN_WAREHOUSE_CODE], "000000002");

    let raw = commands::update_config(&env.state, " ".to_string(), "x".to_string())
        .await
        .unwrap_err();
    assert_eq!(error_of(raw).code, "INVALID_INPUT");
}
