// ==========================================
// Mock ERP 数据源 - 用于集成测试
// ==========================================
// 能力:
// - 可变的规格 / 库存 / 仓库目录数据
// - 故障注入（不可用）与延迟注入（触发超时）
// - 库存拉取前的回调（模拟计算期间的并发修改）
// - 调用计数
// ==========================================

use async_trait::async_trait;
use mrp_reconcile::domain::material::RawSpecification;
use mrp_reconcile::domain::warehouse::{BalanceNode, StockRow, Warehouse};
use mrp_reconcile::engine::SpecificationExtractor;
use mrp_reconcile::source::{
    Credentials, SourceError, SourceResult, SpecificationQuery, SpecificationSource,
    WarehouseSource,
};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type Hook = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct MockErpSource {
    specifications: Mutex<Vec<RawSpecification>>,
    balances: Mutex<Vec<BalanceNode>>,
    warehouses: Mutex<Vec<Warehouse>>,
    fail_specifications: AtomicBool,
    fail_warehouses: AtomicBool,
    delay: Mutex<Option<Duration>>,
    before_balances: Mutex<Option<Hook>>,
    pub spec_calls: AtomicUsize,
    pub balance_calls: AtomicUsize,
}

impl MockErpSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 标准场景: SPEC-1 / SPEC-2 / SPEC-3 + 主仓 Main(000000001)
    pub fn standard() -> Self {
        let source = Self::new();
        source.set_specifications(vec![
            spec(
                "SPEC-1",
                "框架",
                &[("00018218", 10.0), ("000123", 3.0)],
            ),
            spec("SPEC-2", "车轮", &[("18218", 5.0)]),
            spec("SPEC-3", "座椅", &[("777", 2.0)]),
        ]);
        source.set_balances(vec![BalanceNode::group(
            "金属件",
            vec![
                BalanceNode::leaf_with_unit(
                    "18218",
                    "钢管",
                    "m",
                    vec![StockRow::new("Main", 7.0), StockRow::new("Secondary", 100.0)],
                ),
                BalanceNode::leaf("000123", "螺栓", vec![StockRow::new("Main", 10.0)]),
            ],
        )]);
        source.set_warehouses(vec![
            Warehouse::new("000000001", "Main"),
            Warehouse::new("000000002", "Secondary"),
        ]);
        source
    }

    pub fn set_specifications(&self, specs: Vec<RawSpecification>) {
        *self.specifications.lock().unwrap() = specs;
    }

    pub fn set_balances(&self, balances: Vec<BalanceNode>) {
        *self.balances.lock().unwrap() = balances;
    }

    pub fn set_warehouses(&self, warehouses: Vec<Warehouse>) {
        *self.warehouses.lock().unwrap() = warehouses;
    }

    pub fn fail_specifications(&self, fail: bool) {
        self.fail_specifications.store(fail, Ordering::SeqCst);
    }

    pub fn fail_warehouses(&self, fail: bool) {
        self.fail_warehouses.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn set_before_balances(&self, hook: Option<Hook>) {
        *self.before_balances.lock().unwrap() = hook;
    }

    async fn maybe_delay(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

/// 构造一条本地化命名的规格记录
pub fn spec(code: &str, name: &str, items: &[(&str, f64)]) -> RawSpecification {
    let items: Vec<_> = items
        .iter()
        .map(|(material, qty)| json!({ "КодМатериала": material, "Количество": qty }))
        .collect();
    RawSpecification::new(json!({
        "Код": code,
        "Наименование": name,
        "Материалы": items,
    }))
}

#[async_trait]
impl SpecificationSource for MockErpSource {
    async fn get_specifications(
        &self,
        _credentials: &Credentials,
        query: &SpecificationQuery,
    ) -> SourceResult<Vec<RawSpecification>> {
        self.spec_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_delay().await;

        if self.fail_specifications.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable("规格服务不可用".to_string()));
        }

        let specs = self.specifications.lock().unwrap().clone();
        Ok(specs
            .into_iter()
            .filter(|s| match query.code.as_deref() {
                Some(code) => SpecificationExtractor::spec_code(s).as_deref() == Some(code),
                None => true,
            })
            .collect())
    }
}

#[async_trait]
impl WarehouseSource for MockErpSource {
    async fn get_warehouse_balances(
        &self,
        _credentials: &Credentials,
    ) -> SourceResult<Vec<BalanceNode>> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);

        let hook = self.before_balances.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook();
        }

        self.maybe_delay().await;
        if self.fail_warehouses.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable("库存服务不可用".to_string()));
        }
        Ok(self.balances.lock().unwrap().clone())
    }

    async fn get_warehouses(&self, _credentials: &Credentials) -> SourceResult<Vec<Warehouse>> {
        self.maybe_delay().await;
        if self.fail_warehouses.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable("仓库目录不可用".to_string()));
        }
        Ok(self.warehouses.lock().unwrap().clone())
    }
}
