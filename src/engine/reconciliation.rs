// ==========================================
// MRP 对账系统 - 对账引擎
// ==========================================
// 职责: 需求表 × 主仓库存 → 采购需求行
// 红线: purchase = max(0, demand - balance)，恒非负
// 红线: 只输出有需求的物料（仅在库存中出现的物料不进入报告）
// ==========================================

use crate::domain::warehouse::{BalanceNode, Warehouse};
use crate::engine::aggregator::DemandMap;
use crate::engine::balance_tree::{
    build_lookup, filter_to_warehouse, flatten_to_map, resolve_warehouse_name, NomenclatureLookup,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// 对账结果行（尚未绑定报告）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRow {
    pub material_code: String,
    pub material_name: String,
    pub unit: Option<String>,
    pub nomenclature_group: Option<String>,
    pub demand_qty: f64,
    pub balance_qty: f64,
    pub purchase_qty: f64,
}

/// 主仓库存视图：过滤 + 展平 + 主数据查找表
#[derive(Debug, Clone, Default)]
pub struct BalanceView {
    /// 解析出的主仓显示名称（None 表示未过滤）
    pub warehouse_name: Option<String>,
    pub balances: HashMap<String, f64>,
    pub lookup: NomenclatureLookup,
}

pub struct ReconciliationEngine;

impl ReconciliationEngine {
    /// 构建主仓库存视图
    ///
    /// 主仓编码在仓库目录中找不到时不过滤（直接使用全部库存），
    /// 否则会把所有物料误报为零库存。
    pub fn prepare_balances(
        tree: &[BalanceNode],
        warehouses: &[Warehouse],
        main_warehouse_code: &str,
    ) -> BalanceView {
        let warehouse_name = resolve_warehouse_name(warehouses, main_warehouse_code);

        let balances = match warehouse_name.as_deref() {
            Some(name) => flatten_to_map(&filter_to_warehouse(tree, name)),
            None => {
                warn!(
                    main_warehouse_code = %main_warehouse_code,
                    warehouse_count = warehouses.len(),
                    "主仓编码未匹配到仓库，库存不做过滤"
                );
                flatten_to_map(tree)
            }
        };

        let lookup = build_lookup(tree);
        debug!(
            balance_codes = balances.len(),
            nomenclature = lookup.len(),
            "主仓库存视图已构建"
        );

        BalanceView {
            warehouse_name,
            balances,
            lookup,
        }
    }

    /// 对账
    ///
    /// 名称/单位优先取仓库主数据，找不到时回退到规格侧数据
    pub fn reconcile(
        demand: &DemandMap,
        balances: &HashMap<String, f64>,
        lookup: &NomenclatureLookup,
    ) -> Vec<ReconciledRow> {
        demand
            .iter()
            .map(|(code, entry)| {
                let balance_qty = balances.get(code).copied().unwrap_or(0.0);
                let purchase_qty = (entry.quantity - balance_qty).max(0.0);

                ReconciledRow {
                    material_code: code.clone(),
                    material_name: lookup
                        .name_of(code)
                        .map(str::to_string)
                        .unwrap_or_else(|| entry.name.clone()),
                    unit: lookup
                        .unit_of(code)
                        .map(str::to_string)
                        .or_else(|| entry.unit.clone()),
                    nomenclature_group: entry.nomenclature_group.clone(),
                    demand_qty: entry.quantity,
                    balance_qty,
                    purchase_qty,
                }
            })
            .collect()
    }

    /// 对账（直接使用库存视图）
    pub fn reconcile_view(demand: &DemandMap, view: &BalanceView) -> Vec<ReconciledRow> {
        Self::reconcile(demand, &view.balances, &view.lookup)
    }
}
