// ==========================================
// MRP 对账系统 - 需求汇总器
// ==========================================
// 职责: 多个规格的物料条目 → 规范化编码 → 需求
// 规则: 数量累加；名称/单位/分组首次出现者为准
// 说明: 归约满足交换律与结合律（浮点舍入差异可接受）
// ==========================================

use crate::domain::material::{DemandEntry, MaterialEntry};
use crate::engine::normalizer::normalize_code;
use std::collections::BTreeMap;

/// 需求表（BTreeMap 保证遍历顺序确定）
pub type DemandMap = BTreeMap<String, DemandEntry>;

pub struct DemandAggregator;

impl DemandAggregator {
    /// 汇总多个规格的物料条目
    pub fn aggregate(lists: &[Vec<MaterialEntry>]) -> DemandMap {
        let mut demand = DemandMap::new();
        for list in lists {
            Self::merge_into(&mut demand, list);
        }
        demand
    }

    /// 将一个规格的物料条目并入已有需求表
    pub fn merge_into(demand: &mut DemandMap, entries: &[MaterialEntry]) {
        for entry in entries {
            demand
                .entry(normalize_code(&entry.code))
                .and_modify(|existing| existing.quantity += entry.quantity)
                .or_insert_with(|| DemandEntry::from(entry));
        }
    }
}

/// 便捷函数，等价于 [`DemandAggregator::aggregate`]
pub fn aggregate(lists: &[Vec<MaterialEntry>]) -> DemandMap {
    DemandAggregator::aggregate(lists)
}
