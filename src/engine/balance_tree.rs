// ==========================================
// MRP 对账系统 - 库存树归约
// ==========================================
// 职责:
// 1. 按主仓过滤库存树（保持树形）
// 2. 展平为 规范化编码 → 数量
// 3. 构建物料名称/单位查找表
// ==========================================
// 说明: 库存行以仓库显示名称引用仓库，主仓以编码配置，
//       计算前先通过仓库目录把编码解析为显示名称
// ==========================================

use crate::domain::warehouse::{BalanceNode, StockRow, Warehouse};
use crate::engine::normalizer::{codes_match, normalize_code};
use std::collections::HashMap;

/// 按仓库显示名称过滤库存树
///
/// - 分组节点保留结构，递归过滤子节点
/// - 叶子节点改写为一条合成库存行，数量为匹配行之和（无匹配时为 0）
/// - 匹配规则: 两侧 TRIM 后精确比较，区分大小写
/// - 仓库名称为空时原样返回
pub fn filter_to_warehouse(tree: &[BalanceNode], warehouse_name: &str) -> Vec<BalanceNode> {
    let target = warehouse_name.trim();
    if target.is_empty() {
        return tree.to_vec();
    }

    tree.iter().map(|node| filter_node(node, target)).collect()
}

fn filter_node(node: &BalanceNode, target: &str) -> BalanceNode {
    match node {
        BalanceNode::Group { name, children } => BalanceNode::Group {
            name: name.clone(),
            children: children.iter().map(|c| filter_node(c, target)).collect(),
        },
        BalanceNode::Leaf(leaf) => {
            let quantity: f64 = leaf
                .rows
                .iter()
                .filter(|row| row.warehouse.trim() == target)
                .map(|row| row.quantity)
                .sum();

            let mut filtered = leaf.clone();
            filtered.rows = vec![StockRow::new(target, quantity)];
            BalanceNode::Leaf(filtered)
        }
    }
}

/// 展平库存树为 规范化编码 → 数量
///
/// 同一编码出现在不同分支时累加，不覆盖
pub fn flatten_to_map(tree: &[BalanceNode]) -> HashMap<String, f64> {
    let mut map = HashMap::new();
    for node in tree {
        accumulate(node, &mut map);
    }
    map
}

fn accumulate(node: &BalanceNode, map: &mut HashMap<String, f64>) {
    match node {
        BalanceNode::Group { children, .. } => {
            for child in children {
                accumulate(child, map);
            }
        }
        BalanceNode::Leaf(leaf) => {
            *map.entry(normalize_code(&leaf.code)).or_insert(0.0) += leaf.total_quantity();
        }
    }
}

// ==========================================
// NomenclatureLookup - 仓库侧物料主数据查找表
// ==========================================
// 按原始编码存储，遍历顺序后写覆盖先写；
// 额外维护规范化索引，供按规范化编码查询
#[derive(Debug, Clone, Default)]
pub struct NomenclatureLookup {
    pub name: HashMap<String, String>,
    pub unit: HashMap<String, String>,
    normalized_name: HashMap<String, String>,
    normalized_unit: HashMap<String, String>,
}

impl NomenclatureLookup {
    fn insert(&mut self, code: &str, name: &str, unit: Option<&str>) {
        let normalized = normalize_code(code);
        self.name.insert(code.to_string(), name.to_string());
        self.normalized_name.insert(normalized.clone(), name.to_string());
        if let Some(unit) = unit.map(str::trim).filter(|u| !u.is_empty()) {
            self.unit.insert(code.to_string(), unit.to_string());
            self.normalized_unit.insert(normalized, unit.to_string());
        }
    }

    /// 查询名称：原始编码优先，其次规范化编码
    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.name
            .get(code)
            .or_else(|| self.normalized_name.get(&normalize_code(code)))
            .map(String::as_str)
    }

    /// 查询单位：原始编码优先，其次规范化编码
    pub fn unit_of(&self, code: &str) -> Option<&str> {
        self.unit
            .get(code)
            .or_else(|| self.normalized_unit.get(&normalize_code(code)))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// 构建物料名称/单位查找表
pub fn build_lookup(tree: &[BalanceNode]) -> NomenclatureLookup {
    let mut lookup = NomenclatureLookup::default();
    for node in tree {
        collect_lookup(node, &mut lookup);
    }
    lookup
}

fn collect_lookup(node: &BalanceNode, lookup: &mut NomenclatureLookup) {
    match node {
        BalanceNode::Group { children, .. } => {
            for child in children {
                collect_lookup(child, lookup);
            }
        }
        BalanceNode::Leaf(leaf) => {
            let name = if leaf.name.trim().is_empty() {
                leaf.code.as_str()
            } else {
                leaf.name.as_str()
            };
            lookup.insert(&leaf.code, name, leaf.unit.as_deref());
        }
    }
}

/// 将仓库编码解析为显示名称（编码按规范化口径比较）
pub fn resolve_warehouse_name(warehouses: &[Warehouse], code: &str) -> Option<String> {
    if code.trim().is_empty() {
        return None;
    }

    warehouses
        .iter()
        .find(|w| codes_match(&w.code, code))
        .map(|w| w.name.trim().to_string())
        .filter(|name| !name.is_empty())
}
