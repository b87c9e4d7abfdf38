// ==========================================
// MRP 对账系统 - 仓库库存领域模型
// ==========================================
// 库存树: 分组节点(含子节点) XOR 叶子节点(含分仓库存行)
// 来源: 外部 ERP，只读
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// StockRow - 叶子节点上的分仓库存行
// ==========================================
// 注意: 库存行以仓库“显示名称”引用仓库，而不是仓库编码
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRow {
    #[serde(alias = "Склад", alias = "sklad")]
    pub warehouse: String,
    #[serde(alias = "Количество", alias = "kolichestvo", default)]
    pub quantity: f64,
}

impl StockRow {
    pub fn new(warehouse: impl Into<String>, quantity: f64) -> Self {
        Self {
            warehouse: warehouse.into(),
            quantity,
        }
    }
}

// ==========================================
// BalanceLeaf - 物料叶子
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceLeaf {
    #[serde(alias = "Код", alias = "kod")]
    pub code: String,
    #[serde(alias = "Наименование", alias = "naimenovanie", default)]
    pub name: String,
    #[serde(alias = "ЕдиницаИзмерения", alias = "edinica_izmereniya", default)]
    pub unit: Option<String>,
    #[serde(alias = "Склады", alias = "sklady", default)]
    pub rows: Vec<StockRow>,
}

impl BalanceLeaf {
    /// 所有库存行数量之和
    pub fn total_quantity(&self) -> f64 {
        self.rows.iter().map(|r| r.quantity).sum()
    }
}

// ==========================================
// BalanceNode - 库存树节点
// ==========================================
// untagged: 含 children 的是分组，否则按叶子解析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BalanceNode {
    Group {
        #[serde(alias = "Наименование", alias = "naimenovanie", default)]
        name: Option<String>,
        #[serde(alias = "Дети", alias = "deti")]
        children: Vec<BalanceNode>,
    },
    Leaf(BalanceLeaf),
}

impl BalanceNode {
    pub fn group(name: impl Into<String>, children: Vec<BalanceNode>) -> Self {
        BalanceNode::Group {
            name: Some(name.into()),
            children,
        }
    }

    pub fn leaf(code: impl Into<String>, name: impl Into<String>, rows: Vec<StockRow>) -> Self {
        BalanceNode::Leaf(BalanceLeaf {
            code: code.into(),
            name: name.into(),
            unit: None,
            rows,
        })
    }

    pub fn leaf_with_unit(
        code: impl Into<String>,
        name: impl Into<String>,
        unit: impl Into<String>,
        rows: Vec<StockRow>,
    ) -> Self {
        BalanceNode::Leaf(BalanceLeaf {
            code: code.into(),
            name: name.into(),
            unit: Some(unit.into()),
            rows,
        })
    }

    pub fn is_group(&self) -> bool {
        matches!(self, BalanceNode::Group { .. })
    }
}

// ==========================================
// Warehouse - 仓库目录条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    #[serde(alias = "Код", alias = "kod")]
    pub code: String,
    #[serde(alias = "Наименование", alias = "naimenovanie")]
    pub name: String,
}

impl Warehouse {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}
