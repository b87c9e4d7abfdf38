// ==========================================
// MRP 对账系统 - 物料领域模型
// ==========================================
// 用途: 规格原始记录 → 物料条目 → 需求汇总
// 说明: 均为瞬时值，不落库
// ==========================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ==========================================
// RawSpecification - 外部规格原始记录
// ==========================================
// 外部 ERP 返回的松散 JSON 结构，字段命名不受控
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSpecification(Value);

impl RawSpecification {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for RawSpecification {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

// ==========================================
// MaterialEntry - 规格中的一条物料
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub code: String,                       // 物料编码（原始格式）
    pub name: String,                       // 名称（缺省为编码）
    pub quantity: f64,                      // 数量（缺省为 0）
    pub unit: Option<String>,               // 计量单位
    pub nomenclature_group: Option<String>, // 物料分组
}

impl MaterialEntry {
    pub fn new(code: impl Into<String>, quantity: f64) -> Self {
        let code = code.into();
        Self {
            name: code.clone(),
            code,
            quantity,
            unit: None,
            nomenclature_group: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.nomenclature_group = Some(group.into());
        self
    }
}

// ==========================================
// DemandEntry - 汇总后的物料需求
// ==========================================
// 描述字段首次出现者为准，数量累加
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandEntry {
    pub name: String,
    pub unit: Option<String>,
    pub nomenclature_group: Option<String>,
    pub quantity: f64,
}

impl From<&MaterialEntry> for DemandEntry {
    fn from(entry: &MaterialEntry) -> Self {
        Self {
            name: entry.name.clone(),
            unit: entry.unit.clone(),
            nomenclature_group: entry.nomenclature_group.clone(),
            quantity: entry.quantity,
        }
    }
}
