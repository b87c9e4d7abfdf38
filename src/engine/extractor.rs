// ==========================================
// MRP 对账系统 - 规格物料提取器
// ==========================================
// 职责: 外部规格原始记录 → 物料条目列表
// 说明: 外部字段命名有两套（本地化 / 音译），按别名表顺序尝试
// 红线: 无编码的行静默丢弃，不报错（上游数据不受控）
// ==========================================

use crate::domain::material::{MaterialEntry, RawSpecification};
use serde_json::{Map, Value};

// ==========================================
// 字段别名表
// ==========================================

/// 单个属性的候选字段名（按优先级排列）
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub attribute: &'static str,
    pub candidates: &'static [&'static str],
}

pub mod aliases {
    use super::FieldAliases;

    pub const ITEMS: FieldAliases = FieldAliases {
        attribute: "items",
        candidates: &["Материалы", "materialy", "materials"],
    };
    pub const CODE: FieldAliases = FieldAliases {
        attribute: "code",
        candidates: &["КодМатериала", "kod_materiala", "Код", "kod", "code"],
    };
    pub const NAME: FieldAliases = FieldAliases {
        attribute: "name",
        candidates: &["Наименование", "naimenovanie", "name"],
    };
    pub const QUANTITY: FieldAliases = FieldAliases {
        attribute: "quantity",
        candidates: &["Количество", "kolichestvo", "quantity"],
    };
    pub const UNIT: FieldAliases = FieldAliases {
        attribute: "unit",
        candidates: &["ЕдиницаИзмерения", "edinica_izmereniya", "unit"],
    };
    pub const GROUP: FieldAliases = FieldAliases {
        attribute: "nomenclature_group",
        candidates: &["НоменклатурнаяГруппа", "nomenklaturnaya_gruppa", "group"],
    };
    pub const SPEC_CODE: FieldAliases = FieldAliases {
        attribute: "spec_code",
        candidates: &["Код", "kod", "code"],
    };
    pub const SPEC_NAME: FieldAliases = FieldAliases {
        attribute: "spec_name",
        candidates: &["Наименование", "naimenovanie", "name"],
    };
}

// ==========================================
// SpecificationExtractor
// ==========================================
pub struct SpecificationExtractor;

impl SpecificationExtractor {
    /// 提取规格中的全部物料条目
    ///
    /// - 编码必填，缺失则丢弃该行
    /// - 数量缺失或无法解析时为 0
    /// - 名称缺失时使用编码
    /// - 同一规格内重复编码全部保留（由汇总器负责累加）
    pub fn extract_materials(spec: &RawSpecification) -> Vec<MaterialEntry> {
        let Some(items) = spec
            .as_value()
            .as_object()
            .and_then(|obj| first_array(obj, &aliases::ITEMS))
        else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(Self::map_line_item)
            .collect()
    }

    /// 规格自身编码
    pub fn spec_code(spec: &RawSpecification) -> Option<String> {
        spec.as_value()
            .as_object()
            .and_then(|obj| get_string(obj, &aliases::SPEC_CODE))
    }

    /// 规格自身名称
    pub fn spec_name(spec: &RawSpecification) -> Option<String> {
        spec.as_value()
            .as_object()
            .and_then(|obj| get_string(obj, &aliases::SPEC_NAME))
    }

    fn map_line_item(item: &Map<String, Value>) -> Option<MaterialEntry> {
        let code = get_string(item, &aliases::CODE)?;
        let name = get_string(item, &aliases::NAME).unwrap_or_else(|| code.clone());

        Some(MaterialEntry {
            quantity: parse_quantity(item, &aliases::QUANTITY),
            unit: get_string(item, &aliases::UNIT),
            nomenclature_group: get_string(item, &aliases::GROUP),
            name,
            code,
        })
    }
}

/// 便捷函数，等价于 [`SpecificationExtractor::extract_materials`]
pub fn extract_materials(spec: &RawSpecification) -> Vec<MaterialEntry> {
    SpecificationExtractor::extract_materials(spec)
}

// ==========================================
// 字段读取辅助
// ==========================================

/// 按别名顺序返回第一个数组字段（类型不符的候选视为缺失）
fn first_array<'a>(obj: &'a Map<String, Value>, aliases: &FieldAliases) -> Option<&'a Vec<Value>> {
    aliases
        .candidates
        .iter()
        .filter_map(|key| obj.get(*key))
        .find_map(Value::as_array)
}

/// 读取文本字段（数字按文本处理）
fn get_string(obj: &Map<String, Value>, aliases: &FieldAliases) -> Option<String> {
    aliases
        .candidates
        .iter()
        .filter_map(|key| obj.get(*key))
        .find_map(|value| match value {
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// 读取数量（支持小数逗号），所有候选都无法解析时为 0
fn parse_quantity(obj: &Map<String, Value>, aliases: &FieldAliases) -> f64 {
    aliases
        .candidates
        .iter()
        .filter_map(|key| obj.get(*key))
        .find_map(|value| match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s
                .trim()
                .replace(char::is_whitespace, "")
                .replace(',', ".")
                .parse::<f64>()
                .ok(),
            _ => None,
        })
        .filter(|q| q.is_finite())
        .unwrap_or(0.0)
}
