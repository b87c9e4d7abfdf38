// ==========================================
// MRP 对账系统 - 物料需求溯源
// ==========================================
// 职责: 单个物料 → 各规格的贡献数量（审计/排查视图）
// 红线: 只读；只返回贡献数量严格大于 0 的规格
// ==========================================

use crate::domain::material::MaterialEntry;
use crate::engine::normalizer::normalize_code;
use serde::{Deserialize, Serialize};

/// 一个规格及其提取出的物料条目
#[derive(Debug, Clone)]
pub struct SpecificationMaterials {
    pub spec_code: String,
    pub spec_name: String,
    pub materials: Vec<MaterialEntry>,
}

/// 溯源结果行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub spec_code: String,
    pub spec_name: String,
    pub quantity: f64,
}

pub struct BreakdownResolver;

impl BreakdownResolver {
    /// 计算指定物料在各规格中的贡献
    ///
    /// 输出顺序与输入规格顺序一致
    pub fn resolve(specs: &[SpecificationMaterials], material_code: &str) -> Vec<BreakdownRow> {
        let wanted = normalize_code(material_code);

        specs
            .iter()
            .filter_map(|spec| {
                let quantity: f64 = spec
                    .materials
                    .iter()
                    .filter(|m| normalize_code(&m.code) == wanted)
                    .map(|m| m.quantity)
                    .sum();

                (quantity > 0.0).then(|| BreakdownRow {
                    spec_code: spec.spec_code.clone(),
                    spec_name: spec.spec_name.clone(),
                    quantity,
                })
            })
            .collect()
    }
}
