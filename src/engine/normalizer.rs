// ==========================================
// MRP 对账系统 - 物料编码规范化
// ==========================================
// 职责: 规格侧与仓库侧编码统一比较口径
// 规则: TRIM → 去前导零（夹杂的空白一并去掉）；若结果为空则返回 TRIM 后的原值
// ==========================================

/// 规范化物料编码
///
/// 规格数据可能使用补零编码（`00018218`），仓库数据可能不补零（`18218`），
/// 两侧比较前都必须经过此函数。
///
/// # 示例
/// ```
/// use mrp_reconcile::engine::normalize_code;
/// assert_eq!(normalize_code(" 00123 "), "123");
/// assert_eq!(normalize_code("000"), "000");
/// ```
pub fn normalize_code(code: &str) -> String {
    let trimmed = code.trim();
    let stripped = trimmed.trim_start_matches(|c: char| c == '0' || c.is_whitespace());
    if stripped.is_empty() {
        trimmed.to_string()
    } else {
        stripped.to_string()
    }
}

/// 两个编码在规范化后是否相等
pub fn codes_match(a: &str, b: &str) -> bool {
    normalize_code(a) == normalize_code(b)
}
