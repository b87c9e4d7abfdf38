// ==========================================
// MRP 对账系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 报告状态 (Report Status)
// ==========================================
// 状态机: DRAFT → COMPUTED（无回退）
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Draft,    // 草稿：可增删规格
    Computed, // 已计算：结果已落库
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ReportStatus {
    /// 从字符串解析状态（未知值按草稿处理）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "COMPUTED" => ReportStatus::Computed,
            _ => ReportStatus::Draft,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReportStatus::Draft => "DRAFT",
            ReportStatus::Computed => "COMPUTED",
        }
    }

    /// 规格列表是否允许修改
    pub fn allows_spec_edit(&self) -> bool {
        *self == ReportStatus::Draft
    }

    /// 列表去重时的优先级（越大越优先）
    pub fn rank(&self) -> u8 {
        match self {
            ReportStatus::Draft => 0,
            ReportStatus::Computed => 1,
        }
    }
}
