// ==========================================
// MRP 对账系统 - ERP 快照数据源
// ==========================================
// 职责: 以内存快照实现规格/库存/仓库目录接口
// 用途: 命令行工具离线对账、集成测试
// 格式: { "specifications": [...], "balances": [...], "warehouses": [...] }
// ==========================================

use crate::domain::material::RawSpecification;
use crate::domain::warehouse::{BalanceNode, Warehouse};
use crate::engine::extractor::{aliases, SpecificationExtractor};
use crate::source::{
    Credentials, SourceResult, SpecificationQuery, SpecificationSource, WarehouseSource,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotSource {
    #[serde(default)]
    pub specifications: Vec<RawSpecification>,
    #[serde(default)]
    pub balances: Vec<BalanceNode>,
    #[serde(default)]
    pub warehouses: Vec<Warehouse>,
}

impl SnapshotSource {
    pub fn new(
        specifications: Vec<RawSpecification>,
        balances: Vec<BalanceNode>,
        warehouses: Vec<Warehouse>,
    ) -> Self {
        Self {
            specifications,
            balances,
            warehouses,
        }
    }

    /// 从 JSON 文本加载
    pub fn from_json_str(raw: &str) -> SourceResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// 从 JSON 文件加载
    pub async fn from_json_file<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let snapshot = Self::from_json_str(&raw)?;
        debug!(
            path = %path.as_ref().display(),
            specifications = snapshot.specifications.len(),
            warehouses = snapshot.warehouses.len(),
            "ERP 快照已加载"
        );
        Ok(snapshot)
    }

    /// 非 full 查询时去掉物料明细，只保留规格头
    fn header_only(spec: &RawSpecification) -> RawSpecification {
        match spec.as_value() {
            Value::Object(obj) => {
                let mut header = obj.clone();
                for key in aliases::ITEMS.candidates {
                    header.remove(*key);
                }
                RawSpecification::new(Value::Object(header))
            }
            other => RawSpecification::new(other.clone()),
        }
    }
}

#[async_trait]
impl SpecificationSource for SnapshotSource {
    async fn get_specifications(
        &self,
        _credentials: &Credentials,
        query: &SpecificationQuery,
    ) -> SourceResult<Vec<RawSpecification>> {
        let wanted = query.code.as_deref().map(str::trim);

        Ok(self
            .specifications
            .iter()
            .filter(|spec| match wanted {
                Some(code) => SpecificationExtractor::spec_code(spec).as_deref() == Some(code),
                None => true,
            })
            .map(|spec| {
                if query.full {
                    spec.clone()
                } else {
                    Self::header_only(spec)
                }
            })
            .collect())
    }
}

#[async_trait]
impl WarehouseSource for SnapshotSource {
    async fn get_warehouse_balances(
        &self,
        _credentials: &Credentials,
    ) -> SourceResult<Vec<BalanceNode>> {
        Ok(self.balances.clone())
    }

    async fn get_warehouses(&self, _credentials: &Credentials) -> SourceResult<Vec<Warehouse>> {
        Ok(self.warehouses.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::extractor::extract_materials;
    use crate::source::SourceError;

    const SNAPSHOT: &str = r#"{
        "specifications": [
            { "Код": "SPEC-1", "Наименование": "框架",
              "Материалы": [ { "КодМатериала": "00018218", "Количество": 10 } ] },
            { "kod": "SPEC-2", "materialy": [ { "kod": "18218", "kolichestvo": 5 } ] }
        ],
        "balances": [
            { "code": "000123", "name": "螺栓", "rows": [ { "warehouse": "Main", "quantity": 7 } ] }
        ],
        "warehouses": [ { "code": "000000001", "name": "Main" } ]
    }"#;

    fn creds() -> Credentials {
        Credentials::new("tester", "secret")
    }

    #[tokio::test]
    async fn test_query_by_code_full() {
        let source = SnapshotSource::from_json_str(SNAPSHOT).unwrap();
        let found = source
            .get_specifications(&creds(), &SpecificationQuery::full_by_code("SPEC-2"))
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        let materials = extract_materials(&found[0]);
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].quantity, 5.0);
    }

    #[tokio::test]
    async fn test_header_only_listing() {
        let source = SnapshotSource::from_json_str(SNAPSHOT).unwrap();
        let all = source
            .get_specifications(&creds(), &SpecificationQuery::default())
            .await
            .unwrap();

        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|s| extract_materials(s).is_empty()));
        assert_eq!(
            SpecificationExtractor::spec_name(&all[0]).as_deref(),
            Some("框架")
        );
    }

    #[tokio::test]
    async fn test_warehouse_reads() {
        let source = SnapshotSource::from_json_str(SNAPSHOT).unwrap();
        assert_eq!(source.get_warehouse_balances(&creds()).await.unwrap().len(), 1);
        assert_eq!(
            source.get_warehouses(&creds()).await.unwrap(),
            vec![Warehouse::new("000000001", "Main")]
        );
    }

    #[test]
    fn test_invalid_json_is_invalid_payload() {
        match SnapshotSource::from_json_str("{ not json") {
            Err(SourceError::InvalidPayload(_)) => {}
            other => panic!("Expected InvalidPayload, got {:?}", other),
        }
    }
}
