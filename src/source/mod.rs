// ==========================================
// MRP 对账系统 - 外部数据源
// ==========================================
// 职责: 定义规格 / 库存 / 仓库目录的读取接口
// 说明: 具体传输（ERP 连接器）不在本 crate 内，
//       这里只约定接口与超时语义
// ==========================================

pub mod error;
pub mod snapshot;

pub use error::{SourceError, SourceResult};
pub use snapshot::SnapshotSource;

use crate::domain::material::RawSpecification;
use crate::domain::warehouse::{BalanceNode, Warehouse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;

// ==========================================
// Credentials - ERP 访问凭据
// ==========================================
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("secret", &"***")
            .finish()
    }
}

// ==========================================
// SpecificationQuery - 规格查询条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificationQuery {
    /// 规格编码（None 表示全部）
    pub code: Option<String>,
    /// 是否返回物料明细
    pub full: bool,
}

impl SpecificationQuery {
    /// 按编码查询单个规格的完整记录
    pub fn full_by_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            full: true,
        }
    }
}

// ==========================================
// SpecificationSource - 规格数据源
// ==========================================
#[async_trait]
pub trait SpecificationSource: Send + Sync {
    /// 查询规格；`full=true` 且指定编码时预期恰好返回一条
    async fn get_specifications(
        &self,
        credentials: &Credentials,
        query: &SpecificationQuery,
    ) -> SourceResult<Vec<RawSpecification>>;
}

// ==========================================
// WarehouseSource - 库存与仓库目录数据源
// ==========================================
#[async_trait]
pub trait WarehouseSource: Send + Sync {
    /// 库存树（分组/叶子）
    async fn get_warehouse_balances(&self, credentials: &Credentials)
        -> SourceResult<Vec<BalanceNode>>;

    /// 仓库目录（编码 → 显示名称）
    async fn get_warehouses(&self, credentials: &Credentials) -> SourceResult<Vec<Warehouse>>;
}

/// 为外部调用加上超时；超时转换为 [`SourceError::Timeout`]
pub async fn with_timeout<T, F>(operation: &str, timeout: Duration, fut: F) -> SourceResult<T>
where
    F: Future<Output = SourceResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout {
            operation: operation.to_string(),
            timeout_secs: timeout.as_secs(),
        }),
    }
}
