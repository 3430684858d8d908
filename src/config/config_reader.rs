// ==========================================
// 供应商报价引擎 - 配置读取 Trait
// ==========================================
// 职责: 定义导入/分析所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::domain::supplier::SupplierKeyRule;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// EngineConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait EngineConfigReader: Send + Sync {
    /// 批量写入大小（默认 1000）
    async fn get_flush_batch_size(&self) -> RepositoryResult<usize>;

    /// 重复示例上限（默认 3）
    async fn get_max_duplicate_examples(&self) -> RepositoryResult<usize>;

    /// 行级错误记录上限（默认 10）
    async fn get_max_logged_failures(&self) -> RepositoryResult<usize>;

    /// 供应商身份规则（默认 NORMALIZED_NAME）
    async fn get_supplier_key_rule(&self) -> RepositoryResult<SupplierKeyRule>;

    /// 商品名称缺失时的占位名
    async fn get_unnamed_product_label(&self) -> RepositoryResult<String>;

    /// 可疑商品名称的占位名
    async fn get_suspect_product_label(&self) -> RepositoryResult<String>;

    /// 组装完整配置快照
    async fn load_engine_config(&self) -> RepositoryResult<EngineConfig> {
        Ok(EngineConfig {
            flush_batch_size: self.get_flush_batch_size().await?,
            max_duplicate_examples: self.get_max_duplicate_examples().await?,
            max_logged_failures: self.get_max_logged_failures().await?,
            supplier_key_rule: self.get_supplier_key_rule().await?,
            unnamed_product_label: self.get_unnamed_product_label().await?,
            suspect_product_label: self.get_suspect_product_label().await?,
        })
    }
}
