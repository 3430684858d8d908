// ==========================================
// 供应商报价引擎 - 引擎配置快照
// ==========================================
// 职责: 导入/分析运行时使用的类型化配置（带默认值）
// 来源: config_kv 表经 ConfigManager 读取后组装
// ==========================================

use crate::domain::supplier::SupplierKeyRule;
use serde::{Deserialize, Serialize};

/// 默认批量写入大小
pub const DEFAULT_FLUSH_BATCH_SIZE: usize = 1000;
/// 默认保留的重复示例条数
pub const DEFAULT_MAX_DUPLICATE_EXAMPLES: usize = 3;
/// 默认记录的行级错误条数
pub const DEFAULT_MAX_LOGGED_FAILURES: usize = 10;
/// 商品名称缺失时的占位名
pub const DEFAULT_UNNAMED_PRODUCT_LABEL: &str = "未指定";
/// 商品名称与供应商名称相同时的占位名
pub const DEFAULT_SUSPECT_PRODUCT_LABEL: &str = "名称待核实";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub flush_batch_size: usize,
    pub max_duplicate_examples: usize,
    pub max_logged_failures: usize,
    pub supplier_key_rule: SupplierKeyRule,
    pub unnamed_product_label: String,
    pub suspect_product_label: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            flush_batch_size: DEFAULT_FLUSH_BATCH_SIZE,
            max_duplicate_examples: DEFAULT_MAX_DUPLICATE_EXAMPLES,
            max_logged_failures: DEFAULT_MAX_LOGGED_FAILURES,
            supplier_key_rule: SupplierKeyRule::default(),
            unnamed_product_label: DEFAULT_UNNAMED_PRODUCT_LABEL.to_string(),
            suspect_product_label: DEFAULT_SUSPECT_PRODUCT_LABEL.to_string(),
        }
    }
}

impl EngineConfig {
    /// 批量大小至少为 1
    pub fn effective_flush_batch_size(&self) -> usize {
        self.flush_batch_size.max(1)
    }
}
