// ==========================================
// 供应商报价引擎 - 配置层
// ==========================================
// 职责: 引擎配置管理（批量大小、示例上限、身份规则、占位名）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod config_reader;
pub mod engine_config;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use config_reader::EngineConfigReader;
pub use engine_config::EngineConfig;
