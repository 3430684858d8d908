// ==========================================
// 供应商报价引擎 - 配置管理 API
// ==========================================
// 职责: 配置查询、更新
// ==========================================

use crate::api::error::ApiResult;
use crate::config::{ConfigManager, EngineConfig, EngineConfigReader};
use std::collections::BTreeMap;
use tracing::info;

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================
pub struct ConfigApi {
    config_manager: ConfigManager,
}

impl ConfigApi {
    pub fn new(db_path: &str) -> ApiResult<Self> {
        Ok(Self {
            config_manager: ConfigManager::new(db_path)?,
        })
    }

    /// 当前生效的引擎配置（含默认值）
    pub async fn get_engine_config(&self) -> ApiResult<EngineConfig> {
        Ok(self.config_manager.load_engine_config().await?)
    }

    /// 已显式写入的配置项
    pub fn list_configs(&self) -> ApiResult<BTreeMap<String, String>> {
        Ok(self.config_manager.list_global_config()?)
    }

    /// 更新单个配置项
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<()> {
        self.config_manager.set_config_value(key, value)?;
        info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }
}
