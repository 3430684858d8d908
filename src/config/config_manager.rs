// ==========================================
// 供应商报价引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::config_reader::EngineConfigReader;
use crate::config::engine_config::{
    DEFAULT_FLUSH_BATCH_SIZE, DEFAULT_MAX_DUPLICATE_EXAMPLES, DEFAULT_MAX_LOGGED_FAILURES,
    DEFAULT_SUSPECT_PRODUCT_LABEL, DEFAULT_UNNAMED_PRODUCT_LABEL,
};
use crate::db::open_sqlite_connection;
use crate::domain::supplier::SupplierKeyRule;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取配置值并解析，缺失或格式错误时回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr,
    {
        let value = match self.get_global_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match value.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(_) => {
                warn!(config_key = key, raw_value = %value, "配置值格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    fn get_text_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global 配置值
    ///
    /// # 校验
    /// - 仅接受 config_keys 中定义的键
    /// - 数值键必须为正整数，supplier_key_rule 必须为已知规则
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        validate_config_value(key, value)?;

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key, value.trim()],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置（按键排序）
    pub fn list_global_config(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }
}

fn validate_config_value(key: &str, value: &str) -> RepositoryResult<()> {
    let value = value.trim();
    let invalid = |message: &str| RepositoryError::FieldValueError {
        field: key.to_string(),
        message: message.to_string(),
    };

    match key {
        config_keys::FLUSH_BATCH_SIZE
        | config_keys::MAX_DUPLICATE_EXAMPLES
        | config_keys::MAX_LOGGED_FAILURES => match value.parse::<usize>() {
            Ok(n) if key != config_keys::FLUSH_BATCH_SIZE || n > 0 => Ok(()),
            _ => Err(invalid("需要正整数")),
        },
        config_keys::SUPPLIER_KEY_RULE => SupplierKeyRule::from_str(value)
            .map(|_| ())
            .map_err(|e| invalid(&e)),
        config_keys::UNNAMED_PRODUCT_LABEL | config_keys::SUSPECT_PRODUCT_LABEL => {
            if value.is_empty() {
                Err(invalid("不能为空"))
            } else {
                Ok(())
            }
        }
        _ => Err(invalid("未知配置项")),
    }
}

// ==========================================
// EngineConfigReader Trait 实现
// ==========================================
#[async_trait]
impl EngineConfigReader for ConfigManager {
    async fn get_flush_batch_size(&self) -> RepositoryResult<usize> {
        let size = self.get_parsed_or_default(config_keys::FLUSH_BATCH_SIZE, DEFAULT_FLUSH_BATCH_SIZE)?;
        Ok(if size == 0 { DEFAULT_FLUSH_BATCH_SIZE } else { size })
    }

    async fn get_max_duplicate_examples(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(
            config_keys::MAX_DUPLICATE_EXAMPLES,
            DEFAULT_MAX_DUPLICATE_EXAMPLES,
        )
    }

    async fn get_max_logged_failures(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(config_keys::MAX_LOGGED_FAILURES, DEFAULT_MAX_LOGGED_FAILURES)
    }

    async fn get_supplier_key_rule(&self) -> RepositoryResult<SupplierKeyRule> {
        self.get_parsed_or_default(config_keys::SUPPLIER_KEY_RULE, SupplierKeyRule::default())
    }

    async fn get_unnamed_product_label(&self) -> RepositoryResult<String> {
        self.get_text_or_default(config_keys::UNNAMED_PRODUCT_LABEL, DEFAULT_UNNAMED_PRODUCT_LABEL)
    }

    async fn get_suspect_product_label(&self) -> RepositoryResult<String> {
        self.get_text_or_default(config_keys::SUSPECT_PRODUCT_LABEL, DEFAULT_SUSPECT_PRODUCT_LABEL)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 导入
    pub const FLUSH_BATCH_SIZE: &str = "flush_batch_size";
    pub const MAX_DUPLICATE_EXAMPLES: &str = "max_duplicate_examples";
    pub const MAX_LOGGED_FAILURES: &str = "max_logged_failures";
    pub const SUPPLIER_KEY_RULE: &str = "supplier_key_rule";

    // 分析
    pub const UNNAMED_PRODUCT_LABEL: &str = "unnamed_product_label";
    pub const SUSPECT_PRODUCT_LABEL: &str = "suspect_product_label";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::engine_config::EngineConfig;
    use tempfile::NamedTempFile;

    fn setup() -> (NamedTempFile, ConfigManager) {
        let temp_file = NamedTempFile::new().unwrap();
        let manager = ConfigManager::new(temp_file.path().to_str().unwrap()).unwrap();
        (temp_file, manager)
    }

    #[tokio::test]
    async fn test_defaults_when_table_empty() {
        let (_tmp, manager) = setup();
        let config = manager.load_engine_config().await.unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[tokio::test]
    async fn test_set_and_load_overrides() {
        let (_tmp, manager) = setup();
        manager.set_config_value(config_keys::FLUSH_BATCH_SIZE, "2").unwrap();
        manager
            .set_config_value(config_keys::SUPPLIER_KEY_RULE, "business_code")
            .unwrap();

        let config = manager.load_engine_config().await.unwrap();
        assert_eq!(config.flush_batch_size, 2);
        assert_eq!(config.supplier_key_rule, SupplierKeyRule::BusinessCode);

        let listed = manager.list_global_config().unwrap();
        assert_eq!(listed.get("flush_batch_size"), Some(&"2".to_string()));
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let (_tmp, manager) = setup();
        assert!(manager.set_config_value(config_keys::FLUSH_BATCH_SIZE, "0").is_err());
        assert!(manager.set_config_value(config_keys::MAX_LOGGED_FAILURES, "abc").is_err());
        assert!(manager.set_config_value(config_keys::SUPPLIER_KEY_RULE, "phone").is_err());
        assert!(manager.set_config_value("season_mode", "AUTO").is_err());
        assert!(manager.set_config_value(config_keys::MAX_DUPLICATE_EXAMPLES, "0").is_ok());
    }

    #[tokio::test]
    async fn test_malformed_stored_value_falls_back() {
        let (_tmp, manager) = setup();
        {
            let conn = manager.get_conn().unwrap();
            conn.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', 'max_logged_failures', 'many')",
                [],
            )
            .unwrap();
        }
        assert_eq!(
            manager.get_max_logged_failures().await.unwrap(),
            DEFAULT_MAX_LOGGED_FAILURES
        );
    }
}
