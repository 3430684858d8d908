// ==========================================
// 供应商报价引擎 - 核心库
// ==========================================
// 职责: 供应商报价合并（写路径）+ 最低成本配货（读路径）
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 合并 / 配货
pub mod engine;

// 导入层 - 外部文件
pub mod importer;

// 配置层 - 引擎配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    CatalogOffer, ConsolidationReport, FulfillmentPlan, FulfillmentRequest, LineItem, Offer,
    OfferChange, PlanStatus, RawOfferRow, RowOutcome, RowValidationError, Supplier,
    SupplierKeyRule,
};

// 引擎
pub use engine::{FulfillmentAllocator, OfferConsolidator, SupplierRegistry};

// 仓储
pub use repository::{OfferCatalogRepository, OfferCatalogRepositoryImpl, RepositoryError};

// 配置
pub use config::{ConfigManager, EngineConfig};

// API
pub use api::{AnalysisApi, ConfigApi, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "供应商报价引擎";

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "SUPPLIER_OFFER_DB_PATH";

/// 获取默认数据库路径
///
/// 优先级: 环境变量 SUPPLIER_OFFER_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    if let Some(data_dir) = dirs::data_dir() {
        let app_dir = data_dir.join("supplier-offer-engine");
        if std::fs::create_dir_all(&app_dir).is_ok() {
            return app_dir.join("supplier_offers.db").to_string_lossy().to_string();
        }
    }

    "./supplier_offers.db".to_string()
}
