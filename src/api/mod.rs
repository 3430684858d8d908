// ==========================================
// 供应商报价引擎 - API 层
// ==========================================
// 职责: 面向调用方的业务接口（CLI / 上层服务）
// ==========================================

pub mod analysis_api;
pub mod config_api;
pub mod error;
pub mod import_api;

// 重导出核心类型
pub use analysis_api::{AnalysisApi, AnalysisResponse};
pub use config_api::ConfigApi;
pub use error::{ApiError, ApiResult};
pub use import_api::{ConsolidationCounts, ConsolidationResponse, ImportApi};
