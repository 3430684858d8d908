// ==========================================
// 供应商报价导入API
// ==========================================
// 职责: 封装报价文件导入，输出结构化合并结果
// 约定: 整文件错误以 success=false 的响应返回，而非 Err
// ==========================================

use crate::api::error::ApiResult;
use crate::config::{ConfigManager, EngineConfigReader};
use crate::domain::consolidation::ConsolidationReport;
use crate::importer::{OfferImporter, OfferImporterImpl};
use crate::repository::OfferCatalogRepositoryImpl;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// 合并计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationCounts {
    pub total_rows: usize,
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub dropped: usize,
}

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationResponse {
    /// 是否成功（整文件错误时为 false，目录无任何变化）
    pub success: bool,
    /// 面向用户的摘要
    pub message: String,
    /// 导入的文件
    pub file_path: String,
    /// 批次ID（用于日志追溯）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pub counts: ConsolidationCounts,
    /// 文件内重复示例（至多 3 条）
    pub duplicate_examples: Vec<String>,
    /// 行级错误信息（至多 10 条）
    pub failure_messages: Vec<String>,
    /// 导入耗时（毫秒）
    pub elapsed_ms: u64,
}

impl ConsolidationResponse {
    fn from_report(file_path: &str, report: ConsolidationReport) -> Self {
        Self {
            success: true,
            message: format!("导入完成: {}", report.summary_message()),
            file_path: file_path.to_string(),
            batch_id: Some(report.batch_id),
            counts: ConsolidationCounts {
                total_rows: report.total_rows,
                new: report.new_count,
                updated: report.updated_count,
                unchanged: report.unchanged_count,
                skipped: report.skipped_count,
                failed: report.failed_count,
                dropped: report.dropped_count,
            },
            duplicate_examples: report.duplicate_examples,
            failure_messages: report.failure_messages,
            elapsed_ms: report.elapsed_ms,
        }
    }

    fn failure(file_path: &str, message: String) -> Self {
        Self {
            success: false,
            message,
            file_path: file_path.to_string(),
            batch_id: None,
            counts: ConsolidationCounts::default(),
            duplicate_examples: Vec::new(),
            failure_messages: Vec::new(),
            elapsed_ms: 0,
        }
    }
}

/// 导入API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    /// 导入供应商报价文件
    ///
    /// # 返回
    /// - Ok(ConsolidationResponse): 导入结果（整文件错误时 success=false）
    /// - Err(ApiError): 数据库无法打开或配置读取失败
    pub async fn import_offers(&self, file_path: &str) -> ApiResult<ConsolidationResponse> {
        // 每次导入使用独立连接与独立事务
        let repo = Arc::new(OfferCatalogRepositoryImpl::new(&self.db_path)?);
        let config = ConfigManager::new(&self.db_path)?.load_engine_config().await?;
        let importer = OfferImporterImpl::with_default_components(repo, config);

        match importer.import_file(Path::new(file_path)).await {
            Ok(report) => {
                info!(file = %file_path, batch_id = %report.batch_id, "文件导入成功");
                Ok(ConsolidationResponse::from_report(file_path, report))
            }
            Err(e) => {
                error!(file = %file_path, error = %e, "文件导入失败");
                Ok(ConsolidationResponse::failure(
                    file_path,
                    format!("导入失败: {}", e),
                ))
            }
        }
    }

    /// 批量导入多个文件（各文件独立连接、独立事务，互不影响）
    pub async fn import_many(&self, file_paths: &[String]) -> Vec<ApiResult<ConsolidationResponse>> {
        info!(count = file_paths.len(), "开始批量导入文件");

        let tasks = file_paths.iter().map(|path| self.import_offers(path));
        let results = join_all(tasks).await;

        info!(
            total = results.len(),
            success = results
                .iter()
                .filter(|r| matches!(r, Ok(resp) if resp.success))
                .count(),
            "批量导入完成"
        );

        results
    }
}
