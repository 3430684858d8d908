// ==========================================
// 配货分析API
// ==========================================
// 职责: 需求清单 → 每行一个配货方案 + 汇总
// 说明: 只读访问目录，不加锁
// ==========================================

use crate::api::error::ApiResult;
use crate::config::{ConfigManager, EngineConfigReader};
use crate::domain::fulfillment::{FulfillmentPlan, FulfillmentRequest, PlanStatus};
use crate::importer::{OfferImporter, OfferImporterImpl};
use crate::repository::OfferCatalogRepositoryImpl;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// 分析API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub plans: Vec<FulfillmentPlan>,
    pub total_requests: usize,
    pub fulfilled: usize,
    pub requires_manual_processing: usize,
    /// 所有方案已采购部分的总成本
    pub total_cost: f64,
}

impl AnalysisResponse {
    pub fn from_plans(plans: Vec<FulfillmentPlan>) -> Self {
        let fulfilled = plans
            .iter()
            .filter(|p| p.status == PlanStatus::Fulfilled)
            .count();
        let manual = plans.iter().filter(|p| p.requires_manual_processing).count();
        let total_cost = plans.iter().filter_map(|p| p.total_cost).sum();

        Self {
            total_requests: plans.len(),
            fulfilled,
            requires_manual_processing: manual,
            total_cost,
            plans,
        }
    }
}

/// 分析API
pub struct AnalysisApi {
    db_path: String,
}

impl AnalysisApi {
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    async fn create_importer(&self) -> ApiResult<OfferImporterImpl<OfferCatalogRepositoryImpl>> {
        let repo = Arc::new(OfferCatalogRepositoryImpl::new(&self.db_path)?);
        let config = ConfigManager::new(&self.db_path)?.load_engine_config().await?;
        Ok(OfferImporterImpl::with_default_components(repo, config))
    }

    /// 读取需求文件并生成配货方案
    pub async fn analyze_file(&self, file_path: &str) -> ApiResult<AnalysisResponse> {
        let importer = self.create_importer().await?;
        let plans = importer.analyze_file(Path::new(file_path)).await?;
        Ok(AnalysisResponse::from_plans(plans))
    }

    /// 对给定需求行生成配货方案
    pub async fn analyze_requests(
        &self,
        requests: Vec<FulfillmentRequest>,
    ) -> ApiResult<AnalysisResponse> {
        let importer = self.create_importer().await?;
        let plans = importer.analyze_requests(requests).await?;
        Ok(AnalysisResponse::from_plans(plans))
    }
}
