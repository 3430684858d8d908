// ==========================================
// 供应商报价引擎 - 报价导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到目录；从需求文件到配货方案
// 流程: 解析 → 列定位 → 字段映射 → 合并（单事务）
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::domain::consolidation::ConsolidationReport;
use crate::domain::fulfillment::{FulfillmentPlan, FulfillmentRequest};
use crate::domain::offer::RawOfferRow;
use crate::engine::allocator::FulfillmentAllocator;
use crate::engine::consolidator::OfferConsolidator;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapperImpl;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::offer_importer_trait::{FieldMapper, FileParser, OfferImporter};
use crate::repository::offer_catalog_repo::OfferCatalogRepository;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

// ==========================================
// OfferImporterImpl - 报价导入器实现
// ==========================================
pub struct OfferImporterImpl<R>
where
    R: OfferCatalogRepository + ?Sized,
{
    // 引擎
    consolidator: OfferConsolidator<R>,
    allocator: FulfillmentAllocator<R>,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    field_mapper: Box<dyn FieldMapper>,
}

impl<R> OfferImporterImpl<R>
where
    R: OfferCatalogRepository + ?Sized,
{
    /// 创建新的 OfferImporter 实例
    ///
    /// # 参数
    /// - store: 报价目录仓储
    /// - config: 引擎配置
    /// - file_parser: 文件解析器
    /// - field_mapper: 字段映射器
    pub fn new(
        store: Arc<R>,
        config: EngineConfig,
        file_parser: Box<dyn FileParser>,
        field_mapper: Box<dyn FieldMapper>,
    ) -> Self {
        Self {
            consolidator: OfferConsolidator::new(store.clone(), config.clone()),
            allocator: FulfillmentAllocator::new(store, config),
            file_parser,
            field_mapper,
        }
    }

    /// 使用默认组件（按扩展名选择解析器，按配置的身份规则映射字段）
    pub fn with_default_components(store: Arc<R>, config: EngineConfig) -> Self {
        let field_mapper = FieldMapperImpl::new(config.supplier_key_rule);
        Self::new(
            store,
            config,
            Box::new(UniversalFileParser),
            Box::new(field_mapper),
        )
    }

    /// 读取报价文件并映射为标准化行
    pub fn read_offer_rows(&self, file_path: &Path) -> ImportResult<Vec<RawOfferRow>> {
        let sheet = self.file_parser.parse(file_path)?;
        let columns = self.field_mapper.resolve_offer_columns(&sheet.headers)?;
        debug!(?columns, rows = sheet.rows.len(), "报价文件列定位完成");

        Ok(sheet
            .rows
            .iter()
            .map(|row| self.field_mapper.map_offer_row(&columns, row))
            .collect())
    }

    /// 读取需求文件并映射为需求行
    pub fn read_requests(&self, file_path: &Path) -> ImportResult<Vec<FulfillmentRequest>> {
        let sheet = self.file_parser.parse(file_path)?;
        let columns = self.field_mapper.resolve_request_columns(&sheet.headers)?;

        Ok(sheet
            .rows
            .iter()
            .map(|row| self.field_mapper.map_request_row(&columns, row))
            .collect())
    }
}

#[async_trait]
impl<R> OfferImporter for OfferImporterImpl<R>
where
    R: OfferCatalogRepository + ?Sized + 'static,
{
    #[instrument(skip(self, file_path), fields(file = %file_path.display()))]
    async fn import_file(&self, file_path: &Path) -> ImportResult<ConsolidationReport> {
        info!("开始导入报价文件");

        // === 步骤 1: 解析 + 映射（整文件错误在事务开始前返回）===
        let rows = self.read_offer_rows(file_path).map_err(|e| {
            error!(error = %e, "报价文件读取失败");
            e
        })?;
        info!(rows = rows.len(), "报价文件解析完成");

        // === 步骤 2: 合并 ===
        self.import_rows(rows).await
    }

    async fn import_rows(&self, rows: Vec<RawOfferRow>) -> ImportResult<ConsolidationReport> {
        let report = self.consolidator.consolidate(&rows).await?;
        Ok(report)
    }

    #[instrument(skip(self, file_path), fields(file = %file_path.display()))]
    async fn analyze_file(&self, file_path: &Path) -> ImportResult<Vec<FulfillmentPlan>> {
        let requests = self.read_requests(file_path).map_err(|e| {
            error!(error = %e, "需求文件读取失败");
            e
        })?;
        info!(requests = requests.len(), "需求文件解析完成");

        self.analyze_requests(requests).await
    }

    async fn analyze_requests(
        &self,
        requests: Vec<FulfillmentRequest>,
    ) -> ImportResult<Vec<FulfillmentPlan>> {
        let plans = self.allocator.allocate(&requests).await?;
        Ok(plans)
    }
}
