// ==========================================
// 供应商报价引擎 - 报价合并引擎
// ==========================================
// 职责: 将一个文件的标准化行合并进报价目录
// 流程: 校验 → 文件内去重 → 供应商解析 → 变更检测 → 缓冲批量写入
// 事务: 单个文件 = 单个事务；行级错误不回滚，仓储错误整体回滚
// 红线: 未变化的报价不写入（保证重复导入幂等）
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::domain::consolidation::{
    ConsolidationReport, OfferChange, RowOutcome, RowValidationError,
};
use crate::domain::offer::{is_valid_barcode, Offer, RawOfferRow};
use crate::engine::supplier_registry::SupplierRegistry;
use crate::repository::error::RepositoryResult;
use crate::repository::offer_catalog_repo::OfferCatalogRepository;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 校验行必填字段，返回 (supplier_key, barcode)
pub fn validate_row(row: &RawOfferRow) -> Result<(String, String), RowValidationError> {
    let supplier_key = row
        .supplier_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(RowValidationError::MissingSupplier)?;

    let barcode = row
        .barcode
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .ok_or(RowValidationError::MissingBarcode)?;

    if !is_valid_barcode(barcode) {
        return Err(RowValidationError::InvalidBarcode(barcode.to_string()));
    }

    Ok((supplier_key.to_string(), barcode.to_string()))
}

/// 商品名称缺失或与供应商名称相同（源数据常见缺陷）
pub fn is_suspect_product_name(product_name: Option<&str>, supplier_name: &str) -> bool {
    match product_name.map(str::trim).filter(|n| !n.is_empty()) {
        None => true,
        Some(name) => name.to_lowercase() == supplier_name.trim().to_lowercase(),
    }
}

/// 单次合并调用的批次内状态
struct BatchState {
    registry: SupplierRegistry,
    seen: HashSet<(String, String)>,
    buffer: Vec<Offer>,
    suspect_rows: usize,
}

// ==========================================
// OfferConsolidator - 报价合并引擎
// ==========================================
pub struct OfferConsolidator<R>
where
    R: OfferCatalogRepository + ?Sized,
{
    store: Arc<R>,
    config: EngineConfig,
}

impl<R> OfferConsolidator<R>
where
    R: OfferCatalogRepository + ?Sized,
{
    pub fn new(store: Arc<R>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 合并一个文件的全部行
    ///
    /// # 返回
    /// - Ok(ConsolidationReport): 行级错误/重复已计入报告，事务已提交
    /// - Err: 仓储错误，事务已回滚，目录无任何变化
    #[instrument(skip(self, rows), fields(batch_id, total_rows = rows.len()))]
    pub async fn consolidate(&self, rows: &[RawOfferRow]) -> RepositoryResult<ConsolidationReport> {
        let started = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        let mut report = ConsolidationReport::new(batch_id.clone());

        self.store.begin_transaction().await?;

        if let Err(e) = self.consolidate_rows(rows, &mut report).await {
            error!(batch_id = %batch_id, error = %e, "合并失败，回滚事务");
            if let Err(rollback_err) = self.store.rollback_transaction().await {
                error!(error = %rollback_err, "事务回滚失败");
            }
            return Err(e);
        }

        self.store.commit_transaction().await?;

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            batch_id = %batch_id,
            new = report.new_count,
            updated = report.updated_count,
            unchanged = report.unchanged_count,
            skipped = report.skipped_count,
            failed = report.failed_count,
            dropped = report.dropped_count,
            elapsed_ms = report.elapsed_ms,
            "报价合并完成"
        );

        Ok(report)
    }

    async fn consolidate_rows(
        &self,
        rows: &[RawOfferRow],
        report: &mut ConsolidationReport,
    ) -> RepositoryResult<()> {
        let flush_size = self.config.effective_flush_batch_size();
        let mut state = BatchState {
            registry: SupplierRegistry::new(),
            seen: HashSet::new(),
            buffer: Vec::with_capacity(flush_size.min(rows.len())),
            suspect_rows: 0,
        };

        for row in rows {
            let outcome = self.process_row(row, &mut state).await?;

            let failure = match &outcome {
                RowOutcome::Invalid { row_number, error } => Some((*row_number, error.to_string())),
                _ => None,
            };
            let retained = report.record(
                outcome,
                self.config.max_duplicate_examples,
                self.config.max_logged_failures,
            );
            if let (true, Some((row_number, reason))) = (retained, failure) {
                warn!(row_number, reason = %reason, "行级校验失败");
            }

            if state.buffer.len() >= flush_size {
                self.flush(&mut state.buffer, report).await?;
            }
        }

        self.flush(&mut state.buffer, report).await?;

        if state.suspect_rows > 0 {
            warn!(suspect_rows = state.suspect_rows, "存在商品名称缺失或与供应商名称相同的行");
        }
        debug!(
            suppliers = state.registry.len(),
            supplier_lookups = state.registry.store_lookups(),
            supplier_writes = state.registry.store_writes(),
            "供应商缓存统计"
        );

        Ok(())
    }

    /// 处理单行
    async fn process_row(
        &self,
        row: &RawOfferRow,
        state: &mut BatchState,
    ) -> RepositoryResult<RowOutcome> {
        // === 步骤 1: 必填字段与条码格式 ===
        let (supplier_key, barcode) = match validate_row(row) {
            Ok(keys) => keys,
            Err(error) => {
                return Ok(RowOutcome::Invalid {
                    row_number: row.row_number,
                    error,
                })
            }
        };

        // === 步骤 2: 文件内去重 ===
        if !state.seen.insert((supplier_key.clone(), barcode.clone())) {
            let example = format!(
                "行 {}: 供应商 {}, 商品 {}, 条码 {}",
                row.row_number,
                row.supplier_name.as_deref().unwrap_or(&supplier_key),
                row.product_name
                    .as_deref()
                    .unwrap_or(&self.config.unnamed_product_label),
                barcode
            );
            return Ok(RowOutcome::Duplicate(example));
        }

        // === 步骤 3: 供应商解析 ===
        let supplier = state
            .registry
            .resolve(self.store.as_ref(), &supplier_key, row.supplier_name.as_deref())
            .await?;

        if is_suspect_product_name(row.product_name.as_deref(), &supplier.display_name) {
            state.suspect_rows += 1;
            if state.suspect_rows <= self.config.max_logged_failures {
                warn!(
                    row_number = row.row_number,
                    supplier = %supplier.display_name,
                    barcode = %barcode,
                    "商品名称缺失或与供应商名称相同"
                );
            }
        }

        // === 步骤 4: 变更检测 ===
        let change = match self.store.find_offer(&supplier_key, &barcode).await? {
            None => {
                state.buffer.push(Offer::from_row(&supplier_key, &barcode, row));
                OfferChange::New
            }
            Some(mut existing) => {
                if existing.differs_from(row) {
                    existing.apply_row(row);
                    state.buffer.push(existing);
                    OfferChange::Updated
                } else {
                    OfferChange::Unchanged
                }
            }
        };

        Ok(RowOutcome::Applied(change))
    }

    /// 写出缓冲区
    ///
    /// 批量写入遇唯一键冲突时回退为逐条 upsert，逐条失败的报价丢弃并计数
    async fn flush(
        &self,
        buffer: &mut Vec<Offer>,
        report: &mut ConsolidationReport,
    ) -> RepositoryResult<()> {
        if buffer.is_empty() {
            return Ok(());
        }

        let batch = std::mem::take(buffer);
        match self.store.bulk_upsert_offers(&batch).await {
            Ok(written) => {
                debug!(written, "批量写入完成");
                Ok(())
            }
            Err(e) if e.is_write_conflict() => {
                warn!(batch_size = batch.len(), error = %e, "批量写入冲突，回退为逐条 upsert");
                for offer in &batch {
                    if let Err(row_err) = self.store.upsert_offer(offer).await {
                        report.dropped_count += 1;
                        error!(
                            supplier_key = %offer.supplier_key,
                            barcode = %offer.barcode,
                            error = %row_err,
                            "逐条 upsert 失败，丢弃该报价"
                        );
                    }
                }
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
