// ==========================================
// 供应商报价引擎 - 最低成本配货引擎
// ==========================================
// 职责: 对每个需求行，从多个供应商中选出总成本最低的采购组合
// 算法: 按单价升序贪心取量（单价相同按供应商键、报价 ID 排序）
// 约束: 一次分析只查询一次仓储；非法需求不访问仓储
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::domain::fulfillment::{FulfillmentPlan, FulfillmentRequest, LineItem, PlanStatus};
use crate::domain::offer::{is_valid_barcode, CatalogOffer};
use crate::repository::error::RepositoryResult;
use crate::repository::offer_catalog_repo::OfferCatalogRepository;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument};

// ==========================================
// FulfillmentAllocator - 配货引擎
// ==========================================
pub struct FulfillmentAllocator<R>
where
    R: OfferCatalogRepository + ?Sized,
{
    store: Arc<R>,
    config: EngineConfig,
}

impl<R> FulfillmentAllocator<R>
where
    R: OfferCatalogRepository + ?Sized,
{
    pub fn new(store: Arc<R>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// 为每个需求行生成配货方案（顺序与输入一致）
    ///
    /// # 说明
    /// - 重复的商品标识各自独立分配，不在需求之间预留库存
    /// - 仓储错误直接返回，需求行错误体现在各自的方案中
    #[instrument(skip(self, requests), fields(requests = requests.len()))]
    pub async fn allocate(
        &self,
        requests: &[FulfillmentRequest],
    ) -> RepositoryResult<Vec<FulfillmentPlan>> {
        let product_ids: Vec<String> = requests
            .iter()
            .filter(|r| validate_request(r).is_ok())
            .map(|r| r.product_id.trim().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let offers = if product_ids.is_empty() {
            Vec::new()
        } else {
            self.store.find_offers_for_product_ids(&product_ids).await?
        };
        debug!(product_ids = product_ids.len(), offers = offers.len(), "目录报价已加载");

        let grouped = group_by_product(offers);

        let multi_supplier = grouped.values().filter(|o| o.len() > 1).count();
        info!(
            requested_products = product_ids.len(),
            found_products = grouped.len(),
            multi_supplier_products = multi_supplier,
            "多供应商商品统计"
        );

        let plans: Vec<FulfillmentPlan> = requests
            .iter()
            .map(|request| {
                let offers = grouped
                    .get(request.product_id.trim())
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                plan_for(request, offers, &self.config)
            })
            .collect();

        let manual = plans.iter().filter(|p| p.requires_manual_processing).count();
        info!(plans = plans.len(), manual, "配货分析完成");

        Ok(plans)
    }
}

/// 需求行前置校验
fn validate_request(request: &FulfillmentRequest) -> Result<(), String> {
    let product_id = request.product_id.trim();
    if product_id.is_empty() {
        return Err("条码缺失".to_string());
    }
    if !is_valid_barcode(product_id) {
        return Err(format!("条码格式无效: {}", product_id));
    }
    if request.quantity <= 0 {
        return Err("需求数量必须大于零".to_string());
    }
    Ok(())
}

/// 按商品标识分组，组内按 (单价, 供应商键, 报价 ID) 升序
fn group_by_product(offers: Vec<CatalogOffer>) -> HashMap<String, Vec<CatalogOffer>> {
    let mut grouped: HashMap<String, Vec<CatalogOffer>> = HashMap::new();
    for offer in offers {
        grouped
            .entry(offer.offer.barcode.clone())
            .or_default()
            .push(offer);
    }
    for group in grouped.values_mut() {
        group.sort_by(compare_offers);
    }
    grouped
}

fn compare_offers(a: &CatalogOffer, b: &CatalogOffer) -> Ordering {
    a.offer
        .price_with_vat
        .total_cmp(&b.offer.price_with_vat)
        .then_with(|| a.offer.supplier_key.cmp(&b.offer.supplier_key))
        .then_with(|| a.offer.offer_id.cmp(&b.offer.offer_id))
}

/// 为单个需求生成方案（纯函数）
///
/// offers 为该商品的全部报价，函数内部会重新排序
pub fn plan_for(
    request: &FulfillmentRequest,
    offers: &[CatalogOffer],
    config: &EngineConfig,
) -> FulfillmentPlan {
    if let Err(reason) = validate_request(request) {
        let message = match request.row_number {
            Some(row_number) => format!("行 {}: {}", row_number, reason),
            None => reason,
        };
        return FulfillmentPlan::manual(request, PlanStatus::InvalidRequest, message);
    }

    if offers.is_empty() {
        return FulfillmentPlan::manual(request, PlanStatus::NotFound, "商品不在目录中".to_string());
    }

    let mut sorted: Vec<&CatalogOffer> = offers.iter().collect();
    sorted.sort_by(|a, b| compare_offers(a, b));

    let (product_name, product_name_suspect) = resolve_product_name(sorted[0], config);

    if sorted.iter().all(|o| o.offer.quantity <= 0) {
        let mut plan = FulfillmentPlan::manual(
            request,
            PlanStatus::NoStock,
            "所有供应商均无可用库存".to_string(),
        );
        plan.product_name = Some(product_name);
        plan.product_name_suspect = product_name_suspect;
        return plan;
    }

    // === 贪心取量 ===
    let mut remaining = request.quantity;
    let mut line_items = Vec::new();
    let mut total_cost = 0.0;
    for catalog_offer in sorted.iter().filter(|o| o.offer.quantity > 0) {
        if remaining == 0 {
            break;
        }
        let taken = remaining.min(catalog_offer.offer.quantity);
        let item = LineItem {
            supplier_key: catalog_offer.offer.supplier_key.clone(),
            supplier_name: catalog_offer.supplier_name.clone(),
            price: catalog_offer.offer.price_with_vat,
            quantity_taken: taken,
            supplier_available_quantity: catalog_offer.offer.quantity,
        };
        total_cost += item.cost();
        remaining -= taken;
        line_items.push(item);
    }

    let taken: i64 = line_items.iter().map(|l| l.quantity_taken).sum();
    let (status, message) = if remaining == 0 {
        let message = if line_items.len() == 1 {
            let item = &line_items[0];
            format!(
                "已从供应商 {} 以单价 {:.2} 采购 {} 件",
                item.supplier_name, item.price, item.quantity_taken
            )
        } else {
            format!("由多个供应商供货: {}", describe_line_items(&line_items))
        };
        (PlanStatus::Fulfilled, message)
    } else {
        (
            PlanStatus::PartiallyFulfilled,
            format!(
                "数量不足。仅可供应 {}/{} 件。已采购: {}。缺口 {} 件",
                taken,
                request.quantity,
                describe_line_items(&line_items),
                remaining
            ),
        )
    };

    FulfillmentPlan {
        row_number: request.row_number,
        product_id: request.product_id.trim().to_string(),
        requested_quantity: request.quantity,
        product_name: Some(product_name),
        product_name_suspect,
        line_items,
        total_cost: Some(total_cost),
        shortfall: remaining,
        status,
        requires_manual_processing: status.requires_manual_processing(),
        message,
    }
}

/// 取最便宜报价的商品名称；缺失或与供应商名相同时使用占位名
fn resolve_product_name(cheapest: &CatalogOffer, config: &EngineConfig) -> (String, bool) {
    match cheapest
        .offer
        .product_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        None => (config.unnamed_product_label.clone(), false),
        Some(name) if name.to_lowercase() == cheapest.supplier_name.trim().to_lowercase() => {
            (config.suspect_product_label.clone(), true)
        }
        Some(name) => (name.to_string(), false),
    }
}

fn describe_line_items(items: &[LineItem]) -> String {
    items
        .iter()
        .map(|i| format!("{} 件来自 {} 单价 {:.2}", i.quantity_taken, i.supplier_name, i.price))
        .collect::<Vec<_>>()
        .join("; ")
}
