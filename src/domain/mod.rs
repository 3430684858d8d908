// ==========================================
// 供应商报价引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、结果结构
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod consolidation;
pub mod fulfillment;
pub mod offer;
pub mod supplier;

// 重导出核心类型
pub use consolidation::{ConsolidationReport, OfferChange, RowOutcome, RowValidationError};
pub use fulfillment::{FulfillmentPlan, FulfillmentRequest, LineItem, PlanStatus};
pub use offer::{is_valid_barcode, CatalogOffer, Offer, RawOfferRow, BARCODE_PATTERN};
pub use supplier::{normalize_supplier_name, Supplier, SupplierKeyRule};
