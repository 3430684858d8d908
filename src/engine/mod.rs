// ==========================================
// 供应商报价引擎 - 引擎层
// ==========================================
// 职责: 报价合并 / 最低成本配货 / 批次内供应商缓存
// 红线: Engine 不拼 SQL, 所有数据访问通过 Repository
// ==========================================

pub mod allocator;
pub mod consolidator;
pub mod supplier_registry;

// 重导出核心引擎
pub use allocator::{plan_for, FulfillmentAllocator};
pub use consolidator::{is_suspect_product_name, validate_row, OfferConsolidator};
pub use supplier_registry::SupplierRegistry;
