// ==========================================
// 最低成本配货集成测试
// ==========================================
// 测试目标: 贪心取量 / 缺口 / 单次目录读取 / 非法需求不访问仓储
// ==========================================


use std::sync::Arc;
use supplier_offer_engine::config::EngineConfig;
use supplier_offer_engine::domain::{FulfillmentRequest, PlanStatus};
use supplier_offer_engine::engine::{FulfillmentAllocator, OfferConsolidator};
use test_helpers::{offer_row, InstrumentedStore};

const MILK: &str = "4600000000017";
const KEFIR: &str = "4600000000024";
const EMPTY_SHELF: &str = "4600000000031";

/// 目录: MILK 由 S1(10.00 x5) 与 S2(8.00 x3) 供货；KEFIR 仅 S1；EMPTY_SHELF 无库存
async fn seed_catalog(db_path: &str) -> Arc<InstrumentedStore> {
    let store = Arc::new(InstrumentedStore::new(db_path));
    OfferConsolidator::new(store.clone(), EngineConfig::default())
        .consolidate(&[
            offer_row(2, "S1", MILK, Some("Milk 1L"), Some(10.0), Some(5)),
            offer_row(3, "S2", MILK, Some("Milk 1L"), Some(8.0), Some(3)),
            offer_row(4, "S1", KEFIR, Some("Kefir"), Some(4.5), Some(12)),
            offer_row(5, "S2", EMPTY_SHELF, Some("Yogurt"), Some(2.0), Some(0)),
        ])
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn test_cheapest_supplier_taken_first() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let store = seed_catalog(&db_path).await;
    let allocator = FulfillmentAllocator::new(store, EngineConfig::default());

    let plans = allocator
        .allocate(&[FulfillmentRequest::new(MILK, 6)])
        .await
        .unwrap();
    let plan = &plans[0];

    assert_eq!(plan.status, PlanStatus::Fulfilled);
    assert!(!plan.requires_manual_processing);
    assert_eq!(plan.total_cost, Some(54.0));
    assert_eq!(plan.line_items.len(), 2);
    assert_eq!(plan.line_items[0].supplier_name, "S2");
    assert_eq!(plan.line_items[0].quantity_taken, 3);
    assert_eq!(plan.line_items[1].supplier_name, "S1");
    assert_eq!(plan.line_items[1].quantity_taken, 3);
    assert_eq!(plan.product_name.as_deref(), Some("Milk 1L"));
    assert!(plan.message.starts_with("由多个供应商供货"));
}

#[tokio::test]
async fn test_shortfall_reported_when_stock_insufficient() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let store = seed_catalog(&db_path).await;
    let allocator = FulfillmentAllocator::new(store, EngineConfig::default());

    let plans = allocator
        .allocate(&[FulfillmentRequest::new(MILK, 20)])
        .await
        .unwrap();
    let plan = &plans[0];

    assert_eq!(plan.status, PlanStatus::PartiallyFulfilled);
    assert!(plan.requires_manual_processing);
    assert_eq!(plan.total_cost, Some(74.0));
    assert_eq!(plan.taken_quantity(), 8);
    assert_eq!(plan.shortfall, 12);
    assert!(plan.message.contains("仅可供应 8/20 件"));
    assert!(plan.message.contains("缺口 12 件"));
}

#[tokio::test]
async fn test_single_catalog_read_per_analysis() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let store = seed_catalog(&db_path).await;
    let allocator = FulfillmentAllocator::new(store.clone(), EngineConfig::default());

    let requests = vec![
        FulfillmentRequest::new(MILK, 2),
        FulfillmentRequest::new(KEFIR, 1),
        FulfillmentRequest::new("abc", 1),
        FulfillmentRequest::new("9999999999999", 1),
        FulfillmentRequest::new(EMPTY_SHELF, 1),
        FulfillmentRequest::new(MILK, 0),
        FulfillmentRequest::new(MILK, 3),
    ];
    let plans = allocator.allocate(&requests).await.unwrap();

    assert_eq!(InstrumentedStore::count(&store.catalog_reads), 1);
    assert_eq!(plans.len(), requests.len());

    let statuses: Vec<PlanStatus> = plans.iter().map(|p| p.status).collect();
    assert_eq!(
        statuses,
        vec![
            PlanStatus::Fulfilled,
            PlanStatus::Fulfilled,
            PlanStatus::InvalidRequest,
            PlanStatus::NotFound,
            PlanStatus::NoStock,
            PlanStatus::InvalidRequest,
            PlanStatus::Fulfilled,
        ]
    );

    // 重复商品各自独立分配，不互相预留库存
    assert_eq!(plans[0].total_cost, Some(16.0));
    assert_eq!(plans[6].total_cost, Some(24.0));

    assert_eq!(plans[3].total_cost, None);
    assert_eq!(plans[3].message, "商品不在目录中");
    assert_eq!(plans[4].product_name.as_deref(), Some("Yogurt"));
    assert_eq!(plans[4].message, "所有供应商均无可用库存");
}

#[tokio::test]
async fn test_invalid_requests_never_touch_store() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let store = seed_catalog(&db_path).await;
    let allocator = FulfillmentAllocator::new(store.clone(), EngineConfig::default());

    let plans = allocator
        .allocate(&[FulfillmentRequest::new("abc", 5), FulfillmentRequest::new("", 1)])
        .await
        .unwrap();

    assert_eq!(InstrumentedStore::count(&store.catalog_reads), 0);
    assert!(plans.iter().all(|p| p.status == PlanStatus::InvalidRequest));
    assert_eq!(plans[0].message, "条码格式无效: abc");
    assert_eq!(plans[1].message, "条码缺失");
}

#[tokio::test]
async fn test_allocation_is_deterministic() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let store = Arc::new(InstrumentedStore::new(&db_path));
    // 同价供应商按供应商键排序
    OfferConsolidator::new(store.clone(), EngineConfig::default())
        .consolidate(&[
            offer_row(2, "Zeta", MILK, Some("Milk 1L"), Some(5.0), Some(4)),
            offer_row(3, "Alpha", MILK, Some("Milk 1L"), Some(5.0), Some(4)),
            offer_row(4, "Mid", MILK, Some("Milk 1L"), Some(5.0), Some(4)),
        ])
        .await
        .unwrap();
    let allocator = FulfillmentAllocator::new(store, EngineConfig::default());

    let request = [FulfillmentRequest::new(MILK, 6)];
    let first = allocator.allocate(&request).await.unwrap();
    for _ in 0..5 {
        assert_eq!(allocator.allocate(&request).await.unwrap(), first);
    }

    let suppliers: Vec<&str> = first[0]
        .line_items
        .iter()
        .map(|l| l.supplier_key.as_str())
        .collect();
    assert_eq!(suppliers, vec!["alpha", "mid"]);
    assert_eq!(first[0].total_cost, Some(30.0));
}
