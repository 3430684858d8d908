// ==========================================
// 导入/分析 API 端到端测试
// ==========================================
// 场景: CSV 报价导入 → 重复导入幂等 → 需求分析
// ==========================================


use supplier_offer_engine::api::{AnalysisApi, ConfigApi, ImportApi};
use supplier_offer_engine::domain::PlanStatus;
use supplier_offer_engine::repository::OfferCatalogRepository;
use test_helpers::write_csv;

#[tokio::test]
async fn test_import_then_analyze_end_to_end() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let import_api = ImportApi::new(db_path.clone());

    let offers = write_csv(&[
        "供应商;条码;商品名称;单价;数量",
        "Alpha Trade;4600000000017;Milk 1L;10,00;5",
        "  alpha   TRADE ;4600000000017;Milk 1L;9,50;5",
        "Beta;4600000000017;Milk 1L;8;3",
        "Beta;4600000000024;Beta;4,5;10",
        "Beta;12AB;Broken;1;1",
        "",
    ]);
    let path = offers.path().to_str().unwrap().to_string();

    let first = import_api.import_offers(&path).await.unwrap();
    assert!(first.success, "{}", first.message);
    assert!(first.batch_id.is_some());
    assert_eq!(first.counts.total_rows, 5);
    assert_eq!(first.counts.new, 3);
    assert_eq!(first.counts.skipped, 1);
    assert_eq!(first.counts.failed, 1);
    assert_eq!(first.failure_messages, vec!["行 6: 条码格式无效: 12AB".to_string()]);
    assert_eq!(first.duplicate_examples.len(), 1);
    assert!(first.duplicate_examples[0].starts_with("行 3: "));

    let snapshot = test_helpers::snapshot_offers(&db_path);
    let second = import_api.import_offers(&path).await.unwrap();
    assert!(second.success);
    assert_eq!(second.counts.new, 0);
    assert_eq!(second.counts.updated, 0);
    assert_eq!(second.counts.unchanged, 3);
    assert_eq!(test_helpers::snapshot_offers(&db_path), snapshot);

    let wanted = write_csv(&[
        "条码,数量",
        "4600000000017,6",
        "4600000000024,2",
        "abc,1",
        "4600000000017,0",
    ]);
    let analysis = AnalysisApi::new(db_path.clone())
        .analyze_file(wanted.path().to_str().unwrap())
        .await
        .unwrap();

    assert_eq!(analysis.total_requests, 4);
    assert_eq!(analysis.fulfilled, 2);
    assert_eq!(analysis.requires_manual_processing, 2);
    assert_eq!(analysis.plans[0].total_cost, Some(54.0));
    // 商品名与供应商名相同时使用占位名
    assert_eq!(analysis.plans[1].product_name.as_deref(), Some("名称待核实"));
    assert!(analysis.plans[1].product_name_suspect);
    assert_eq!(analysis.plans[2].status, PlanStatus::InvalidRequest);
    assert_eq!(analysis.plans[3].status, PlanStatus::InvalidRequest);
    // 非法需求可追溯到需求文件行号
    assert_eq!(analysis.plans[2].row_number, Some(4));
    assert_eq!(analysis.plans[2].message, "行 4: 条码格式无效: abc");
    assert_eq!(analysis.plans[3].message, "行 5: 需求数量必须大于零");
    assert_eq!(analysis.plans[0].row_number, Some(2));
    assert_eq!(analysis.total_cost, 54.0 + 9.0);
}

#[tokio::test]
async fn test_business_code_rule_from_config() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    ConfigApi::new(&db_path)
        .unwrap()
        .update_config("supplier_key_rule", "BUSINESS_CODE")
        .unwrap();

    let offers = write_csv(&[
        "供应商编码,供应商,条码,单价,数量",
        "100234,Alpha,4600000000017,10,5",
        "100234,Alpha Trade LLC,4600000000024,4,5",
        "100999,Alpha,4600000000017,9,5",
        ",Gamma,4600000000017,1,1",
    ]);
    let response = ImportApi::new(db_path.clone())
        .import_offers(offers.path().to_str().unwrap())
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.counts.new, 3);
    assert_eq!(response.counts.failed, 1);
    assert_eq!(response.failure_messages, vec!["行 5: 未填写供应商".to_string()]);

    let repo = test_helpers::create_test_repo(&db_path);
    assert_eq!(repo.count_suppliers().await.unwrap(), 2);
    // 批次内以首次出现的名称为准
    let supplier = repo.find_supplier("100234").await.unwrap().unwrap();
    assert_eq!(supplier.display_name, "Alpha");

    // 后续导入携带新名称时刷新，报价不受影响
    let renamed = write_csv(&[
        "供应商编码,供应商,条码,单价,数量",
        "100234,Alpha Trade LLC,4600000000017,10,5",
    ]);
    let response = ImportApi::new(db_path.clone())
        .import_offers(renamed.path().to_str().unwrap())
        .await
        .unwrap();
    assert_eq!(response.counts.unchanged, 1);

    let supplier = repo.find_supplier("100234").await.unwrap().unwrap();
    assert_eq!(supplier.display_name, "Alpha Trade LLC");
    assert_eq!(repo.count_suppliers().await.unwrap(), 2);
}

#[tokio::test]
async fn test_missing_columns_reported_without_writes() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let offers = write_csv(&["供应商,单价,数量", "Alpha,10,5"]);

    let response = ImportApi::new(db_path.clone())
        .import_offers(offers.path().to_str().unwrap())
        .await
        .unwrap();

    assert!(!response.success);
    assert!(response.batch_id.is_none());
    assert!(response.message.contains("缺少必需列: 条码"));
    assert_eq!(test_helpers::create_test_repo(&db_path).count_offers().await.unwrap(), 0);
}

#[tokio::test]
async fn test_import_many_isolates_files() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let good_a = write_csv(&["supplier,barcode,price,qty", "Alpha,4600000000017,10,5"]);
    let good_b = write_csv(&["supplier,barcode,price,qty", "Beta,4600000000017,8,3"]);
    let paths = vec![
        good_a.path().to_str().unwrap().to_string(),
        "/nonexistent/offers.csv".to_string(),
        good_b.path().to_str().unwrap().to_string(),
    ];

    let results = ImportApi::new(db_path.clone()).import_many(&paths).await;

    assert_eq!(results.len(), 3);
    let responses: Vec<_> = results.into_iter().map(|r| r.unwrap()).collect();
    assert!(responses[0].success);
    assert!(!responses[1].success);
    assert!(responses[2].success);
    assert_eq!(responses[1].file_path, "/nonexistent/offers.csv");
    assert_eq!(test_helpers::create_test_repo(&db_path).count_offers().await.unwrap(), 2);
}
