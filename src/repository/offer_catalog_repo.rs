// ==========================================
// 供应商报价引擎 - 报价目录 Repository Trait
// ==========================================
// 职责: 定义报价目录数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::offer::{CatalogOffer, Offer};
use crate::domain::supplier::Supplier;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// OfferCatalogRepository Trait
// ==========================================
// 用途: 报价目录读写（导入写路径 + 分析读路径）
// 实现者: OfferCatalogRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait OfferCatalogRepository: Send + Sync {
    // ===== 事务控制 =====

    /// 开启导入事务（单个文件 = 单个逻辑事务）
    async fn begin_transaction(&self) -> RepositoryResult<()>;

    /// 提交导入事务
    async fn commit_transaction(&self) -> RepositoryResult<()>;

    /// 回滚导入事务（此前所有写入均不生效）
    async fn rollback_transaction(&self) -> RepositoryResult<()>;

    // ===== 供应商 =====

    /// 按供应商键查询
    async fn find_supplier(&self, supplier_key: &str) -> RepositoryResult<Option<Supplier>>;

    /// 保存供应商（存在则刷新显示名称）
    async fn save_supplier(&self, supplier: &Supplier) -> RepositoryResult<()>;

    // ===== 报价写路径 =====

    /// 按 (supplier_key, barcode) 点查当前报价
    async fn find_offer(
        &self,
        supplier_key: &str,
        barcode: &str,
    ) -> RepositoryResult<Option<Offer>>;

    /// 检查报价是否存在
    async fn exists_offer(&self, supplier_key: &str, barcode: &str) -> RepositoryResult<bool>;

    /// 批量写入报价
    ///
    /// # 语义
    /// - offer_id 为 None: INSERT
    /// - offer_id 为 Some: UPDATE
    ///
    /// # 返回
    /// - Ok(usize): 写入条数
    /// - Err(WriteConflict): 唯一键冲突，本批次无任何写入生效
    async fn bulk_upsert_offers(&self, offers: &[Offer]) -> RepositoryResult<usize>;

    /// 单条原子 upsert（插入；唯一键冲突时更新）
    async fn upsert_offer(&self, offer: &Offer) -> RepositoryResult<()>;

    // ===== 报价读路径 =====

    /// 一次性查询多个商品标识的全部报价
    ///
    /// # 返回
    /// - 按 barcode, 价格升序, 供应商键升序排列
    async fn find_offers_for_product_ids(
        &self,
        product_ids: &[String],
    ) -> RepositoryResult<Vec<CatalogOffer>>;

    /// 统计报价总数
    async fn count_offers(&self) -> RepositoryResult<usize>;

    /// 统计供应商总数
    async fn count_suppliers(&self) -> RepositoryResult<usize>;
}
