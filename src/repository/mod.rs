// ==========================================
// 供应商报价引擎 - 数据仓储层
// ==========================================
// 职责: 提供报价目录数据访问接口,屏蔽数据库细节
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod offer_catalog_repo;
pub mod offer_catalog_repo_impl;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use offer_catalog_repo::OfferCatalogRepository;
pub use offer_catalog_repo_impl::OfferCatalogRepositoryImpl;
