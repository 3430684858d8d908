// ==========================================
// 供应商报价引擎 - 供应商注册缓存
// ==========================================
// 职责: 批次内缓存 supplier_key → Supplier，避免重复访问仓储
// 作用域: 单次导入调用创建并持有，调用结束即丢弃（不跨批次共享）
// 红线: 每个不同供应商在一个批次内至多写入一次
// ==========================================

use crate::domain::supplier::Supplier;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::offer_catalog_repo::OfferCatalogRepository;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SupplierRegistry {
    cache: HashMap<String, Supplier>,
    store_lookups: usize,
    store_writes: usize,
}

impl SupplierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析供应商（缓存 → 仓储 → 新建）
    ///
    /// # 参数
    /// - store: 报价目录仓储
    /// - supplier_key: 供应商键
    /// - display_name: 本行携带的显示名称（可能为空）
    ///
    /// # 说明
    /// - 缓存命中时不访问仓储，也不刷新名称
    /// - 仓储中已存在且名称变化时刷新名称并写回
    pub async fn resolve<R>(
        &mut self,
        store: &R,
        supplier_key: &str,
        display_name: Option<&str>,
    ) -> RepositoryResult<&Supplier>
    where
        R: OfferCatalogRepository + ?Sized,
    {
        if !self.cache.contains_key(supplier_key) {
            let supplier = self.load_or_create(store, supplier_key, display_name).await?;
            self.cache.insert(supplier_key.to_string(), supplier);
        }

        self.cache.get(supplier_key).ok_or_else(|| {
            RepositoryError::InternalError(format!("供应商缓存缺失: {}", supplier_key))
        })
    }

    async fn load_or_create<R>(
        &mut self,
        store: &R,
        supplier_key: &str,
        display_name: Option<&str>,
    ) -> RepositoryResult<Supplier>
    where
        R: OfferCatalogRepository + ?Sized,
    {
        self.store_lookups += 1;

        match store.find_supplier(supplier_key).await? {
            Some(mut supplier) => {
                let renamed = display_name
                    .map(|name| supplier.refresh_display_name(name))
                    .unwrap_or(false);
                if renamed {
                    debug!(supplier_key, display_name = %supplier.display_name, "刷新供应商名称");
                    store.save_supplier(&supplier).await?;
                    self.store_writes += 1;
                }
                Ok(supplier)
            }
            None => {
                let name = display_name
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .unwrap_or(supplier_key);
                let supplier = Supplier::new(supplier_key.to_string(), name.to_string());
                debug!(supplier_key, display_name = %supplier.display_name, "新建供应商");
                store.save_supplier(&supplier).await?;
                self.store_writes += 1;
                Ok(supplier)
            }
        }
    }

    /// 已缓存的供应商数
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// 仓储查询次数
    pub fn store_lookups(&self) -> usize {
        self.store_lookups
    }

    /// 仓储写入次数
    pub fn store_writes(&self) -> usize {
        self.store_writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::OfferCatalogRepositoryImpl;
    use tempfile::NamedTempFile;

    fn setup() -> (NamedTempFile, OfferCatalogRepositoryImpl) {
        let temp_file = NamedTempFile::new().unwrap();
        let repo = OfferCatalogRepositoryImpl::new(temp_file.path().to_str().unwrap()).unwrap();
        (temp_file, repo)
    }

    #[tokio::test]
    async fn test_one_lookup_and_write_per_supplier() {
        let (_tmp, repo) = setup();
        let mut registry = SupplierRegistry::new();

        for _ in 0..5 {
            let supplier = registry.resolve(&repo, "alpha", Some("Alpha")).await.unwrap();
            assert_eq!(supplier.display_name, "Alpha");
        }
        registry.resolve(&repo, "beta", None).await.unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.store_lookups(), 2);
        assert_eq!(registry.store_writes(), 2);
        assert_eq!(repo.count_suppliers().await.unwrap(), 2);

        // 无显示名称时回退为供应商键
        let beta = repo.find_supplier("beta").await.unwrap().unwrap();
        assert_eq!(beta.display_name, "beta");
    }

    #[tokio::test]
    async fn test_existing_supplier_written_only_on_rename() {
        let (_tmp, repo) = setup();
        repo.save_supplier(&Supplier::new("alpha".to_string(), "Alpha".to_string()))
            .await
            .unwrap();

        let mut registry = SupplierRegistry::new();
        registry.resolve(&repo, "alpha", Some("Alpha")).await.unwrap();
        assert_eq!(registry.store_writes(), 0);

        let mut next_batch = SupplierRegistry::new();
        let supplier = next_batch
            .resolve(&repo, "alpha", Some("Alpha Trade"))
            .await
            .unwrap();
        assert_eq!(supplier.display_name, "Alpha Trade");
        assert_eq!(next_batch.store_writes(), 1);

        let stored = repo.find_supplier("alpha").await.unwrap().unwrap();
        assert_eq!(stored.display_name, "Alpha Trade");
    }
}
