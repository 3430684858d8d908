// ==========================================
// 供应商报价引擎 - 报价目录 Repository 实现
// ==========================================
// 职责: 实现报价目录数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 并发: 每个导入任务持有独立连接，写锁由 SQLite 串行化
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::offer::{CatalogOffer, Offer};
use crate::domain::supplier::Supplier;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::offer_catalog_repo::OfferCatalogRepository;
use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

/// IN 查询单次绑定参数上限
const IN_CLAUSE_CHUNK: usize = 500;

const OFFER_COLUMNS: &str = "o.offer_id, o.supplier_key, o.barcode, o.external_code, \
     o.product_name, o.price_with_vat, o.quantity, o.created_at, o.updated_at";

fn map_offer(row: &Row) -> rusqlite::Result<Offer> {
    Ok(Offer {
        offer_id: row.get(0)?,
        supplier_key: row.get(1)?,
        barcode: row.get(2)?,
        external_code: row.get(3)?,
        product_name: row.get(4)?,
        price_with_vat: row.get(5)?,
        quantity: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

// ==========================================
// OfferCatalogRepositoryImpl
// ==========================================
pub struct OfferCatalogRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl OfferCatalogRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（连接需已完成 schema 初始化）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 逐条写入（INSERT 新报价 / UPDATE 已有报价）
    fn write_offers(conn: &Connection, offers: &[Offer]) -> RepositoryResult<usize> {
        let mut insert_stmt = conn.prepare_cached(
            r#"
            INSERT INTO supplier_offer (
                supplier_key, barcode, external_code, product_name,
                price_with_vat, quantity, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )?;
        let mut update_stmt = conn.prepare_cached(
            r#"
            UPDATE supplier_offer SET
                external_code = ?2,
                product_name = ?3,
                price_with_vat = ?4,
                quantity = ?5,
                updated_at = ?6
            WHERE offer_id = ?1
            "#,
        )?;

        let mut count = 0;
        for offer in offers {
            match offer.offer_id {
                None => {
                    insert_stmt.execute(params![
                        offer.supplier_key,
                        offer.barcode,
                        offer.external_code,
                        offer.product_name,
                        offer.price_with_vat,
                        offer.quantity,
                        offer.created_at,
                        offer.updated_at,
                    ])?;
                }
                Some(offer_id) => {
                    let affected = update_stmt.execute(params![
                        offer_id,
                        offer.external_code,
                        offer.product_name,
                        offer.price_with_vat,
                        offer.quantity,
                        offer.updated_at,
                    ])?;
                    if affected == 0 {
                        return Err(RepositoryError::NotFound {
                            entity: "supplier_offer".to_string(),
                            id: offer_id.to_string(),
                        });
                    }
                }
            }
            count += 1;
        }

        Ok(count)
    }
}

#[async_trait]
impl OfferCatalogRepository for OfferCatalogRepositoryImpl {
    async fn begin_transaction(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
    }

    async fn commit_transaction(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch("COMMIT")
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
    }

    async fn rollback_transaction(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        // 事务已被 SQLite 自动回滚时不再重复 ROLLBACK
        if conn.is_autocommit() {
            return Ok(());
        }
        conn.execute_batch("ROLLBACK")
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
    }

    async fn find_supplier(&self, supplier_key: &str) -> RepositoryResult<Option<Supplier>> {
        let conn = self.get_conn()?;
        let supplier = conn
            .query_row(
                "SELECT supplier_key, display_name, created_at, updated_at
                 FROM supplier WHERE supplier_key = ?1",
                params![supplier_key],
                |row| {
                    Ok(Supplier {
                        supplier_key: row.get(0)?,
                        display_name: row.get(1)?,
                        created_at: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(supplier)
    }

    async fn save_supplier(&self, supplier: &Supplier) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO supplier (supplier_key, display_name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(supplier_key) DO UPDATE SET
                display_name = excluded.display_name,
                updated_at = excluded.updated_at
            "#,
            params![
                supplier.supplier_key,
                supplier.display_name,
                supplier.created_at,
                supplier.updated_at,
            ],
        )?;
        Ok(())
    }

    async fn find_offer(
        &self,
        supplier_key: &str,
        barcode: &str,
    ) -> RepositoryResult<Option<Offer>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM supplier_offer o WHERE o.supplier_key = ?1 AND o.barcode = ?2",
            OFFER_COLUMNS
        );
        let offer = conn
            .query_row(&sql, params![supplier_key, barcode], map_offer)
            .optional()?;
        Ok(offer)
    }

    async fn exists_offer(&self, supplier_key: &str, barcode: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let exists = conn
            .query_row(
                "SELECT 1 FROM supplier_offer WHERE supplier_key = ?1 AND barcode = ?2 LIMIT 1",
                params![supplier_key, barcode],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(exists)
    }

    async fn bulk_upsert_offers(&self, offers: &[Offer]) -> RepositoryResult<usize> {
        if offers.is_empty() {
            return Ok(0);
        }

        let conn = self.get_conn()?;
        conn.execute_batch("SAVEPOINT bulk_upsert_offers")?;

        match Self::write_offers(&conn, offers) {
            Ok(count) => {
                conn.execute_batch("RELEASE SAVEPOINT bulk_upsert_offers")?;
                Ok(count)
            }
            Err(e) => {
                // 撤销本批次的部分写入，外层事务保持打开
                conn.execute_batch(
                    "ROLLBACK TO SAVEPOINT bulk_upsert_offers; RELEASE SAVEPOINT bulk_upsert_offers",
                )?;
                Err(e)
            }
        }
    }

    async fn upsert_offer(&self, offer: &Offer) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO supplier_offer (
                supplier_key, barcode, external_code, product_name,
                price_with_vat, quantity, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(supplier_key, barcode) DO UPDATE SET
                external_code = excluded.external_code,
                product_name = excluded.product_name,
                price_with_vat = excluded.price_with_vat,
                quantity = excluded.quantity,
                updated_at = excluded.updated_at
            "#,
            params![
                offer.supplier_key,
                offer.barcode,
                offer.external_code,
                offer.product_name,
                offer.price_with_vat,
                offer.quantity,
                offer.created_at,
                offer.updated_at,
            ],
        )?;
        Ok(())
    }

    async fn find_offers_for_product_ids(
        &self,
        product_ids: &[String],
    ) -> RepositoryResult<Vec<CatalogOffer>> {
        let conn = self.get_conn()?;
        let mut offers = Vec::new();

        for chunk in product_ids.chunks(IN_CLAUSE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                r#"
                SELECT {}, s.display_name
                FROM supplier_offer o
                JOIN supplier s ON s.supplier_key = o.supplier_key
                WHERE o.barcode IN ({})
                ORDER BY o.barcode, o.price_with_vat ASC, o.supplier_key ASC, o.offer_id ASC
                "#,
                OFFER_COLUMNS, placeholders
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                Ok(CatalogOffer {
                    offer: map_offer(row)?,
                    supplier_name: row.get(9)?,
                })
            })?;

            for row in rows {
                offers.push(row?);
            }
        }

        Ok(offers)
    }

    async fn count_offers(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM supplier_offer", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn count_suppliers(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM supplier", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
