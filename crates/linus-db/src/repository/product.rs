//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - List (ordered by name) and get
//! - Barcode lookup and name/barcode search for the register's scan box
//! - Bulk upsert in one transaction
//! - Delete one / delete all
//!
//! Stock is decremented by [`SaleRepository::commit`](super::sale::SaleRepository::commit),
//! never here.

use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use linus_core::{Money, Product};

/// Column layout of the `products` table.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    name: String,
    price_minor: i64,
    category: String,
    stock: i64,
    barcode: String,
    image: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            price: Money::from_minor(row.price_minor),
            category: row.category,
            stock: row.stock,
            barcode: row.barcode,
            image: row.image,
        }
    }
}

const SELECT_PRODUCT: &str =
    "SELECT id, name, price_minor, category, stock, barcode, image FROM products";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// All products, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} ORDER BY name COLLATE NOCASE, id"))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// First product carrying `barcode`. Barcodes are not unique; ties go to
    /// the lowest id.
    pub async fn find_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "{SELECT_PRODUCT} WHERE barcode = ?1 ORDER BY id LIMIT 1"
        ))
        .bind(barcode.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Products whose name contains `query` (case-insensitive) or whose
    /// barcode starts with it, ordered like [`list`](Self::list).
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Product>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let escaped = query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            r#"{SELECT_PRODUCT}
               WHERE name LIKE ?1 ESCAPE '\' OR barcode LIKE ?2 ESCAPE '\'
               ORDER BY name COLLATE NOCASE, id
               LIMIT ?3"#
        ))
        .bind(format!("%{escaped}%"))
        .bind(format!("{escaped}%"))
        .bind(limit.max(1))
        .fetch_all(&self.pool)
        .await?;

        debug!(query = %query, found = rows.len(), "Product search");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Inserts or replaces products, in payload order, in one transaction.
    ///
    /// Callers validate first; a CHECK failure on any row rolls back all of
    /// them.
    pub async fn upsert_many(&self, products: &[Product]) -> DbResult<usize> {
        debug!(count = products.len(), "Upserting products");

        let mut tx = self.pool.begin().await?;

        for p in products {
            sqlx::query(
                r#"
                INSERT INTO products (id, name, price_minor, category, stock, barcode, image)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    price_minor = excluded.price_minor,
                    category = excluded.category,
                    stock = excluded.stock,
                    barcode = excluded.barcode,
                    image = excluded.image
                "#,
            )
            .bind(&p.id)
            .bind(&p.name)
            .bind(p.price.minor())
            .bind(&p.category)
            .bind(p.stock)
            .bind(&p.barcode)
            .bind(&p.image)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(products.len())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Clears the inventory. Returns the number of products removed.
    pub async fn delete_all(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM products")
            .execute(&self.pool)
            .await?;

        debug!(removed = result.rows_affected(), "Cleared inventory");
        Ok(result.rows_affected())
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use linus_core::{Money, Product};

    fn product(id: &str, name: &str, price_minor: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            price: Money::from_minor(price_minor),
            category: "General".to_string(),
            stock,
            barcode: format!("BC-{id}"),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.upsert_many(&[product("p1", "Tea", 1000, 5), product("p2", "Bread", 300, 2)])
            .await
            .unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);

        repo.upsert_many(&[product("p1", "Green Tea", 1200, 9)])
            .await
            .unwrap();
        let p1 = repo.get("p1").await.unwrap().unwrap();
        assert_eq!(p1.name, "Green Tea");
        assert_eq!(p1.price.minor(), 1200);
        assert_eq!(p1.stock, 9);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.upsert_many(&[product("a", "Zaatar", 100, 1), product("b", "apple", 100, 1)])
            .await
            .unwrap();

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["apple", "Zaatar"]);
    }

    #[tokio::test]
    async fn test_failed_row_rolls_back_whole_batch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let result = repo
            .upsert_many(&[product("p1", "Tea", 1000, 5), product("p2", "Bad", 100, -1)])
            .await;
        assert!(result.is_err());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_by_barcode() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let mut dup = product("p3", "Tea Refill", 900, 5);
        dup.barcode = "BC-p1".to_string();
        repo.upsert_many(&[dup, product("p1", "Tea", 1000, 5), product("p2", "Milk", 500, 5)])
            .await
            .unwrap();

        let found = repo.find_by_barcode(" BC-p2 ").await.unwrap().unwrap();
        assert_eq!(found.id, "p2");
        assert_eq!(repo.find_by_barcode("BC-p1").await.unwrap().unwrap().id, "p1");
        assert!(repo.find_by_barcode("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_matches_name_or_barcode_prefix() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.upsert_many(&[
            product("p1", "Green Tea", 1000, 5),
            product("p2", "Milk", 500, 5),
            product("p3", "100% Juice", 700, 5),
        ])
        .await
        .unwrap();

        let names = |found: Vec<Product>| found.into_iter().map(|p| p.name).collect::<Vec<_>>();
        assert_eq!(names(repo.search("tea", 20).await.unwrap()), vec!["Green Tea"]);
        assert_eq!(names(repo.search("BC-p2", 20).await.unwrap()), vec!["Milk"]);
        assert_eq!(names(repo.search("%", 20).await.unwrap()), vec!["100% Juice"]);
        assert_eq!(repo.search("BC-", 2).await.unwrap().len(), 2);
        assert!(repo.search("  ", 20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_delete_all() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.upsert_many(&[
            product("p1", "Tea", 1000, 5),
            product("p2", "Milk", 500, 5),
            product("p3", "Eggs", 900, 5),
        ])
        .await
        .unwrap();

        repo.delete("p1").await.unwrap();
        assert!(matches!(
            repo.delete("p1").await,
            Err(crate::DbError::NotFound { .. })
        ));
        assert_eq!(repo.delete_all().await.unwrap(), 2);
        assert!(repo.list().await.unwrap().is_empty());
    }
}
