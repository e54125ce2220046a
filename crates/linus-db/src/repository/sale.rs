//! # Sale Repository
//!
//! The append-only sales ledger and the sale commit transaction.
//!
//! ## Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       commit(sale, policy)                              │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │   ├── INSERT sales (header)                                            │
//! │   ├── line 0: INSERT sale_items ─► decrement stock                     │
//! │   ├── line 1: INSERT sale_items ─► decrement stock                     │
//! │   └── ...      (cart order)                                            │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Any failure: the transaction is dropped and rolled back. Readers      │
//! │  never see a header without its lines or a line without its stock     │
//! │  change.                                                               │
//! │                                                                         │
//! │  Guarded: UPDATE ... SET stock = stock - q WHERE id = ? AND stock >= q │
//! │           0 rows ──► StockConflict (or NotFound)                       │
//! │  Clamp:   UPDATE ... SET stock = MAX(stock - q, 0)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite admits one writer at a time, so each commit is serializable with
//! respect to every other commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use linus_core::report::DateRange;
use linus_core::{Currency, Money, PaymentMethod, Sale, SaleLine, SaleStatus};

// =============================================================================
// Stock Policy
// =============================================================================

/// How a commit treats a line that asks for more than is on hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockPolicy {
    /// Atomic check-and-set; insufficient stock aborts the sale.
    #[default]
    Guarded,
    /// Decrement and floor at zero; the sale always goes through.
    Clamp,
}

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, FromRow)]
struct SaleRow {
    id: String,
    date: DateTime<Utc>,
    subtotal_minor: i64,
    tax_minor: i64,
    discount_minor: i64,
    total_minor: i64,
    currency: Currency,
    cashier: String,
    customer_name: Option<String>,
    payment_method: PaymentMethod,
    payment_details: String,
    status: SaleStatus,
}

impl SaleRow {
    fn into_sale(self, items: Vec<SaleLine>) -> Sale {
        Sale {
            id: self.id,
            date: self.date,
            items,
            subtotal: Money::from_minor(self.subtotal_minor),
            tax: Money::from_minor(self.tax_minor),
            discount: Money::from_minor(self.discount_minor),
            total: Money::from_minor(self.total_minor),
            currency: self.currency,
            cashier: self.cashier,
            customer_name: self.customer_name,
            payment_method: self.payment_method,
            payment_details: self.payment_details,
            status: self.status,
        }
    }
}

#[derive(Debug, FromRow)]
struct SaleItemRow {
    sale_id: String,
    product_id: String,
    product_name: String,
    quantity: i64,
    price_minor: i64,
}

impl From<SaleItemRow> for SaleLine {
    fn from(row: SaleItemRow) -> Self {
        SaleLine {
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            price: Money::from_minor(row.price_minor),
        }
    }
}

const SELECT_SALE: &str = r#"
    SELECT id, date, subtotal_minor, tax_minor, discount_minor, total_minor,
           currency, cashier, customer_name, payment_method, payment_details, status
    FROM sales
"#;

const RANGE_FILTER: &str = r#"
    WHERE (?1 IS NULL OR substr(date, 1, 10) >= ?1)
      AND (?2 IS NULL OR substr(date, 1, 10) <= ?2)
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Persists a sale, its lines and the stock decrements atomically.
    ///
    /// ## Errors
    /// - `StockConflict` when a guarded decrement finds too little stock
    /// - `NotFound` when a guarded line names a product that is gone
    /// - `UniqueViolation` when the sale id already exists
    /// - `TransactionFailed` for any other failure inside the transaction
    pub async fn commit(&self, sale: &Sale, policy: StockPolicy) -> DbResult<()> {
        debug!(id = %sale.id, lines = sale.items.len(), ?policy, "Committing sale");

        let mut tx = self.pool.begin().await?;

        if let Err(e) = write_sale(&mut tx, sale, policy).await {
            warn!(id = %sale.id, error = %e, "Sale commit rolled back");
            tx.rollback().await?;
            return Err(match e {
                DbError::StockConflict { .. }
                | DbError::NotFound { .. }
                | DbError::UniqueViolation { .. }
                | DbError::ConnectionFailed(_)
                | DbError::PoolExhausted => e,
                other => DbError::TransactionFailed(other.to_string()),
            });
        }

        tx.commit().await?;
        debug!(id = %sale.id, total = %sale.total, "Sale committed");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Sale>> {
        let row: Option<SaleRow> = sqlx::query_as(&format!("{SELECT_SALE} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: Vec<SaleItemRow> = sqlx::query_as(
            r#"
            SELECT sale_id, product_id, product_name, quantity, price_minor
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(row.into_sale(items.into_iter().map(SaleLine::from).collect())))
    }

    /// Sales whose calendar date falls in `range`, newest first.
    pub async fn list(&self, range: &DateRange) -> DbResult<Vec<Sale>> {
        let from = range.from.map(|d| d.to_string());
        let to = range.to.map(|d| d.to_string());

        let rows: Vec<SaleRow> =
            sqlx::query_as(&format!("{SELECT_SALE} {RANGE_FILTER} ORDER BY date DESC, id"))
                .bind(&from)
                .bind(&to)
                .fetch_all(&self.pool)
                .await?;

        let item_rows: Vec<SaleItemRow> = sqlx::query_as(&format!(
            r#"
            SELECT sale_id, product_id, product_name, quantity, price_minor
            FROM sale_items
            WHERE sale_id IN (SELECT id FROM sales {RANGE_FILTER})
            ORDER BY sale_id, line_no
            "#
        ))
        .bind(&from)
        .bind(&to)
        .fetch_all(&self.pool)
        .await?;

        let mut lines: HashMap<String, Vec<SaleLine>> = HashMap::new();
        for row in item_rows {
            lines.entry(row.sale_id.clone()).or_default().push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = lines.remove(&row.id).unwrap_or_default();
                row.into_sale(items)
            })
            .collect())
    }

    /// Counts stored sales (for diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn write_sale(
    tx: &mut Transaction<'_, Sqlite>,
    sale: &Sale,
    policy: StockPolicy,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, date, subtotal_minor, tax_minor, discount_minor, total_minor,
            currency, cashier, customer_name, payment_method, payment_details, status
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&sale.id)
    .bind(sale.date)
    .bind(sale.subtotal.minor())
    .bind(sale.tax.minor())
    .bind(sale.discount.minor())
    .bind(sale.total.minor())
    .bind(sale.currency)
    .bind(&sale.cashier)
    .bind(&sale.customer_name)
    .bind(sale.payment_method)
    .bind(&sale.payment_details)
    .bind(sale.status)
    .execute(&mut **tx)
    .await?;

    for (line_no, line) in sale.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_items (sale_id, line_no, product_id, product_name, quantity, price_minor)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&sale.id)
        .bind(line_no as i64)
        .bind(&line.product_id)
        .bind(&line.product_name)
        .bind(line.quantity)
        .bind(line.price.minor())
        .execute(&mut **tx)
        .await?;

        decrement_stock(tx, &line.product_id, line.quantity, policy).await?;
    }

    Ok(())
}

async fn decrement_stock(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: &str,
    quantity: i64,
    policy: StockPolicy,
) -> DbResult<()> {
    match policy {
        StockPolicy::Guarded => {
            let result = sqlx::query(
                "UPDATE products SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1",
            )
            .bind(quantity)
            .bind(product_id)
            .execute(&mut **tx)
            .await?;

            if result.rows_affected() == 0 {
                let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = ?1")
                    .bind(product_id)
                    .fetch_optional(&mut **tx)
                    .await?;

                return Err(match exists {
                    Some(_) => DbError::StockConflict {
                        product_id: product_id.to_string(),
                        requested: quantity,
                    },
                    None => DbError::not_found("Product", product_id),
                });
            }
        }
        StockPolicy::Clamp => {
            let result =
                sqlx::query("UPDATE products SET stock = MAX(stock - ?1, 0) WHERE id = ?2")
                    .bind(quantity)
                    .bind(product_id)
                    .execute(&mut **tx)
                    .await?;

            if result.rows_affected() == 0 {
                debug!(product_id = %product_id, "Sold product no longer stocked");
            }
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{NaiveDate, TimeZone};
    use linus_core::cart::{Cart, CartItem};
    use linus_core::checkout::{prepare_sale, TenderDetails};
    use linus_core::{Product, SystemSettings};
    use uuid::Uuid;

    fn product(id: &str, price_minor: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_uppercase(),
            price: Money::from_minor(price_minor),
            category: String::new(),
            stock,
            barcode: id.to_string(),
            image: None,
        }
    }

    async fn setup(products: &[Product]) -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().upsert_many(products).await.unwrap();
        db
    }

    fn sale_of(lines: Vec<(Product, i64)>, method: PaymentMethod) -> Sale {
        let cart = Cart::from_items(lines.into_iter().map(|(p, q)| CartItem::new(p, q)).collect());
        let tender = TenderDetails {
            payment_method: method,
            ..TenderDetails::default()
        };
        prepare_sale(
            &cart,
            &SystemSettings::default(),
            "Admin",
            tender,
            Uuid::new_v4().to_string(),
            Utc::now(),
        )
        .unwrap()
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get(id).await.unwrap().unwrap().stock
    }

    async fn line_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_commit_writes_sale_lines_and_stock() {
        let p1 = product("p1", 1000, 10);
        let p2 = product("p2", 500, 10);
        let db = setup(&[p1.clone(), p2.clone()]).await;

        let sale = sale_of(vec![(p1, 2), (p2, 1)], PaymentMethod::Cash);
        assert_eq!(sale.subtotal.to_string(), "25.00");
        assert_eq!(sale.tax.to_string(), "3.75");
        assert_eq!(sale.total.to_string(), "28.75");

        db.sales().commit(&sale, StockPolicy::Guarded).await.unwrap();

        assert_eq!(stock_of(&db, "p1").await, 8);
        assert_eq!(stock_of(&db, "p2").await, 9);

        let stored = db.sales().get(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SaleStatus::Completed);
        assert_eq!(stored.total.minor(), 2875);
        assert_eq!(stored.items, sale.items);
    }

    #[tokio::test]
    async fn test_credit_sale_is_pending() {
        let p1 = product("p1", 1000, 10);
        let db = setup(&[p1.clone()]).await;

        let sale = sale_of(vec![(p1, 1)], PaymentMethod::Credit);
        db.sales().commit(&sale, StockPolicy::Guarded).await.unwrap();

        let stored = db.sales().get(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SaleStatus::Pending);
        assert_eq!(stored.payment_method, PaymentMethod::Credit);
    }

    #[tokio::test]
    async fn test_failed_line_write_leaves_store_untouched() {
        let p1 = product("p1", 1000, 10);
        let p2 = product("p2", 500, 10);
        let db = setup(&[p1.clone(), p2.clone()]).await;

        let mut sale = sale_of(vec![(p1, 2), (p2, 1)], PaymentMethod::Cash);
        // Second line violates the quantity CHECK after the first line landed
        sale.items[1].quantity = 0;

        let err = db.sales().commit(&sale, StockPolicy::Guarded).await.unwrap_err();
        assert!(matches!(err, DbError::TransactionFailed(_)));

        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert_eq!(line_count(&db).await, 0);
        assert_eq!(stock_of(&db, "p1").await, 10);
        assert_eq!(stock_of(&db, "p2").await, 10);
    }

    #[tokio::test]
    async fn test_guarded_rejects_oversell() {
        let p1 = product("p1", 1000, 1);
        let db = setup(&[p1.clone()]).await;

        let sale = sale_of(vec![(p1, 2)], PaymentMethod::Cash);
        let err = db.sales().commit(&sale, StockPolicy::Guarded).await.unwrap_err();

        assert!(matches!(err, DbError::StockConflict { requested: 2, .. }));
        assert_eq!(stock_of(&db, "p1").await, 1);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_guarded_reports_missing_product() {
        let db = setup(&[]).await;
        let sale = sale_of(vec![(product("ghost", 100, 5), 1)], PaymentMethod::Cash);

        let err = db.sales().commit(&sale, StockPolicy::Guarded).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_clamp_floors_at_zero() {
        let p1 = product("p1", 1000, 1);
        let db = setup(&[p1.clone()]).await;

        let sale = sale_of(vec![(p1, 3)], PaymentMethod::Cash);
        db.sales().commit(&sale, StockPolicy::Clamp).await.unwrap();

        assert_eq!(stock_of(&db, "p1").await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_commits_never_oversell() {
        let p1 = product("p1", 1000, 5);
        let db = setup(&[p1.clone()]).await;

        let a = sale_of(vec![(p1.clone(), 3)], PaymentMethod::Cash);
        let b = sale_of(vec![(p1, 3)], PaymentMethod::Cash);
        let (repo_a, repo_b) = (db.sales(), db.sales());

        let (ra, rb) = tokio::join!(
            repo_a.commit(&a, StockPolicy::Guarded),
            repo_b.commit(&b, StockPolicy::Guarded)
        );

        assert_eq!([ra.is_ok(), rb.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert_eq!(stock_of(&db, "p1").await, 2);
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_filters_by_calendar_date() {
        let p1 = product("p1", 100, 100);
        let db = setup(&[p1.clone()]).await;

        for day in [1, 2, 3] {
            let mut sale = sale_of(vec![(p1.clone(), 1)], PaymentMethod::Cash);
            sale.date = Utc.with_ymd_and_hms(2024, 3, day, 23, 30, 0).unwrap();
            db.sales().commit(&sale, StockPolicy::Guarded).await.unwrap();
        }

        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 2),
            NaiveDate::from_ymd_opt(2024, 3, 3),
        );
        let sales = db.sales().list(&range).await.unwrap();
        assert_eq!(sales.len(), 2);
        assert!(sales[0].date > sales[1].date);
        assert_eq!(sales[0].items.len(), 1);

        assert_eq!(db.sales().list(&DateRange::default()).await.unwrap().len(), 3);
    }
}
