//! # Held Invoice Repository
//!
//! Parked carts. Items are stored as one JSON snapshot per invoice; they are
//! never joined against `products`, so a restored invoice carries the prices
//! and names from hold time.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use linus_core::{CartItem, HeldInvoice};

#[derive(Debug, FromRow)]
struct HeldRow {
    id: String,
    created_at: DateTime<Utc>,
    items: String,
}

impl TryFrom<HeldRow> for HeldInvoice {
    type Error = DbError;

    fn try_from(row: HeldRow) -> DbResult<Self> {
        let items: Vec<CartItem> = serde_json::from_str(&row.items)?;
        Ok(HeldInvoice {
            id: row.id,
            date: row.created_at,
            items,
        })
    }
}

/// Repository for held invoices.
#[derive(Debug, Clone)]
pub struct HeldInvoiceRepository {
    pool: SqlitePool,
}

impl HeldInvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        HeldInvoiceRepository { pool }
    }

    pub async fn insert(&self, invoice: &HeldInvoice) -> DbResult<()> {
        debug!(id = %invoice.id, lines = invoice.items.len(), "Holding invoice");

        let items = serde_json::to_string(&invoice.items)?;
        sqlx::query("INSERT INTO held_invoices (id, created_at, items) VALUES (?1, ?2, ?3)")
            .bind(&invoice.id)
            .bind(invoice.date)
            .bind(items)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// All held invoices, most recent first.
    pub async fn list(&self) -> DbResult<Vec<HeldInvoice>> {
        let rows: Vec<HeldRow> = sqlx::query_as(
            "SELECT id, created_at, items FROM held_invoices ORDER BY created_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(HeldInvoice::try_from).collect()
    }

    /// Deletes and returns an invoice in one transaction.
    pub async fn take(&self, id: &str) -> DbResult<HeldInvoice> {
        let mut tx = self.pool.begin().await?;

        let row: Option<HeldRow> =
            sqlx::query_as("SELECT id, created_at, items FROM held_invoices WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let row = row.ok_or_else(|| DbError::not_found("Held invoice", id))?;

        sqlx::query("DELETE FROM held_invoices WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let invoice = HeldInvoice::try_from(row)?;
        tx.commit().await?;

        debug!(id = %id, "Took held invoice");
        Ok(invoice)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM held_invoices WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Held invoice", id));
        }

        debug!(id = %id, "Discarded held invoice");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Duration;
    use linus_core::{Money, Product};

    fn invoice(id: &str, minutes_ago: i64) -> HeldInvoice {
        let product = Product {
            id: "p1".to_string(),
            name: "شاي".to_string(),
            price: Money::from_minor(350),
            category: String::new(),
            stock: 4,
            barcode: "1".to_string(),
            image: None,
        };
        HeldInvoice {
            id: id.to_string(),
            date: Utc::now() - Duration::minutes(minutes_ago),
            items: vec![CartItem::new(product, 3)],
        }
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.held_invoices();
        repo.insert(&invoice("old", 10)).await.unwrap();
        repo.insert(&invoice("new", 1)).await.unwrap();

        let ids: Vec<_> = repo.list().await.unwrap().into_iter().map(|h| h.id).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_take_returns_snapshot_and_deletes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.held_invoices();
        let original = invoice("h1", 0);
        repo.insert(&original).await.unwrap();

        let taken = repo.take("h1").await.unwrap();
        assert_eq!(taken.items, original.items);
        assert!(repo.list().await.unwrap().is_empty());
        assert!(matches!(repo.take("h1").await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(matches!(
            db.held_invoices().delete("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
