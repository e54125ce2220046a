//! # Settings Repository
//!
//! The store-wide settings singleton (row `id = 1`). A store that has never
//! saved settings reads as [`SystemSettings::default`].

use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use linus_core::{Currency, SystemSettings, TaxRate};

#[derive(Debug, FromRow)]
struct SettingsRow {
    store_name: String,
    currency: Currency,
    low_stock_threshold: i64,
    tax_rate_bps: i64,
}

impl From<SettingsRow> for SystemSettings {
    fn from(row: SettingsRow) -> Self {
        SystemSettings {
            store_name: row.store_name,
            currency: row.currency,
            low_stock_threshold: row.low_stock_threshold,
            tax_rate: TaxRate::from_bps(u32::try_from(row.tax_rate_bps).unwrap_or(0)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    pub async fn load(&self) -> DbResult<SystemSettings> {
        let row: Option<SettingsRow> = sqlx::query_as(
            "SELECT store_name, currency, low_stock_threshold, tax_rate_bps FROM settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SystemSettings::from).unwrap_or_default())
    }

    pub async fn save(&self, settings: &SystemSettings) -> DbResult<()> {
        debug!(store = %settings.store_name, "Saving settings");

        sqlx::query(
            r#"
            INSERT INTO settings (id, store_name, currency, low_stock_threshold, tax_rate_bps)
            VALUES (1, ?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                store_name = excluded.store_name,
                currency = excluded.currency,
                low_stock_threshold = excluded.low_stock_threshold,
                tax_rate_bps = excluded.tax_rate_bps
            "#,
        )
        .bind(&settings.store_name)
        .bind(settings.currency)
        .bind(settings.low_stock_threshold)
        .bind(i64::from(settings.tax_rate.bps()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_defaults_then_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.settings();
        assert_eq!(repo.load().await.unwrap(), SystemSettings::default());

        let custom = SystemSettings {
            store_name: "بقالة لينوس".to_string(),
            currency: Currency::Yer,
            low_stock_threshold: 12,
            tax_rate: TaxRate::from_bps(500),
        };
        repo.save(&custom).await.unwrap();
        repo.save(&custom).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), custom);
    }
}
