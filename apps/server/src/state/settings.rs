//! # Settings Context
//!
//! The store-wide [`SystemSettings`], loaded once at startup and held in
//! memory. Every mutation goes through [`SettingsContext::replace`], which
//! validates, persists, then swaps the in-memory copy and raises the change
//! signal.
//!
//! ```text
//! startup ──► SettingsRepository::load() ──► SettingsContext
//!                                                 │
//!   GET /api/settings ◄── current() ◄─────────────┤
//!   checkout / reports ◄── current() ◄────────────┤
//!                                                 │
//!   PUT /api/settings ──► replace() ── validate ── save ── swap ── notify
//! ```

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use linus_core::validation::validate_settings;
use linus_core::SystemSettings;
use linus_db::{Database, DbResult};

use crate::error::ApiResult;
use crate::state::ChangeSignal;

#[derive(Debug, Clone)]
pub struct SettingsContext {
    current: Arc<RwLock<SystemSettings>>,
    db: Database,
    signal: ChangeSignal,
}

impl SettingsContext {
    /// Loads the persisted settings (defaults when none were saved).
    pub async fn load(db: Database, signal: ChangeSignal) -> DbResult<Self> {
        let settings = db.settings().load().await?;
        info!(
            store = %settings.store_name,
            currency = %settings.currency,
            threshold = settings.low_stock_threshold,
            tax = %settings.tax_rate.percent_label(),
            "Settings loaded"
        );

        Ok(SettingsContext {
            current: Arc::new(RwLock::new(settings)),
            db,
            signal,
        })
    }

    /// A snapshot of the settings in force.
    pub async fn current(&self) -> SystemSettings {
        self.current.read().await.clone()
    }

    /// Validates and persists new settings. The in-memory copy changes only
    /// after the write succeeds.
    pub async fn replace(&self, settings: SystemSettings) -> ApiResult<SystemSettings> {
        validate_settings(&settings)?;

        let mut current = self.current.write().await;
        self.db.settings().save(&settings).await?;
        *current = settings.clone();
        drop(current);

        info!(store = %settings.store_name, "Settings updated");
        self.signal.notify("settings");
        Ok(settings)
    }
}
