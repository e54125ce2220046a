//! # Application State
//!
//! Shared state handed to every handler through axum's `State`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          AppState (Clone)                               │
//! │                                                                         │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐ ┌──────────────┐   │
//! │  │  Database    │ │ SessionStore │ │  Settings    │ │ LowStock     │   │
//! │  │  (pool)      │ │ token ─►     │ │  Context     │ │ Board        │   │
//! │  │              │ │  user, cart, │ │ (RwLock,     │ │ (watch)      │   │
//! │  │              │ │  guard       │ │  persisted)  │ │              │   │
//! │  └──────────────┘ └──────────────┘ └──────────────┘ └──────────────┘   │
//! │                                                                         │
//! │  ChangeSignal ─── raised by writers, awaited by the poller             │
//! │  StockPolicy  ─── from [inventory] config                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod notifications;
pub mod session;
pub mod settings;
pub mod signal;

pub use notifications::LowStockBoard;
pub use session::{CurrentSession, Session, SessionStore};
pub use settings::SettingsContext;
pub use signal::ChangeSignal;

use linus_db::{Database, DbResult, StockPolicy};

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionStore,
    pub settings: SettingsContext,
    pub signal: ChangeSignal,
    pub low_stock: LowStockBoard,
    pub stock_policy: StockPolicy,
}

impl AppState {
    /// Builds the state over an open database, loading settings.
    pub async fn new(db: Database, stock_policy: StockPolicy) -> DbResult<Self> {
        let signal = ChangeSignal::new();
        let settings = SettingsContext::load(db.clone(), signal.clone()).await?;

        Ok(AppState {
            db,
            sessions: SessionStore::new(),
            settings,
            signal,
            low_stock: LowStockBoard::new(),
            stock_policy,
        })
    }
}
