//! # linus-db: SQLite Store for Linus POS
//!
//! Owns the schema and every SQL statement. Callers get linus-core types
//! back; rows and column names stay inside [`repository`].
//!
//! ```text
//! linus-server handlers / poller
//!        │  db.sales().commit(&sale, StockPolicy::Guarded)
//!        ▼
//! Database (pool.rs) ── SqlitePool, WAL, foreign keys
//!        │
//!        ├── ProductRepository      catalogue, bulk upsert
//!        ├── SaleRepository         atomic commit + stock decrement, ledger
//!        ├── HeldInvoiceRepository  parked carts (JSON items)
//!        ├── UserRepository         credentials, permissions, legacy upgrade
//!        └── SettingsRepository     store-wide settings row
//!        │
//!        ▼
//! linus.db  (migrations/sqlite, embedded)
//! ```
//!
//! ```rust,ignore
//! use linus_db::{Database, DbConfig, StockPolicy};
//!
//! let db = Database::new(DbConfig::new("linus.db")).await?;
//! let products = db.products().list().await?;
//! db.sales().commit(&sale, StockPolicy::Guarded).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::held::HeldInvoiceRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::{SaleRepository, StockPolicy};
pub use repository::settings::SettingsRepository;
pub use repository::user::UserRepository;
