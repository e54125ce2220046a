//! # linus-core: Pure Business Logic for Linus POS
//!
//! Cart math, sale preparation, held invoices, low-stock rules, permissions
//! and report formatting. No I/O lives here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Linus POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Browser client (SPA)                         │   │
//! │  │    POS screen ──► Inventory ──► Reports ──► Users ──► Settings  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    linus-server (axum)                          │   │
//! │  │    sessions, settings context, low-stock poller                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ linus-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌───────┐ ┌──────────┐  │   │
//! │  │   │  money  │ │  cart   │ │ checkout │ │ held  │ │  stock   │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └───────┘ └──────────┘  │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────────┐          │   │
//! │  │   │  auth   │ │ report  │ │  export  │ │ validation │          │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └────────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    linus-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, User, SystemSettings)
//! - [`money`] - Money type with integer arithmetic
//! - [`cart`] - Cart engine and totals
//! - [`checkout`] - Cart to sale
//! - [`held`] - Suspended carts
//! - [`stock`] - Low-stock comparisons and notifications
//! - [`auth`] - Credentials, permissions, legacy user upgrade
//! - [`report`] - Date ranges and period summaries
//! - [`export`] - CSV and printable HTML
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use linus_core::cart::{compute_totals, CartItem};
//! use linus_core::money::Money;
//! use linus_core::types::{Product, TaxRate};
//!
//! let p1 = Product {
//!     id: "p1".into(), name: "Tea".into(), price: Money::from_minor(1000),
//!     category: String::new(), stock: 10, barcode: "1".into(), image: None,
//! };
//! let p2 = Product { id: "p2".into(), price: Money::from_minor(500), ..p1.clone() };
//!
//! let totals = compute_totals(
//!     &[CartItem::new(p1, 2), CartItem::new(p2, 1)],
//!     TaxRate::from_bps(1500),
//! )
//! .unwrap();
//! assert_eq!(totals.subtotal.to_string(), "25.00");
//! assert_eq!(totals.tax.to_string(), "3.75");
//! assert_eq!(totals.total.to_string(), "28.75");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod error;
pub mod export;
pub mod held;
pub mod money;
pub mod report;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use auth::{AuthError, Permission};
pub use cart::{Cart, CartItem, Totals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use held::HeldInvoice;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single cart line.
///
/// Catches typing 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

pub const DEFAULT_STORE_NAME: &str = "Linus POS";

pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// 15%.
pub const DEFAULT_TAX_RATE_BPS: u32 = 1500;

/// Highest unit price accepted, in minor units (1,000,000,000.00).
///
/// A full cart at this price and [`MAX_ITEM_QUANTITY`] still fits in `i64`.
pub const MAX_PRICE_MINOR: i64 = 100_000_000_000;
