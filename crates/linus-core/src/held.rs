//! # Held Invoices
//!
//! A held invoice is a parked cart that a cashier can resume later.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Held Invoice Lifecycle                             │
//! │                                                                         │
//! │  hold(cart)                                                            │
//! │     ├── cart empty? ──────────────► EmptyCart                          │
//! │     └── HeldInvoice { new id, now, frozen items }, cart cleared        │
//! │                                                                         │
//! │  restore(invoice, confirm_override)                                    │
//! │     ├── cart non-empty && !confirm ► CartNotEmpty (nothing changes)    │
//! │     └── cart = invoice.items, invoice deleted                          │
//! │         (no stock re-validation)                                       │
//! │                                                                         │
//! │  discard(invoice) ─────────────────► deleted                           │
//! │                                                                         │
//! │  Held invoices never touch stock.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{compute_totals, Cart, CartItem};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::TaxRate;

/// A suspended cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HeldInvoice {
    pub id: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub items: Vec<CartItem>,
}

impl HeldInvoice {
    /// Display total at the given rate. Not stored.
    pub fn total(&self, rate: TaxRate) -> CoreResult<Money> {
        Ok(compute_totals(&self.items, rate)?.total)
    }
}

/// Moves the cart's items into a new held invoice.
///
/// The cart is left empty on success and untouched on error.
pub fn hold(cart: &mut Cart, id: String, now: DateTime<Utc>) -> CoreResult<HeldInvoice> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    Ok(HeldInvoice {
        id,
        date: now,
        items: cart.take_items(),
    })
}

/// Checks whether a restore may replace the current cart.
pub fn ensure_restorable(cart: &Cart, confirm_override: bool) -> CoreResult<()> {
    if !cart.is_empty() && !confirm_override {
        return Err(CoreError::CartNotEmpty);
    }
    Ok(())
}

/// Replaces the cart with the invoice's frozen items.
pub fn restore(cart: &mut Cart, invoice: HeldInvoice) {
    *cart = Cart::from_items(invoice.items);
}

/// Sorts invoices most-recent-first.
pub fn sort_newest_first(invoices: &mut [HeldInvoice]) {
    invoices.sort_by(|a, b| b.date.cmp(&a.date));
}
