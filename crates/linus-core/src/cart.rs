//! # Cart & Totals Engine
//!
//! The in-memory cart of an active checkout session and the pure totals
//! computation over it.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Client Action            Operation               Cart Change           │
//! │  ─────────────            ─────────               ───────────           │
//! │                                                                         │
//! │  Tap product ────────────► add_item() ──────────► qty += 1 or push     │
//! │                            (stock <= 0 → OutOfStock)                    │
//! │                                                                         │
//! │  +/- buttons ────────────► change_quantity() ───► qty = max(1, q + d)  │
//! │                            (q + d > known stock → Rejected)             │
//! │                                                                         │
//! │  Trash icon ─────────────► remove_item() ───────► line removed         │
//! │                                                                         │
//! │  Totals panel ───────────► compute_totals() ────► (read only)          │
//! │                                                                         │
//! │  NOTE: Persisted stock is never touched here. It only changes when a   │
//! │        sale is committed.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Product, TaxRate};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Item
// =============================================================================

/// A product in the cart with its quantity.
///
/// The product is a snapshot taken when it was first added. Price and name
/// stay frozen; `product.stock` is the last known stock and is only used as
/// a fallback bound when the live value is unavailable.
///
/// Serialized flat, as `{ id, name, price, ..., quantity }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    #[ts(type = "number")]
    pub quantity: i64,
}

impl CartItem {
    pub fn new(product: Product, quantity: i64) -> Self {
        CartItem { product, quantity }
    }

    /// Product id; cart lines are keyed by it.
    #[inline]
    pub fn id(&self) -> &str {
        &self.product.id
    }

    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> CoreResult<Money> {
        self.product
            .price
            .checked_mul_quantity(self.quantity)
            .ok_or_else(|| ValidationError::amount_overflow("subtotal").into())
    }
}

// =============================================================================
// Quantity Change Outcome
// =============================================================================

/// Result of [`Cart::change_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "outcome", rename_all = "camelCase")]
#[ts(export)]
pub enum QuantityChange {
    /// The line now holds `quantity`.
    Applied {
        #[ts(type = "number")]
        quantity: i64,
    },
    /// The request exceeded known stock; the line keeps `kept`.
    Rejected {
        #[ts(type = "number")]
        kept: i64,
    },
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by product id (adding the same product increments)
/// - Every quantity is >= 1
/// - At most `MAX_CART_ITEMS` lines, each at most `MAX_ITEM_QUANTITY`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Rebuilds a cart from a frozen item list (held-invoice restore).
    ///
    /// Items are taken as-is; stock is not re-validated.
    pub fn from_items(items: Vec<CartItem>) -> Self {
        Cart { items }
    }

    /// Adds one unit of a product.
    ///
    /// ## Behavior
    /// - `stock <= 0`: `OutOfStock`, cart unchanged
    /// - Already present: quantity + 1
    /// - Otherwise: appended with quantity 1
    pub fn add_item(&mut self, product: &Product) -> CoreResult<()> {
        if product.stock <= 0 {
            return Err(CoreError::OutOfStock {
                product: product.name.clone(),
            });
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.id() == product.id) {
            let new_qty = item.quantity + 1;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(CartItem::new(product.clone(), 1));
        Ok(())
    }

    /// Applies `delta` to a line's quantity.
    ///
    /// The new quantity is floored at 1. If it exceeds `known_stock` (or the
    /// item's snapshot stock when `None`), the change is rejected and the
    /// line keeps its prior quantity.
    pub fn change_quantity(
        &mut self,
        product_id: &str,
        delta: i64,
        known_stock: Option<i64>,
    ) -> CoreResult<QuantityChange> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id() == product_id)
            .ok_or_else(|| CoreError::ItemNotInCart(product_id.to_string()))?;

        let requested = item.quantity.saturating_add(delta).max(1);
        let stock = known_stock.unwrap_or(item.product.stock);

        if requested > stock || requested > MAX_ITEM_QUANTITY {
            return Ok(QuantityChange::Rejected {
                kept: item.quantity,
            });
        }

        item.quantity = requested;
        Ok(QuantityChange::Applied {
            quantity: requested,
        })
    }

    /// Removes a line. Removing a product that is not present is a no-op.
    pub fn remove_item(&mut self, product_id: &str) {
        self.items.retain(|i| i.id() != product_id);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Moves all items out, leaving the cart empty.
    pub fn take_items(&mut self) -> Vec<CartItem> {
        std::mem::take(&mut self.items)
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn get(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id() == product_id)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Monetary summary of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Totals {
    #[ts(type = "number")]
    pub subtotal: Money,
    #[ts(type = "number")]
    pub tax: Money,
    #[ts(type = "number")]
    pub total: Money,
}

/// Computes cart totals.
///
/// `subtotal = Σ(price × quantity)`, `tax = subtotal × rate`,
/// `total = subtotal + tax`. The subtotal is exact; tax is rounded once.
///
/// ```rust
/// use linus_core::cart::{compute_totals, CartItem};
/// use linus_core::money::Money;
/// use linus_core::types::{Product, TaxRate};
///
/// let tea = Product {
///     id: "p1".into(), name: "Tea".into(), price: Money::from_minor(1000),
///     category: String::new(), stock: 10, barcode: "1".into(), image: None,
/// };
/// let totals = compute_totals(&[CartItem::new(tea, 2)], TaxRate::from_bps(1500)).unwrap();
/// assert_eq!(totals.total.minor(), 2300);
/// ```
///
/// ## Errors
/// `Validation` when an amount does not fit in `i64` minor units.
pub fn compute_totals(items: &[CartItem], rate: TaxRate) -> CoreResult<Totals> {
    let lines = items
        .iter()
        .map(CartItem::line_total)
        .collect::<CoreResult<Vec<_>>>()?;
    Totals::from_subtotal(
        Money::checked_sum(lines).ok_or_else(|| ValidationError::amount_overflow("subtotal"))?,
        rate,
    )
}

impl Totals {
    /// Adds tax at `rate` to an exact subtotal.
    pub fn from_subtotal(subtotal: Money, rate: TaxRate) -> CoreResult<Totals> {
        let tax = subtotal.calculate_tax(rate);
        let total = subtotal
            .checked_add(tax)
            .ok_or_else(|| ValidationError::amount_overflow("total"))?;
        Ok(Totals {
            subtotal,
            tax,
            total,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
