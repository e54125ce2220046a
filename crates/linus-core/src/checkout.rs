//! # Checkout
//!
//! Turns a cart into a [`Sale`] ready to be committed.
//!
//! ```text
//! Cart + SystemSettings + cashier + TenderDetails
//!      │
//!      ▼
//! prepare_sale()  ← pure: totals, status, frozen lines
//!      │
//!      ▼
//! Sale ──► SaleRepository::commit() (linus-db, one transaction)
//! ```
//!
//! Totals are always derived here, from the lines and the tax rate in force
//! at the moment of checkout. A client-supplied sale goes through
//! [`rebuild_sale`] so that stored totals satisfy
//! `total = subtotal + tax - discount` no matter what the client sent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{compute_totals, Cart, CartItem, Totals};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentMethod, Sale, SaleLine, SaleStatus, SystemSettings};
use crate::validation::{validate_price, validate_quantity};
use crate::MAX_CART_ITEMS;

/// Payment details captured at the tender step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct TenderDetails {
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub payment_details: String,
    #[ts(type = "number")]
    pub discount: Money,
}

/// Prepares a sale from the active cart.
///
/// ## Errors
/// - `EmptyCart` when there is nothing to sell
/// - `InvalidDiscount` when the discount is negative or above `subtotal + tax`
pub fn prepare_sale(
    cart: &Cart,
    settings: &SystemSettings,
    cashier: &str,
    tender: TenderDetails,
    id: String,
    now: DateTime<Utc>,
) -> CoreResult<Sale> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let totals = compute_totals(cart.items(), settings.tax_rate)?;
    let lines = cart.items().iter().map(freeze_line).collect();

    assemble(id, now, lines, totals, settings, cashier, tender)
}

/// Re-derives totals and status for a sale payload submitted directly.
///
/// Lines, id, date, cashier and tender fields are kept; `subtotal`, `tax`,
/// `total`, `currency` and `status` are recomputed.
pub fn rebuild_sale(submitted: Sale, settings: &SystemSettings) -> CoreResult<Sale> {
    if submitted.items.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    if submitted.items.len() > MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }

    let mut lines = Vec::with_capacity(submitted.items.len());
    for line in &submitted.items {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::required("productId").into());
        }
        validate_quantity(line.quantity)?;
        validate_price(line.price)?;
        lines.push(line.line_total()?);
    }

    let subtotal =
        Money::checked_sum(lines).ok_or_else(|| ValidationError::amount_overflow("subtotal"))?;
    let totals = Totals::from_subtotal(subtotal, settings.tax_rate)?;

    let tender = TenderDetails {
        payment_method: submitted.payment_method,
        customer_name: submitted.customer_name,
        payment_details: submitted.payment_details,
        discount: submitted.discount,
    };

    assemble(
        submitted.id,
        submitted.date,
        submitted.items,
        totals,
        settings,
        &submitted.cashier,
        tender,
    )
}

fn freeze_line(item: &CartItem) -> SaleLine {
    SaleLine {
        product_id: item.product.id.clone(),
        product_name: item.product.name.clone(),
        quantity: item.quantity,
        price: item.product.price,
    }
}

fn assemble(
    id: String,
    date: DateTime<Utc>,
    items: Vec<SaleLine>,
    totals: Totals,
    settings: &SystemSettings,
    cashier: &str,
    tender: TenderDetails,
) -> CoreResult<Sale> {
    let gross = totals.total;
    if tender.discount.is_negative() {
        return Err(CoreError::InvalidDiscount {
            reason: "discount cannot be negative".to_string(),
        });
    }
    if tender.discount > gross {
        return Err(CoreError::InvalidDiscount {
            reason: format!("discount {} exceeds amount due {}", tender.discount, gross),
        });
    }

    let customer_name = tender
        .customer_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    Ok(Sale {
        id,
        date,
        items,
        subtotal: totals.subtotal,
        tax: totals.tax,
        discount: tender.discount,
        total: gross - tender.discount,
        currency: settings.currency,
        cashier: cashier.to_string(),
        customer_name,
        payment_method: tender.payment_method,
        payment_details: tender.payment_details,
        status: SaleStatus::for_payment(tender.payment_method),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Currency, Product};

    fn product(id: &str, price_minor: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            price: Money::from_minor(price_minor),
            category: String::new(),
            stock: 10,
            barcode: format!("BC-{}", id),
            image: None,
        }
    }

    fn reference_cart() -> Cart {
        Cart::from_items(vec![
            CartItem::new(product("p1", 1000), 2),
            CartItem::new(product("p2", 500), 1),
        ])
    }

    #[test]
    fn test_prepare_sale_reference_totals() {
        let settings = SystemSettings::default();
        let sale = prepare_sale(
            &reference_cart(),
            &settings,
            "Admin",
            TenderDetails::default(),
            "s1".to_string(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(sale.subtotal.minor(), 2500);
        assert_eq!(sale.tax.minor(), 375);
        assert_eq!(sale.total.minor(), 2875);
        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.payment_method, PaymentMethod::Cash);
        assert_eq!(sale.currency, Currency::Sar);
        assert_eq!(sale.payment_details, "");
        assert_eq!(sale.items.len(), 2);
        assert_eq!(sale.items[0].product_id, "p1");
        assert_eq!(sale.items[0].quantity, 2);
    }

    #[test]
    fn test_credit_sale_is_pending() {
        let tender = TenderDetails {
            payment_method: PaymentMethod::Credit,
            customer_name: Some("  Omar ".to_string()),
            ..TenderDetails::default()
        };
        let sale = prepare_sale(
            &reference_cart(),
            &SystemSettings::default(),
            "Admin",
            tender,
            "s2".to_string(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(sale.status, SaleStatus::Pending);
        assert_eq!(sale.customer_name.as_deref(), Some("Omar"));
    }

    #[test]
    fn test_empty_cart_cannot_check_out() {
        let err = prepare_sale(
            &Cart::new(),
            &SystemSettings::default(),
            "Admin",
            TenderDetails::default(),
            "s3".to_string(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart));
    }

    #[test]
    fn test_discount_applied_and_bounded() {
        let settings = SystemSettings::default();
        let tender = TenderDetails {
            discount: Money::from_minor(875),
            ..TenderDetails::default()
        };
        let sale = prepare_sale(
            &reference_cart(),
            &settings,
            "Admin",
            tender,
            "s4".to_string(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(sale.total.minor(), 2000);
        assert_eq!(sale.total, sale.subtotal + sale.tax - sale.discount);

        let too_much = TenderDetails {
            discount: Money::from_minor(2876),
            ..TenderDetails::default()
        };
        let err = prepare_sale(
            &reference_cart(),
            &settings,
            "Admin",
            too_much,
            "s5".to_string(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidDiscount { .. }));
    }

    #[test]
    fn test_rebuild_sale_overrides_client_totals() {
        let settings = SystemSettings::default();
        let mut submitted = prepare_sale(
            &reference_cart(),
            &settings,
            "Admin",
            TenderDetails::default(),
            "s6".to_string(),
            Utc::now(),
        )
        .unwrap();
        submitted.total = Money::from_minor(1);
        submitted.status = SaleStatus::Pending;
        submitted.payment_method = PaymentMethod::Electronic;

        let rebuilt = rebuild_sale(submitted, &settings).unwrap();
        assert_eq!(rebuilt.total.minor(), 2875);
        assert_eq!(rebuilt.status, SaleStatus::Completed);
    }

    #[test]
    fn test_rebuild_sale_rejects_bad_lines() {
        let settings = SystemSettings::default();
        let mut submitted = prepare_sale(
            &reference_cart(),
            &settings,
            "Admin",
            TenderDetails::default(),
            "s7".to_string(),
            Utc::now(),
        )
        .unwrap();
        submitted.items[0].quantity = 0;
        assert!(matches!(
            rebuild_sale(submitted, &settings),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_oversized_price_is_rejected_before_totals() {
        let settings = SystemSettings::default();
        let huge = Money::from_major(1e16).unwrap();

        let cart = Cart::from_items(vec![CartItem::new(product("p1", huge.minor()), 999)]);
        let err = prepare_sale(
            &cart,
            &settings,
            "Admin",
            TenderDetails::default(),
            "s8".to_string(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let mut submitted = prepare_sale(
            &reference_cart(),
            &settings,
            "Admin",
            TenderDetails::default(),
            "s9".to_string(),
            Utc::now(),
        )
        .unwrap();
        submitted.items[0].price = huge;
        submitted.items[0].quantity = 999;
        match rebuild_sale(submitted, &settings) {
            Err(CoreError::Validation(ValidationError::OutOfRange { field, max, .. })) => {
                assert_eq!(field, "price");
                assert_eq!(max, crate::MAX_PRICE_MINOR);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rebuild_sale_line_limit() {
        let settings = SystemSettings::default();
        let mut submitted = prepare_sale(
            &reference_cart(),
            &settings,
            "Admin",
            TenderDetails::default(),
            "s10".to_string(),
            Utc::now(),
        )
        .unwrap();
        let line = submitted.items[0].clone();
        submitted.items = vec![line; MAX_CART_ITEMS + 1];
        assert!(matches!(
            rebuild_sale(submitted, &settings),
            Err(CoreError::CartTooLarge { .. })
        ));
    }
}
