//! # Low-Stock Rules
//!
//! Two comparisons against the configured threshold live here, and they are
//! deliberately different:
//!
//! ```text
//! threshold = 5
//!
//! stock:            3     4     5     6
//! restock alert:    ✔     ✔     ✔     ✘     needs_restock_alert: stock <= threshold
//! inventory flag:   ✔     ✔     ✘     ✘     is_low_stock:        stock <  threshold
//! ```
//!
//! The alert feeds the notification list and fires as soon as stock reaches
//! the threshold. The inventory flag (and the report's low-stock count) marks
//! only products already below it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Product;

/// Inclusive comparison used by the notification poller.
#[inline]
pub const fn needs_restock_alert(stock: i64, threshold: i64) -> bool {
    stock <= threshold
}

/// Exclusive comparison used by the inventory listing and reports.
#[inline]
pub const fn is_low_stock(stock: i64, threshold: i64) -> bool {
    stock < threshold
}

/// One entry of the low-stock notification list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LowStockNotification {
    pub product_id: String,
    pub product_name: String,
    #[ts(type = "number")]
    pub stock: i64,
    #[ts(type = "number")]
    pub threshold: i64,
}

/// Builds the full notification set for a scan, in product order.
pub fn scan(products: &[Product], threshold: i64) -> Vec<LowStockNotification> {
    products
        .iter()
        .filter(|p| needs_restock_alert(p.stock, threshold))
        .map(|p| LowStockNotification {
            product_id: p.id.clone(),
            product_name: p.name.clone(),
            stock: p.stock,
            threshold,
        })
        .collect()
}

/// A product as shown in the inventory table.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryRow {
    #[serde(flatten)]
    pub product: Product,
    pub is_low_stock: bool,
}

pub fn inventory_rows(products: Vec<Product>, threshold: i64) -> Vec<InventoryRow> {
    products
        .into_iter()
        .map(|product| InventoryRow {
            is_low_stock: is_low_stock(product.stock, threshold),
            product,
        })
        .collect()
}

/// Number of products under the inventory flag.
pub fn low_stock_count(products: &[Product], threshold: i64) -> usize {
    products
        .iter()
        .filter(|p| is_low_stock(p.stock, threshold))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn product(id: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_string(),
            price: Money::from_minor(100),
            category: String::new(),
            stock,
            barcode: id.to_string(),
            image: None,
        }
    }

    #[test]
    fn test_stock_at_threshold_alerts_but_is_not_flagged() {
        assert!(needs_restock_alert(5, 5));
        assert!(!is_low_stock(5, 5));
    }

    #[test]
    fn test_stock_below_threshold_is_both() {
        assert!(needs_restock_alert(4, 5));
        assert!(is_low_stock(4, 5));
    }

    #[test]
    fn test_scan_replaces_with_current_matches() {
        let products = vec![product("a", 5), product("b", 4), product("c", 6)];
        let ids: Vec<_> = scan(&products, 5).into_iter().map(|n| n.product_id).collect();
        assert_eq!(ids, vec!["a", "b"]);

        // "a" restocked: it simply drops out of the next scan
        let products = vec![product("a", 20), product("b", 4), product("c", 6)];
        let ids: Vec<_> = scan(&products, 5).into_iter().map(|n| n.product_id).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_inventory_rows_and_count_use_exclusive_comparison() {
        let products = vec![product("a", 5), product("b", 4)];
        assert_eq!(low_stock_count(&products, 5), 1);

        let rows = inventory_rows(products, 5);
        assert!(!rows[0].is_low_stock);
        assert!(rows[1].is_low_stock);
    }
}
