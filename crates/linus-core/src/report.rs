//! # Reports
//!
//! Date-range filtering and period summaries over stored sales.
//!
//! Dates compare on the calendar part of the sale timestamp (`YYYY-MM-DD`,
//! UTC), inclusive on both ends.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::stock::low_stock_count;
use crate::types::{Product, Sale};

/// Inclusive calendar-date range. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        DateRange { from, to }
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        DateRange {
            from: Some(date),
            to: Some(date),
        }
    }

    /// Parses optional `YYYY-MM-DD` strings. Blank strings count as open.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self, ValidationError> {
        Ok(DateRange {
            from: parse_date("from", from)?,
            to: parse_date("to", to)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    /// Sales whose calendar date falls in the range, order preserved.
    pub fn filter<'a>(&self, sales: &'a [Sale]) -> Vec<&'a Sale> {
        sales
            .iter()
            .filter(|s| self.contains(s.date.date_naive()))
            .collect()
    }
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "expected YYYY-MM-DD".to_string(),
            }),
    }
}

/// Best-selling product of a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopProduct {
    pub product_id: String,
    pub product_name: String,
    #[ts(type = "number")]
    pub quantity: i64,
}

/// Dashboard figures for a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PeriodSummary {
    #[ts(type = "number")]
    pub revenue: Money,
    #[ts(type = "number")]
    pub sale_count: usize,
    #[ts(type = "number")]
    pub average_ticket: Money,
    pub top_product: Option<TopProduct>,
    #[ts(type = "number")]
    pub low_stock_count: usize,
}

/// Summarises the given sales. `products` and `threshold` feed the
/// low-stock count.
pub fn summarize(sales: &[&Sale], products: &[Product], threshold: i64) -> PeriodSummary {
    let revenue: Money = sales.iter().map(|s| s.total).sum();
    let sale_count = sales.len();
    let average_ticket = if sale_count == 0 {
        Money::zero()
    } else {
        Money::from_minor(revenue.minor() / sale_count as i64)
    };

    PeriodSummary {
        revenue,
        sale_count,
        average_ticket,
        top_product: top_product(sales),
        low_stock_count: low_stock_count(products, threshold),
    }
}

/// Product with the highest sold quantity. Ties go to the product that
/// first reached the winning quantity in sale order.
pub fn top_product(sales: &[&Sale]) -> Option<TopProduct> {
    let mut order: Vec<&str> = Vec::new();
    let mut tally: HashMap<&str, (i64, &str)> = HashMap::new();

    for line in sales.iter().flat_map(|s| s.items.iter()) {
        let entry = tally.entry(line.product_id.as_str()).or_insert_with(|| {
            order.push(line.product_id.as_str());
            (0, line.product_name.as_str())
        });
        entry.0 += line.quantity;
    }

    let mut best: Option<(&str, i64, &str)> = None;
    for id in order {
        let (qty, name) = tally[id];
        if best.map_or(true, |(_, best_qty, _)| qty > best_qty) {
            best = Some((id, qty, name));
        }
    }

    best.map(|(id, quantity, name)| TopProduct {
        product_id: id.to_string(),
        product_name: name.to_string(),
        quantity,
    })
}

/// Revenue per calendar date, oldest first. Days without sales are left
/// out.
pub fn revenue_by_day(sales: &[&Sale]) -> Vec<(NaiveDate, Money)> {
    let mut days: BTreeMap<NaiveDate, Money> = BTreeMap::new();
    for sale in sales {
        *days.entry(sale.date.date_naive()).or_default() += sale.total;
    }
    days.into_iter().collect()
}

/// Sales from the given day.
pub fn daily(sales: &[Sale], today: NaiveDate) -> Vec<&Sale> {
    DateRange::day(today).filter(sales)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Currency, PaymentMethod, SaleLine, SaleStatus};
    use chrono::{TimeZone, Utc};

    fn sale(id: &str, y: i32, m: u32, d: u32, total: i64, lines: &[(&str, i64)]) -> Sale {
        Sale {
            id: id.to_string(),
            date: Utc.with_ymd_and_hms(y, m, d, 23, 59, 0).unwrap(),
            items: lines
                .iter()
                .map(|(pid, qty)| SaleLine {
                    product_id: pid.to_string(),
                    product_name: pid.to_uppercase(),
                    quantity: *qty,
                    price: Money::from_minor(100),
                })
                .collect(),
            subtotal: Money::from_minor(total),
            tax: Money::zero(),
            discount: Money::zero(),
            total: Money::from_minor(total),
            currency: Currency::Sar,
            cashier: "Admin".to_string(),
            customer_name: None,
            payment_method: PaymentMethod::Cash,
            payment_details: String::new(),
            status: SaleStatus::Completed,
        }
    }

    #[test]
    fn test_range_is_inclusive_on_calendar_date() {
        let sales = vec![
            sale("a", 2024, 3, 1, 100, &[]),
            sale("b", 2024, 3, 2, 100, &[]),
            sale("c", 2024, 3, 3, 100, &[]),
        ];
        let range = DateRange::parse(Some("2024-03-01"), Some("2024-03-02")).unwrap();
        let ids: Vec<_> = range.filter(&sales).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let open = DateRange::parse(Some(""), None).unwrap();
        assert_eq!(open.filter(&sales).len(), 3);
    }

    #[test]
    fn test_range_rejects_bad_dates() {
        assert!(DateRange::parse(Some("03/01/2024"), None).is_err());
    }

    #[test]
    fn test_summary_figures() {
        let sales = vec![
            sale("a", 2024, 3, 1, 1000, &[("tea", 2), ("milk", 1)]),
            sale("b", 2024, 3, 1, 2000, &[("milk", 3)]),
        ];
        let refs: Vec<&Sale> = sales.iter().collect();
        let summary = summarize(&refs, &[], 5);

        assert_eq!(summary.revenue.minor(), 3000);
        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.average_ticket.minor(), 1500);
        let top = summary.top_product.unwrap();
        assert_eq!(top.product_id, "milk");
        assert_eq!(top.quantity, 4);
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[], &[], 5);
        assert!(summary.revenue.is_zero());
        assert!(summary.average_ticket.is_zero());
        assert!(summary.top_product.is_none());
    }

    #[test]
    fn test_daily_selects_today() {
        let sales = vec![sale("a", 2024, 3, 1, 100, &[]), sale("b", 2024, 3, 2, 100, &[])];
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let picked = daily(&sales, today);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id, "b");
    }

    #[test]
    fn test_revenue_by_day_groups_and_orders() {
        let sales = vec![
            sale("c", 2024, 3, 3, 700, &[]),
            sale("a", 2024, 3, 1, 100, &[]),
            sale("b", 2024, 3, 1, 250, &[]),
        ];
        let refs: Vec<&Sale> = sales.iter().collect();
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();

        assert_eq!(
            revenue_by_day(&refs),
            vec![(day(1), Money::from_minor(350)), (day(3), Money::from_minor(700))]
        );
        assert!(revenue_by_day(&[]).is_empty());
    }
}
