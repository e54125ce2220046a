//! # Exports
//!
//! CSV and printable HTML renderings of inventory, sales and receipts.
//!
//! ```text
//! inventory_csv   BOM + Product,Category,Price,Stock,Barcode
//! sales_csv       BOM + ID,Date,Cashier,Total,Currency
//! receipt_html    one sale, short id (#last6)
//! inventory_html  stock table with value column
//! period_html     revenue, count, average ticket, sales table
//! ```
//!
//! The BOM lets spreadsheet tools detect UTF-8 for Arabic product names.
//! Barcodes are prefixed with `'` so long numeric codes stay text.

use html_escape::encode_text;

use crate::report::{summarize, DateRange};
use crate::stock::is_low_stock;
use crate::types::{Product, Sale, SystemSettings};

/// UTF-8 byte order mark.
pub const BOM: &str = "\u{feff}";

// =============================================================================
// CSV
// =============================================================================

/// Quotes a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(out: &mut String, fields: &[&str]) {
    let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

pub fn inventory_csv(products: &[Product]) -> String {
    let mut out = String::from(BOM);
    csv_row(&mut out, &["Product", "Category", "Price", "Stock", "Barcode"]);
    for p in products {
        csv_row(
            &mut out,
            &[
                &p.name,
                &p.category,
                &p.price.to_string(),
                &p.stock.to_string(),
                &format!("'{}", p.barcode),
            ],
        );
    }
    out
}

pub fn sales_csv(sales: &[&Sale]) -> String {
    let mut out = String::from(BOM);
    csv_row(&mut out, &["ID", "Date", "Cashier", "Total", "Currency"]);
    for s in sales {
        csv_row(
            &mut out,
            &[
                &s.id,
                &s.date.to_rfc3339(),
                &s.cashier,
                &s.total.to_string(),
                s.currency.code(),
            ],
        );
    }
    out
}

// =============================================================================
// HTML
// =============================================================================

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html dir=\"auto\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>\
         body{{font-family:sans-serif;margin:24px}}\
         table{{border-collapse:collapse;width:100%}}\
         th,td{{border:1px solid #ccc;padding:4px 8px;text-align:start}}\
         .low{{color:#b00020;font-weight:bold}}\
         </style>\n</head>\n<body>\n{}</body>\n</html>\n",
        encode_text(title),
        body
    )
}

/// Printable receipt for one sale.
pub fn receipt_html(sale: &Sale, store_name: &str) -> String {
    let currency = sale.currency;
    let mut body = String::new();

    body.push_str(&format!("<h1>{}</h1>\n", encode_text(store_name)));
    body.push_str(&format!(
        "<p>#{} &middot; {} &middot; {}</p>\n",
        encode_text(sale.short_id()),
        sale.date.format("%Y-%m-%d %H:%M"),
        encode_text(&sale.cashier)
    ));
    if let Some(customer) = &sale.customer_name {
        body.push_str(&format!("<p>{}</p>\n", encode_text(customer)));
    }

    body.push_str("<table>\n<tr><th>Item</th><th>Qty</th><th>Price</th><th>Total</th></tr>\n");
    for line in &sale.items {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            encode_text(&line.product_name),
            line.quantity,
            line.price,
            line.price.multiply_quantity(line.quantity)
        ));
    }
    body.push_str("</table>\n");

    body.push_str(&format!(
        "<p>Subtotal: {}</p>\n",
        encode_text(&currency.format(sale.subtotal))
    ));
    body.push_str(&format!("<p>Tax: {}</p>\n", encode_text(&currency.format(sale.tax))));
    if !sale.discount.is_zero() {
        body.push_str(&format!(
            "<p>Discount: {}</p>\n",
            encode_text(&currency.format(sale.discount))
        ));
    }
    body.push_str(&format!(
        "<p><strong>Total: {}</strong></p>\n",
        encode_text(&currency.format(sale.total))
    ));

    page(&format!("#{}", sale.short_id()), &body)
}

/// Printable stock list. Rows under the threshold are marked.
pub fn inventory_html(products: &[Product], settings: &SystemSettings) -> String {
    let mut body = String::new();
    body.push_str(&format!("<h1>{}</h1>\n", encode_text(&settings.store_name)));
    body.push_str("<h2>Inventory</h2>\n<table>\n<tr><th>Product</th><th>Category</th><th>Price</th><th>Stock</th><th>Value</th></tr>\n");

    for p in products {
        let class = if is_low_stock(p.stock, settings.low_stock_threshold) {
            " class=\"low\""
        } else {
            ""
        };
        body.push_str(&format!(
            "<tr{}><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            class,
            encode_text(&p.name),
            encode_text(&p.category),
            p.price,
            p.stock,
            p.stock_value()
        ));
    }
    body.push_str("</table>\n");

    page("Inventory", &body)
}

/// Printable period report.
pub fn period_html(sales: &[&Sale], range: DateRange, settings: &SystemSettings) -> String {
    let summary = summarize(sales, &[], settings.low_stock_threshold);
    let currency = settings.currency;
    let label = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "…".to_string(), |d| d.to_string());

    let mut body = String::new();
    body.push_str(&format!("<h1>{}</h1>\n", encode_text(&settings.store_name)));
    body.push_str(&format!("<h2>Sales {} to {}</h2>\n", label(range.from), label(range.to)));
    body.push_str(&format!(
        "<p>Total revenue: {}</p>\n<p>Sales: {}</p>\n<p>Average ticket: {}</p>\n",
        encode_text(&currency.format(summary.revenue)),
        summary.sale_count,
        encode_text(&currency.format(summary.average_ticket))
    ));

    body.push_str("<table>\n<tr><th>ID</th><th>Date</th><th>Cashier</th><th>Total</th></tr>\n");
    for s in sales {
        body.push_str(&format!(
            "<tr><td>#{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            encode_text(s.short_id()),
            s.calendar_date(),
            encode_text(&s.cashier),
            encode_text(&s.currency.format(s.total))
        ));
    }
    body.push_str("</table>\n");

    page("Sales report", &body)
}
