//! # Demo Store Seeder
//!
//! ```bash
//! cargo run -p linus-db --bin seed                      # 120 products into ./linus_dev.db
//! cargo run -p linus-db --bin seed -- --count 40 --db ./data/linus.db
//! ```
//!
//! Creates the default admin when it is missing and, on an empty catalogue,
//! inserts `count` products cycled from a small corner-shop list. Stock
//! levels spread from 0 to 24 so a fresh store already shows low-stock
//! notifications.

use std::env;
use std::path::PathBuf;

use tracing::{info, warn};

use linus_core::auth::hash_password;
use linus_core::{stock, Money, Product};
use linus_db::{Database, DbConfig};

const DEFAULT_COUNT: usize = 120;
const DEFAULT_DB: &str = "./linus_dev.db";
const ADMIN_NAME: &str = "Admin";
const ADMIN_PASSWORD: &str = "123";

/// (category, name, price in minor units)
const CATALOGUE: &[(&str, &str, i64)] = &[
    ("Beverages", "Black Tea 100 bags", 1250),
    ("Beverages", "Arabic Coffee 250g", 3200),
    ("Beverages", "Mineral Water 1.5L", 200),
    ("Beverages", "Laban 1L", 650),
    ("Beverages", "Orange Juice 1L", 875),
    ("Bakery", "Samoon Bread", 300),
    ("Bakery", "Date Maamoul", 1500),
    ("Bakery", "Khubz Arabic 6pc", 250),
    ("Dairy", "Fresh Milk 2L", 1100),
    ("Dairy", "Labneh 400g", 950),
    ("Dairy", "White Cheese 500g", 1800),
    ("Dairy", "Eggs 30pc", 2400),
    ("Grocery", "Basmati Rice 5kg", 4500),
    ("Grocery", "Sugar 2kg", 900),
    ("Grocery", "Sunflower Oil 1.8L", 1650),
    ("Grocery", "Lentils 1kg", 700),
    ("Grocery", "Tomato Paste 400g", 425),
    ("Grocery", "Sukari Dates 1kg", 2800),
    ("Household", "Dish Soap 750ml", 1075),
    ("Household", "Tissue Box", 550),
];

/// Pack variants appended to the name, with their price multiplier.
const PACKS: &[(&str, i64)] = &[("", 1), ("x2", 2), ("x6", 6)];

#[derive(Debug)]
struct Args {
    db: PathBuf,
    count: usize,
}

fn parse_args() -> Option<Args> {
    let mut args = Args {
        db: PathBuf::from(DEFAULT_DB),
        count: DEFAULT_COUNT,
    };

    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--db" | "-d" => {
                if let Some(path) = iter.next() {
                    args.db = PathBuf::from(path);
                }
            }
            "--count" | "-c" => match iter.next().map(|n| n.parse::<usize>()) {
                Some(Ok(n)) => args.count = n,
                _ => warn!(default = DEFAULT_COUNT, "Invalid --count, using default"),
            },
            "--help" | "-h" => {
                println!("Usage: seed [--db <PATH>] [--count <N>]");
                println!("  -d, --db <PATH>   database file (default {DEFAULT_DB})");
                println!("  -c, --count <N>   products to insert (default {DEFAULT_COUNT})");
                return None;
            }
            other => warn!(arg = other, "Ignoring unknown argument"),
        }
    }

    Some(args)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let Some(args) = parse_args() else {
        return Ok(());
    };

    let db = Database::new(DbConfig::new(&args.db)).await?;

    let upgraded = db.users().upgrade_legacy_records().await?;
    if upgraded > 0 {
        info!(upgraded, "Legacy user records upgraded");
    }

    let hash = hash_password(ADMIN_PASSWORD)?;
    if db.users().ensure_default_admin(ADMIN_NAME, &hash).await? {
        info!(username = "admin", "Default admin created");
    }

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Catalogue is not empty, products left untouched");
        db.close().await;
        return Ok(());
    }

    let products = demo_products(args.count);
    let saved = db.products().upsert_many(&products).await?;

    let threshold = db.settings().load().await?.low_stock_threshold;
    let alerts = stock::scan(&products, threshold).len();
    info!(saved, alerts, threshold, db = %args.db.display(), "Demo catalogue seeded");

    db.close().await;
    Ok(())
}

fn demo_products(count: usize) -> Vec<Product> {
    PACKS
        .iter()
        .flat_map(|pack| CATALOGUE.iter().map(move |item| (item, pack)))
        .cycle()
        .take(count)
        .enumerate()
        .map(|(n, (&(category, name, price), &(pack, multiplier)))| {
            let name = if pack.is_empty() {
                name.to_string()
            } else {
                format!("{name} {pack}")
            };
            // Past one full cycle, names get a batch suffix to stay distinct.
            let batch = n / (CATALOGUE.len() * PACKS.len());
            let name = if batch == 0 { name } else { format!("{name} #{}", batch + 1) };

            Product {
                id: format!("demo-{:04}", n + 1),
                name,
                price: Money::from_minor(price * multiplier),
                category: category.to_string(),
                stock: ((n * 7) % 25) as i64,
                barcode: format!("6281{:09}", n + 1),
                image: None,
            }
        })
        .collect()
}
