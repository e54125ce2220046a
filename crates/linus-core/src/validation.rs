//! # Validation Module
//!
//! Input validation for Linus POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Client                                                       │
//! │  └── Immediate feedback on forms                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Server (Rust)                                                │
//! │  ├── Type validation (serde deserialization)                           │
//! │  └── THIS MODULE: business rule validation, before any write           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE constraints (username)                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Product, SystemSettings};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_MINOR};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_USERNAME_LEN: usize = 50;
const MAX_THRESHOLD: i64 = 100_000;

// =============================================================================
// Products
// =============================================================================

/// Validates a product before it is saved.
///
/// ## Rules
/// - `id`, `name` and `barcode` are required
/// - `price >= 0`, `stock >= 0`
///
/// ## Example
/// ```rust
/// use linus_core::money::Money;
/// use linus_core::types::Product;
/// use linus_core::validation::validate_product;
///
/// let mut p = Product {
///     id: "p1".into(), name: "Tea".into(), price: Money::from_minor(100),
///     category: String::new(), stock: 1, barcode: "123".into(), image: None,
/// };
/// assert!(validate_product(&p).is_ok());
/// p.barcode.clear();
/// assert!(validate_product(&p).is_err());
/// ```
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    if product.id.trim().is_empty() {
        return Err(ValidationError::required("id"));
    }

    validate_product_name(&product.name)?;

    if product.barcode.trim().is_empty() {
        return Err(ValidationError::required("barcode"));
    }

    validate_price(product.price)?;

    if product.stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// `0 ≤ price ≤ MAX_PRICE_MINOR`.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price.minor() > MAX_PRICE_MINOR {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_MINOR,
        });
    }
    Ok(())
}

pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Quantities
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be >= 1
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

// =============================================================================
// Users
// =============================================================================

/// Validates a new user. Password is mandatory.
pub fn validate_new_user(username: &str, name: &str, password: Option<&str>) -> ValidationResult<()> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ValidationError::required("username"));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: MAX_USERNAME_LEN,
        });
    }
    if username.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    if name.trim().is_empty() {
        return Err(ValidationError::required("name"));
    }

    match password {
        Some(p) if !p.is_empty() => Ok(()),
        _ => Err(ValidationError::required("password")),
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Validates a settings record before it replaces the current one.
///
/// ## Rules
/// - store name non-empty
/// - low-stock threshold in 0..=100000
/// - tax rate in 0..=1 (0..=10000 bps)
pub fn validate_settings(settings: &SystemSettings) -> ValidationResult<()> {
    if settings.store_name.trim().is_empty() {
        return Err(ValidationError::required("storeName"));
    }

    if !(0..=MAX_THRESHOLD).contains(&settings.low_stock_threshold) {
        return Err(ValidationError::OutOfRange {
            field: "lowStockThreshold".to_string(),
            min: 0,
            max: MAX_THRESHOLD,
        });
    }

    if settings.tax_rate.bps() > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "taxRate".to_string(),
            min: 0,
            max: 1,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
