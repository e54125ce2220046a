//! # Domain Types
//!
//! Core domain types used throughout Linus POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id (UUID)      │   │  username       │       │
//! │  │  name, category │   │  date           │   │  name, role     │       │
//! │  │  price (Money)  │   │  items[]        │   │  is_active      │       │
//! │  │  stock, barcode │   │  totals, status │   │  permissions    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │   SaleStatus    │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Completed      │   │  Cash           │       │
//! │  │  1500 = 15%     │   │  Pending        │   │  Electronic     │       │
//! │  └─────────────────┘   └─────────────────┘   │  Credit         │       │
//! │                                              └─────────────────┘       │
//! │  SystemSettings: store name, currency, low-stock threshold, tax rate   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Wire names are camelCase. Column naming of the SQL store is handled by
//! row structs in linus-db and never leaks into these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%. 1500 bps = 15%.
///
/// On the wire the rate is a fraction (`0.15`), the same shape the settings
/// record has always used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Converts a fraction (0.15 = 15%) to basis points.
    ///
    /// Returns `None` for negative or non-finite input.
    pub fn from_fraction(fraction: f64) -> Option<Self> {
        if !fraction.is_finite() || fraction < 0.0 {
            return None;
        }
        let bps = (fraction * 10000.0).round();
        if bps > u32::MAX as f64 {
            return None;
        }
        Some(TaxRate(bps as u32))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a fraction (for display and the wire).
    #[inline]
    pub fn as_fraction(&self) -> f64 {
        self.0 as f64 / 10000.0
    }

    /// Returns the rate as a whole-number percentage label, e.g. `15`.
    pub fn percent_label(&self) -> String {
        if self.0 % 100 == 0 {
            format!("{}", self.0 / 100)
        } else {
            format!("{:.2}", self.0 as f64 / 100.0)
        }
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Serialize for TaxRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_fraction())
    }
}

impl<'de> Deserialize<'de> for TaxRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fraction = f64::deserialize(deserializer)?;
        TaxRate::from_fraction(fraction)
            .ok_or_else(|| serde::de::Error::custom("tax rate must be a non-negative number"))
    }
}

// =============================================================================
// Currency
// =============================================================================

/// Supported store currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Currency {
    /// Saudi riyal.
    #[default]
    Sar,
    /// US dollar.
    Usd,
    /// Yemeni rial.
    Yer,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Sar, Currency::Usd, Currency::Yer];

    /// ISO 4217 code.
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Sar => "SAR",
            Currency::Usd => "USD",
            Currency::Yer => "YER",
        }
    }

    /// Display symbol.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Currency::Sar => "ر.س",
            Currency::Usd => "$",
            Currency::Yer => "ر.ي",
        }
    }

    /// Formats an amount as `"28.75 ر.س"`.
    ///
    /// ```rust
    /// use linus_core::money::Money;
    /// use linus_core::types::Currency;
    ///
    /// assert_eq!(Currency::Usd.format(Money::from_minor(2875)), "28.75 $");
    /// ```
    pub fn format(&self, amount: Money) -> String {
        format!("{} {}", amount, self.symbol())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SAR" => Ok(Currency::Sar),
            "USD" => Ok(Currency::Usd),
            "YER" => Ok(Currency::Yer),
            _ => Err(ValidationError::NotAllowed {
                field: "currency".to_string(),
                allowed: Currency::ALL.iter().map(|c| c.code().to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier, assigned by the client.
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Unit price.
    #[ts(type = "number")]
    pub price: Money,

    /// Free-text category.
    #[serde(default)]
    pub category: String,

    /// Units on hand. Never negative once stored.
    #[ts(type = "number")]
    pub stock: i64,

    /// Barcode. Not enforced unique.
    #[serde(default)]
    pub barcode: String,

    /// Optional image reference (URL or data URI).
    #[serde(default)]
    pub image: Option<String>,
}

impl Product {
    /// Stock value at unit price, used by the inventory report.
    pub fn stock_value(&self) -> Money {
        self.price.multiply_quantity(self.stock)
    }
}

// =============================================================================
// Payment Method / Sale Status
// =============================================================================

/// How the customer paid. A label only; no gateway is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
pub enum PaymentMethod {
    #[default]
    Cash,
    Electronic,
    /// Customer owes the amount; the sale stays pending.
    Credit,
}

/// Status of a stored sale, derived from the payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
pub enum SaleStatus {
    Completed,
    Pending,
}

impl SaleStatus {
    /// `Credit` sales are `Pending`; everything else is `Completed`.
    pub const fn for_payment(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Credit => SaleStatus::Pending,
            PaymentMethod::Cash | PaymentMethod::Electronic => SaleStatus::Completed,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One line of a stored sale.
///
/// Snapshot pattern: name and price are frozen at the moment of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLine {
    pub product_id: String,
    pub product_name: String,
    #[ts(type = "number")]
    pub quantity: i64,
    /// Unit price at time of sale.
    #[ts(type = "number")]
    pub price: Money,
}

impl SaleLine {
    #[inline]
    pub fn line_total(&self) -> Result<Money, ValidationError> {
        self.price
            .checked_mul_quantity(self.quantity)
            .ok_or_else(|| ValidationError::amount_overflow("subtotal"))
    }
}

/// An immutable, append-only sale record.
///
/// `total = subtotal + tax - discount`, where `tax` was computed from the
/// settings' tax rate at commit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub items: Vec<SaleLine>,
    #[ts(type = "number")]
    pub subtotal: Money,
    #[ts(type = "number")]
    pub tax: Money,
    #[ts(type = "number")]
    pub discount: Money,
    #[ts(type = "number")]
    pub total: Money,
    pub currency: Currency,
    pub cashier: String,
    pub customer_name: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_details: String,
    pub status: SaleStatus,
}

impl Sale {
    /// `YYYY-MM-DD` portion of the sale timestamp.
    pub fn calendar_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Last six characters of the id, as printed on receipts.
    pub fn short_id(&self) -> &str {
        let start = self
            .id
            .char_indices()
            .rev()
            .nth(5)
            .map(|(i, _)| i)
            .unwrap_or(0);
        &self.id[start..]
    }
}

// =============================================================================
// Users
// =============================================================================

/// Legacy role tag. Permissions are authoritative; the role only seeds
/// defaults for records that predate permission sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Staff,
}

/// Four independent permission flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserPermissions {
    pub can_manage_inventory: bool,
    pub can_view_reports: bool,
    pub can_manage_settings: bool,
    pub can_manage_users: bool,
}

impl UserPermissions {
    pub const fn all() -> Self {
        UserPermissions {
            can_manage_inventory: true,
            can_view_reports: true,
            can_manage_settings: true,
            can_manage_users: true,
        }
    }

    pub const fn none() -> Self {
        UserPermissions {
            can_manage_inventory: false,
            can_view_reports: false,
            can_manage_settings: false,
            can_manage_users: false,
        }
    }

    /// Default permission set for a role.
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => UserPermissions::all(),
            Role::Staff => UserPermissions::none(),
        }
    }
}

/// A fully-typed user. Never carries a password or hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub username: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub permissions: UserPermissions,
}

// =============================================================================
// System Settings
// =============================================================================

/// Store-wide settings singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SystemSettings {
    pub store_name: String,
    pub currency: Currency,
    #[ts(type = "number")]
    pub low_stock_threshold: i64,
    #[ts(type = "number")]
    pub tax_rate: TaxRate,
}

impl Default for SystemSettings {
    fn default() -> Self {
        SystemSettings {
            store_name: crate::DEFAULT_STORE_NAME.to_string(),
            currency: Currency::Sar,
            low_stock_threshold: crate::DEFAULT_LOW_STOCK_THRESHOLD,
            tax_rate: TaxRate::from_bps(crate::DEFAULT_TAX_RATE_BPS),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
