//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Integer Minor Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Accumulate exactly, round once                                         │
//! │                                                                         │
//! │  line totals:   1000 × 2 + 500 × 1 = 2500 minor units (exact)          │
//! │  tax (15%):     (2500 × 1500 + 5000) / 10000 = 375     (one rounding)  │
//! │  total:         2500 + 375 = 2875                      (exact)         │
//! │                                                                         │
//! │  Wire / display: 28.75                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every currency in [`Currency`](crate::types::Currency) has two decimal
//! places, so one minor unit is 1/100 of the displayed amount.
//!
//! ## Wire Format
//! `Money` serializes as a JSON number in major units (`28.75`), matching the
//! entity shapes the browser client expects. Deserialization rounds to the
//! nearest minor unit and rejects non-finite numbers.
//!
//! ```rust
//! use linus_core::money::Money;
//!
//! let price = Money::from_minor(1099);
//! let doubled = price * 2;
//! assert_eq!(doubled.to_string(), "21.98");
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor units (1/100 of the currency).
///
/// ## Where Money Flows
/// ```text
/// Product.price ──► CartItem.line_total ──► Totals.subtotal
///                                               │
///                                   calculate_tax(settings.tax_rate)
///                                               │
///                                               ▼
///                        Sale { subtotal, tax, discount, total }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from major and minor parts.
    ///
    /// ```rust
    /// use linus_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 99).minor(), 1099);
    /// assert_eq!(Money::from_major_minor(-5, 50).minor(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Converts a decimal amount in major units, rounding to the nearest
    /// minor unit. Returns `None` for NaN or infinite input.
    ///
    /// This is the only float entry point and exists for the JSON boundary.
    pub fn from_major(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        let minor = (amount * 100.0).round();
        if minor > i64::MAX as f64 || minor < i64::MIN as f64 {
            return None;
        }
        Some(Money(minor as i64))
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the whole major-unit part.
    #[inline]
    pub const fn major_part(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor part (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the amount as a float in major units (wire/display only).
    #[inline]
    pub fn as_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax on this amount with a single half-up rounding.
    ///
    /// Formula: `(amount × bps + 5000) / 10000`, computed in i128.
    ///
    /// ```rust
    /// use linus_core::money::Money;
    /// use linus_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_minor(2500);
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(1500));
    /// assert_eq!(tax.minor(), 375);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money(i64::try_from(tax).unwrap_or(if tax < 0 { i64::MIN } else { i64::MAX }))
    }

    /// Multiplies by a quantity, saturating at the `i64` bounds. Display
    /// only; totals go through [`Money::checked_mul_quantity`].
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `None` on overflow.
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Sums amounts, `None` if any step overflows.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain two-decimal amount without a currency symbol.
///
/// Use [`Currency::format`](crate::types::Currency::format) when a symbol is
/// wanted.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major_part().abs(), self.minor_part())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_major())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Money::from_major(amount)
            .ok_or_else(|| serde::de::Error::custom("amount must be a finite number"))
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
