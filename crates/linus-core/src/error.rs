//! # Domain Errors
//!
//! Rule failures raised before anything is written. Each variant maps to
//! one client-facing code in the server:
//!
//! ```text
//! OutOfStock, CartNotEmpty                            ──► CONFLICT
//! EmptyCart, CartTooLarge, QuantityTooLarge,
//!   InvalidDiscount, Validation(_)                    ──► VALIDATION_ERROR
//! ProductNotFound, ItemNotInCart                      ──► NOT_FOUND
//! ```
//!
//! Credential and permission failures live in [`crate::auth::AuthError`].

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the cart, checkout and held-invoice
/// logic.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product has no stock left and cannot be added to the cart.
    ///
    /// ## User Workflow
    /// ```text
    /// Tap product (stock: 0)
    ///      │
    ///      ▼
    /// Cart::add_item → OutOfStock { product: "Milk" }
    ///      │
    ///      ▼
    /// Client shows: "Milk is out of stock"
    /// ```
    #[error("{product} is out of stock")]
    OutOfStock { product: String },

    /// The referenced line is not in the cart.
    #[error("Product {0} not in cart")]
    ItemNotInCart(String),

    /// Checkout or hold was attempted on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Restoring a held invoice would overwrite a non-empty cart and the
    /// caller did not confirm the override.
    #[error("Cart is not empty; confirm override to replace it")]
    CartNotEmpty,

    /// Cart has reached the maximum number of distinct lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Discount is negative or larger than the amount it applies to.
    #[error("Invalid discount: {reason}")]
    InvalidDiscount { reason: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any write so that no partial state change happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g. a date that is not YYYY-MM-DD).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// An amount that left the representable range.
    pub fn amount_overflow(field: impl Into<String>) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min: 0,
            max: i64::MAX,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::OutOfStock {
            product: "Milk".to_string(),
        };
        assert_eq!(err.to_string(), "Milk is out of stock");
        assert_eq!(CoreError::EmptyCart.to_string(), "Cart is empty");
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::required("barcode").to_string(),
            "barcode is required"
        );

        let err = ValidationError::OutOfRange {
            field: "taxRate".to_string(),
            min: 0,
            max: 1,
        };
        assert_eq!(err.to_string(), "taxRate must be between 0 and 1");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("name").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
