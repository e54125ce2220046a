//! # API Error Type
//!
//! Unified error type for route handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Linus POS                              │
//! │                                                                         │
//! │  Handler -> Result<T, ApiError>                                         │
//! │     │                                                                   │
//! │     ├── CoreError  (cart, checkout, validation) ──┐                     │
//! │     ├── AuthError  (disabled, forbidden)  ────────┼──► ApiError ──► HTTP│
//! │     └── DbError    (not found, unique, stock) ────┘   {code, message}  │
//! │                                                                         │
//! │  Client:                                                                │
//! │    if (res.status === 403 && body.code === 'ACCOUNT_DISABLED') ...      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal details (SQL messages, hashing failures) are logged and replaced
//! with a generic message before reaching the client.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use linus_core::{AuthError, CoreError, ValidationError};
use linus_db::DbError;

use crate::config::ConfigError;

/// Error body returned by every failing endpoint.
///
/// ```json
/// { "code": "CONFLICT", "message": "username 'sara' already exists" }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip)]
    status: StatusCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Duplicate key or state that forbids the action (409)
    Conflict,

    /// Credentials matched an inactive account (403)
    AccountDisabled,

    /// Session lacks a permission (403)
    Forbidden,

    /// Missing or unknown session token (401)
    Unauthorized,

    /// Username/password did not match (401)
    InvalidCredentials,

    /// Sale commit rolled back (409 for stock, 500 otherwise)
    CommitFailed,

    /// Store unreachable (503)
    DatabaseError,

    /// Resource not found (404)
    NotFound,

    /// Anything else (500)
    Internal,
}

impl ErrorCode {
    pub const fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::AccountDisabled | ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Unauthorized | ErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorCode::CommitFailed | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::DatabaseError => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            status: code.status(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    pub fn unauthorized() -> Self {
        ApiError::new(ErrorCode::Unauthorized, "Missing or invalid session token")
    }

    pub fn invalid_credentials() -> Self {
        ApiError::new(ErrorCode::InvalidCredentials, "Invalid username or password")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Maps a failed sale commit.
    ///
    /// ```text
    /// StockConflict / NotFound ──► COMMIT_FAILED 409
    /// UniqueViolation          ──► CONFLICT      409
    /// store unreachable        ──► DATABASE_ERROR 503
    /// anything else            ──► COMMIT_FAILED 500
    /// ```
    pub fn commit_failed(err: DbError) -> Self {
        match err {
            DbError::StockConflict { .. } | DbError::NotFound { .. } => ApiError {
                code: ErrorCode::CommitFailed,
                message: format!("Sale was not recorded: {}", err),
                status: StatusCode::CONFLICT,
            },
            DbError::UniqueViolation { value, .. } => {
                ApiError::conflict(format!("Sale '{}' already exists", value))
            }
            e if e.is_unavailable() => ApiError::from(e),
            e => {
                error!(error = %e, "Sale commit failed");
                ApiError::new(ErrorCode::CommitFailed, "Sale was not recorded")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(code = ?self.code, message = %self.message, "Request failed");
        }
        (self.status, Json(self)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            e @ DbError::StockConflict { .. } => ApiError::commit_failed(e),
            DbError::ConnectionFailed(e) => {
                error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database unavailable")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::MigrationFailed(e) => {
                error!("Migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::TransactionFailed(e) => {
                error!("Transaction failed: {}", e);
                ApiError::internal("Database transaction failed")
            }
            DbError::QueryFailed(e) | DbError::Internal(e) => {
                error!("Database operation failed: {}", e);
                ApiError::internal("Database operation failed")
            }
            DbError::Serialization(e) => {
                error!("Stored data could not be decoded: {}", e);
                ApiError::internal("Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::ItemNotInCart(id) => ApiError::not_found("Cart item", &id),
            e @ (CoreError::OutOfStock { .. } | CoreError::CartNotEmpty) => {
                ApiError::conflict(e.to_string())
            }
            e @ (CoreError::EmptyCart
            | CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. }
            | CoreError::InvalidDiscount { .. }) => ApiError::validation(e.to_string()),
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AccountDisabled => {
                ApiError::new(ErrorCode::AccountDisabled, "Account disabled")
            }
            e @ AuthError::Forbidden(_) => ApiError::new(ErrorCode::Forbidden, e.to_string()),
            e @ AuthError::AdminImmutable => ApiError::conflict(e.to_string()),
            AuthError::Hashing(e) => {
                error!("Password hashing failed: {}", e);
                ApiError::internal("Password processing failed")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

// =============================================================================
// Startup Errors
// =============================================================================

/// Failures while bringing the server up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create data directory {path}: {source}")]
    DataDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}
