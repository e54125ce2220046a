//! # Store Errors
//!
//! `sqlx` failures are classified once, here, so callers match on meaning
//! instead of SQLite message text.
//!
//! ```text
//! sqlx::Error
//!   RowNotFound                         ──► NotFound
//!   Database "UNIQUE constraint ..."    ──► UniqueViolation { field: table.column }
//!   Database "FOREIGN KEY constraint"   ──► ForeignKeyViolation
//!   Database (other)                    ──► QueryFailed
//!   PoolTimedOut                        ──► PoolExhausted
//!   PoolClosed / Io                     ──► ConnectionFailed
//!   anything else                       ──► Internal
//! ```
//!
//! The server turns these into `{code, message}` bodies; see
//! `linus_server::error`.

use thiserror::Error;

const UNIQUE_PREFIX: &str = "UNIQUE constraint failed: ";
const FOREIGN_KEY_MARKER: &str = "FOREIGN KEY constraint failed";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// `field` is the `table.column` SQLite reports. Repositories fill in
    /// `value` when they know it.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A guarded decrement matched no row: the product has less stock than
    /// the line sells.
    ///
    /// ```text
    /// stock = 3
    /// terminal A sells 2 ──► ok, stock = 1
    /// terminal B sells 2 ──► StockConflict, B's whole sale rolled back
    /// ```
    #[error("Insufficient stock for product {product_id} (requested {requested})")]
    StockConflict { product_id: String, requested: i64 },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A multi-statement write failed part way and was rolled back.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// A JSON column (held-invoice items) could not be encoded or decoded.
    #[error("Invalid stored data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// The store itself cannot serve requests (as opposed to a bad request).
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DbError::ConnectionFailed(_) | DbError::PoolExhausted | DbError::MigrationFailed(_)
        )
    }

    fn from_sqlite_message(msg: &str) -> Self {
        if let Some(field) = msg.strip_prefix(UNIQUE_PREFIX) {
            DbError::duplicate(field, "unknown")
        } else if msg.contains(FOREIGN_KEY_MARKER) {
            DbError::ForeignKeyViolation {
                message: msg.to_string(),
            }
        } else {
            DbError::QueryFailed(msg.to_string())
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => DbError::from_sqlite_message(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
