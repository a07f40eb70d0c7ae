//! # Persistence Errors
//!
//! What can go wrong between a repository call and SQLite.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error ───────► From<sqlx::Error> ──┐                             │
//! │                       (constraint kind)   │                             │
//! │                                           ▼                             │
//! │  CoreError ─────────► DbError::Domain ──► DbError ──► ApiError          │
//! │  (raised mid-transaction;                           (market app)        │
//! │   the transaction is dropped, so it rolls back)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use course_core::CoreError;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Failure of a `course-db` operation.
#[derive(Debug, Error)]
pub enum DbError {
    /// A row looked up by key does not exist.
    #[error("No {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write.
    ///
    /// `field` carries SQLite's `<table>.<column>` list, e.g.
    /// `accounts.email` or `carts.buyer_id, carts.course_id`.
    #[error("{field} already holds '{value}'")]
    UniqueViolation { field: String, value: String },

    /// A row referenced an account, course or snapshot that is not there.
    #[error("Dangling reference: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Cannot reach the market database: {0}")]
    ConnectionFailed(String),

    #[error("Schema migration failed: {0}")]
    MigrationFailed(String),

    #[error("Statement rejected: {0}")]
    QueryFailed(String),

    /// `begin` or `commit` failed.
    #[error("Transaction aborted: {0}")]
    TransactionFailed(String),

    #[error("Timed out waiting for a pooled connection")]
    PoolExhausted,

    /// A checkout rule failed while a transaction was open.
    ///
    /// Raised by `place_order` (course missing from the cart, course with
    /// no snapshot) and `pay_order` (order unknown or already paid).
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("Unexpected database failure: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Columns named in `UNIQUE constraint failed: accounts.username`.
fn unique_columns(message: &str) -> String {
    message
        .split_once(": ")
        .map(|(_, columns)| columns.to_string())
        .unwrap_or_else(|| message.to_string())
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("row", "?"),

            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation => DbError::UniqueViolation {
                    field: unique_columns(db_err.message()),
                    value: String::new(),
                },
                ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
                    message: db_err.message().to_string(),
                },
                _ => DbError::QueryFailed(db_err.message().to_string()),
            },

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_columns() {
        assert_eq!(
            unique_columns("UNIQUE constraint failed: accounts.username"),
            "accounts.username"
        );
        assert_eq!(
            unique_columns("UNIQUE constraint failed: carts.buyer_id, carts.course_id"),
            "carts.buyer_id, carts.course_id"
        );
    }

    #[test]
    fn test_missing_row() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_pool_timeout() {
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::PoolExhausted));
    }

    #[test]
    fn test_domain_error_is_transparent() {
        let err: DbError = CoreError::OrderNotPayable(12).into();
        assert_eq!(err.to_string(), "Order 12 does not exist or is already paid");
    }
}
