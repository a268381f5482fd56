//! Database errors.
//!
//! Repositories return [`DbError`]. Stock and validation failures raised
//! inside a repository travel as [`DbError::Domain`] so callers can match the
//! original [`CoreError`] without string parsing.
//!
//! ```text
//! sqlx::Error ─┐
//!              ├──► DbError ──► ApiError (server)
//! CoreError ───┘
//! ```

use kasir_core::{CoreError, ValidationError};
use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A product code or marketplace name that already exists.
    ///
    /// Repositories re-raise it with the submitted value through
    /// [`DbError::duplicate`]; straight from SQLite only the column is known.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A row failed a schema `CHECK`, e.g. `stock >= 0`.
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Every connection stayed busy past the acquire timeout.
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

    pub fn insufficient_stock(variant: impl Into<String>, available: i64, requested: i64) -> Self {
        DbError::Domain(CoreError::InsufficientStock {
            variant: variant.into(),
            available,
            requested,
        })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// Classifies SQLite failures by constraint kind.
///
/// ```text
/// RowNotFound              → NotFound
/// UNIQUE / FOREIGN KEY     → UniqueViolation / ForeignKeyViolation
/// CHECK / NOT NULL         → CheckViolation
/// other database error     → QueryFailed
/// PoolTimedOut             → PoolExhausted
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    // "UNIQUE constraint failed: products.code"
                    ErrorKind::UniqueViolation => DbError::UniqueViolation {
                        field: unique_column(&message).to_string(),
                        value: "unknown".to_string(),
                    },
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                        DbError::CheckViolation { message }
                    }
                    _ => DbError::QueryFailed(message),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Column name out of SQLite's unique-constraint message.
fn unique_column(message: &str) -> &str {
    message
        .rsplit(": ")
        .next()
        .and_then(|cols| cols.split(", ").next())
        .and_then(|col| col.rsplit('.').next())
        .unwrap_or("unknown")
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_wraps_core_error() {
        let err = DbError::insufficient_stock("v-1", 3, 5);
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 3,
                requested: 5,
                ..
            })
        ));
        assert_eq!(
            err.to_string(),
            "Insufficient stock for variant v-1: available 3, requested 5"
        );
    }

    #[test]
    fn test_validation_error_converts() {
        let err: DbError = ValidationError::Required {
            field: "lines".to_string(),
        }
        .into();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[test]
    fn test_unique_column() {
        assert_eq!(unique_column("UNIQUE constraint failed: products.code"), "code");
        assert_eq!(
            unique_column("UNIQUE constraint failed: daily_summaries.marketplace, daily_summaries.date"),
            "marketplace"
        );
    }

    #[tokio::test]
    async fn test_check_constraint_is_classified() {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE t (stock INTEGER NOT NULL CHECK (stock >= 0))")
            .execute(&pool)
            .await
            .unwrap();

        let err: DbError = sqlx::query("INSERT INTO t (stock) VALUES (-1)")
            .execute(&pool)
            .await
            .unwrap_err()
            .into();

        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
