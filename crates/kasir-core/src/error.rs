//! Domain errors.
//!
//! ```text
//! ValidationError ──► CoreError ──► kasir_db::DbError ──► ApiError (JSON)
//!   bad input          sold more       SQL failures         status code
//!                      than stocked
//! ```
//!
//! A `ValidationError` is always raised before anything is written; a
//! `CoreError::InsufficientStock` aborts the transaction it happens in.

use thiserror::Error;

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A variant has fewer units than a sale line (or a manual adjustment)
    /// takes out. `available` is the stock at the moment of the attempt,
    /// after any earlier lines of the same sale.
    ///
    /// ```text
    /// lines: Hitam ×3, Hitam ×3     stock: 5
    ///   line 1 ─► 5 - 3 = 2
    ///   line 2 ─► InsufficientStock { available: 2, requested: 3 }
    ///   ─► rollback, stock back to 5
    /// ```
    #[error("Insufficient stock for variant {variant}: available {available}, requested {requested}")]
    InsufficientStock {
        variant: String,
        available: i64,
        requested: i64,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Rejected input. Every variant names the offending field.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Quantities, page sizes.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Prices, stock, fee values.
    #[error("{field} must not be negative")]
    Negative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Same value twice in one request, e.g. two variants named "Hitam".
    #[error("{field} '{value}' is duplicated")]
    Duplicate { field: String, value: String },

    /// A computed amount does not fit in `i64` rupiah.
    #[error("{field} is too large to compute")]
    Overflow { field: String },
}

impl ValidationError {
    /// Name of the rejected field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::Negative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::Duplicate { field, .. }
            | ValidationError::Overflow { field } => field,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
