//! Error types for the HTTP API.
//!
//! Every failure leaves the server as `{"code": "...", "message": "..."}`.
//!
//! | Source                                   | Status | code                 |
//! |------------------------------------------|--------|----------------------|
//! | `DbError::NotFound`                      | 404    | `not_found`          |
//! | validation, duplicate value, CHECK       | 400    | `invalid_request`    |
//! | `CoreError::InsufficientStock`           | 409    | `insufficient_stock` |
//! | foreign key violation                    | 409    | `conflict`           |
//! | anything else                            | 500    | `internal`           |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use kasir_core::{CoreError, ValidationError};
use kasir_db::DbError;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    InsufficientStock(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InsufficientStock(_) | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::InsufficientStock(_) => "insufficient_stock",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound { .. } => ApiError::NotFound(error.to_string()),
            DbError::UniqueViolation { .. } | DbError::CheckViolation { .. } => {
                ApiError::InvalidRequest(error.to_string())
            }
            DbError::ForeignKeyViolation { .. } => ApiError::Conflict(error.to_string()),
            DbError::Domain(core) => core.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::InsufficientStock { .. } => ApiError::InsufficientStock(error.to_string()),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        tracing::debug!(field = error.field(), "Rejected input");
        ApiError::InvalidRequest(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match self {
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "Internal error");
                "Internal server error".to_string()
            }
            ApiError::NotFound(msg)
            | ApiError::InvalidRequest(msg)
            | ApiError::InsufficientStock(msg)
            | ApiError::Conflict(msg) => msg,
        };

        (status, Json(ErrorBody { code, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::not_found("Product", "p-1").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = DbError::duplicate("code", "GMS-01").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = DbError::insufficient_stock("v-1", 3, 5).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "insufficient_stock");

        let err: ApiError = DbError::QueryFailed("disk I/O error".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_is_bad_request() {
        let err: ApiError = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid request: quantity must be positive");
    }
}
