//! Error types for the API server.
//!
//! Every failure a handler can produce maps to exactly one HTTP status and
//! a JSON body of the form `{"message": "..."}` (plus diagnostic fields for
//! the redemption errors). Services return `ApiError` directly; the lower
//! layers' errors convert via the `From` impls at the bottom.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::error;

use bazario_core::error::{DiscountError, ValidationError};
use bazario_core::Money;
use bazario_db::DbError;

use crate::display::format_ist;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// The voucher has already been redeemed; carries the redemption
    /// instant so the merchant sees when it happened.
    #[error("Voucher has already been redeemed")]
    AlreadyRedeemed { redeemed_at: Option<DateTime<Utc>> },

    /// The voucher expired before this request.
    #[error("Voucher has expired")]
    Expired { expiry_date: DateTime<Utc> },

    #[error("Cart total {cart_total} is below the minimum purchase amount {minimum}")]
    BelowMinimum { minimum: Money, cart_total: Money },

    #[error("Voucher does not apply to any item in this cart")]
    NotApplicable,

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_)
            | ApiError::AlreadyRedeemed { .. }
            | ApiError::Expired { .. }
            | ApiError::BelowMinimum { .. }
            | ApiError::NotApplicable => StatusCode::BAD_REQUEST,
            ApiError::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(%self, "Request failed");
        }

        let body = match &self {
            ApiError::AlreadyRedeemed { redeemed_at } => json!({
                "message": self.to_string(),
                "redeemed_at": redeemed_at.map(format_ist),
            }),
            ApiError::Expired { expiry_date } => json!({
                "message": self.to_string(),
                "expiry_date": format_ist(*expiry_date),
            }),
            // Never leak internal details to clients
            ApiError::Internal(_) => json!({
                "message": "Internal server error",
            }),
            _ => json!({
                "message": self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{entity} not found: {id}"))
            }
            DbError::UniqueViolation { field, .. } => {
                ApiError::Conflict(format!("{field} already exists"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::InvalidArgument(error.to_string())
    }
}

impl From<DiscountError> for ApiError {
    fn from(error: DiscountError) -> Self {
        match error {
            DiscountError::BelowMinimum {
                minimum,
                cart_total,
            } => ApiError::BelowMinimum {
                minimum,
                cart_total,
            },
            DiscountError::NotApplicable => ApiError::NotApplicable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::InvalidArgument("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::AuthFailed("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::AlreadyRedeemed { redeemed_at: None }.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_discount_error_conversion() {
        let err: ApiError = DiscountError::NotApplicable.into();
        assert!(matches!(err, ApiError::NotApplicable));
    }
}
