//! Unified error handling for the server.
//!
//! Every error response carries a stable code:
//!
//! | Code       | Status | Meaning                          |
//! |------------|--------|----------------------------------|
//! | `VAL_001`  | 400    | Payload failed validation        |
//! | `ORD_001`  | 404    | Order not found                  |
//! | `ORD_002`  | 400    | Status change not allowed        |
//! | `ORD_002`  | 422    | Order unusable for picking       |
//! | `PICK_001` | 404    | No matching picking session      |
//! | `PICK_005` | 409    | Order already claimed by a picker|
//! | `DB_001`   | 503    | Record store unavailable         |
//! | `DB_004`   | 409    | Duplicate order id               |
//! | `SYS_001`  | 500    | Internal error                   |

use arrowhead_core::picking::GuardViolation;
use arrowhead_core::{OrderId, ValidationRejection};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::SessionError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Payload failed validation; carries every failing rule.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationRejection),

    /// Record store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),

    /// Picking session error.
    #[error("Picking error: {0}")]
    Session(#[from] SessionError),

    /// No such order, or the stored record is too malformed to use.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Lifecycle guard rejected a status change.
    #[error("Invalid status change: {0}")]
    InvalidTransition(GuardViolation),

    /// Status changes are locked while a picker holds the order.
    #[error("Order {0} is being picked")]
    OrderLocked(OrderId),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    code: &'static str,
    message: String,
}

impl AppError {
    /// HTTP status, error kind, and stable code.
    const fn classify(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError", "VAL_001"),
            Self::Store(RepositoryError::NotFound)
            | Self::Session(SessionError::Persist(RepositoryError::NotFound))
            | Self::OrderNotFound(_) => (StatusCode::NOT_FOUND, "NotFound", "ORD_001"),
            Self::Store(RepositoryError::Conflict(_))
            | Self::Session(SessionError::Persist(RepositoryError::Conflict(_))) => {
                (StatusCode::CONFLICT, "Conflict", "DB_004")
            }
            Self::Store(RepositoryError::Unavailable(_))
            | Self::Session(SessionError::Persist(RepositoryError::Unavailable(_))) => {
                (StatusCode::SERVICE_UNAVAILABLE, "ServiceUnavailable", "DB_001")
            }
            Self::Store(_) | Self::Session(SessionError::Persist(_)) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalError", "SYS_001")
            }
            Self::InvalidTransition(_) | Self::Session(SessionError::NotPickable { .. }) => {
                (StatusCode::BAD_REQUEST, "InvalidStatus", "ORD_002")
            }
            Self::Session(SessionError::InvalidOrder(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "InvalidOrder", "ORD_002")
            }
            Self::Session(SessionError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NotFound", "PICK_001")
            }
            Self::Session(SessionError::AlreadyClaimed { .. }) | Self::OrderLocked(_) => {
                (StatusCode::CONFLICT, "Conflict", "PICK_005")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, code) = self.classify();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        if let Self::Validation(rejection) = self {
            return (status, Json(rejection)).into_response();
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            success: false,
            error,
            code,
            message,
        };
        (status, Json(body)).into_response()
    }
}
