//! Validating extractors for the order submission contract.
//!
//! A handler that takes [`ValidatedOrder`] only runs for payloads that pass
//! every rule, and receives them with write-time defaults already applied.
//! Anything else is answered with the full `400` error list.

use arrowhead_core::validation::{accept_order, accept_status_update};
use arrowhead_core::{OrderStatus, ValidationRejection};
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde_json::Value;

use crate::error::AppError;

/// A validated, defaulted order payload.
#[derive(Debug, Clone)]
pub struct ValidatedOrder(pub Value);

/// The target status of a validated status-update body.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedStatus(pub OrderStatus);

impl<S> FromRequest<S> for ValidatedOrder
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let payload = json_body(req, state, "Invalid order data").await?;
        Ok(Self(accept_order(payload)?))
    }
}

impl<S> FromRequest<S> for ValidatedStatus
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = json_body(req, state, "Invalid status").await?;
        Ok(Self(accept_status_update(&body)?))
    }
}

/// Read a JSON body. Unreadable bodies are reported in the same shape as
/// rule failures.
async fn json_body<S>(req: Request, state: &S, message: &str) -> Result<Value, AppError>
where
    S: Send + Sync,
{
    match Json::<Value>::from_request(req, state).await {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Unreadable request body");
            Err(AppError::Validation(ValidationRejection {
                message: message.to_string(),
                errors: vec![rejection.body_text()],
            }))
        }
    }
}
