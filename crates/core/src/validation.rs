//! Order payload validation.
//!
//! Validation collects every failing rule instead of stopping at the first
//! one, so a submission form can highlight all offending fields in a single
//! round trip. Failures are values ([`ValidationResult`], [`ValidationRejection`]),
//! not errors; the transport decides what to do with them.
//!
//! Defaults are injected exactly once, by [`accept_order`], and only on a
//! payload that passed validation.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{Email, OrderStatus, Priority, Sku};

/// Default `estimatedPickMinutes` injected at write time.
pub const DEFAULT_ESTIMATED_PICK_MINUTES: u32 = 10;
/// Default item name injected at write time.
pub const DEFAULT_ITEM_NAME: &str = "Unknown Item";
/// Default item location injected at write time.
pub const DEFAULT_ITEM_LOCATION: &str = "UNKNOWN";

/// Stable machine-readable code carried by every validation rejection.
pub const VALIDATION_ERROR_CODE: &str = "VAL_001";
/// Error kind carried by every validation rejection.
pub const VALIDATION_ERROR_KIND: &str = "ValidationError";

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-()]+$").expect("Invalid regex"));

/// Outcome of validating a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Convert a failed result into a transport-ready rejection.
    #[must_use]
    pub fn into_rejection(self, message: impl Into<String>) -> Option<ValidationRejection> {
        (!self.valid).then(|| ValidationRejection {
            message: message.into(),
            errors: self.errors,
        })
    }
}

/// A rejected payload: HTTP-style status 400, kind `ValidationError`, a
/// human message, and the full list of errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} ({} error(s))", errors.len())]
pub struct ValidationRejection {
    pub message: String,
    pub errors: Vec<String>,
}

impl ValidationRejection {
    /// HTTP-style status carried in the body.
    pub const STATUS: u16 = 400;
}

impl Serialize for ValidationRejection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Body<'a> {
            success: bool,
            status: u16,
            error: &'static str,
            code: &'static str,
            message: &'a str,
            errors: &'a [String],
        }

        Body {
            success: false,
            status: Self::STATUS,
            error: VALIDATION_ERROR_KIND,
            code: VALIDATION_ERROR_CODE,
            message: &self.message,
            errors: &self.errors,
        }
        .serialize(serializer)
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Validate a single order item.
#[must_use]
pub fn validate_order_item(item: &Value) -> ValidationResult {
    let Some(fields) = item.as_object() else {
        return ValidationResult::from_errors(vec!["item must be an object".to_string()]);
    };

    let mut errors = Vec::new();

    match present(fields, "sku") {
        None => errors.push("sku is required".to_string()),
        Some(Value::String(sku)) if Sku::is_valid(sku) => {}
        Some(Value::String(_)) => {
            errors.push("sku must be a 12-13 digit numeric string".to_string());
        }
        Some(_) => errors.push("sku must be a string".to_string()),
    }

    match present(fields, "barcode") {
        None => {}
        Some(Value::String(barcode)) if Sku::is_valid(barcode) => {}
        Some(_) => errors.push("barcode must be a 12-13 digit numeric string".to_string()),
    }

    match present(fields, "name") {
        None => {}
        Some(Value::String(name)) if !name.trim().is_empty() => {}
        Some(_) => errors.push("name cannot be empty".to_string()),
    }

    let quantity = match present(fields, "quantity") {
        None => {
            errors.push("quantity is required".to_string());
            None
        }
        Some(value) => match positive_integer(value) {
            Some(quantity) => Some(quantity),
            None => {
                errors.push("quantity must be a positive integer".to_string());
                None
            }
        },
    };

    for key in ["pickedQuantity", "packedQuantity"] {
        let Some(value) = present(fields, key) else {
            continue;
        };
        match non_negative_integer(value) {
            None => errors.push(format!("{key} must be a non-negative integer")),
            Some(count) if quantity.is_some_and(|quantity| count > quantity) => {
                errors.push(format!("{key} cannot exceed quantity"));
            }
            Some(_) => {}
        }
    }

    let location = present(fields, "location").or_else(|| present(fields, "binLocation"));
    match location {
        Some(Value::String(code)) if !code.trim().is_empty() => {}
        Some(Value::String(_)) | None => errors.push("location is required".to_string()),
        Some(_) => errors.push("location must be a string".to_string()),
    }

    ValidationResult::from_errors(errors)
}

/// Validate an order creation or full-update payload.
///
/// Item errors are prefixed with the item's 1-based position
/// (`"Item 2: sku is required"`).
#[must_use]
pub fn validate_order(order: &Value) -> ValidationResult {
    let Some(fields) = order.as_object() else {
        return ValidationResult::from_errors(vec!["order must be an object".to_string()]);
    };

    let mut errors = Vec::new();

    match present(fields, "customerName") {
        Some(Value::String(name)) if !name.trim().is_empty() => {}
        Some(Value::String(_)) | None => errors.push("customerName is required".to_string()),
        Some(_) => errors.push("customerName must be a string".to_string()),
    }

    match present(fields, "customerEmail") {
        None => errors.push("customerEmail is required".to_string()),
        Some(Value::String(email)) => {
            if let Err(e) = Email::parse(email) {
                errors.push(format!("customerEmail must be a valid email address: {e}"));
            }
        }
        Some(_) => errors.push("customerEmail must be a string".to_string()),
    }

    match present(fields, "customerPhone") {
        Some(Value::String(phone)) if phone.trim().is_empty() => {
            errors.push("customerPhone is required".to_string());
        }
        Some(Value::String(phone)) if PHONE_RE.is_match(phone.trim()) => {}
        Some(Value::String(_)) => {
            errors.push("customerPhone must be a valid phone number".to_string());
        }
        None => errors.push("customerPhone is required".to_string()),
        Some(_) => errors.push("customerPhone must be a string".to_string()),
    }

    if let Some(status) = present(fields, "status") {
        if !parses_as::<OrderStatus>(status) {
            errors.push(format!(
                "status must be one of: {}",
                join_names(OrderStatus::ALL.map(OrderStatus::as_str))
            ));
        }
    }

    if let Some(priority) = present(fields, "priority") {
        if !parses_as::<Priority>(priority) {
            errors.push(format!(
                "priority must be one of: {}",
                join_names(Priority::ALL.map(Priority::as_str))
            ));
        }
    }

    if let Some(minutes) = present(fields, "estimatedPickMinutes") {
        if !minutes.as_f64().is_some_and(|m| m.is_finite() && m >= 0.0) {
            errors.push("estimatedPickMinutes must be a non-negative number".to_string());
        }
    }

    match present(fields, "items") {
        None => errors.push("items is required".to_string()),
        Some(Value::Array(items)) if items.is_empty() => {
            errors.push("items must contain at least one item".to_string());
        }
        Some(Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                let position = index + 1;
                errors.extend(
                    validate_order_item(item)
                        .errors
                        .into_iter()
                        .map(|e| format!("Item {position}: {e}")),
                );
            }
        }
        Some(_) => errors.push("items must be an array".to_string()),
    }

    ValidationResult::from_errors(errors)
}

/// Validate a status-update body (`{ "status": "PACKED" }`).
#[must_use]
pub fn validate_status_update(body: &Value) -> ValidationResult {
    let status = body.as_object().and_then(|fields| present(fields, "status"));
    let errors = match status {
        None => vec!["status is required".to_string()],
        Some(status) if parses_as::<OrderStatus>(status) => Vec::new(),
        Some(_) => vec![format!(
            "status must be one of: {}",
            join_names(OrderStatus::ALL.map(OrderStatus::as_str))
        )],
    };
    ValidationResult::from_errors(errors)
}

// =============================================================================
// Boundary
// =============================================================================

/// Validate an order payload and, when valid, inject write-time defaults.
///
/// # Errors
///
/// Returns a [`ValidationRejection`] carrying every failing rule. A rejected
/// payload is never partially defaulted.
pub fn accept_order(payload: Value) -> Result<Value, ValidationRejection> {
    let result = validate_order(&payload);
    if let Some(rejection) = result.into_rejection("Invalid order data") {
        tracing::debug!(errors = rejection.errors.len(), "Order payload rejected");
        return Err(rejection);
    }
    Ok(apply_order_defaults(payload))
}

/// Validate a status-update body and return the requested status.
///
/// # Errors
///
/// Returns a [`ValidationRejection`] when `status` is missing or unknown.
pub fn accept_status_update(body: &Value) -> Result<OrderStatus, ValidationRejection> {
    let result = validate_status_update(body);
    if let Some(rejection) = result.into_rejection("Invalid status") {
        return Err(rejection);
    }
    body.get("status")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ValidationRejection {
            message: "Invalid status".to_string(),
            errors: vec!["status is required".to_string()],
        })
}

/// Inject write-time defaults into an already-validated payload.
///
/// Only absent (missing or `null`) fields are filled. Status and priority
/// are rewritten to their canonical upper-case names.
#[must_use]
pub fn apply_order_defaults(mut payload: Value) -> Value {
    let Some(fields) = payload.as_object_mut() else {
        return payload;
    };

    if present(fields, "estimatedPickMinutes").is_none() {
        fields.insert(
            "estimatedPickMinutes".to_string(),
            Value::from(DEFAULT_ESTIMATED_PICK_MINUTES),
        );
    }

    let status = present(fields, "status")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<OrderStatus>().ok())
        .unwrap_or_default();
    fields.insert("status".to_string(), Value::from(status.as_str()));

    let priority = present(fields, "priority")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Priority>().ok())
        .unwrap_or_default();
    fields.insert("priority".to_string(), Value::from(priority.as_str()));

    if let Some(Value::Array(items)) = fields.get_mut("items") {
        for item in items.iter_mut().filter_map(Value::as_object_mut) {
            apply_item_defaults(item);
        }
    }

    payload
}

fn apply_item_defaults(item: &mut Map<String, Value>) {
    for key in ["pickedQuantity", "packedQuantity"] {
        if present(item, key).is_none() {
            item.insert(key.to_string(), Value::from(0));
        }
    }

    if present(item, "name").is_none() {
        item.insert("name".to_string(), Value::from(DEFAULT_ITEM_NAME));
    }

    let location = present(item, "location")
        .or_else(|| present(item, "binLocation"))
        .and_then(Value::as_str)
        .map_or(DEFAULT_ITEM_LOCATION, str::trim)
        .to_string();
    item.insert("location".to_string(), Value::from(location.clone()));
    item.insert("binLocation".to_string(), Value::from(location));
}

// =============================================================================
// Helpers
// =============================================================================

/// Field value, treating `null` the same as a missing key.
fn present<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|value| !value.is_null())
}

fn parses_as<T: std::str::FromStr>(value: &Value) -> bool {
    value.as_str().is_some_and(|s| s.parse::<T>().is_ok())
}

fn join_names<const N: usize>(names: [&str; N]) -> String {
    names.join(", ")
}

/// Whole, non-negative JSON number (`3` or `3.0`).
fn non_negative_integer(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if !(f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < 2f64.powi(53)) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // checked whole and in range
    let n = f as u64;
    Some(n)
}

fn positive_integer(value: &Value) -> Option<u64> {
    non_negative_integer(value).filter(|n| *n > 0)
}
