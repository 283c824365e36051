//! Defensive normalization of stored order records.
//!
//! Records coming back from the record store are not re-validated: fields may
//! be missing, either alias of the bin location may be used, dates may be
//! unparsable, and quantities may be out of range. Everything here turns such
//! a record into a [`NormalizedOrder`] without panicking.
//!
//! Batch normalization isolates each record. A malformed record is excluded
//! from [`NormalizedBatch::orders`] and reported in [`NormalizedBatch::omitted`]
//! so callers can decide whether to surface the omission.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::order::{NormalizedOrder, OrderItem};
use crate::types::{
    BinLocation, OrderId, OrderItemId, OrderStatus, PickEstimate, Priority, ProductId, SiteId,
    UserId,
};

/// Customer name used when a stored record has none.
pub const UNKNOWN_CUSTOMER: &str = "Unknown Customer";
/// Item name used when a stored record has none.
pub const UNKNOWN_ITEM: &str = "Unknown Item";
/// Text shown for an order without a pick estimate.
pub const NOT_ESTIMATED: &str = "Not estimated";

/// Why a record could not be normalized or was excluded from a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizationError {
    /// The record itself was absent (`null` or missing).
    #[error("{0} record is absent")]
    Absent(&'static str),
    /// The record was not a JSON object.
    #[error("{0} record is not an object")]
    NotAnObject(&'static str),
    /// The normalized order has no id.
    #[error("order is missing an id")]
    MissingId,
    /// The stored status is not a known order status.
    #[error("order has unknown status {0:?}")]
    UnknownStatus(String),
    /// The normalized order has no items.
    #[error("order has no items")]
    NoItems,
}

impl Serialize for NormalizationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A record excluded from a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Omission {
    /// Position of the record in the input.
    pub index: usize,
    /// The record's id, when one could be read.
    pub order_id: Option<String>,
    pub reason: NormalizationError,
}

/// Result of normalizing a batch of stored records.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NormalizedBatch {
    /// Valid orders, in input order.
    pub orders: Vec<NormalizedOrder>,
    /// Records that were dropped, with the reason.
    pub omitted: Vec<Omission>,
}

// =============================================================================
// Items
// =============================================================================

/// Normalize a single stored order item.
///
/// Fills every optional field with its fallback, falls back to the SKU for
/// a missing barcode, and resolves the `location`/`binLocation` aliases into
/// one bin location. Picked and packed quantities are clamped to
/// `0..=quantity`.
///
/// # Errors
///
/// Returns [`NormalizationError::Absent`] for a missing or `null` item and
/// [`NormalizationError::NotAnObject`] for any other non-object value.
pub fn normalize_order_item(item: Option<&Value>) -> Result<OrderItem, NormalizationError> {
    let fields = match item {
        None | Some(Value::Null) => {
            error!("normalize_order_item: received absent item");
            return Err(NormalizationError::Absent("order item"));
        }
        Some(Value::Object(fields)) => fields,
        Some(other) => {
            error!(kind = json_kind(other), "normalize_order_item: item is not an object");
            return Err(NormalizationError::NotAnObject("order item"));
        }
    };

    let id = text(fields, "id").map(OrderItemId::from);
    let sku = text(fields, "sku").unwrap_or_default();
    let barcode = text(fields, "barcode").unwrap_or_else(|| sku.clone());
    let quantity = count(fields, "quantity").unwrap_or(0);
    let picked_quantity = clamped(fields, "pickedQuantity", quantity, id.as_ref());
    let packed_quantity = clamped(fields, "packedQuantity", quantity, id.as_ref());

    let location = text(fields, "location").or_else(|| text(fields, "binLocation"));
    let bin_location = BinLocation::from_raw(location.as_deref());
    if !bin_location.is_known() {
        debug!(item_id = ?id, "Missing bin location for item");
    }

    Ok(OrderItem {
        id,
        order_id: text(fields, "orderId").map(OrderId::from),
        product_id: text(fields, "productId").map(ProductId::from),
        sku,
        barcode,
        name: text(fields, "name").unwrap_or_else(|| UNKNOWN_ITEM.to_string()),
        quantity,
        picked_quantity,
        packed_quantity,
        bin_location,
    })
}

fn clamped(fields: &Map<String, Value>, key: &str, quantity: u32, id: Option<&OrderItemId>) -> u32 {
    let value = count(fields, key).unwrap_or(0);
    if value > quantity {
        warn!(item_id = ?id, field = key, value, quantity, "Clamping quantity above target");
        quantity
    } else {
        value
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Normalize a single stored order.
///
/// Absent items inside the order are skipped (and logged). `totalItems` is
/// the sum of the defaulted item quantities. A missing status reads as
/// `PENDING`; an unrecognized one reads as `None` so that
/// [`is_valid_order`] rejects it.
///
/// # Errors
///
/// Returns [`NormalizationError::Absent`] for a missing or `null` order and
/// [`NormalizationError::NotAnObject`] for any other non-object value.
pub fn normalize_order(order: Option<&Value>) -> Result<NormalizedOrder, NormalizationError> {
    let fields = match order {
        None | Some(Value::Null) => {
            error!("normalize_order: received absent order");
            return Err(NormalizationError::Absent("order"));
        }
        Some(Value::Object(fields)) => fields,
        Some(other) => {
            error!(kind = json_kind(other), "normalize_order: order is not an object");
            return Err(NormalizationError::NotAnObject("order"));
        }
    };

    let id = text(fields, "id").map(OrderId::from);

    let items: Vec<OrderItem> = match fields.get("items") {
        Some(Value::Array(raw)) => raw
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match normalize_order_item(Some(item)) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(order_id = ?id, index, error = %e, "Skipping malformed order item");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    };

    let total_items = items
        .iter()
        .fold(0u32, |sum, item| sum.saturating_add(item.quantity));

    let status = match text(fields, "status") {
        None => Some(OrderStatus::Pending),
        Some(raw) => raw.parse().ok(),
    };

    let priority = text(fields, "priority").map_or(Priority::Normal, |raw| {
        raw.parse().unwrap_or_else(|_| {
            debug!(order_id = ?id, priority = %raw, "Unknown priority, using NORMAL");
            Priority::Normal
        })
    });

    Ok(NormalizedOrder {
        id,
        customer_name: text(fields, "customerName").unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string()),
        customer_email: text(fields, "customerEmail"),
        customer_phone: text(fields, "customerPhone"),
        status,
        priority,
        site_id: text(fields, "siteId").map(SiteId::from),
        items,
        created_at: date(fields, "createdAt"),
        due_date: date(fields, "dueDate"),
        estimated_pick_minutes: fields
            .get("estimatedPickMinutes")
            .map_or(PickEstimate::NotEstimated, pick_estimate),
        required_by: date(fields, "requiredBy"),
        assigned_picker_id: text(fields, "assignedPickerId").map(UserId::from),
        assigned_packer_id: text(fields, "assignedPackerId").map(UserId::from),
        shipping_address: fields
            .get("shippingAddress")
            .filter(|address| address.is_object())
            .cloned(),
        package_type: text(fields, "packageType"),
        tracking_number: text(fields, "trackingNumber"),
        packed_at: date(fields, "packedAt"),
        shipped_at: date(fields, "shippedAt"),
        notes: text(fields, "notes"),
        total_items,
    })
}

/// Post-normalization sanity check for an order: non-empty id, known
/// status, and at least one item.
#[must_use]
pub fn is_valid_order(order: &NormalizedOrder) -> bool {
    order_problem(order, None).is_none()
}

/// Post-normalization sanity check for an item: non-empty id and SKU, a
/// positive quantity, and a resolved bin location.
///
/// Batches keep items that fail this check so that the order stays visible.
/// Consumers use it to flag items a picker cannot work, as the picking claim
/// does.
#[must_use]
pub fn is_valid_order_item(item: &OrderItem) -> bool {
    item.id.as_ref().is_some_and(|id| !id.as_str().is_empty())
        && !item.sku.is_empty()
        && item.quantity > 0
        && item.bin_location.is_known()
}

fn order_problem(order: &NormalizedOrder, raw: Option<&Value>) -> Option<NormalizationError> {
    if order.id.as_ref().is_none_or(|id| id.as_str().is_empty()) {
        return Some(NormalizationError::MissingId);
    }
    if order.status.is_none() {
        let raw_status = raw
            .and_then(|raw| raw.get("status"))
            .map_or_else(String::new, |status| match status {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        return Some(NormalizationError::UnknownStatus(raw_status));
    }
    if order.items.is_empty() {
        return Some(NormalizationError::NoItems);
    }
    None
}

/// Normalize one record of a batch, folding the post-normalization check
/// into the result.
///
/// # Errors
///
/// Returns the reason the record cannot be part of a listing.
pub fn normalize_record(raw: &Value) -> Result<NormalizedOrder, NormalizationError> {
    let order = normalize_order(Some(raw))?;
    match order_problem(&order, Some(raw)) {
        Some(problem) => Err(problem),
        None => Ok(order),
    }
}

/// Normalize a batch of stored records.
///
/// Each record is normalized in isolation; records that fail are excluded
/// from `orders` and reported in `omitted`. The output is idempotent:
/// normalizing the JSON form of `orders` again yields the same orders.
#[must_use]
pub fn normalize_orders(raw_orders: &[Value]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for (index, raw) in raw_orders.iter().enumerate() {
        match normalize_record(raw) {
            Ok(order) => batch.orders.push(order),
            Err(reason) => {
                let order_id = raw.get("id").and_then(id_text);
                warn!(index, order_id = ?order_id, reason = %reason, "Omitting order from batch");
                batch.omitted.push(Omission {
                    index,
                    order_id,
                    reason,
                });
            }
        }
    }

    if !batch.omitted.is_empty() {
        warn!(
            kept = batch.orders.len(),
            omitted = batch.omitted.len(),
            "Batch normalization dropped records"
        );
    }

    batch
}

// =============================================================================
// Formatting helpers
// =============================================================================

/// Parse a stored date value.
///
/// Accepts RFC 3339 strings, naive `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC),
/// plain `YYYY-MM-DD`, and epoch milliseconds. Anything else yields `None`,
/// as does any instant outside years 0 through 9999, which RFC 3339 cannot
/// write back.
#[must_use]
pub fn format_date(value: &Value) -> Option<DateTime<Utc>> {
    let parsed = match value {
        Value::String(raw) => parse_date_text(raw.trim()),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }?;
    (0..=9999).contains(&parsed.year()).then_some(parsed)
}

fn parse_date_text(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// Render a pick estimate as `H:MM`, or `"Not estimated"` when absent.
#[must_use]
pub fn format_estimated_time(estimate: PickEstimate) -> String {
    match estimate {
        PickEstimate::Estimated(minutes) => format!("{}:{:02}", minutes / 60, minutes % 60),
        PickEstimate::NotEstimated => NOT_ESTIMATED.to_string(),
    }
}

/// Read a stored `estimatedPickMinutes` value. Non-numeric and negative
/// values read as not estimated; fractional minutes are rounded.
#[must_use]
pub fn pick_estimate(value: &Value) -> PickEstimate {
    match value.as_f64() {
        Some(minutes) if minutes.is_finite() && minutes >= 0.0 => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped below
            let minutes = minutes.round().min(f64::from(u32::MAX)) as u32;
            PickEstimate::Estimated(minutes)
        }
        _ => PickEstimate::NotEstimated,
    }
}

// =============================================================================
// Field access
// =============================================================================

/// Non-blank text field; numbers are accepted and rendered as text.
fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(id_text)
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-negative whole count; anything else reads as absent.
fn count(fields: &Map<String, Value>, key: &str) -> Option<u32> {
    let value = fields.get(key)?;
    if let Some(n) = value.as_u64() {
        return Some(u32::try_from(n).unwrap_or(u32::MAX));
    }
    let f = value.as_f64()?;
    if !(f.is_finite() && f >= 0.0) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped below
    let n = f.floor().min(f64::from(u32::MAX)) as u32;
    Some(n)
}

fn date(fields: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    let value = fields.get(key)?;
    let parsed = format_date(value);
    if parsed.is_none() && !value.is_null() {
        debug!(field = key, value = %value, "Unparsable date treated as absent");
    }
    parsed
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
