//! Canonical in-memory orders.
//!
//! These are the shapes every renderer and the picking state machine consume.
//! They are produced only by [`crate::normalize`]; nothing here talks to the
//! record store.
//!
//! Absent optional fields serialize as `null`, never as a missing key.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::types::{
    BinLocation, OrderId, OrderItemId, OrderStatus, PickEstimate, Priority, ProductId, SiteId,
    UserId,
};

/// One SKU line of a normalized order.
///
/// Holds a single `bin_location`; the `location`/`binLocation` alias pair
/// only appears in the JSON form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: Option<OrderItemId>,
    pub order_id: Option<OrderId>,
    pub product_id: Option<ProductId>,
    /// Empty when the stored record had no SKU.
    pub sku: String,
    /// Scannable code; the SKU when the record had no barcode.
    pub barcode: String,
    pub name: String,
    /// Target quantity to pick.
    pub quantity: u32,
    /// Always within `0..=quantity`.
    pub picked_quantity: u32,
    /// Always within `0..=quantity`.
    pub packed_quantity: u32,
    pub bin_location: BinLocation,
}

impl OrderItem {
    /// Whether the item has been picked in full.
    #[must_use]
    pub const fn is_picked(&self) -> bool {
        self.quantity > 0 && self.picked_quantity >= self.quantity
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderItemJson<'a> {
    id: Option<&'a OrderItemId>,
    order_id: Option<&'a OrderId>,
    product_id: Option<&'a ProductId>,
    sku: &'a str,
    barcode: &'a str,
    name: &'a str,
    quantity: u32,
    picked_quantity: u32,
    packed_quantity: u32,
    location: &'a BinLocation,
    bin_location: &'a BinLocation,
}

impl Serialize for OrderItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OrderItemJson {
            id: self.id.as_ref(),
            order_id: self.order_id.as_ref(),
            product_id: self.product_id.as_ref(),
            sku: &self.sku,
            barcode: &self.barcode,
            name: &self.name,
            quantity: self.quantity,
            picked_quantity: self.picked_quantity,
            packed_quantity: self.packed_quantity,
            location: &self.bin_location,
            bin_location: &self.bin_location,
        }
        .serialize(serializer)
    }
}

/// A canonical, safe-to-render order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedOrder {
    pub id: Option<OrderId>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    /// `None` when the stored status was not a known status.
    pub status: Option<OrderStatus>,
    pub priority: Priority,
    pub site_id: Option<SiteId>,
    pub items: Vec<OrderItem>,
    pub created_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_pick_minutes: PickEstimate,
    pub required_by: Option<DateTime<Utc>>,
    pub assigned_picker_id: Option<UserId>,
    pub assigned_packer_id: Option<UserId>,
    pub shipping_address: Option<Value>,
    pub package_type: Option<String>,
    pub tracking_number: Option<String>,
    pub packed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// Sum of item quantities. Derived on every normalization.
    pub total_items: u32,
}

impl NormalizedOrder {
    /// Look up an item by id.
    #[must_use]
    pub fn item(&self, id: &OrderItemId) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id.as_ref() == Some(id))
    }

    /// Sum of picked quantities across items.
    #[must_use]
    pub fn total_picked(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |sum, item| sum.saturating_add(item.picked_quantity))
    }
}
