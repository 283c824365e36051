//! Order record store.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use arrowhead_core::{OrderId, OrderItemId, OrderStatus, UserId};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::RepositoryError;

/// Create/read/update access to raw order records.
///
/// Records are stored and returned as raw JSON. Callers normalize on read.
pub trait OrderStore: Send + Sync {
    /// Every record, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store is unavailable.
    fn list(&self) -> Result<Vec<Value>, RepositoryError>;

    /// A single record by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store is unavailable.
    fn get(&self, id: &OrderId) -> Result<Option<Value>, RepositoryError>;

    /// Insert a new record. Assigns order and item ids where missing and
    /// stamps `createdAt`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id is taken.
    fn create(&self, record: Value) -> Result<Value, RepositoryError>;

    /// Replace a record, keeping its id and `createdAt`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no record has this id.
    fn replace(&self, id: &OrderId, record: Value) -> Result<Value, RepositoryError>;

    /// Set the stored status, stamping `packedAt`/`shippedAt` as needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no record has this id.
    fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<Value, RepositoryError>;

    /// Record the picker working the order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no record has this id.
    fn assign_picker(&self, id: &OrderId, picker_id: &UserId) -> Result<Value, RepositoryError>;

    /// Persist the outcome of a picking session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no record has this id.
    fn record_picks(
        &self,
        id: &OrderId,
        status: OrderStatus,
        picks: &[(OrderItemId, u32)],
    ) -> Result<Value, RepositoryError>;
}

/// Process-local record store.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    records: RwLock<Vec<Value>>,
}

impl InMemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing raw records. They are kept verbatim, malformed
    /// or not.
    #[must_use]
    pub fn with_records(records: Vec<Value>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Value>>, RepositoryError> {
        self.records
            .read()
            .map_err(|_| RepositoryError::Unavailable("order store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Value>>, RepositoryError> {
        self.records
            .write()
            .map_err(|_| RepositoryError::Unavailable("order store lock poisoned".to_string()))
    }

    fn update_with(
        &self,
        id: &OrderId,
        apply: impl FnOnce(&mut Map<String, Value>),
    ) -> Result<Value, RepositoryError> {
        let mut records = self.write()?;
        let fields = records
            .iter_mut()
            .find(|record| has_id(record, id))
            .and_then(Value::as_object_mut)
            .ok_or(RepositoryError::NotFound)?;
        apply(fields);
        fields.insert("updatedAt".to_string(), Value::from(now()));
        Ok(Value::Object(fields.clone()))
    }
}

impl OrderStore for InMemoryOrderStore {
    fn list(&self) -> Result<Vec<Value>, RepositoryError> {
        Ok(self.read()?.clone())
    }

    fn get(&self, id: &OrderId) -> Result<Option<Value>, RepositoryError> {
        Ok(self.read()?.iter().find(|record| has_id(record, id)).cloned())
    }

    fn create(&self, record: Value) -> Result<Value, RepositoryError> {
        let Value::Object(mut fields) = record else {
            return Err(RepositoryError::DataCorruption(
                "order record must be an object".to_string(),
            ));
        };

        let id = fields
            .get("id")
            .and_then(id_text)
            .map_or_else(|| OrderId::new(format!("ORD-{}", Uuid::new_v4().simple())), OrderId::new);

        let mut records = self.write()?;
        if records.iter().any(|existing| has_id(existing, &id)) {
            return Err(RepositoryError::Conflict(format!("order {id} already exists")));
        }

        fields.insert("id".to_string(), Value::from(id.as_str()));
        if fields.get("createdAt").is_none_or(Value::is_null) {
            fields.insert("createdAt".to_string(), Value::from(now()));
        }
        assign_item_ids(&mut fields, &id);

        let stored = Value::Object(fields);
        records.push(stored.clone());
        tracing::info!(order_id = %id, "Order created");
        Ok(stored)
    }

    fn replace(&self, id: &OrderId, record: Value) -> Result<Value, RepositoryError> {
        let Value::Object(mut incoming) = record else {
            return Err(RepositoryError::DataCorruption(
                "order record must be an object".to_string(),
            ));
        };
        let stored = self.update_with(id, |fields| {
            incoming.insert("id".to_string(), Value::from(id.as_str()));
            if let Some(created_at) = fields.get("createdAt") {
                incoming.insert("createdAt".to_string(), created_at.clone());
            }
            assign_item_ids(&mut incoming, id);
            *fields = incoming;
        })?;
        tracing::info!(order_id = %id, "Order replaced");
        Ok(stored)
    }

    fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<Value, RepositoryError> {
        self.update_with(id, |fields| {
            fields.insert("status".to_string(), Value::from(status.as_str()));
            let stamp = match status {
                OrderStatus::Packed => Some("packedAt"),
                OrderStatus::Shipped => Some("shippedAt"),
                _ => None,
            };
            if let Some(key) = stamp {
                fields.insert(key.to_string(), Value::from(now()));
            }
        })
    }

    fn assign_picker(&self, id: &OrderId, picker_id: &UserId) -> Result<Value, RepositoryError> {
        self.update_with(id, |fields| {
            fields.insert(
                "assignedPickerId".to_string(),
                Value::from(picker_id.as_str()),
            );
        })
    }

    fn record_picks(
        &self,
        id: &OrderId,
        status: OrderStatus,
        picks: &[(OrderItemId, u32)],
    ) -> Result<Value, RepositoryError> {
        self.update_with(id, |fields| {
            fields.insert("status".to_string(), Value::from(status.as_str()));
            let Some(Value::Array(items)) = fields.get_mut("items") else {
                return;
            };
            for item in items.iter_mut().filter_map(Value::as_object_mut) {
                let Some(item_id) = item.get("id").and_then(id_text) else {
                    continue;
                };
                if let Some((_, picked)) = picks.iter().find(|(pick_id, _)| pick_id.as_str() == item_id) {
                    item.insert("pickedQuantity".to_string(), Value::from(*picked));
                }
            }
        })
    }
}

fn assign_item_ids(fields: &mut Map<String, Value>, order_id: &OrderId) {
    let Some(Value::Array(items)) = fields.get_mut("items") else {
        return;
    };
    for item in items.iter_mut().filter_map(Value::as_object_mut) {
        if item.get("id").and_then(id_text).is_none() {
            item.insert("id".to_string(), Value::from(Uuid::new_v4().to_string()));
        }
        item.insert("orderId".to_string(), Value::from(order_id.as_str()));
    }
}

fn has_id(record: &Value, id: &OrderId) -> bool {
    record
        .get("id")
        .and_then(id_text)
        .is_some_and(|record_id| record_id == id.as_str())
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
