//! Record store access.
//!
//! The record store keeps orders as raw JSON records, exactly as accepted
//! at the write boundary. Reads hand back raw records; shaping them is the
//! normalizer's job.

pub mod orders;

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

pub use orders::{InMemoryOrderStore, OrderStore};

/// Errors that can occur during record store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate id).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The store cannot be reached or its lock was poisoned.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Seed file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Seed file is not valid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read a seed file: a JSON array of raw order records.
///
/// # Errors
///
/// Returns `RepositoryError` if the file cannot be read, is not JSON, or is
/// not an array.
pub fn load_seed_file(path: &Path) -> Result<Vec<Value>, RepositoryError> {
    let contents = std::fs::read_to_string(path)?;
    match serde_json::from_str(&contents)? {
        Value::Array(records) => Ok(records),
        other => Err(RepositoryError::DataCorruption(format!(
            "seed file must hold a JSON array, found {}",
            if other.is_object() { "an object" } else { "a scalar" }
        ))),
    }
}
