//! Offline normalization of stored records.
//!
//! Produces the exact `NormalizedOrder` list the dashboard would render.
//! Omitted records are reported alongside so a dump can be repaired.

use std::path::Path;

use arrowhead_core::NormalizedBatch;
use arrowhead_core::normalize::normalize_orders;

use super::{CliError, emit, read_records};

/// Run `normalize` on a file.
pub fn run(path: &Path, strict: bool) -> Result<(), CliError> {
    let batch: NormalizedBatch = normalize_orders(&read_records(path)?);
    emit(&batch)?;

    let omitted = batch.omitted.len();
    tracing::info!(
        normalized = batch.orders.len(),
        omitted,
        "Normalization finished"
    );
    if strict && omitted > 0 {
        return Err(CliError::Omitted(omitted));
    }
    Ok(())
}
