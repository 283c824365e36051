//! Offline validation of submission payloads.
//!
//! Applies the same rules as `POST /orders`, so a dump can be checked before
//! it is replayed against the server.

use std::path::Path;

use arrowhead_core::validation::validate_order;
use serde::Serialize;
use serde_json::Value;

use super::{CliError, emit, read_records};

/// Verdict for one payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadReport {
    pub index: usize,
    pub valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateReport {
    pub total: usize,
    pub rejected: usize,
    pub payloads: Vec<PayloadReport>,
}

/// Validate every payload.
#[must_use]
pub fn check(payloads: &[Value]) -> ValidateReport {
    let reports: Vec<PayloadReport> = payloads
        .iter()
        .enumerate()
        .map(|(index, payload)| {
            let result = validate_order(payload);
            PayloadReport {
                index,
                valid: result.valid,
                errors: result.errors,
            }
        })
        .collect();

    ValidateReport {
        total: reports.len(),
        rejected: reports.iter().filter(|report| !report.valid).count(),
        payloads: reports,
    }
}

/// Run `validate` on a file.
pub fn run(path: &Path) -> Result<(), CliError> {
    let report = check(&read_records(path)?);
    emit(&report)?;

    if report.rejected > 0 {
        return Err(CliError::Rejected(report.rejected));
    }
    tracing::info!(total = report.total, "All payloads valid");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::super::test_support::temp_json;
    use super::*;

    fn valid_payload() -> Value {
        json!({
            "customerName": "Ana Lima",
            "customerEmail": "ana@example.com",
            "customerPhone": "+55 11 5555-0100",
            "items": [{ "sku": "123456789012", "quantity": 1, "location": "A-01" }]
        })
    }

    #[test]
    fn test_check_collects_every_error() {
        let report = check(&[valid_payload(), json!({ "items": [] }), json!("nope")]);
        assert_eq!(report.total, 3);
        assert_eq!(report.rejected, 2);
        assert!(report.payloads[0].valid);
        assert!(report.payloads[0].errors.is_empty());
        assert!(report.payloads[1].errors.len() >= 2);
        assert!(!report.payloads[2].valid);
    }

    #[test]
    fn test_run_fails_on_rejection() {
        let path = temp_json(&json!([valid_payload(), {}]));
        assert!(matches!(run(&path), Err(CliError::Rejected(1))));
        std::fs::remove_file(path).unwrap();

        let path = temp_json(&json!([valid_payload()]));
        assert!(run(&path).is_ok());
        std::fs::remove_file(path).unwrap();
    }
}
