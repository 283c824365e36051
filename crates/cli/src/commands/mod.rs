//! Command implementations.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub mod normalize;
pub mod stats;
pub mod validate;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Input file could not be read or output could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Some payloads failed validation.
    #[error("{0} payload(s) rejected")]
    Rejected(usize),

    /// Some records were omitted under `--strict`.
    #[error("{0} record(s) omitted")]
    Omitted(usize),
}

/// Read a JSON file as a list of records. A lone object is a list of one.
pub fn read_records(path: &Path) -> Result<Vec<Value>, CliError> {
    let contents = std::fs::read_to_string(path)?;
    let records = match serde_json::from_str(&contents)? {
        Value::Array(records) => records,
        other => vec![other],
    };
    tracing::debug!(path = %path.display(), count = records.len(), "Records loaded");
    Ok(records)
}

/// Write a value to stdout as pretty JSON.
pub fn emit<T: Serialize>(value: &T) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use serde_json::Value;

    /// Write `value` to a unique temp file.
    pub fn temp_json(value: &Value) -> PathBuf {
        let path = std::env::temp_dir().join(format!("ah-cli-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, value.to_string()).unwrap();
        path
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::test_support::temp_json;
    use super::*;

    #[test]
    fn test_read_records_accepts_array_and_object() {
        let array = temp_json(&json!([{ "id": 1 }, { "id": 2 }]));
        assert_eq!(read_records(&array).unwrap().len(), 2);

        let single = temp_json(&json!({ "id": 1 }));
        assert_eq!(read_records(&single).unwrap().len(), 1);

        std::fs::remove_file(array).unwrap();
        std::fs::remove_file(single).unwrap();
    }

    #[test]
    fn test_read_records_rejects_bad_json() {
        let path = std::env::temp_dir().join(format!("ah-cli-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(read_records(&path), Err(CliError::Json(_))));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_read_records_missing_file() {
        assert!(matches!(
            read_records(Path::new("/nonexistent/orders.json")),
            Err(CliError::Io(_))
        ));
    }
}
