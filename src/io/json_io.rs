use std::path::Path;

use serde::Serialize;

use crate::error::ModelError;
use crate::models::{CensusRow, TreeRecord};

fn utf8(data: &[u8]) -> Result<&str, ModelError> {
    std::str::from_utf8(data).map_err(|e| ModelError::ParseError(format!("Invalid UTF-8: {e}")))
}

/// Read a classified census from a JSON array of rows.
pub fn read_census_json(path: impl AsRef<Path>) -> Result<Vec<CensusRow>, ModelError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&content)?)
}

/// Read a classified census from JSON bytes.
pub fn read_census_json_from_bytes(data: &[u8]) -> Result<Vec<CensusRow>, ModelError> {
    Ok(serde_json::from_str(utf8(data)?)?)
}

/// Read raw per-tree measurements from a JSON array.
pub fn read_tree_records_json(path: impl AsRef<Path>) -> Result<Vec<TreeRecord>, ModelError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let records: Vec<TreeRecord> = serde_json::from_str(&content)?;
    for record in &records {
        record.validate()?;
    }
    Ok(records)
}

/// Write any serializable value (census rows, a full transition result) as JSON.
pub fn write_json<T: Serialize + ?Sized>(
    value: &T,
    path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), ModelError> {
    let content = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    std::fs::write(path.as_ref(), content)?;
    Ok(())
}

/// Write a classified census as a JSON array.
pub fn write_census_json(
    rows: &[CensusRow],
    path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), ModelError> {
    write_json(rows, path, pretty)
}
