mod csv_io;
mod json_io;
mod params_io;

use std::path::Path;

use crate::error::ModelError;
use crate::models::{CensusRow, TreeRecord};

pub use csv_io::{
    read_census_csv, read_census_csv_from_bytes, read_tree_records_csv,
    read_tree_records_csv_from_bytes, write_census_csv,
};
pub use json_io::{
    read_census_json, read_census_json_from_bytes, read_tree_records_json, write_census_json,
    write_json,
};
pub use params_io::{parse_parameter_store_json, parse_parameter_store_toml, read_parameter_store};

/// Trait for reading a classified census from a file.
pub trait CensusReader {
    fn read(&self, path: &Path) -> Result<Vec<CensusRow>, ModelError>;

    fn read_trees(&self, path: &Path) -> Result<Vec<TreeRecord>, ModelError>;
}

/// Trait for writing a classified census to a file.
pub trait CensusWriter {
    fn write(&self, rows: &[CensusRow], path: &Path) -> Result<(), ModelError>;
}

/// CSV format reader/writer.
pub struct CsvFormat;

impl CensusReader for CsvFormat {
    fn read(&self, path: &Path) -> Result<Vec<CensusRow>, ModelError> {
        read_census_csv(path)
    }

    fn read_trees(&self, path: &Path) -> Result<Vec<TreeRecord>, ModelError> {
        read_tree_records_csv(path)
    }
}

impl CensusWriter for CsvFormat {
    fn write(&self, rows: &[CensusRow], path: &Path) -> Result<(), ModelError> {
        write_census_csv(rows, path)
    }
}

/// JSON format reader/writer.
#[derive(Default)]
pub struct JsonFormat {
    pub pretty: bool,
}

impl CensusReader for JsonFormat {
    fn read(&self, path: &Path) -> Result<Vec<CensusRow>, ModelError> {
        read_census_json(path)
    }

    fn read_trees(&self, path: &Path) -> Result<Vec<TreeRecord>, ModelError> {
        read_tree_records_json(path)
    }
}

impl CensusWriter for JsonFormat {
    fn write(&self, rows: &[CensusRow], path: &Path) -> Result<(), ModelError> {
        write_census_json(rows, path, self.pretty)
    }
}

/// Pick a reader from a file extension (`csv` or `json`).
pub fn reader_for(path: &Path) -> Result<Box<dyn CensusReader>, ModelError> {
    match extension(path).as_str() {
        "csv" => Ok(Box::new(CsvFormat)),
        "json" => Ok(Box::new(JsonFormat::default())),
        other => Err(ModelError::ParseError(format!(
            "Unsupported input format: .{other}. Use .csv or .json"
        ))),
    }
}

/// Pick a writer from a file extension (`csv` or `json`).
pub fn writer_for(path: &Path, pretty: bool) -> Result<Box<dyn CensusWriter>, ModelError> {
    match extension(path).as_str() {
        "csv" => Ok(Box::new(CsvFormat)),
        "json" => Ok(Box::new(JsonFormat { pretty })),
        other => Err(ModelError::ParseError(format!(
            "Unsupported output format: .{other}. Use .csv or .json"
        ))),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
