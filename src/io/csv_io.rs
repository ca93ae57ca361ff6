use std::io::Read;
use std::path::Path;

use crate::error::ModelError;
use crate::models::{CensusRow, TreeRecord};

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true).trim(csv::Trim::All);
    builder
}

fn parse_tree_records<R: Read>(rdr: &mut csv::Reader<R>) -> Result<Vec<TreeRecord>, ModelError> {
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: TreeRecord = result?;
        record.validate()?;
        records.push(record);
    }
    Ok(records)
}

fn parse_census_rows<R: Read>(rdr: &mut csv::Reader<R>) -> Result<Vec<CensusRow>, ModelError> {
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: CensusRow = result?;
        if row.species.is_empty() {
            return Err(ModelError::ValidationError(format!(
                "Census row for class {}: species must not be empty",
                row.diameter_class
            )));
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Read raw per-tree measurements (`species`, `dbh` columns) from a CSV file.
pub fn read_tree_records_csv(path: impl AsRef<Path>) -> Result<Vec<TreeRecord>, ModelError> {
    let mut rdr = reader_builder().from_path(path.as_ref())?;
    parse_tree_records(&mut rdr)
}

/// Read raw per-tree measurements from CSV bytes.
pub fn read_tree_records_csv_from_bytes(data: &[u8]) -> Result<Vec<TreeRecord>, ModelError> {
    let mut rdr = reader_builder().from_reader(data);
    parse_tree_records(&mut rdr)
}

/// Read a classified census (`species`, `diameter_class`, `stem_count`).
pub fn read_census_csv(path: impl AsRef<Path>) -> Result<Vec<CensusRow>, ModelError> {
    let mut rdr = reader_builder().from_path(path.as_ref())?;
    parse_census_rows(&mut rdr)
}

/// Read a classified census from CSV bytes.
pub fn read_census_csv_from_bytes(data: &[u8]) -> Result<Vec<CensusRow>, ModelError> {
    let mut rdr = reader_builder().from_reader(data);
    parse_census_rows(&mut rdr)
}

/// Write a classified census to a CSV file.
pub fn write_census_csv(rows: &[CensusRow], path: impl AsRef<Path>) -> Result<(), ModelError> {
    let mut wtr = csv::Writer::from_path(path.as_ref())?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
