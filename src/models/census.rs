use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A single raw stem measurement from a field census.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeRecord {
    /// Species name as recorded in the field sheet
    #[serde(alias = "树种")]
    pub species: String,
    /// Diameter at breast height in centimetres
    #[serde(alias = "胸径")]
    pub dbh: f64,
}

impl TreeRecord {
    pub fn new(species: impl Into<String>, dbh: f64) -> Self {
        Self {
            species: species.into(),
            dbh,
        }
    }

    /// Validate the measurement. Returns `ModelError::ValidationError` on failure.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.species.trim().is_empty() {
            return Err(ModelError::ValidationError(format!(
                "Tree with DBH {}: species must not be empty",
                self.dbh
            )));
        }
        if !self.dbh.is_finite() {
            return Err(ModelError::ValidationError(format!(
                "Species '{}': DBH must be a finite number, got {}",
                self.species, self.dbh
            )));
        }
        Ok(())
    }
}

/// One (species, diameter class) cell of the classified population table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CensusRow {
    #[serde(alias = "树种")]
    pub species: String,
    /// Representative diameter of the class (the range label)
    #[serde(alias = "径阶")]
    pub diameter_class: u32,
    #[serde(alias = "株数")]
    pub stem_count: u64,
}

impl CensusRow {
    pub fn new(species: impl Into<String>, diameter_class: u32, stem_count: u64) -> Self {
        Self {
            species: species.into(),
            diameter_class,
            stem_count,
        }
    }
}

impl std::fmt::Display for CensusRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} @ {}: {} stems",
            self.species, self.diameter_class, self.stem_count
        )
    }
}
