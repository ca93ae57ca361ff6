use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;
use crate::models::{CensusRow, TreeRecord};

/// Labels stop being generated once they pass this diameter.
pub const MAX_CLASS_LABEL: u32 = 100;

/// A half-open diameter interval `[min, max)` tagged with its class label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiameterRange {
    /// Lower bound of the class (inclusive)
    pub min: f64,
    /// Upper bound of the class (exclusive)
    pub max: f64,
    /// Representative diameter of the class
    pub label: u32,
}

impl DiameterRange {
    pub fn contains(&self, diameter: f64) -> bool {
        diameter >= self.min && diameter < self.max
    }
}

/// Build the ordered class ranges, stepping `min`, `max` and `label` by
/// `spacing` while `label <= 100`.
///
/// Termination depends on the label alone: the bounds are not checked
/// against the label, so callers must pick a start consistent with their
/// spacing.
pub fn build_diameter_ranges(
    min: f64,
    max: f64,
    label: u32,
    spacing: u32,
) -> Result<Vec<DiameterRange>, ModelError> {
    if spacing == 0 {
        return Err(ModelError::ValidationError(
            "Diameter class spacing must be positive".to_string(),
        ));
    }
    if !min.is_finite() || !max.is_finite() {
        return Err(ModelError::ValidationError(format!(
            "Diameter range bounds must be finite, got [{min}, {max})"
        )));
    }

    let step = f64::from(spacing);
    let mut ranges = Vec::new();
    let (mut min, mut max, mut label) = (min, max, label);
    while label <= MAX_CLASS_LABEL {
        ranges.push(DiameterRange { min, max, label });
        min += step;
        max += step;
        label = match label.checked_add(spacing) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(ranges)
}

/// Why a raw record did not make it into the classified census.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DropReason {
    /// The diameter is not inside any configured range.
    OutOfRange,
    /// The diameter is NaN or infinite.
    NotFinite,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::OutOfRange => write!(f, "out of range"),
            DropReason::NotFinite => write!(f, "not a number"),
        }
    }
}

/// A raw record left out of the classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedRecord {
    /// Position of the record in the input
    pub index: usize,
    pub species: String,
    pub dbh: f64,
    pub reason: DropReason,
}

/// Result of classifying a raw census.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classification {
    /// Every species × every range, zero-count classes included.
    pub rows: Vec<CensusRow>,
    pub dropped: Vec<DroppedRecord>,
}

impl Classification {
    pub fn total_stems(&self) -> u64 {
        self.rows.iter().map(|r| r.stem_count).sum()
    }

    pub fn num_species(&self) -> usize {
        let mut seen: Vec<&str> = self.rows.iter().map(|r| r.species.as_str()).collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }
}

/// Assign raw measurements to diameter classes.
///
/// A zero grid (species in first-seen order × ranges) is laid out before any
/// record is counted, so every species reports every class. The first range
/// whose `[min, max)` contains the diameter wins.
pub fn classify(records: &[TreeRecord], ranges: &[DiameterRange]) -> Classification {
    let mut grid: IndexMap<&str, Vec<u64>> = IndexMap::new();
    for record in records {
        grid.entry(record.species.as_str())
            .or_insert_with(|| vec![0; ranges.len()]);
    }

    let mut dropped = Vec::new();
    for (index, record) in records.iter().enumerate() {
        if !record.dbh.is_finite() {
            dropped.push(DroppedRecord {
                index,
                species: record.species.clone(),
                dbh: record.dbh,
                reason: DropReason::NotFinite,
            });
            continue;
        }
        match ranges.iter().position(|r| r.contains(record.dbh)) {
            Some(slot) => {
                if let Some(counts) = grid.get_mut(record.species.as_str()) {
                    counts[slot] += 1;
                }
            }
            None => {
                debug!(
                    species = %record.species,
                    dbh = record.dbh,
                    "diameter outside configured classes, record dropped"
                );
                dropped.push(DroppedRecord {
                    index,
                    species: record.species.clone(),
                    dbh: record.dbh,
                    reason: DropReason::OutOfRange,
                });
            }
        }
    }

    let rows = grid
        .into_iter()
        .flat_map(move |(species, counts)| {
            ranges
                .iter()
                .zip(counts)
                .map(move |(range, stem_count)| CensusRow::new(species, range.label, stem_count))
        })
        .collect();

    Classification { rows, dropped }
}
