use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::CensusRow;

/// Square metres in one hectare.
pub const SQ_M_PER_HECTARE: f64 = 10_000.0;

/// Stand-level covariates shared by every rate evaluation in one step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StandCovariates {
    pub total_basal_area: f64,
    /// Shannon index of basal-area shares by species (4 decimals)
    pub species_diversity: f64,
    /// Shannon index of basal-area shares by diameter class (4 decimals)
    pub diameter_diversity: f64,
}

/// Basal area and stems of one species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesBasalArea {
    pub species: String,
    pub stems: u64,
    pub basal_area: f64,
    pub percent_basal_area: f64,
}

/// Basal area and stems of one diameter class, all species pooled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassBasalArea {
    pub diameter_class: u32,
    pub stems: u64,
    pub basal_area: f64,
    pub percent_basal_area: f64,
}

/// Covariates plus the per-species and per-class breakdown they came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandSummary {
    pub stand_area: f64,
    pub total_stems: u64,
    pub stems_per_hectare: f64,
    pub covariates: StandCovariates,
    /// Species in first-seen order
    pub species: Vec<SpeciesBasalArea>,
    /// Classes in ascending label order
    pub classes: Vec<ClassBasalArea>,
}

/// Basal area of one stem of the given class, divided by the stand area as
/// supplied. No unit conversion happens here.
pub fn basal_area(diameter_class: u32, stand_area: f64) -> f64 {
    let d = f64::from(diameter_class);
    std::f64::consts::PI * (d / 2.0).powi(2) / stand_area
}

/// Shannon entropy `-Σ p ln p` of the parts' shares of `total`, rounded to
/// 4 decimals. Zero shares contribute nothing; a zero total yields 0.
pub fn shannon_index(parts: impl IntoIterator<Item = f64>, total: f64) -> f64 {
    if total.is_nan() || total <= 0.0 {
        return 0.0;
    }
    let entropy: f64 = parts
        .into_iter()
        .map(|part| part / total)
        .filter(|p| *p > 0.0)
        .map(|p| -p * p.ln())
        .sum();
    // a lone share sums to -0.0
    round_to(entropy, 4) + 0.0
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Compute the stand covariates of a classified census.
pub fn aggregate(rows: &[CensusRow], stand_area: f64) -> StandCovariates {
    summarize(rows, stand_area).covariates
}

/// Compute the covariates together with their species and class breakdown.
pub fn summarize(rows: &[CensusRow], stand_area: f64) -> StandSummary {
    let mut total_basal_area = 0.0;
    let mut total_stems = 0u64;
    let mut by_species: IndexMap<&str, (u64, f64)> = IndexMap::new();
    let mut by_class: BTreeMap<u32, (u64, f64)> = BTreeMap::new();

    for row in rows {
        let ba = basal_area(row.diameter_class, stand_area) * row.stem_count as f64;
        total_basal_area += ba;
        total_stems += row.stem_count;

        let species = by_species.entry(row.species.as_str()).or_insert((0, 0.0));
        species.0 += row.stem_count;
        species.1 += ba;

        let class = by_class.entry(row.diameter_class).or_insert((0, 0.0));
        class.0 += row.stem_count;
        class.1 += ba;
    }

    let covariates = StandCovariates {
        total_basal_area,
        species_diversity: shannon_index(by_species.values().map(|(_, ba)| *ba), total_basal_area),
        diameter_diversity: shannon_index(by_class.values().map(|(_, ba)| *ba), total_basal_area),
    };

    let percent = |ba: f64| {
        if total_basal_area > 0.0 {
            ba / total_basal_area * 100.0
        } else {
            0.0
        }
    };

    let species = by_species
        .iter()
        .map(|(name, (stems, ba))| SpeciesBasalArea {
            species: name.to_string(),
            stems: *stems,
            basal_area: *ba,
            percent_basal_area: percent(*ba),
        })
        .collect();

    let classes = by_class
        .iter()
        .map(|(label, (stems, ba))| ClassBasalArea {
            diameter_class: *label,
            stems: *stems,
            basal_area: *ba,
            percent_basal_area: percent(*ba),
        })
        .collect();

    let stems_per_hectare = if stand_area > 0.0 {
        total_stems as f64 / (stand_area / SQ_M_PER_HECTARE)
    } else {
        0.0
    };

    StandSummary {
        stand_area,
        total_stems,
        stems_per_hectare,
        covariates,
        species,
        classes,
    }
}
