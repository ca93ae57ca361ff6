use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Growth coefficients for one species.
///
/// Linear predictor: `r1 + r2*D + r3*SL + r4*H1 + r5*H2 + r6*MAT + r7*MAP + r8*B`
/// where `D` is the class diameter, `H1`/`H2` the species and diameter-class
/// diversity indices and `B` the stand basal area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GrowthParams {
    pub r1: f64,
    #[serde(alias = "r2dbh")]
    pub r2: f64,
    #[serde(alias = "r3SL")]
    pub r3: f64,
    #[serde(alias = "r4h1")]
    pub r4: f64,
    #[serde(alias = "r5h2")]
    pub r5: f64,
    #[serde(alias = "r6MAT")]
    pub r6: f64,
    #[serde(alias = "r7MAP")]
    pub r7: f64,
    #[serde(alias = "r8B")]
    pub r8: f64,
}

impl GrowthParams {
    pub fn coefficients(&self) -> [f64; 8] {
        [
            self.r1, self.r2, self.r3, self.r4, self.r5, self.r6, self.r7, self.r8,
        ]
    }
}

/// Mortality (probit) coefficients for one species. Same predictor layout as
/// [`GrowthParams`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MortalityParams {
    pub m1: f64,
    #[serde(alias = "m2dbh")]
    pub m2: f64,
    #[serde(alias = "m3SL")]
    pub m3: f64,
    #[serde(alias = "m4h1")]
    pub m4: f64,
    #[serde(alias = "m5h2")]
    pub m5: f64,
    #[serde(alias = "m6MAT")]
    pub m6: f64,
    #[serde(alias = "m7MAP")]
    pub m7: f64,
    #[serde(alias = "m8B")]
    pub m8: f64,
}

impl MortalityParams {
    pub fn coefficients(&self) -> [f64; 8] {
        [
            self.m1, self.m2, self.m3, self.m4, self.m5, self.m6, self.m7, self.m8,
        ]
    }
}

/// Recruitment (Tobit) coefficients for one species.
///
/// `z2` multiplies the species' stock per hectare instead of a diameter;
/// `ze` is the log of the censored-normal scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RecruitmentParams {
    pub z1: f64,
    #[serde(alias = "z2N")]
    pub z2: f64,
    #[serde(alias = "z3SL")]
    pub z3: f64,
    #[serde(alias = "z4h1")]
    pub z4: f64,
    #[serde(alias = "z5h2")]
    pub z5: f64,
    #[serde(alias = "z6MAT")]
    pub z6: f64,
    #[serde(alias = "z7MAP")]
    pub z7: f64,
    #[serde(alias = "z8B")]
    pub z8: f64,
    pub ze: f64,
}

impl RecruitmentParams {
    pub fn coefficients(&self) -> [f64; 8] {
        [
            self.z1, self.z2, self.z3, self.z4, self.z5, self.z6, self.z7, self.z8,
        ]
    }

    /// Scale of the censored normal, `exp(ze)`.
    pub fn scale(&self) -> f64 {
        self.ze.exp()
    }
}

/// Which coefficient table a lookup failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterTable {
    Growth,
    Mortality,
    Recruitment,
}

impl std::fmt::Display for ParameterTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterTable::Growth => write!(f, "growth"),
            ParameterTable::Mortality => write!(f, "mortality"),
            ParameterTable::Recruitment => write!(f, "recruitment"),
        }
    }
}

/// The three coefficient records of one species, resolved from a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesParameters<'a> {
    pub growth: &'a GrowthParams,
    pub mortality: &'a MortalityParams,
    pub recruitment: &'a RecruitmentParams,
}

/// Coefficient tables of one geographic region, keyed by species name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionParameters {
    #[serde(default)]
    pub growth: HashMap<String, GrowthParams>,
    #[serde(default)]
    pub mortality: HashMap<String, MortalityParams>,
    #[serde(default)]
    pub recruitment: HashMap<String, RecruitmentParams>,
}

impl RegionParameters {
    /// Resolve all three records for a species, or name the first table
    /// (growth, mortality, recruitment) that lacks it.
    pub fn species(&self, name: &str) -> Result<SpeciesParameters<'_>, ParameterTable> {
        let growth = self.growth.get(name).ok_or(ParameterTable::Growth)?;
        let mortality = self.mortality.get(name).ok_or(ParameterTable::Mortality)?;
        let recruitment = self
            .recruitment
            .get(name)
            .ok_or(ParameterTable::Recruitment)?;
        Ok(SpeciesParameters {
            growth,
            mortality,
            recruitment,
        })
    }

    /// Species with a complete set of coefficients, sorted by name.
    pub fn complete_species(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .growth
            .keys()
            .filter(|name| {
                self.mortality.contains_key(*name) && self.recruitment.contains_key(*name)
            })
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }
}

/// Region-keyed coefficient store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterStore {
    #[serde(default)]
    pub regions: IndexMap<String, RegionParameters>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the coefficient tables of a region.
    pub fn region(&self, key: &str) -> Result<&RegionParameters, ModelError> {
        self.regions
            .get(key)
            .ok_or_else(|| ModelError::UnknownRegion(key.to_string()))
    }

    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    /// Reject non-finite coefficients, which would poison every rate of the
    /// species.
    pub fn validate(&self) -> Result<(), ModelError> {
        for (region, tables) in &self.regions {
            let growth = tables
                .growth
                .iter()
                .map(|(sp, p)| (ParameterTable::Growth, sp, p.coefficients().to_vec()));
            let mortality = tables
                .mortality
                .iter()
                .map(|(sp, p)| (ParameterTable::Mortality, sp, p.coefficients().to_vec()));
            let recruitment = tables.recruitment.iter().map(|(sp, p)| {
                let mut values = p.coefficients().to_vec();
                values.push(p.ze);
                (ParameterTable::Recruitment, sp, values)
            });
            for (table, species, values) in growth.chain(mortality).chain(recruitment) {
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(ModelError::ValidationError(format!(
                        "Region '{region}', species '{species}': {table} coefficients must be finite"
                    )));
                }
            }
        }
        Ok(())
    }
}
