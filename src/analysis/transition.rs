use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::covariates::{aggregate, StandCovariates, SQ_M_PER_HECTARE};
use crate::analysis::rates::RateModel;
use crate::error::ModelError;
use crate::models::{CensusRow, Environment, ParameterTable, RegionParameters};

/// What to do with a species that has no coefficients in the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingParameterPolicy {
    /// Leave the species out and record the skip in the outcomes.
    Skip,
    /// Same as `Skip`, and emit a warning.
    #[default]
    Warn,
    /// Abort the step with `ModelError::MissingParameters`.
    Fail,
}

impl std::str::FromStr for MissingParameterPolicy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(MissingParameterPolicy::Skip),
            "warn" => Ok(MissingParameterPolicy::Warn),
            "fail" => Ok(MissingParameterPolicy::Fail),
            _ => Err(ModelError::ParseError(format!(
                "Unknown missing-parameter policy: '{s}'"
            ))),
        }
    }
}

/// Everything one transition step needs besides the census and coefficients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// Stand area in square metres
    pub stand_area: f64,
    /// Width of a diameter class; raw growth is divided by it
    pub spacing: u32,
    pub environment: Environment,
    #[serde(default)]
    pub rates: RateModel,
    #[serde(default)]
    pub missing_parameters: MissingParameterPolicy,
}

impl TransitionConfig {
    pub fn new(stand_area: f64, spacing: u32, environment: Environment) -> Self {
        Self {
            stand_area,
            spacing,
            environment,
            rates: RateModel::default(),
            missing_parameters: MissingParameterPolicy::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.stand_area.is_finite() || self.stand_area <= 0.0 {
            return Err(ModelError::ValidationError(format!(
                "Stand area must be positive, got {}",
                self.stand_area
            )));
        }
        if self.spacing == 0 {
            return Err(ModelError::ValidationError(
                "Diameter class spacing must be positive".to_string(),
            ));
        }
        self.environment.validate()
    }

    fn hectares(&self) -> f64 {
        self.stand_area / SQ_M_PER_HECTARE
    }
}

/// One diameter class of one species, with its per-period rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    pub diameter_class: u32,
    /// Stems in the class at the start of the period
    pub stock: f64,
    /// Share of stems moving up one class (already divided by spacing)
    pub growth: f64,
    pub mortality: f64,
    /// `max(1 - growth - mortality, 0)`
    pub survival: f64,
}

impl Cohort {
    pub fn new(diameter_class: u32, stock: f64, growth: f64, mortality: f64) -> Self {
        Self {
            diameter_class,
            stock,
            growth,
            mortality,
            survival: (1.0 - growth - mortality).max(0.0),
        }
    }

    /// Growth and mortality together exceed certainty.
    pub fn survival_clamped(&self) -> bool {
        self.growth + self.mortality > 1.0
    }
}

/// Output of the cohort-shift chain of one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortShift {
    /// `(class, stems)` in ascending class order, floored at zero
    pub next: Vec<(u32, u64)>,
    /// Sum of the unrounded class values, carries excluded
    pub raw_total: f64,
    /// Sum of the rounded class values before the zero floor
    pub rounded_total: f64,
    /// Rounding remainder left after the largest class
    pub residual_carry: f64,
}

/// Half-up rounding, `floor(x + 0.5)`.
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

fn to_stem_count(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        value as u64
    }
}

/// Advance the classes of one species by one period.
///
/// `cohorts` must be sorted by ascending class. The smallest class keeps its
/// survivors and receives all `recruitment`; every larger class keeps its
/// survivors and receives the growth of the class below it. Each class's
/// rounding remainder is added into the next class, so
/// `|rounded_total - raw_total| <= 0.5`.
pub fn cohort_shift(cohorts: &[Cohort], recruitment: f64) -> CohortShift {
    let mut next = Vec::with_capacity(cohorts.len());
    let mut raw_total = 0.0;
    let mut rounded_total = 0.0;
    let mut carry = 0.0;
    let mut previous: Option<&Cohort> = None;

    for cohort in cohorts {
        let inflow = match previous {
            None => recruitment,
            Some(below) => below.stock * below.growth,
        };
        let expected = cohort.stock * cohort.survival + inflow;
        let raw = expected + carry;
        let rounded = round_half_up(raw);
        carry = raw - rounded;

        raw_total += expected;
        rounded_total += rounded;
        next.push((cohort.diameter_class, to_stem_count(rounded)));
        previous = Some(cohort);
    }

    CohortShift {
        next,
        raw_total,
        rounded_total,
        residual_carry: carry,
    }
}

/// Projection details of one species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesProjection {
    pub species: String,
    /// Stems per hectare across all classes at the start of the period
    pub stock_per_hectare: f64,
    /// Recruits added to the smallest class, in stems
    pub recruitment: f64,
    pub cohorts: Vec<Cohort>,
    pub raw_total: f64,
    pub rounded_total: f64,
    pub residual_carry: f64,
    /// Classes whose growth plus mortality exceeded one
    pub clamped_survival_classes: usize,
}

/// What happened to one species during a step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SpeciesOutcome {
    Projected(SpeciesProjection),
    Skipped {
        species: String,
        missing: ParameterTable,
    },
    /// A rate or stem total overflowed; the species' classes are carried
    /// into the next period unchanged.
    Diverged {
        species: String,
        /// Classes whose growth or mortality was not finite
        non_finite_classes: usize,
        recruitment_finite: bool,
    },
}

impl SpeciesOutcome {
    pub fn species(&self) -> &str {
        match self {
            SpeciesOutcome::Projected(p) => &p.species,
            SpeciesOutcome::Skipped { species, .. } => species,
            SpeciesOutcome::Diverged { species, .. } => species,
        }
    }

    pub fn is_diverged(&self) -> bool {
        matches!(self, SpeciesOutcome::Diverged { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, SpeciesOutcome::Skipped { .. })
    }
}

/// The next-period census together with per-species outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionResult {
    /// One row per (species, class) of every projected or diverged species
    pub rows: Vec<CensusRow>,
    pub outcomes: Vec<SpeciesOutcome>,
    /// Covariates the rates were evaluated with
    pub covariates: StandCovariates,
}

impl TransitionResult {
    pub fn total_stems(&self) -> u64 {
        self.rows.iter().map(|r| r.stem_count).sum()
    }

    pub fn outcome(&self, species: &str) -> Option<&SpeciesOutcome> {
        self.outcomes.iter().find(|o| o.species() == species)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SpeciesOutcome> {
        self.outcomes.iter().filter(|o| o.is_skipped())
    }

    pub fn projections(&self) -> impl Iterator<Item = &SpeciesProjection> {
        self.outcomes.iter().filter_map(|o| match o {
            SpeciesOutcome::Projected(p) => Some(p),
            _ => None,
        })
    }

    pub fn diverged(&self) -> impl Iterator<Item = &SpeciesOutcome> {
        self.outcomes.iter().filter(|o| o.is_diverged())
    }
}

/// Group rows by species (first-seen order) and class (ascending), summing
/// duplicate cells.
fn group_by_species(census: &[CensusRow]) -> IndexMap<&str, BTreeMap<u32, u64>> {
    let mut grouped: IndexMap<&str, BTreeMap<u32, u64>> = IndexMap::new();
    for row in census {
        *grouped
            .entry(row.species.as_str())
            .or_default()
            .entry(row.diameter_class)
            .or_insert(0) += row.stem_count;
    }
    grouped
}

/// Project a classified census one period forward.
///
/// Covariates are computed from the whole census, skipped species included.
/// Species are independent; classes within a species are chained in
/// ascending order.
pub fn project_transition(
    census: &[CensusRow],
    region: &RegionParameters,
    config: &TransitionConfig,
) -> Result<TransitionResult, ModelError> {
    config.validate()?;

    let covariates = aggregate(census, config.stand_area);
    let env = &config.environment;
    let spacing = f64::from(config.spacing);
    let hectares = config.hectares();

    let mut rows = Vec::with_capacity(census.len());
    let mut outcomes = Vec::new();

    for (species, classes) in group_by_species(census) {
        let params = match region.species(species) {
            Ok(params) => params,
            Err(missing) => {
                match config.missing_parameters {
                    MissingParameterPolicy::Fail => {
                        return Err(ModelError::MissingParameters {
                            species: species.to_string(),
                            table: missing,
                        });
                    }
                    MissingParameterPolicy::Warn => {
                        warn!(species, table = %missing, "no coefficients for species, skipping");
                    }
                    MissingParameterPolicy::Skip => {}
                }
                outcomes.push(SpeciesOutcome::Skipped {
                    species: species.to_string(),
                    missing,
                });
                continue;
            }
        };

        let cohorts: Vec<Cohort> = classes
            .iter()
            .map(|(&label, &stems)| {
                let d = f64::from(label);
                let growth = config.rates.growth_rate(params.growth, d, env, &covariates) / spacing;
                let mortality =
                    config
                        .rates
                        .mortality_probability(params.mortality, d, env, &covariates);
                Cohort::new(label, stems as f64, growth, mortality)
            })
            .collect();

        let stock_per_hectare = classes.values().map(|&n| n as f64).sum::<f64>() / hectares;
        let recruitment = config.rates.recruitment_count(
            params.recruitment,
            stock_per_hectare,
            env,
            &covariates,
        ) * hectares;

        let clamped_survival_classes = cohorts.iter().filter(|c| c.survival_clamped()).count();
        if clamped_survival_classes > 0 {
            warn!(
                species,
                classes = clamped_survival_classes,
                "growth plus mortality exceeds 1, survival clamped to 0"
            );
        }

        let shift = cohort_shift(&cohorts, recruitment);
        let non_finite_classes = cohorts
            .iter()
            .filter(|c| !c.growth.is_finite() || !c.mortality.is_finite())
            .count();
        let recruitment_finite = recruitment.is_finite();
        if non_finite_classes > 0
            || !recruitment_finite
            || !shift.raw_total.is_finite()
            || !shift.rounded_total.is_finite()
        {
            warn!(
                species,
                classes = non_finite_classes,
                recruitment_finite,
                "non-finite rates, stems carried forward unchanged; check coefficient magnitudes"
            );
            rows.extend(
                classes
                    .iter()
                    .map(|(&label, &stems)| CensusRow::new(species, label, stems)),
            );
            outcomes.push(SpeciesOutcome::Diverged {
                species: species.to_string(),
                non_finite_classes,
                recruitment_finite,
            });
            continue;
        }
        debug!(
            species,
            raw_total = shift.raw_total,
            rounded_total = shift.rounded_total,
            recruitment,
            "species projected"
        );

        rows.extend(
            shift
                .next
                .iter()
                .map(|&(label, stems)| CensusRow::new(species, label, stems)),
        );
        outcomes.push(SpeciesOutcome::Projected(SpeciesProjection {
            species: species.to_string(),
            stock_per_hectare,
            recruitment,
            cohorts,
            raw_total: shift.raw_total,
            rounded_total: shift.rounded_total,
            residual_carry: shift.residual_carry,
            clamped_survival_classes,
        }));
    }

    Ok(TransitionResult {
        rows,
        outcomes,
        covariates,
    })
}
