use tracing::info;

use crate::analysis::{
    aggregate, classify, project_transition, summarize, Classification, DiameterRange,
    StandCovariates, StandSummary, TransitionConfig, TransitionResult,
};
use crate::error::ModelError;
use crate::models::{CensusRow, ParameterStore, RegionParameters, TreeRecord};

/// Unified API over one stand: a resolved region's coefficients plus the
/// settings of a transition step.
pub struct StandModel<'a> {
    region: &'a RegionParameters,
    config: TransitionConfig,
}

impl<'a> StandModel<'a> {
    /// Create a model for already-resolved coefficients.
    pub fn new(region: &'a RegionParameters, config: TransitionConfig) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self { region, config })
    }

    /// Resolve the region once and create a model for it.
    pub fn from_store(
        store: &'a ParameterStore,
        region_key: &str,
        config: TransitionConfig,
    ) -> Result<Self, ModelError> {
        let region = store.region(region_key)?;
        Self::new(region, config)
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    /// Classify raw measurements into the given diameter classes.
    pub fn classify(&self, records: &[TreeRecord], ranges: &[DiameterRange]) -> Classification {
        classify(records, ranges)
    }

    /// Stand covariates of a census at this stand's area.
    pub fn covariates(&self, census: &[CensusRow]) -> StandCovariates {
        aggregate(census, self.config.stand_area)
    }

    /// Covariates with their species and class breakdown.
    pub fn summary(&self, census: &[CensusRow]) -> StandSummary {
        summarize(census, self.config.stand_area)
    }

    /// Project the census one period forward.
    pub fn step(&self, census: &[CensusRow]) -> Result<TransitionResult, ModelError> {
        let result = project_transition(census, self.region, &self.config)?;
        info!(
            species = result.outcomes.len(),
            skipped = result.skipped().count(),
            stems_before = census.iter().map(|r| r.stem_count).sum::<u64>(),
            stems_after = result.total_stems(),
            "transition step complete"
        );
        Ok(result)
    }

    /// Classify raw measurements, then project the classified census.
    pub fn step_records(
        &self,
        records: &[TreeRecord],
        ranges: &[DiameterRange],
    ) -> Result<(Classification, TransitionResult), ModelError> {
        let classification = self.classify(records, ranges);
        if classification.rows.is_empty() {
            return Err(ModelError::InsufficientData(
                "No records could be classified".to_string(),
            ));
        }
        let result = self.step(&classification.rows)?;
        Ok((classification, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::build_diameter_ranges;
    use crate::models::{Environment, GrowthParams, MortalityParams, RecruitmentParams};

    fn store() -> ParameterStore {
        let mut region = RegionParameters::default();
        region.growth.insert(
            "Pinus".to_string(),
            GrowthParams {
                r1: 0.02,
                r2: 0.004,
                ..Default::default()
            },
        );
        region.mortality.insert(
            "Pinus".to_string(),
            MortalityParams {
                m1: -2.2,
                ..Default::default()
            },
        );
        region.recruitment.insert(
            "Pinus".to_string(),
            RecruitmentParams {
                z1: 30.0,
                z2: -0.01,
                ze: 2.0,
                ..Default::default()
            },
        );
        let mut store = ParameterStore::new();
        store.regions.insert("north".to_string(), region);
        store
    }

    fn config() -> TransitionConfig {
        TransitionConfig::new(600.0, 2, Environment::new(15.0, 7.5, 520.0))
    }

    fn records() -> Vec<TreeRecord> {
        [5.5, 6.1, 7.2, 8.8, 12.3, 14.9, 21.0]
            .iter()
            .map(|d| TreeRecord::new("Pinus", *d))
            .collect()
    }

    #[test]
    fn test_from_store_unknown_region() {
        let store = store();
        assert!(matches!(
            StandModel::from_store(&store, "south", config()),
            Err(ModelError::UnknownRegion(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let store = store();
        let mut cfg = config();
        cfg.stand_area = -1.0;
        assert!(StandModel::from_store(&store, "north", cfg).is_err());
    }

    #[test]
    fn test_covariates_match_standalone() {
        let store = store();
        let model = StandModel::from_store(&store, "north", config()).unwrap();
        let ranges = build_diameter_ranges(5.0, 7.0, 6, 2).unwrap();
        let census = model.classify(&records(), &ranges).rows;
        assert_eq!(model.covariates(&census), aggregate(&census, 600.0));
        assert_eq!(model.summary(&census).total_stems, 7);
    }

    #[test]
    fn test_step_records_keeps_every_class() {
        let store = store();
        let model = StandModel::from_store(&store, "north", config()).unwrap();
        let ranges = build_diameter_ranges(5.0, 7.0, 6, 2).unwrap();
        let (classification, result) = model.step_records(&records(), &ranges).unwrap();
        assert_eq!(result.rows.len(), classification.rows.len());
        assert_eq!(result.rows.len(), ranges.len());
        assert!(result.skipped().next().is_none());
    }

    #[test]
    fn test_step_records_nothing_classified() {
        let store = store();
        let model = StandModel::from_store(&store, "north", config()).unwrap();
        let ranges = build_diameter_ranges(5.0, 7.0, 6, 2).unwrap();
        assert!(model.step_records(&[], &ranges).is_err());
    }

    #[test]
    fn test_step_output_feeds_next_step() {
        let store = store();
        let model = StandModel::from_store(&store, "north", config()).unwrap();
        let ranges = build_diameter_ranges(5.0, 7.0, 6, 2).unwrap();
        let census = model.classify(&records(), &ranges).rows;
        let first = model.step(&census).unwrap();
        let second = model.step(&first.rows).unwrap();
        assert_eq!(second.rows.len(), first.rows.len());
    }
}
