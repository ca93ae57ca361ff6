mod classifier;
mod covariates;
mod model;
mod rates;
mod transition;

pub use classifier::{
    build_diameter_ranges, classify, Classification, DiameterRange, DropReason, DroppedRecord,
    MAX_CLASS_LABEL,
};
pub use covariates::{
    aggregate, basal_area, shannon_index, summarize, ClassBasalArea, SpeciesBasalArea,
    StandCovariates, StandSummary, SQ_M_PER_HECTARE,
};
pub use model::StandModel;
pub use rates::{
    dnorm, erf, growth_rate, mortality_probability, pnorm, recruitment_count, CdfMethod,
    RateModel,
};
pub use transition::{
    cohort_shift, project_transition, round_half_up, Cohort, CohortShift,
    MissingParameterPolicy, SpeciesOutcome, SpeciesProjection, TransitionConfig,
    TransitionResult,
};
