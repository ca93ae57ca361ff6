mod census;
mod environment;
mod parameters;

pub use census::{CensusRow, TreeRecord};
pub use environment::Environment;
pub use parameters::{
    GrowthParams, MortalityParams, ParameterStore, ParameterTable, RecruitmentParams,
    RegionParameters, SpeciesParameters,
};
