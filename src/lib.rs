pub mod analysis;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod visualization;

pub use analysis::StandModel;
pub use config::RunConfig;
pub use error::ModelError;
pub use io::{CensusReader, CensusWriter};
pub use models::{CensusRow, Environment, ParameterStore, RegionParameters, TreeRecord};
