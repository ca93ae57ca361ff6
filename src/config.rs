use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::{
    build_diameter_ranges, CdfMethod, DiameterRange, MissingParameterPolicy, RateModel,
    TransitionConfig,
};
use crate::error::ModelError;
use crate::models::Environment;

/// Bounds and label of the smallest diameter class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassStart {
    pub min: f64,
    pub max: f64,
    pub label: u32,
}

impl Default for ClassStart {
    fn default() -> Self {
        Self {
            min: 5.0,
            max: 7.0,
            label: 6,
        }
    }
}

fn default_spacing() -> u32 {
    2
}

/// Settings of one run, as read from a TOML file.
///
/// ```toml
/// stand_area = 600.0
/// spacing = 2
/// region = "north"
/// parameters = "params.toml"
///
/// [environment]
/// slope = 15.0
/// mean_annual_temperature = 7.5
/// mean_annual_precipitation = 520.0
///
/// [classes]
/// min = 5.0
/// max = 7.0
/// label = 6
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Stand area in square metres
    pub stand_area: f64,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default = "default_spacing")]
    pub spacing: u32,
    #[serde(default)]
    pub classes: ClassStart,
    /// Region key into the parameter store
    pub region: Option<String>,
    /// Parameter file, relative to the config file
    pub parameters: Option<PathBuf>,
    #[serde(default)]
    pub missing_parameters: MissingParameterPolicy,
    #[serde(default)]
    pub cdf: CdfMethod,
}

impl RunConfig {
    pub fn new(stand_area: f64) -> Self {
        Self {
            stand_area,
            environment: Environment::default(),
            spacing: default_spacing(),
            classes: ClassStart::default(),
            region: None,
            parameters: None,
            missing_parameters: MissingParameterPolicy::default(),
            cdf: CdfMethod::default(),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ModelError> {
        let config: RunConfig = toml::from_str(text)?;
        config.transition_config().validate()?;
        Ok(config)
    }

    /// Load a run config. A relative `parameters` path is resolved against
    /// the directory of the config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let mut config = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
        if let (Some(params), Some(dir)) = (config.parameters.as_mut(), path.parent()) {
            if params.is_relative() {
                *params = dir.join(&*params);
            }
        }
        Ok(config)
    }

    pub fn ranges(&self) -> Result<Vec<DiameterRange>, ModelError> {
        build_diameter_ranges(
            self.classes.min,
            self.classes.max,
            self.classes.label,
            self.spacing,
        )
    }

    pub fn transition_config(&self) -> TransitionConfig {
        TransitionConfig {
            stand_area: self.stand_area,
            spacing: self.spacing,
            environment: self.environment,
            rates: RateModel::new(self.cdf),
            missing_parameters: self.missing_parameters,
        }
    }
}
