use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Site conditions shared by every rate evaluation in a stand.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Environment {
    /// Slope of the site
    #[serde(alias = "sl")]
    pub slope: f64,
    /// Mean annual temperature
    #[serde(alias = "mat")]
    pub mean_annual_temperature: f64,
    /// Mean annual precipitation
    #[serde(alias = "map")]
    pub mean_annual_precipitation: f64,
}

impl Environment {
    pub fn new(slope: f64, mean_annual_temperature: f64, mean_annual_precipitation: f64) -> Self {
        Self {
            slope,
            mean_annual_temperature,
            mean_annual_precipitation,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let fields = [
            ("slope", self.slope),
            ("mean_annual_temperature", self.mean_annual_temperature),
            ("mean_annual_precipitation", self.mean_annual_precipitation),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(ModelError::ValidationError(format!(
                    "{name} must be a finite number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
