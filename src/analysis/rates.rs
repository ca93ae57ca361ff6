use serde::{Deserialize, Serialize};

use crate::analysis::StandCovariates;
use crate::models::{Environment, GrowthParams, MortalityParams, RecruitmentParams};

/// How the standard normal CDF is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CdfMethod {
    /// Abramowitz & Stegun 7.1.26 rational approximation of erf
    /// (max absolute error 1.5e-7).
    #[default]
    AbramowitzStegun,
    /// The `statrs` error function (accurate to machine precision).
    Statrs,
}

impl CdfMethod {
    pub fn erf(self, x: f64) -> f64 {
        match self {
            CdfMethod::AbramowitzStegun => erf(x),
            CdfMethod::Statrs => statrs::function::erf::erf(x),
        }
    }

    /// Standard normal cumulative distribution function.
    pub fn pnorm(self, x: f64) -> f64 {
        (1.0 + self.erf(x / std::f64::consts::SQRT_2)) / 2.0
    }
}

impl std::str::FromStr for CdfMethod {
    type Err = crate::error::ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "abramowitz_stegun" | "as" => Ok(CdfMethod::AbramowitzStegun),
            "statrs" | "exact" => Ok(CdfMethod::Statrs),
            _ => Err(crate::error::ModelError::ParseError(format!(
                "Unknown CDF method: '{s}'"
            ))),
        }
    }
}

/// Abramowitz & Stegun 7.1.26 approximation of the error function.
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Standard normal CDF through [`erf`].
pub fn pnorm(x: f64) -> f64 {
    CdfMethod::AbramowitzStegun.pnorm(x)
}

/// Standard normal density.
pub fn dnorm(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// Predictor terms in coefficient order: intercept, the size variable
/// (class diameter or stock per hectare), slope, species diversity,
/// diameter diversity, MAT, MAP, total basal area.
fn predictor_terms(size: f64, env: &Environment, cov: &StandCovariates) -> [f64; 8] {
    [
        1.0,
        size,
        env.slope,
        cov.species_diversity,
        cov.diameter_diversity,
        env.mean_annual_temperature,
        env.mean_annual_precipitation,
        cov.total_basal_area,
    ]
}

fn linear_predictor(coefficients: [f64; 8], terms: [f64; 8]) -> f64 {
    coefficients.iter().zip(terms).map(|(c, x)| c * x).sum()
}

/// Evaluates growth, mortality and recruitment for one species from its
/// injected coefficients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateModel {
    pub cdf: CdfMethod,
}

impl RateModel {
    pub fn new(cdf: CdfMethod) -> Self {
        Self { cdf }
    }

    /// Raw diameter growth of a class: `max(exp(η) - 1, 0)`.
    ///
    /// Not yet divided by the class spacing.
    pub fn growth_rate(
        &self,
        params: &GrowthParams,
        diameter_class: f64,
        env: &Environment,
        cov: &StandCovariates,
    ) -> f64 {
        let eta = linear_predictor(
            params.coefficients(),
            predictor_terms(diameter_class, env, cov),
        );
        (eta.exp() - 1.0).max(0.0)
    }

    /// Probit mortality of a class: `max(Φ(η), 0)`.
    pub fn mortality_probability(
        &self,
        params: &MortalityParams,
        diameter_class: f64,
        env: &Environment,
        cov: &StandCovariates,
    ) -> f64 {
        let eta = linear_predictor(
            params.coefficients(),
            predictor_terms(diameter_class, env, cov),
        );
        self.cdf.pnorm(eta).max(0.0)
    }

    /// Expected recruits per hectare from a Tobit model censored at zero:
    /// `max(Φ(η/s)·η + s·φ(η/s), 0)` with `s = exp(ze)`.
    pub fn recruitment_count(
        &self,
        params: &RecruitmentParams,
        stock_per_hectare: f64,
        env: &Environment,
        cov: &StandCovariates,
    ) -> f64 {
        let eta = linear_predictor(
            params.coefficients(),
            predictor_terms(stock_per_hectare, env, cov),
        );
        let scale = params.scale();
        let z = eta / scale;
        (self.cdf.pnorm(z) * eta + scale * dnorm(z)).max(0.0)
    }
}

/// [`RateModel::growth_rate`] with the default CDF.
pub fn growth_rate(
    params: &GrowthParams,
    diameter_class: f64,
    env: &Environment,
    cov: &StandCovariates,
) -> f64 {
    RateModel::default().growth_rate(params, diameter_class, env, cov)
}

/// [`RateModel::mortality_probability`] with the default CDF.
pub fn mortality_probability(
    params: &MortalityParams,
    diameter_class: f64,
    env: &Environment,
    cov: &StandCovariates,
) -> f64 {
    RateModel::default().mortality_probability(params, diameter_class, env, cov)
}

/// [`RateModel::recruitment_count`] with the default CDF.
pub fn recruitment_count(
    params: &RecruitmentParams,
    stock_per_hectare: f64,
    env: &Environment,
    cov: &StandCovariates,
) -> f64 {
    RateModel::default().recruitment_count(params, stock_per_hectare, env, cov)
}
