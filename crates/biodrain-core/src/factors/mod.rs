//! Factor derivation: raw measurements → bounded dimensionless factors.
//!
//!   S     = clamp(slope% / slope_cap, 0, 1)
//!   C     = runoff coefficient (see `runoff`),  K = 1 − C
//!   W*    = clamp(mean_annual_mm / 1000, 0, 1)
//!   R_ext = clamp(max_daily_mm / 120, 0, 1)
//!
//! Missing scalar inputs take the neutral midpoint; each substitution is
//! listed in `RiskFactors::fallbacks`.

pub mod runoff;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::rainfall::RainfallStats;
use crate::sample::EnvironmentalSample;

use runoff::{runoff_coefficient, soil_multiplier, vegetation_multiplier};

/// A neutral or derived value substituted for a missing input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FactorFallback {
    /// No slope reading; S set to the neutral midpoint.
    NeutralSlope,
    /// No raw permeability; taken from the land-cover class table.
    PermeabilityFromLandCover,
    /// Neither permeability nor land cover; neutral permeability.
    NeutralPermeability,
    /// No mean annual rainfall; W* set neutral.
    NeutralWetness,
    /// No daily maximum; R_ext set neutral.
    NeutralExtreme,
}

/// Dimensionless factors for one footprint. All in [0, 1] except the two
/// adjustment multipliers, which stay close to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    /// Slope (percent) used by hydrology; neutral slope when unmeasured.
    pub slope_percent: f64,
    /// S
    pub slope_factor: f64,
    /// C
    pub runoff_coefficient: f64,
    /// K = 1 − C
    pub permeability_index: f64,
    /// W*
    pub wetness: f64,
    /// R_ext
    pub extreme: f64,
    pub soil_multiplier: f64,
    pub vegetation_multiplier: f64,
    pub fallbacks: Vec<FactorFallback>,
}

impl RiskFactors {
    /// S_mid = 1 − |2S − 1|: peaks at mid-slope, zero at flat and at the cap.
    pub fn mid_slope(&self) -> f64 {
        1.0 - (2.0 * self.slope_factor - 1.0).abs()
    }
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Derive every factor from the resolved sample and rainfall statistics.
pub fn derive_factors(
    sample: &EnvironmentalSample,
    rainfall: &RainfallStats,
    config: &EngineConfig,
) -> RiskFactors {
    let neutral = config.runoff.neutral_factor;
    let cap = config.slope.cap_percent;
    let mut fallbacks = Vec::new();

    let (slope_percent, slope_factor) = match sample.slope.and_then(|s| s.percent()) {
        Some(p) => (p, (p / cap).clamp(0.0, 1.0)),
        None => {
            fallbacks.push(FactorFallback::NeutralSlope);
            (neutral * cap, neutral)
        }
    };

    let permeability = match (finite(sample.permeability), sample.land_cover) {
        (Some(p), _) => p.clamp(0.0, 1.0),
        (None, Some(class)) => {
            fallbacks.push(FactorFallback::PermeabilityFromLandCover);
            class.typical_permeability()
        }
        (None, None) => {
            fallbacks.push(FactorFallback::NeutralPermeability);
            neutral
        }
    };
    let soil = soil_multiplier(sample.soil_texture, &config.runoff);
    let vegetation = vegetation_multiplier(sample.vegetation_index, &config.runoff);
    let c = runoff_coefficient(permeability, soil, vegetation);

    let wetness = match finite(rainfall.mean_annual_mm) {
        Some(mm) => (mm / config.rainfall.wetness_reference_mm).clamp(0.0, 1.0),
        None => {
            fallbacks.push(FactorFallback::NeutralWetness);
            neutral
        }
    };
    let extreme = match finite(rainfall.max_daily_mm) {
        Some(mm) => (mm / config.rainfall.extreme_reference_mm).clamp(0.0, 1.0),
        None => {
            fallbacks.push(FactorFallback::NeutralExtreme);
            neutral
        }
    };

    if !fallbacks.is_empty() {
        tracing::warn!(?fallbacks, "factor derivation substituted missing inputs");
    }

    RiskFactors {
        slope_percent,
        slope_factor,
        runoff_coefficient: c,
        permeability_index: 1.0 - c,
        wetness,
        extreme,
        soil_multiplier: soil,
        vegetation_multiplier: vegetation,
        fallbacks,
    }
}
