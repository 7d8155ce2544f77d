//! Runoff coefficient from permeability, soil texture, and vegetation.
//!
//!   raw_C = 1 − permeability
//!   C     = clamp(raw_C × soil × veg, 0, 1)
//!   soil  = 1.25 clay | 0.85 sand | 1.0 otherwise
//!   veg   = 1 − damping_max · clamp((NDVI − threshold)/(1 − threshold), 0, 1)

use crate::config::RunoffConfig;
use crate::sample::SoilTexture;

/// Soil-texture multiplier on the raw runoff coefficient.
pub fn soil_multiplier(texture: Option<SoilTexture>, config: &RunoffConfig) -> f64 {
    match texture {
        Some(SoilTexture::Clay) => config.clay_factor,
        Some(SoilTexture::Sand) => config.sand_factor,
        Some(SoilTexture::Silt) | Some(SoilTexture::Loam) | None => 1.0,
    }
}

/// Vegetation damping multiplier in [1 − max_damping, 1].
pub fn vegetation_multiplier(index: Option<f64>, config: &RunoffConfig) -> f64 {
    let Some(ndvi) = index.filter(|v| v.is_finite()) else {
        return 1.0;
    };
    let span = 1.0 - config.vegetation_threshold;
    let excess = ((ndvi - config.vegetation_threshold) / span).clamp(0.0, 1.0);
    1.0 - config.vegetation_max_damping * excess
}

/// Runoff coefficient C in [0, 1].
pub fn runoff_coefficient(permeability: f64, soil: f64, vegetation: f64) -> f64 {
    let raw = 1.0 - permeability.clamp(0.0, 1.0);
    (raw * soil * vegetation).clamp(0.0, 1.0)
}
