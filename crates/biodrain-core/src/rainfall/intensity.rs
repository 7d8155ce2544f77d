//! Short-duration design intensity from a daily base depth.
//!
//! Two IDF policies, chosen per footprint by a pluggable region predicate:
//!   Regional: i = a·t^(−b),  a = P_T / 24^(1−b),  t = max(t_c/60, t_min)
//!   Generic:  i = scale·(P_max·m_climate) / (t + offset)^exp
//! where t is the storm duration in hours, equal to the time of concentration,
//! P_T is the Gumbel return level and P_max the largest observed day.
//!
//! Time of concentration (Kirpich, minutes):
//!   t_c = 0.0195 · L^0.77 / S^0.385,  clamped to [5, 45] min
//!   L = flow length (m), S = max(slope% / 100, 0.01)

use serde::{Deserialize, Serialize};

use crate::config::{GenericIdfConfig, KirpichConfig, RainfallConfig};
use crate::error::{Error, Result};
use crate::geometry::Coordinate;

/// Decides whether a coordinate falls inside a calibrated IDF region.
pub trait RegionPredicate: Send + Sync {
    fn contains(&self, point: Coordinate) -> bool;
}

/// Inclusive lat/lon rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self { min_lat, max_lat, min_lon, max_lon }
    }

    pub fn validate(&self) -> Result<()> {
        let finite = [self.min_lat, self.max_lat, self.min_lon, self.max_lon]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.min_lat > self.max_lat || self.min_lon > self.max_lon {
            return Err(Error::InvalidConfig(format!("malformed bounding box {self:?}")));
        }
        Ok(())
    }
}

impl RegionPredicate for BoundingBox {
    fn contains(&self, p: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&p.lat)
            && (self.min_lon..=self.max_lon).contains(&p.lon)
    }
}

/// IDF policy applied to a footprint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum IntensityPolicy {
    Regional { exponent_b: f64 },
    Generic,
}

impl IntensityPolicy {
    /// Intensity (mm/h) for a storm lasting the time of concentration.
    ///
    /// `base_depth_mm` is P_T for the regional policy and the historical
    /// daily maximum for the generic one; see [`IntensityPolicy::base_depth_mm`].
    pub fn intensity_mm_h(
        &self,
        base_depth_mm: f64,
        tc_min: f64,
        mean_annual_mm: Option<f64>,
        config: &RainfallConfig,
    ) -> f64 {
        let hours = tc_min / 60.0;
        match *self {
            IntensityPolicy::Regional { exponent_b } => {
                let min_h = config.regional.as_ref().map_or(0.1, |r| r.min_duration_h);
                let t_h = hours.max(min_h);
                let a = base_depth_mm / 24.0_f64.powf(1.0 - exponent_b);
                a * t_h.powf(-exponent_b)
            }
            IntensityPolicy::Generic => {
                let g = &config.generic;
                let multiplier = climate_multiplier(mean_annual_mm, g);
                let duration = (hours + g.duration_offset_h).powf(g.exponent);
                g.scale * (base_depth_mm * multiplier) / duration
            }
        }
    }

    /// Depth the policy scales: the return level P_T for the regional
    /// curve, the largest observed day for the generic one. A record with
    /// no usable day falls back to the configured depth.
    pub fn base_depth_mm(
        &self,
        design_depth_mm: f64,
        max_daily_mm: Option<f64>,
        config: &RainfallConfig,
    ) -> f64 {
        match self {
            IntensityPolicy::Regional { .. } => design_depth_mm,
            IntensityPolicy::Generic => max_daily_mm
                .filter(|max| max.is_finite() && *max > 0.0)
                .unwrap_or(config.fallback_design_depth_mm),
        }
    }
}

/// Pick the IDF policy for `center`. The configured regional bounding box
/// is used unless an explicit predicate is supplied.
pub fn select_policy(
    center: Coordinate,
    region: Option<&dyn RegionPredicate>,
    config: &RainfallConfig,
) -> IntensityPolicy {
    let Some(regional) = &config.regional else {
        return IntensityPolicy::Generic;
    };
    let inside = match region {
        Some(predicate) => predicate.contains(center),
        None => regional.region.contains(center),
    };
    if inside {
        IntensityPolicy::Regional { exponent_b: regional.exponent_b }
    } else {
        IntensityPolicy::Generic
    }
}

/// Climate multiplier tiered by mean annual rainfall.
pub fn climate_multiplier(mean_annual_mm: Option<f64>, config: &GenericIdfConfig) -> f64 {
    let Some(mm) = mean_annual_mm.filter(|v| v.is_finite()) else {
        return config.unknown_multiplier;
    };
    config
        .climate_tiers
        .iter()
        .find(|tier| mm < tier.below_mm)
        .map_or(config.wettest_multiplier, |tier| tier.multiplier)
}

/// Kirpich time of concentration in minutes.
pub fn time_of_concentration_min(
    flow_length_m: f64,
    slope_percent: f64,
    config: &KirpichConfig,
) -> f64 {
    let length = if flow_length_m.is_finite() {
        flow_length_m.max(0.0)
    } else {
        0.0
    };
    let slope = if slope_percent.is_finite() {
        (slope_percent / 100.0).max(config.min_slope)
    } else {
        config.min_slope
    };
    let tc = config.coefficient * length.powf(config.length_exponent)
        / slope.powf(config.slope_exponent);
    tc.clamp(config.min_minutes, config.max_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn kirpich_clamps_to_window() {
        let k = KirpichConfig::default();
        // Short steep site: raw t_c well under 5 min.
        assert_eq!(time_of_concentration_min(50.0, 20.0, &k), 5.0);
        // Long flat corridor: raw t_c far above 45 min.
        assert_eq!(time_of_concentration_min(20_000.0, 0.1, &k), 45.0);
    }

    #[test]
    fn kirpich_mid_range_value() {
        // L = 1500 m, S = 2 %: 0.0195 · 1500^0.77 / 0.02^0.385 ≈ 24.6 min.
        let tc = time_of_concentration_min(1500.0, 2.0, &KirpichConfig::default());
        assert_relative_eq!(tc, 24.6, epsilon = 0.3);
    }

    #[test]
    fn zero_slope_is_floored_not_infinite() {
        let tc = time_of_concentration_min(800.0, 0.0, &KirpichConfig::default());
        assert!(tc.is_finite());
    }

    #[test]
    fn regional_curve_recovers_daily_depth_at_24h() {
        let cfg = RainfallConfig::default();
        let policy = IntensityPolicy::Regional { exponent_b: 0.54 };
        let i = policy.intensity_mm_h(80.0, 24.0 * 60.0, None, &cfg);
        assert_relative_eq!(i * 24.0, 80.0, max_relative = 1e-9);
    }

    #[test]
    fn shorter_storms_are_more_intense() {
        let cfg = RainfallConfig::default();
        for policy in [IntensityPolicy::Regional { exponent_b: 0.54 }, IntensityPolicy::Generic] {
            let short = policy.intensity_mm_h(60.0, 5.0, Some(700.0), &cfg);
            let long = policy.intensity_mm_h(60.0, 45.0, Some(700.0), &cfg);
            assert!(short > long, "{policy:?}: {short:.1} should exceed {long:.1}");
        }
    }

    #[test]
    fn each_policy_scales_its_own_depth() {
        let cfg = RainfallConfig::default();
        let regional = IntensityPolicy::Regional { exponent_b: 0.54 };
        assert_eq!(regional.base_depth_mm(66.6, Some(62.0), &cfg), 66.6);
        assert_eq!(IntensityPolicy::Generic.base_depth_mm(66.6, Some(62.0), &cfg), 62.0);
        assert_eq!(
            IntensityPolicy::Generic.base_depth_mm(66.6, None, &cfg),
            cfg.fallback_design_depth_mm
        );
    }

    #[test]
    fn drier_climates_get_larger_multiplier() {
        let g = GenericIdfConfig::default();
        assert_eq!(climate_multiplier(Some(250.0), &g), 1.30);
        assert_eq!(climate_multiplier(Some(650.0), &g), 1.15);
        assert_eq!(climate_multiplier(Some(1200.0), &g), 1.00);
        assert_eq!(climate_multiplier(Some(2400.0), &g), 0.90);
        assert_eq!(climate_multiplier(None, &g), 1.0);
    }

    #[test]
    fn policy_follows_region() {
        let cfg = RainfallConfig::default();
        let ankara = Coordinate::new(39.93, 32.86);
        let lyon = Coordinate::new(45.76, 4.84);
        assert!(matches!(select_policy(ankara, None, &cfg), IntensityPolicy::Regional { .. }));
        assert_eq!(select_policy(lyon, None, &cfg), IntensityPolicy::Generic);

        // Custom predicate overrides the configured box.
        struct Everywhere;
        impl RegionPredicate for Everywhere {
            fn contains(&self, _: Coordinate) -> bool {
                true
            }
        }
        assert!(matches!(
            select_policy(lyon, Some(&Everywhere), &cfg),
            IntensityPolicy::Regional { .. }
        ));

        let mut no_region = cfg.clone();
        no_region.regional = None;
        assert_eq!(select_policy(ankara, None, &no_region), IntensityPolicy::Generic);
    }
}
