//! Hydraulic sizer: rational-method discharge → Manning-inverted diameter,
//! checked by a forward Manning evaluation.
//!
//!   Q     = 0.278 · C · i(mm/h) · A(km²) · safety_factor
//!   n     = 0.025 naturalistic (meandering, radial) | 0.013 engineered
//!   S_bed = max(0.005, slope% / 100)
//!   D     = Manning inverse (see `manning`)
//! Validation: |Q_cap − Q| / Q ≤ tolerance.

pub mod manning;
pub mod material;

use serde::{Deserialize, Serialize};

use crate::config::HydraulicConfig;
use crate::geometry::SiteFootprint;
use crate::topology::Topology;

use manning::{full_flow_capacity, full_flow_diameter, full_flow_velocity};
use material::{
    classify_scale, nominal_diameter_mm, recommend_material, DiameterBand, MaterialRecommendation,
    NetworkScale,
};

/// Outcome of the forward capacity check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ValidationStatus {
    Verified { relative_error: f64 },
    CapacityMismatch { relative_error: f64 },
    /// No runoff to convey; nothing was sized.
    NoDischarge,
}

impl ValidationStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationStatus::Verified { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VelocityRegime {
    BelowSelfCleansing,
    Adequate,
    AboveScourLimit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConduitDesign {
    pub discharge_m3s: f64,
    /// Theoretical full-flow diameter.
    pub diameter_mm: f64,
    /// Next commercial size; `None` when a single barrel is not enough.
    pub nominal_diameter_mm: Option<u32>,
    pub velocity_m_s: f64,
    pub velocity_regime: VelocityRegime,
    pub roughness: f64,
    pub bed_slope: f64,
    pub scale: NetworkScale,
    pub material: MaterialRecommendation,
    pub validation: ValidationStatus,
}

impl ConduitDesign {
    pub fn is_valid(&self) -> bool {
        self.validation.is_valid()
    }
}

/// Rational-method peak discharge in m³/s.
pub fn rational_discharge(
    c: f64,
    intensity_mm_h: f64,
    area_km2: f64,
    config: &HydraulicConfig,
) -> f64 {
    let q = config.runoff_constant * c * intensity_mm_h * area_km2 * config.safety_factor;
    if q.is_finite() { q.max(0.0) } else { 0.0 }
}

pub fn roughness_for(topology: Topology, config: &HydraulicConfig) -> f64 {
    if topology.is_naturalistic() {
        config.naturalistic_roughness
    } else {
        config.engineered_roughness
    }
}

pub fn bed_slope(slope_percent: f64, config: &HydraulicConfig) -> f64 {
    if slope_percent.is_finite() {
        (slope_percent / 100.0).max(config.min_bed_slope)
    } else {
        config.min_bed_slope
    }
}

fn velocity_regime(v: f64, config: &HydraulicConfig) -> VelocityRegime {
    if v < config.self_cleansing_velocity {
        VelocityRegime::BelowSelfCleansing
    } else if v > config.scour_velocity {
        VelocityRegime::AboveScourLimit
    } else {
        VelocityRegime::Adequate
    }
}

/// Size the primary conduit for the winning topology.
pub fn size_conduit(
    runoff_coefficient: f64,
    intensity_mm_h: f64,
    footprint: &SiteFootprint,
    slope_percent: f64,
    topology: Topology,
    config: &HydraulicConfig,
) -> ConduitDesign {
    let q = rational_discharge(runoff_coefficient, intensity_mm_h, footprint.area_km2(), config);
    let n = roughness_for(topology, config);
    let s_bed = bed_slope(slope_percent, config);

    let d_m = full_flow_diameter(q, n, s_bed);
    let validation = if q <= 0.0 || d_m <= 0.0 {
        ValidationStatus::NoDischarge
    } else {
        let capacity = full_flow_capacity(d_m, n, s_bed);
        let relative_error = (capacity - q).abs() / q;
        if relative_error <= config.validation_tolerance {
            ValidationStatus::Verified { relative_error }
        } else {
            ValidationStatus::CapacityMismatch { relative_error }
        }
    };
    if !validation.is_valid() {
        tracing::warn!(q, n, s_bed, ?validation, "conduit sizing did not verify");
    }

    let diameter_mm = d_m * 1000.0;
    let velocity = full_flow_velocity(d_m, n, s_bed);

    ConduitDesign {
        discharge_m3s: q,
        diameter_mm,
        nominal_diameter_mm: nominal_diameter_mm(diameter_mm),
        velocity_m_s: velocity,
        velocity_regime: velocity_regime(velocity, config),
        roughness: n,
        bed_slope: s_bed,
        scale: classify_scale(diameter_mm, q, footprint.area_ha()),
        material: recommend_material(topology, DiameterBand::of(diameter_mm), runoff_coefficient),
        validation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{resolve_footprint, Coordinate, SiteDefinition};
    use approx::assert_relative_eq;

    fn disc(radius_m: f64) -> SiteFootprint {
        let center = Coordinate::new(41.0, 29.0);
        resolve_footprint(&SiteDefinition::Point { center, radius_m }).unwrap()
    }

    #[test]
    fn rational_method_units() {
        // C = 0.5, i = 100 mm/h, A = 1 km², SF = 1.15 → 0.278·50·1.15 = 15.985 m³/s.
        let q = rational_discharge(0.5, 100.0, 1.0, &HydraulicConfig::default());
        assert_relative_eq!(q, 15.985, epsilon = 1e-9);
    }

    #[test]
    fn urban_site_sizes_a_verified_pipe() {
        let cfg = HydraulicConfig::default();
        let d = size_conduit(0.75, 60.0, &disc(200.0), 2.0, Topology::Reticular, &cfg);
        assert!(d.is_valid(), "{d:?}");
        assert_eq!(d.roughness, 0.013);
        assert!(
            d.diameter_mm > 300.0 && d.diameter_mm < 2000.0,
            "diameter {:.0} mm",
            d.diameter_mm
        );
        let nominal = d.nominal_diameter_mm.unwrap();
        assert!(f64::from(nominal) >= d.diameter_mm);
    }

    #[test]
    fn naturalistic_topology_uses_rough_channel() {
        let cfg = HydraulicConfig::default();
        let engineered = size_conduit(0.5, 50.0, &disc(150.0), 4.0, Topology::Dendritic, &cfg);
        let natural = size_conduit(0.5, 50.0, &disc(150.0), 4.0, Topology::Meandering, &cfg);
        assert_eq!(natural.roughness, 0.025);
        assert!(natural.diameter_mm > engineered.diameter_mm);
    }

    #[test]
    fn bed_slope_has_a_floor() {
        let cfg = HydraulicConfig::default();
        assert_eq!(bed_slope(0.0, &cfg), 0.005);
        assert_eq!(bed_slope(f64::NAN, &cfg), 0.005);
        assert_relative_eq!(bed_slope(3.0, &cfg), 0.03);
    }

    #[test]
    fn zero_runoff_is_not_sized() {
        let cfg = HydraulicConfig::default();
        let d = size_conduit(0.0, 60.0, &disc(100.0), 2.0, Topology::Parallel, &cfg);
        assert_eq!(d.validation, ValidationStatus::NoDischarge);
        assert_eq!(d.diameter_mm, 0.0);
        assert_eq!(d.velocity_m_s, 0.0);
        assert!(d.discharge_m3s == 0.0);
    }
}
