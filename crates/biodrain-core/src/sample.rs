//! Resolved environmental measurements for one site.
//!
//! Every field may be absent. Absence is always explicit (`None`,
//! `Elevation::Unresolved`), never encoded as a numeric sentinel, so that a
//! genuine 0 m or below-sea-level reading cannot be confused with a failed
//! lookup.

use serde::{Deserialize, Serialize};

/// Mean terrain slope in the unit the provider reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "kebab-case")]
pub enum SlopeMeasure {
    Percent(f64),
    Degrees(f64),
}

/// Largest angle accepted before the tangent blows up.
const MAX_SLOPE_DEG: f64 = 89.9;

impl SlopeMeasure {
    /// Slope in percent (rise/run × 100). Degrees go through `tan`, which is
    /// exact at every angle, unlike a linear degrees→percent factor.
    /// Returns `None` for non-finite readings.
    pub fn percent(&self) -> Option<f64> {
        match *self {
            SlopeMeasure::Percent(p) if p.is_finite() => Some(p.abs()),
            SlopeMeasure::Degrees(d) if d.is_finite() => {
                let deg = d.abs().min(MAX_SLOPE_DEG);
                Some(deg.to_radians().tan() * 100.0)
            }
            _ => None,
        }
    }
}

/// Mean footprint elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "metres", rename_all = "kebab-case")]
pub enum Elevation {
    Resolved(f64),
    Unresolved,
}

impl Elevation {
    pub fn metres(&self) -> Option<f64> {
        match *self {
            Elevation::Resolved(m) if m.is_finite() => Some(m),
            _ => None,
        }
    }
}

/// Dominant land-cover class of the footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LandCoverClass {
    Forest,
    Meadow,
    Grassland,
    Greenfield,
    Farmland,
    Orchard,
    Residential,
    Commercial,
    Industrial,
    BareSoil,
    Wetland,
    Water,
    Other,
}

impl LandCoverClass {
    /// Typical permeability (share of rainfall that infiltrates).
    pub fn typical_permeability(self) -> f64 {
        match self {
            LandCoverClass::Forest => 0.85,
            LandCoverClass::Meadow | LandCoverClass::Grassland => 0.80,
            LandCoverClass::Greenfield => 0.75,
            LandCoverClass::Farmland | LandCoverClass::Orchard => 0.60,
            LandCoverClass::Residential => 0.35,
            LandCoverClass::Commercial => 0.30,
            LandCoverClass::Industrial => 0.25,
            LandCoverClass::Wetland => 0.10,
            LandCoverClass::Water => 0.0,
            LandCoverClass::BareSoil | LandCoverClass::Other => 0.50,
        }
    }
}

/// Dominant topsoil texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SoilTexture {
    Clay,
    Silt,
    Loam,
    Sand,
}

/// Every measurement the engine consumes for one footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalSample {
    pub slope: Option<SlopeMeasure>,
    pub land_cover: Option<LandCoverClass>,
    /// Raw permeability in [0, 1]; derived from `land_cover` when absent.
    pub permeability: Option<f64>,
    pub soil_texture: Option<SoilTexture>,
    /// Mean vegetation index (NDVI-like, −1..1).
    pub vegetation_index: Option<f64>,
    pub elevation: Elevation,
    /// Water-covered share of the footprint in [0, 1].
    pub water_fraction: Option<f64>,
}

impl Default for EnvironmentalSample {
    fn default() -> Self {
        Self {
            slope: None,
            land_cover: None,
            permeability: None,
            soil_texture: None,
            vegetation_index: None,
            elevation: Elevation::Unresolved,
            water_fraction: None,
        }
    }
}

impl EnvironmentalSample {
    /// Water fraction clamped to [0, 1]; absent or non-finite reads as dry.
    pub fn water_fraction_or_dry(&self) -> f64 {
        self.water_fraction
            .filter(|f| f.is_finite())
            .map(|f| f.clamp(0.0, 1.0))
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn degrees_convert_through_tangent() {
        assert_relative_eq!(SlopeMeasure::Degrees(45.0).percent().unwrap(), 100.0, epsilon = 1e-9);
        // 30° is 57.7 %, a linear 1.5×/° rule would give 45 %.
        assert_relative_eq!(SlopeMeasure::Degrees(30.0).percent().unwrap(), 57.735, epsilon = 1e-3);
    }

    #[test]
    fn vertical_slope_is_finite() {
        let p = SlopeMeasure::Degrees(90.0).percent().unwrap();
        assert!(p.is_finite() && p > 10_000.0, "got {p}");
    }

    #[test]
    fn non_finite_slope_is_absent() {
        assert!(SlopeMeasure::Percent(f64::NAN).percent().is_none());
        assert!(SlopeMeasure::Degrees(f64::INFINITY).percent().is_none());
    }

    #[test]
    fn unresolved_elevation_is_not_zero() {
        assert_eq!(Elevation::Unresolved.metres(), None);
        assert_eq!(Elevation::Resolved(0.0).metres(), Some(0.0));
        assert_eq!(Elevation::Resolved(-28.0).metres(), Some(-28.0));
    }

    #[test]
    fn sample_serialises_with_explicit_absence() {
        let json = serde_json::to_value(EnvironmentalSample::default()).unwrap();
        assert_eq!(json["elevation"]["status"], "unresolved");
        assert!(json["slope"].is_null());
    }
}
