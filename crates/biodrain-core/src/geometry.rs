//! Site geometry resolver.
//!
//! Turns a point (disc) or corridor (buffered segment) definition into the
//! immutable `SiteFootprint` the rest of the engine works from: a center
//! coordinate for point-based climate queries, a planar area, and a
//! characteristic flow length.
//!
//! Distances use the local equirectangular approximation:
//!   dy = Δlat × 111 320 m/°
//!   dx = Δlon × 111 320 × cos(mid_lat) m/°
//! which is accurate to well under 1 % for the sub-10 km sites handled here.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Metres per degree of latitude.
pub const METRES_PER_DEGREE: f64 = 111_320.0;

/// Shortest characteristic flow length the hydrology is allowed to see.
pub const MIN_FLOW_LENGTH_M: f64 = 50.0;

/// Segments shorter than this are treated as degenerate corridors.
const MIN_SEGMENT_LENGTH_M: f64 = 1.0;

/// WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    fn validate(&self, what: &'static str) -> Result<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::parameter(what, self.lat, "latitude must lie in [-90, 90]"));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(Error::parameter(what, self.lon, "longitude must lie in [-180, 180]"));
        }
        Ok(())
    }

    /// Planar distance in metres (equirectangular approximation).
    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        let mid_lat = ((self.lat + other.lat) * 0.5).to_radians();
        let dy = (other.lat - self.lat) * METRES_PER_DEGREE;
        let dx = (other.lon - self.lon) * METRES_PER_DEGREE * mid_lat.cos();
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(&self, other: &Coordinate) -> Coordinate {
        Coordinate {
            lat: (self.lat + other.lat) * 0.5,
            lon: (self.lon + other.lon) * 0.5,
        }
    }
}

/// User-supplied site definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum SiteDefinition {
    /// Disc of `radius_m` around `center`.
    Point { center: Coordinate, radius_m: f64 },
    /// Segment `start`→`end` buffered by `half_width_m` on each side.
    Corridor {
        start: Coordinate,
        end: Coordinate,
        half_width_m: f64,
    },
}

/// Resolved site footprint. Created once per request and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteFootprint {
    pub definition: SiteDefinition,
    /// Point center, or segment midpoint for corridors.
    pub center: Coordinate,
    /// Planar area in m².
    pub area_m2: f64,
    /// Characteristic flow length in m, never below `MIN_FLOW_LENGTH_M`.
    pub flow_length_m: f64,
}

impl SiteFootprint {
    pub fn area_km2(&self) -> f64 {
        self.area_m2 / 1.0e6
    }

    pub fn area_ha(&self) -> f64 {
        self.area_m2 / 1.0e4
    }
}

fn positive_length(name: &'static str, v: f64) -> Result<()> {
    if !v.is_finite() || v <= 0.0 {
        return Err(Error::parameter(name, v, "must be a finite positive length in metres"));
    }
    Ok(())
}

/// Resolve a site definition into its footprint.
///
/// Point:    area = π·r²,        flow length = max(2r, 50 m)
/// Corridor: area = len × 2·hw,  flow length = max(len, 50 m), center = midpoint
pub fn resolve_footprint(definition: &SiteDefinition) -> Result<SiteFootprint> {
    match *definition {
        SiteDefinition::Point { center, radius_m } => {
            center.validate("center")?;
            positive_length("radius_m", radius_m)?;
            Ok(SiteFootprint {
                definition: definition.clone(),
                center,
                area_m2: std::f64::consts::PI * radius_m * radius_m,
                flow_length_m: (2.0 * radius_m).max(MIN_FLOW_LENGTH_M),
            })
        }
        SiteDefinition::Corridor { start, end, half_width_m } => {
            start.validate("start")?;
            end.validate("end")?;
            positive_length("half_width_m", half_width_m)?;
            let length = start.distance_m(&end);
            if length < MIN_SEGMENT_LENGTH_M {
                return Err(Error::InvalidGeometry(format!(
                    "corridor segment is degenerate ({length:.3} m long)"
                )));
            }
            Ok(SiteFootprint {
                definition: definition.clone(),
                center: start.midpoint(&end),
                area_m2: length * 2.0 * half_width_m,
                flow_length_m: length.max(MIN_FLOW_LENGTH_M),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn point_area_and_flow_length() {
        let fp = resolve_footprint(&SiteDefinition::Point {
            center: Coordinate::new(39.9, 32.8),
            radius_m: 200.0,
        })
        .unwrap();
        assert_relative_eq!(fp.area_m2, std::f64::consts::PI * 40_000.0, max_relative = 1e-12);
        assert_relative_eq!(fp.flow_length_m, 400.0);
        assert_eq!(fp.center, Coordinate::new(39.9, 32.8));
    }

    #[test]
    fn small_point_flow_length_is_floored() {
        let fp = resolve_footprint(&SiteDefinition::Point {
            center: Coordinate::new(0.0, 0.0),
            radius_m: 10.0,
        })
        .unwrap();
        assert_eq!(fp.flow_length_m, MIN_FLOW_LENGTH_M);
    }

    #[test]
    fn corridor_uses_midpoint_and_buffered_area() {
        // 0.01° of latitude ≈ 1113.2 m.
        let fp = resolve_footprint(&SiteDefinition::Corridor {
            start: Coordinate::new(40.00, 30.0),
            end: Coordinate::new(40.01, 30.0),
            half_width_m: 15.0,
        })
        .unwrap();
        assert_relative_eq!(fp.flow_length_m, 1113.2, max_relative = 1e-6);
        assert_relative_eq!(fp.area_m2, 1113.2 * 30.0, max_relative = 1e-6);
        assert_relative_eq!(fp.center.lat, 40.005, epsilon = 1e-12);
    }

    #[test]
    fn short_corridor_flow_length_is_floored() {
        // ≈ 22 m segment.
        let fp = resolve_footprint(&SiteDefinition::Corridor {
            start: Coordinate::new(0.0, 0.0),
            end: Coordinate::new(0.0002, 0.0),
            half_width_m: 5.0,
        })
        .unwrap();
        assert_eq!(fp.flow_length_m, MIN_FLOW_LENGTH_M);
        assert!(fp.area_m2 < 300.0, "area should follow the true length, got {}", fp.area_m2);
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let bad_radius = SiteDefinition::Point { center: Coordinate::new(0.0, 0.0), radius_m: 0.0 };
        assert!(matches!(resolve_footprint(&bad_radius), Err(Error::InvalidParameter { .. })));

        let nan_radius =
            SiteDefinition::Point { center: Coordinate::new(0.0, 0.0), radius_m: f64::NAN };
        assert!(resolve_footprint(&nan_radius).is_err());

        let degenerate = SiteDefinition::Corridor {
            start: Coordinate::new(10.0, 10.0),
            end: Coordinate::new(10.0, 10.0),
            half_width_m: 5.0,
        };
        assert!(matches!(resolve_footprint(&degenerate), Err(Error::InvalidGeometry(_))));

        let bad_lat = SiteDefinition::Point { center: Coordinate::new(91.0, 0.0), radius_m: 50.0 };
        assert!(resolve_footprint(&bad_lat).is_err());
    }
}
