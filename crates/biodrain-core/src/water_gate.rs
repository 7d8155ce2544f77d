//! Water-body gate.
//!
//! Runs before any factor is derived. A footprint at or below sea level, or
//! mostly covered by water, is open water and gets no drainage design. An
//! unresolved elevation on an otherwise dry footprint is a data problem, not
//! water, and is reported as such.

use serde::{Deserialize, Serialize};

use crate::config::WaterGateConfig;
use crate::sample::EnvironmentalSample;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum WaterReason {
    AtOrBelowSeaLevel { elevation_m: f64 },
    OpenWater { water_fraction: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Water(WaterReason),
    /// Land, with the water fraction that feeds the proximity penalty.
    Land { water_fraction: f64 },
    /// Neither water nor verifiably land.
    ElevationUnresolved,
}

pub fn water_gate(sample: &EnvironmentalSample, config: &WaterGateConfig) -> GateDecision {
    let elevation = sample.elevation.metres();
    let water_fraction = sample.water_fraction_or_dry();

    if let Some(m) = elevation {
        if m <= config.sea_level_m {
            return GateDecision::Water(WaterReason::AtOrBelowSeaLevel { elevation_m: m });
        }
    }
    if water_fraction > config.open_water_fraction {
        return GateDecision::Water(WaterReason::OpenWater { water_fraction });
    }
    match elevation {
        Some(_) => GateDecision::Land { water_fraction },
        None => GateDecision::ElevationUnresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Elevation;

    fn sample(elevation: Elevation, water_fraction: Option<f64>) -> EnvironmentalSample {
        EnvironmentalSample { elevation, water_fraction, ..Default::default() }
    }

    fn gate(s: &EnvironmentalSample) -> GateDecision {
        water_gate(s, &WaterGateConfig::default())
    }

    #[test]
    fn below_sea_level_is_water() {
        assert!(matches!(
            gate(&sample(Elevation::Resolved(-1.0), Some(0.0))),
            GateDecision::Water(WaterReason::AtOrBelowSeaLevel { .. })
        ));
        assert!(matches!(gate(&sample(Elevation::Resolved(0.0), None)), GateDecision::Water(_)));
    }

    #[test]
    fn mostly_flooded_footprint_is_water() {
        assert!(matches!(
            gate(&sample(Elevation::Resolved(40.0), Some(0.80))),
            GateDecision::Water(WaterReason::OpenWater { .. })
        ));
    }

    #[test]
    fn partial_water_stays_land() {
        for f in [0.16, 0.30, 0.50, 0.65] {
            assert_eq!(
                gate(&sample(Elevation::Resolved(50.0), Some(f))),
                GateDecision::Land { water_fraction: f },
                "fraction {f} must not short-circuit"
            );
        }
    }

    #[test]
    fn unresolved_elevation_is_not_water() {
        assert_eq!(
            gate(&sample(Elevation::Unresolved, Some(0.1))),
            GateDecision::ElevationUnresolved
        );
        // Unless the footprint is visibly water anyway.
        assert!(matches!(gate(&sample(Elevation::Unresolved, Some(0.9))), GateDecision::Water(_)));
    }
}
