//! Pure lookups on a sized conduit: commercial size, network scale, and the
//! material / nature-based solution pairing.

use serde::{Deserialize, Serialize};

use crate::topology::Topology;

/// Commercial pipe sizes (mm) a theoretical diameter is rounded up to.
pub const NOMINAL_SIZES_MM: [u32; 13] =
    [300, 400, 500, 600, 800, 1000, 1200, 1400, 1600, 1800, 2000, 2500, 3000];

/// Smallest commercial size ≥ `diameter_mm`; `None` beyond the largest
/// single barrel.
pub fn nominal_diameter_mm(diameter_mm: f64) -> Option<u32> {
    NOMINAL_SIZES_MM.iter().copied().find(|&size| f64::from(size) >= diameter_mm)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiameterBand {
    /// < 600 mm
    Small,
    /// 600–1200 mm
    Medium,
    /// > 1200 mm
    Large,
}

impl DiameterBand {
    pub fn of(diameter_mm: f64) -> Self {
        if diameter_mm < 600.0 {
            DiameterBand::Small
        } else if diameter_mm <= 1200.0 {
            DiameterBand::Medium
        } else {
            DiameterBand::Large
        }
    }
}

/// Role of the conduit in the wider network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkScale {
    StreetDrain,
    NeighbourhoodCollector,
    TrunkMain,
}

/// Street drain when small on every axis; collector when any axis is in
/// the middle band; trunk otherwise.
pub fn classify_scale(diameter_mm: f64, discharge_m3s: f64, area_ha: f64) -> NetworkScale {
    if diameter_mm < 500.0 && discharge_m3s < 1.5 && area_ha < 3.0 {
        return NetworkScale::StreetDrain;
    }
    let mid_diameter = (500.0..1000.0).contains(&diameter_mm);
    let mid_discharge = (1.5..5.0).contains(&discharge_m3s);
    let mid_area = (3.0..10.0).contains(&area_ha);
    if mid_diameter || mid_discharge || mid_area {
        NetworkScale::NeighbourhoodCollector
    } else {
        NetworkScale::TrunkMain
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecommendation {
    pub conduit: String,
    pub nature_based: String,
}

/// Material and paired nature-based measure for a winning topology,
/// diameter band, and runoff coefficient.
pub fn recommend_material(
    topology: Topology,
    band: DiameterBand,
    runoff_coefficient: f64,
) -> MaterialRecommendation {
    let conduit = if topology.is_naturalistic() {
        match band {
            DiameterBand::Small => "grass-lined swale",
            DiameterBand::Medium => "vegetated earth channel with coir erosion matting",
            DiameterBand::Large => "riprap-lined open channel with vegetated berms",
        }
    } else {
        match band {
            DiameterBand::Small => "PVC-U or corrugated HDPE pipe",
            DiameterBand::Medium => "structured-wall HDPE pipe",
            DiameterBand::Large => "reinforced concrete pipe",
        }
    };

    let nature_based = match topology {
        Topology::Reticular => "green-street grid of connected bioswales",
        Topology::Meandering => "riparian buffer planting along the channel",
        Topology::Radial => "infiltration basins at the channel outfalls",
        _ if runoff_coefficient > 0.6 => "permeable paving over an infiltration trench",
        _ if runoff_coefficient > 0.35 => "bioretention cells at inlets",
        _ => "rain gardens and filter strips",
    };

    MaterialRecommendation { conduit: conduit.to_string(), nature_based: nature_based.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_up_to_commercial_size() {
        assert_eq!(nominal_diameter_mm(120.0), Some(300));
        assert_eq!(nominal_diameter_mm(600.0), Some(600));
        assert_eq!(nominal_diameter_mm(601.0), Some(800));
        assert_eq!(nominal_diameter_mm(3200.0), None);
    }

    #[test]
    fn scale_classes() {
        assert_eq!(classify_scale(400.0, 0.4, 1.0), NetworkScale::StreetDrain);
        assert_eq!(classify_scale(700.0, 0.9, 2.0), NetworkScale::NeighbourhoodCollector);
        assert_eq!(classify_scale(450.0, 0.9, 5.0), NetworkScale::NeighbourhoodCollector);
        assert_eq!(classify_scale(1500.0, 8.0, 40.0), NetworkScale::TrunkMain);
    }

    #[test]
    fn naturalistic_topologies_get_open_channels() {
        let m = recommend_material(Topology::Meandering, DiameterBand::Medium, 0.3);
        assert!(m.conduit.contains("channel"), "{m:?}");
        let p = recommend_material(Topology::Dendritic, DiameterBand::Large, 0.3);
        assert_eq!(p.conduit, "reinforced concrete pipe");
    }

    #[test]
    fn sealed_catchments_get_infiltration() {
        let m = recommend_material(Topology::Hybrid, DiameterBand::Small, 0.8);
        assert!(m.nature_based.contains("permeable paving"), "{m:?}");
    }
}
