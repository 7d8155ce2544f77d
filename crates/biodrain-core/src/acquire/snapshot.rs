//! Recorded measurements served as a provider.
//!
//! A snapshot file freezes everything upstream services returned for one
//! site, so an evaluation can be replayed offline and deterministically.

use serde::{Deserialize, Serialize};

use super::{LandCoverSample, Provider, ProviderError, TerrainSample, VegetationIndex};
use crate::engine::AnalysisRequest;
use crate::geometry::SiteFootprint;
use crate::rainfall::RainfallSeries;
use crate::sample::{Elevation, LandCoverClass, SlopeMeasure, SoilTexture};

/// Per-capability readings; any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordedMeasurements {
    pub elevation_m: Option<f64>,
    pub slope: Option<SlopeMeasure>,
    pub land_cover: Option<LandCoverClass>,
    pub permeability: Option<f64>,
    pub water_fraction: Option<f64>,
    pub soil_texture: Option<SoilTexture>,
    pub vegetation_index: Option<f64>,
    pub precipitation: Option<RainfallSeries>,
}

const NAME: &str = "snapshot";

fn missing(what: &str) -> ProviderError {
    ProviderError::unavailable(format!("snapshot has no {what} reading"))
}

impl Provider<TerrainSample> for RecordedMeasurements {
    fn name(&self) -> &str {
        NAME
    }

    fn fetch(&self, _site: &SiteFootprint) -> Result<TerrainSample, ProviderError> {
        if self.elevation_m.is_none() && self.slope.is_none() {
            return Err(missing("terrain"));
        }
        let elevation = match self.elevation_m {
            Some(m) => Elevation::Resolved(m),
            None => Elevation::Unresolved,
        };
        Ok(TerrainSample { elevation, slope: self.slope })
    }
}

impl Provider<LandCoverSample> for RecordedMeasurements {
    fn name(&self) -> &str {
        NAME
    }

    fn fetch(&self, _site: &SiteFootprint) -> Result<LandCoverSample, ProviderError> {
        if self.land_cover.is_none()
            && self.permeability.is_none()
            && self.water_fraction.is_none()
        {
            return Err(missing("land-cover"));
        }
        Ok(LandCoverSample {
            class: self.land_cover,
            permeability: self.permeability,
            water_fraction: self.water_fraction,
        })
    }
}

impl Provider<SoilTexture> for RecordedMeasurements {
    fn name(&self) -> &str {
        NAME
    }

    fn fetch(&self, _site: &SiteFootprint) -> Result<SoilTexture, ProviderError> {
        self.soil_texture.ok_or_else(|| missing("soil"))
    }
}

impl Provider<VegetationIndex> for RecordedMeasurements {
    fn name(&self) -> &str {
        NAME
    }

    fn fetch(&self, _site: &SiteFootprint) -> Result<VegetationIndex, ProviderError> {
        self.vegetation_index.map(VegetationIndex).ok_or_else(|| missing("vegetation"))
    }
}

impl Provider<RainfallSeries> for RecordedMeasurements {
    fn name(&self) -> &str {
        NAME
    }

    fn fetch(&self, _site: &SiteFootprint) -> Result<RainfallSeries, ProviderError> {
        self.precipitation.clone().ok_or_else(|| missing("precipitation"))
    }
}

/// One replayable evaluation: the request plus what the providers said.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSnapshot {
    /// Free-form label carried into batch output.
    #[serde(default)]
    pub label: Option<String>,
    pub request: AnalysisRequest,
    #[serde(default)]
    pub measurements: RecordedMeasurements,
}

impl SiteSnapshot {
    pub fn from_json_str(s: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
