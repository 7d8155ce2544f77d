//! Provider interfaces and input acquisition.
//!
//! Each capability (terrain, land cover, soil, vegetation, precipitation)
//! is served by an ordered `SourceChain` of providers. The first provider
//! that answers wins and its name is kept as provenance; every failure is
//! kept too. A provider never reports "no data" as a zero: it returns a
//! `ProviderError`.
//!
//! Terrain and land cover are required. The other capabilities fall back to
//! neutral values downstream when every provider fails. A missing required
//! capability still hands back whatever did resolve.

pub mod snapshot;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AcquisitionConfig;
use crate::geometry::SiteFootprint;
use crate::rainfall::RainfallSeries;
use crate::sample::{Elevation, EnvironmentalSample, LandCoverClass, SlopeMeasure, SoilTexture};

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProviderError {
    #[error("provider unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("insufficient samples: got {got}, need {required}")]
    InsufficientSamples { got: usize, required: usize },
}

impl ProviderError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        ProviderError::Unavailable { reason: reason.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Terrain,
    LandCover,
    Soil,
    Vegetation,
    Precipitation,
}

/// Elevation and mean slope over the footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainSample {
    pub elevation: Elevation,
    pub slope: Option<SlopeMeasure>,
}

/// Land-cover class, raw permeability, and water-covered share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandCoverSample {
    pub class: Option<LandCoverClass>,
    pub permeability: Option<f64>,
    pub water_fraction: Option<f64>,
}

/// Mean vegetation index over the footprint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VegetationIndex(pub f64);

/// A source of one capability for a footprint.
pub trait Provider<T>: Send + Sync {
    fn name(&self) -> &str;
    fn fetch(&self, site: &SiteFootprint) -> Result<T, ProviderError>;
}

impl<T, P: Provider<T> + ?Sized> Provider<T> for Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, site: &SiteFootprint) -> Result<T, ProviderError> {
        (**self).fetch(site)
    }
}

/// A value tagged with the provider that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub capability: Capability,
    pub provider: String,
    pub error: ProviderError,
}

/// Ordered providers for one capability.
pub struct SourceChain<T> {
    capability: Capability,
    providers: Vec<Box<dyn Provider<T>>>,
}

impl<T> SourceChain<T> {
    pub fn new(capability: Capability) -> Self {
        Self { capability, providers: Vec::new() }
    }

    /// Append a provider; earlier providers are tried first.
    pub fn with(mut self, provider: impl Provider<T> + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn push(&mut self, provider: Box<dyn Provider<T>>) {
        self.providers.push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Try each provider in order, accepting the first answer that passes
    /// `check`. Failures are appended to `failures`.
    pub fn fetch_checked(
        &self,
        site: &SiteFootprint,
        check: impl Fn(&T) -> Result<(), ProviderError>,
        failures: &mut Vec<ProviderFailure>,
    ) -> Option<Sourced<T>> {
        for provider in &self.providers {
            let outcome = provider.fetch(site).and_then(|value| check(&value).map(|()| value));
            match outcome {
                Ok(value) => {
                    return Some(Sourced { value, source: provider.name().to_string() });
                }
                Err(error) => {
                    tracing::warn!(
                        capability = ?self.capability,
                        provider = provider.name(),
                        %error,
                        "provider failed, trying next"
                    );
                    failures.push(ProviderFailure {
                        capability: self.capability,
                        provider: provider.name().to_string(),
                        error,
                    });
                }
            }
        }
        if self.providers.is_empty() {
            failures.push(ProviderFailure {
                capability: self.capability,
                provider: "<none>".to_string(),
                error: ProviderError::unavailable("no provider configured"),
            });
        }
        None
    }

    pub fn fetch(
        &self,
        site: &SiteFootprint,
        failures: &mut Vec<ProviderFailure>,
    ) -> Option<Sourced<T>> {
        self.fetch_checked(site, |_| Ok(()), failures)
    }
}

/// Provider chains for every capability.
pub struct Providers {
    pub terrain: SourceChain<TerrainSample>,
    pub land_cover: SourceChain<LandCoverSample>,
    pub soil: SourceChain<SoilTexture>,
    pub vegetation: SourceChain<VegetationIndex>,
    pub precipitation: SourceChain<RainfallSeries>,
}

impl Default for Providers {
    fn default() -> Self {
        Self {
            terrain: SourceChain::new(Capability::Terrain),
            land_cover: SourceChain::new(Capability::LandCover),
            soil: SourceChain::new(Capability::Soil),
            vegetation: SourceChain::new(Capability::Vegetation),
            precipitation: SourceChain::new(Capability::Precipitation),
        }
    }
}

impl Providers {
    /// One provider object serving every capability.
    pub fn single<P>(provider: Arc<P>) -> Self
    where
        P: Provider<TerrainSample>
            + Provider<LandCoverSample>
            + Provider<SoilTexture>
            + Provider<VegetationIndex>
            + Provider<RainfallSeries>
            + 'static,
    {
        Self {
            terrain: SourceChain::new(Capability::Terrain).with(Arc::clone(&provider)),
            land_cover: SourceChain::new(Capability::LandCover).with(Arc::clone(&provider)),
            soil: SourceChain::new(Capability::Soil).with(Arc::clone(&provider)),
            vegetation: SourceChain::new(Capability::Vegetation).with(Arc::clone(&provider)),
            precipitation: SourceChain::new(Capability::Precipitation).with(provider),
        }
    }
}

/// Which provider answered each capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub terrain: Option<String>,
    pub land_cover: Option<String>,
    pub soil: Option<String>,
    pub vegetation: Option<String>,
    pub precipitation: Option<String>,
    /// Failed attempts, including those a later provider recovered from.
    pub failures: Vec<ProviderFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedInputs {
    pub sample: EnvironmentalSample,
    pub rainfall: RainfallSeries,
    pub provenance: Provenance,
}

/// Why an analysis could not be computed from upstream data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnavailableReport {
    pub missing: Vec<Capability>,
    pub failures: Vec<ProviderFailure>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Acquisition {
    Resolved(ResolvedInputs),
    /// A required capability failed. `partial` carries whatever did resolve
    /// so the water gate can still run on it.
    Incomplete { partial: ResolvedInputs, report: UnavailableReport },
}

/// Query every chain for `site` and assemble the engine inputs.
pub fn acquire(
    providers: &Providers,
    site: &SiteFootprint,
    config: &AcquisitionConfig,
) -> Acquisition {
    let mut failures = Vec::new();

    let terrain = providers.terrain.fetch(site, &mut failures);
    let land_cover = providers.land_cover.fetch(site, &mut failures);
    let soil = providers.soil.fetch(site, &mut failures);
    let vegetation = providers.vegetation.fetch(site, &mut failures);
    let min_days = config.min_precipitation_days;
    let precipitation = providers.precipitation.fetch_checked(
        site,
        |series| {
            let got = series.valid_day_count();
            if got < min_days {
                Err(ProviderError::InsufficientSamples { got, required: min_days })
            } else {
                Ok(())
            }
        },
        &mut failures,
    );

    let mut missing = Vec::new();
    if terrain.is_none() {
        missing.push(Capability::Terrain);
    }
    if land_cover.is_none() {
        missing.push(Capability::LandCover);
    }

    let terrain_value = terrain.as_ref().map(|t| &t.value);
    let land_value = land_cover.as_ref().map(|l| &l.value);
    let sample = EnvironmentalSample {
        slope: terrain_value.and_then(|t| t.slope),
        land_cover: land_value.and_then(|l| l.class),
        permeability: land_value.and_then(|l| l.permeability),
        soil_texture: soil.as_ref().map(|s| s.value),
        vegetation_index: vegetation.as_ref().map(|v| v.value.0),
        elevation: terrain_value.map_or(Elevation::Unresolved, |t| t.elevation),
        water_fraction: land_value.and_then(|l| l.water_fraction),
    };

    let provenance = Provenance {
        terrain: terrain.map(|t| t.source),
        land_cover: land_cover.map(|l| l.source),
        soil: soil.map(|s| s.source),
        vegetation: vegetation.map(|v| v.source),
        precipitation: precipitation.as_ref().map(|p| p.source.clone()),
        failures,
    };

    let inputs = ResolvedInputs {
        sample,
        rainfall: precipitation.map(|p| p.value).unwrap_or_default(),
        provenance,
    };

    if missing.is_empty() {
        Acquisition::Resolved(inputs)
    } else {
        let report = UnavailableReport {
            missing,
            failures: inputs.provenance.failures.clone(),
            detail: Some("required capability unavailable from every provider".to_string()),
        };
        Acquisition::Incomplete { partial: inputs, report }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{resolve_footprint, Coordinate, SiteDefinition};
    use crate::rainfall::YearRecord;

    struct Fixed<T> {
        name: &'static str,
        value: Result<T, ProviderError>,
    }

    impl<T: Clone + Send + Sync> Provider<T> for Fixed<T> {
        fn name(&self) -> &str {
            self.name
        }

        fn fetch(&self, _: &SiteFootprint) -> Result<T, ProviderError> {
            self.value.clone()
        }
    }

    fn ok<T>(name: &'static str, value: T) -> Fixed<T> {
        Fixed { name, value: Ok(value) }
    }

    fn down<T>(name: &'static str) -> Fixed<T> {
        Fixed { name, value: Err(ProviderError::unavailable("timeout")) }
    }

    fn site() -> SiteFootprint {
        let center = Coordinate::new(39.0, 35.0);
        resolve_footprint(&SiteDefinition::Point { center, radius_m: 150.0 }).unwrap()
    }

    fn terrain() -> TerrainSample {
        TerrainSample {
            elevation: Elevation::Resolved(900.0),
            slope: Some(SlopeMeasure::Percent(4.0)),
        }
    }

    fn land() -> LandCoverSample {
        LandCoverSample {
            class: Some(LandCoverClass::Residential),
            permeability: None,
            water_fraction: Some(0.0),
        }
    }

    fn series(days: usize) -> RainfallSeries {
        RainfallSeries { years: vec![YearRecord { year: 2020, daily_mm: vec![Some(1.0); days] }] }
    }

    #[test]
    fn chain_falls_through_to_second_provider() {
        let chain: SourceChain<TerrainSample> = SourceChain::new(Capability::Terrain)
            .with(down("primary"))
            .with(ok("secondary", terrain()));
        let mut failures = Vec::new();
        let got = chain.fetch(&site(), &mut failures).unwrap();
        assert_eq!(got.source, "secondary");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].provider, "primary");
    }

    #[test]
    fn missing_required_capability_keeps_partial_inputs() {
        let providers = Providers {
            terrain: SourceChain::new(Capability::Terrain).with(down("dem-a")).with(down("dem-b")),
            land_cover: SourceChain::new(Capability::LandCover).with(ok("lc", land())),
            ..Default::default()
        };
        match acquire(&providers, &site(), &AcquisitionConfig::default()) {
            Acquisition::Incomplete { partial, report } => {
                assert_eq!(report.missing, vec![Capability::Terrain]);
                assert!(report.failures.iter().any(|f| f.provider == "dem-b"));
                assert_eq!(partial.sample.elevation, Elevation::Unresolved);
                assert_eq!(partial.sample.water_fraction, Some(0.0));
                assert_eq!(partial.provenance.land_cover.as_deref(), Some("lc"));
            }
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[test]
    fn optional_capabilities_may_fail() {
        let providers = Providers {
            terrain: SourceChain::new(Capability::Terrain).with(ok("dem", terrain())),
            land_cover: SourceChain::new(Capability::LandCover).with(ok("lc", land())),
            soil: SourceChain::new(Capability::Soil).with(down("soilgrid")),
            ..Default::default()
        };
        let acquired = acquire(&providers, &site(), &AcquisitionConfig::default());
        let Acquisition::Resolved(inputs) = acquired else {
            panic!("optional failures must not block acquisition");
        };
        assert_eq!(inputs.sample.soil_texture, None);
        assert_eq!(inputs.provenance.terrain.as_deref(), Some("dem"));
        assert!(inputs.rainfall.years.is_empty());
        let failed: Vec<Capability> =
            inputs.provenance.failures.iter().map(|f| f.capability).collect();
        assert_eq!(
            failed,
            vec![Capability::Soil, Capability::Vegetation, Capability::Precipitation]
        );
    }

    #[test]
    fn short_precipitation_record_falls_through() {
        let providers = Providers {
            terrain: SourceChain::new(Capability::Terrain).with(ok("dem", terrain())),
            land_cover: SourceChain::new(Capability::LandCover).with(ok("lc", land())),
            precipitation: SourceChain::new(Capability::Precipitation)
                .with(ok("gauge", series(30)))
                .with(ok("reanalysis", series(400))),
            ..Default::default()
        };
        let acquired = acquire(&providers, &site(), &AcquisitionConfig::default());
        let Acquisition::Resolved(inputs) = acquired else {
            panic!("expected resolved inputs");
        };
        assert_eq!(inputs.provenance.precipitation.as_deref(), Some("reanalysis"));
        assert!(inputs.provenance.failures.iter().any(|f| f.error
            == ProviderError::InsufficientSamples { got: 30, required: 365 }));
    }
}
