//! Pipeline orchestrator: one request in, one `AnalysisResult` out.
//!
//! Stages, in order:
//!   geometry → acquisition → water gate → factors → design storm
//!   → flood risk → topology → conduit sizing
//!
//! Invalid requests are rejected before any provider is queried. Missing
//! upstream data is an outcome, not an error.

use serde::{Deserialize, Serialize};

use crate::acquire::{
    acquire, Acquisition, Capability, Provenance, Providers, ResolvedInputs, UnavailableReport,
};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::factors::{derive_factors, RiskFactors};
use crate::geometry::{resolve_footprint, SiteDefinition, SiteFootprint};
use crate::hydraulic::{size_conduit, ConduitDesign};
use crate::rainfall::intensity::RegionPredicate;
use crate::rainfall::{design_storm, DesignStorm, RainfallStats};
use crate::risk::{compose_flood_risk, FloodRiskScore};
use crate::topology::{select_topology, SelectionResult, TopologyInputs};
use crate::water_gate::{water_gate, GateDecision, WaterReason};

// ── Request / result ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub site: SiteDefinition,
    /// Overrides `rainfall.return_period_years` when set. Must be > 1.
    #[serde(default)]
    pub return_period_years: Option<f64>,
}

impl AnalysisRequest {
    pub fn new(site: SiteDefinition) -> Self {
        Self { site, return_period_years: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterVerdict {
    pub footprint: SiteFootprint,
    pub reason: WaterReason,
    pub provenance: Provenance,
}

/// Intermediate values behind a successful assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub config_version: String,
    pub factors: RiskFactors,
    pub rainfall: RainfallStats,
    pub design_storm: DesignStorm,
    pub water_fraction: f64,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub footprint: SiteFootprint,
    pub flood_risk: FloodRiskScore,
    pub selection: SelectionResult,
    pub conduit: ConduitDesign,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum AnalysisResult {
    Water(WaterVerdict),
    Success(Box<Assessment>),
    DataUnavailable(UnavailableReport),
}

impl AnalysisResult {
    pub fn outcome(&self) -> &'static str {
        match self {
            AnalysisResult::Water(_) => "water",
            AnalysisResult::Success(_) => "success",
            AnalysisResult::DataUnavailable(_) => "data-unavailable",
        }
    }

    pub fn assessment(&self) -> Option<&Assessment> {
        match self {
            AnalysisResult::Success(a) => Some(a.as_ref()),
            _ => None,
        }
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// A validated configuration plus the IDF region predicate.
///
/// Holds no mutable state, so one engine can serve any number of threads.
pub struct DrainageEngine {
    config: EngineConfig,
    region: Option<Box<dyn RegionPredicate>>,
}

impl DrainageEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, region: None })
    }

    /// Replace the configured bounding box with a custom region test.
    pub fn with_region(mut self, region: impl RegionPredicate + 'static) -> Self {
        self.region = Some(Box::new(region));
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn return_period(&self, request: &AnalysisRequest) -> Result<f64> {
        let t = request.return_period_years.unwrap_or(self.config.rainfall.return_period_years);
        if t.is_finite() && t > 1.0 {
            Ok(t)
        } else {
            Err(Error::parameter("return_period_years", t, "must be greater than 1"))
        }
    }

    /// Validate the request, query `providers`, and run the pipeline.
    pub fn evaluate(
        &self,
        request: &AnalysisRequest,
        providers: &Providers,
    ) -> Result<AnalysisResult> {
        let footprint = resolve_footprint(&request.site)?;
        let t_years = self.return_period(request)?;

        tracing::debug!(
            area_m2 = footprint.area_m2,
            flow_length_m = footprint.flow_length_m,
            t_years,
            "footprint resolved"
        );

        match acquire(providers, &footprint, &self.config.acquisition) {
            Acquisition::Resolved(inputs) => Ok(self.evaluate_resolved(footprint, inputs, t_years)),
            Acquisition::Incomplete { partial, report } => {
                Ok(self.evaluate_incomplete(footprint, partial, report))
            }
        }
    }

    /// A required capability is missing, but what did resolve may still
    /// show open water. Only a Water decision outranks the report.
    fn evaluate_incomplete(
        &self,
        footprint: SiteFootprint,
        partial: ResolvedInputs,
        report: UnavailableReport,
    ) -> AnalysisResult {
        if let GateDecision::Water(reason) = water_gate(&partial.sample, &self.config.water_gate) {
            tracing::info!(
                ?reason,
                missing = ?report.missing,
                "footprint is open water on partial inputs"
            );
            return AnalysisResult::Water(WaterVerdict {
                footprint,
                reason,
                provenance: partial.provenance,
            });
        }
        tracing::warn!(missing = ?report.missing, "required inputs unavailable");
        AnalysisResult::DataUnavailable(report)
    }

    /// Run the pipeline on inputs that are already resolved.
    pub fn evaluate_resolved(
        &self,
        footprint: SiteFootprint,
        inputs: ResolvedInputs,
        t_years: f64,
    ) -> AnalysisResult {
        let ResolvedInputs { sample, rainfall, provenance } = inputs;
        let cfg = &self.config;

        let water_fraction = match water_gate(&sample, &cfg.water_gate) {
            GateDecision::Water(reason) => {
                tracing::info!(?reason, "footprint is open water, no drainage designed");
                return AnalysisResult::Water(WaterVerdict { footprint, reason, provenance });
            }
            GateDecision::ElevationUnresolved => {
                return AnalysisResult::DataUnavailable(UnavailableReport {
                    missing: vec![Capability::Terrain],
                    failures: provenance.failures,
                    detail: Some("elevation could not be resolved for a dry footprint".to_string()),
                });
            }
            GateDecision::Land { water_fraction } => water_fraction,
        };

        let stats = rainfall.stats();
        let factors = derive_factors(&sample, &stats, cfg);
        let storm = design_storm(
            &stats,
            footprint.center,
            footprint.flow_length_m,
            factors.slope_percent,
            t_years,
            &cfg.rainfall,
            self.region.as_deref(),
        );
        let flood_risk = compose_flood_risk(&factors, water_fraction, &cfg.risk, &cfg.water_gate);
        let selection = select_topology(&TopologyInputs::new(&factors, &flood_risk), &cfg.topology);
        let conduit = size_conduit(
            factors.runoff_coefficient,
            storm.intensity_mm_h,
            &footprint,
            factors.slope_percent,
            selection.selected,
            &cfg.hydraulics,
        );

        tracing::info!(
            score = flood_risk.score,
            level = flood_risk.level.as_str(),
            topology = selection.selected.as_str(),
            diameter_mm = conduit.diameter_mm,
            "site evaluated"
        );

        AnalysisResult::Success(Box::new(Assessment {
            footprint,
            flood_risk,
            selection,
            conduit,
            diagnostics: Diagnostics {
                config_version: cfg.version.clone(),
                factors,
                rainfall: stats,
                design_storm: storm,
                water_fraction,
                provenance,
            },
        }))
    }
}

impl DrainageEngine {
    /// Evaluate independent requests. Runs on the rayon pool with the
    /// `threading` feature; results keep the order of `jobs`.
    pub fn evaluate_batch(
        &self,
        jobs: &[(AnalysisRequest, Providers)],
    ) -> Vec<Result<AnalysisResult>> {
        #[cfg(feature = "threading")]
        {
            use rayon::prelude::*;
            jobs.par_iter().map(|(request, providers)| self.evaluate(request, providers)).collect()
        }
        #[cfg(not(feature = "threading"))]
        {
            jobs.iter().map(|(request, providers)| self.evaluate(request, providers)).collect()
        }
    }
}

/// One-shot evaluation with a freshly validated engine.
pub fn evaluate(
    request: &AnalysisRequest,
    providers: &Providers,
    config: &EngineConfig,
) -> Result<AnalysisResult> {
    DrainageEngine::new(config.clone())?.evaluate(request, providers)
}
