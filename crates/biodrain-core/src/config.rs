//! Versioned engine calibration.
//!
//! Every tunable constant of the engine lives in one `EngineConfig`, so a
//! recalibration is a visible, testable change of value rather than an edit
//! to a formula. `Default` is the reference calibration; loaded
//! configurations are checked with `validate()` before use.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rainfall::intensity::BoundingBox;
use crate::topology::TopologyWeights;

pub const REFERENCE_VERSION: &str = "2024.2-reference";

/// Clamped linear ramp: 0 at or below `start`, 1 at or above `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateWindow {
    pub start: f64,
    pub end: f64,
}

impl GateWindow {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn ramp(&self, x: f64) -> f64 {
        ((x - self.start) / (self.end - self.start)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeConfig {
    /// Slope (percent) at which the slope factor saturates to 1.
    pub cap_percent: f64,
}

impl Default for SlopeConfig {
    fn default() -> Self {
        Self { cap_percent: 20.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunoffConfig {
    pub clay_factor: f64,
    pub sand_factor: f64,
    /// Vegetation index above which runoff starts to be damped.
    pub vegetation_threshold: f64,
    /// Damping reached at vegetation index 1.0.
    pub vegetation_max_damping: f64,
    /// Substitute for any missing scalar factor input.
    pub neutral_factor: f64,
}

impl Default for RunoffConfig {
    fn default() -> Self {
        Self {
            clay_factor: 1.25,
            sand_factor: 0.85,
            vegetation_threshold: 0.2,
            vegetation_max_damping: 0.30,
            neutral_factor: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KirpichConfig {
    pub coefficient: f64,
    pub length_exponent: f64,
    pub slope_exponent: f64,
    pub min_minutes: f64,
    pub max_minutes: f64,
    /// Floor on the slope (m/m) fed into the formula.
    pub min_slope: f64,
}

impl Default for KirpichConfig {
    fn default() -> Self {
        Self {
            coefficient: 0.0195,
            length_exponent: 0.77,
            slope_exponent: 0.385,
            min_minutes: 5.0,
            max_minutes: 45.0,
            min_slope: 0.01,
        }
    }
}

/// Power-law IDF calibrated to a region: i = a·t^(−b), a = P_T / 24^(1−b).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalIdfConfig {
    pub region: BoundingBox,
    pub exponent_b: f64,
    /// Shortest storm duration (h) the curve is evaluated at.
    pub min_duration_h: f64,
}

impl Default for RegionalIdfConfig {
    fn default() -> Self {
        Self {
            // Anatolian calibration box.
            region: BoundingBox::new(35.8, 42.2, 25.6, 44.9),
            exponent_b: 0.54,
            min_duration_h: 0.1,
        }
    }
}

/// Mean-annual-rainfall tier for the generic IDF climate multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateTier {
    /// Tier applies when mean annual rainfall is strictly below this.
    pub below_mm: f64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericIdfConfig {
    pub scale: f64,
    pub duration_offset_h: f64,
    pub exponent: f64,
    /// Ascending by `below_mm`; first match wins.
    pub climate_tiers: Vec<ClimateTier>,
    /// Multiplier above the last tier.
    pub wettest_multiplier: f64,
    /// Multiplier when mean annual rainfall is unknown.
    pub unknown_multiplier: f64,
}

impl Default for GenericIdfConfig {
    fn default() -> Self {
        Self {
            scale: 0.40,
            duration_offset_h: 0.15,
            exponent: 0.7,
            climate_tiers: vec![
                ClimateTier {
                    below_mm: 400.0,
                    multiplier: 1.30,
                },
                ClimateTier {
                    below_mm: 800.0,
                    multiplier: 1.15,
                },
                ClimateTier {
                    below_mm: 1500.0,
                    multiplier: 1.00,
                },
            ],
            wettest_multiplier: 0.90,
            unknown_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RainfallConfig {
    /// Mean annual total (mm) at which wetness W* saturates.
    pub wetness_reference_mm: f64,
    /// Historical daily maximum (mm) at which R_ext saturates.
    pub extreme_reference_mm: f64,
    pub return_period_years: f64,
    /// Minimum number of annual maxima for a Gumbel fit.
    pub min_fit_years: usize,
    /// Design depth used when no precipitation record is available.
    pub fallback_design_depth_mm: f64,
    /// `None` disables the regional policy everywhere.
    pub regional: Option<RegionalIdfConfig>,
    pub generic: GenericIdfConfig,
    pub kirpich: KirpichConfig,
}

impl Default for RainfallConfig {
    fn default() -> Self {
        Self {
            wetness_reference_mm: 1000.0,
            extreme_reference_mm: 120.0,
            return_period_years: 10.0,
            min_fit_years: 5,
            fallback_design_depth_mm: 60.0,
            regional: Some(RegionalIdfConfig::default()),
            generic: GenericIdfConfig::default(),
            kirpich: KirpichConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub wetness_weight: f64,
    pub imperviousness_weight: f64,
    pub slope_weight: f64,
    /// Share of W* inside the wet block (the rest is R_ext).
    pub wet_block_mean_share: f64,
    pub peak_threshold: f64,
    pub peak_gain: f64,
    pub aridity_gain: f64,
    pub urban_gate: GateWindow,
    pub storm_gate: GateWindow,
    /// Lower bounds of low / moderate / high / critical.
    pub level_thresholds: [f64; 4],
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            wetness_weight: 0.45,
            imperviousness_weight: 0.45,
            slope_weight: 0.10,
            wet_block_mean_share: 0.6,
            peak_threshold: 0.75,
            peak_gain: 0.4,
            aridity_gain: 0.3,
            urban_gate: GateWindow::new(0.35, 0.55),
            storm_gate: GateWindow::new(0.20, 0.40),
            level_thresholds: [0.20, 0.40, 0.60, 0.80],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydraulicConfig {
    pub runoff_constant: f64,
    pub safety_factor: f64,
    pub naturalistic_roughness: f64,
    pub engineered_roughness: f64,
    pub min_bed_slope: f64,
    /// Allowed relative gap between forward capacity and design discharge.
    pub validation_tolerance: f64,
    pub self_cleansing_velocity: f64,
    pub scour_velocity: f64,
}

impl Default for HydraulicConfig {
    fn default() -> Self {
        Self {
            runoff_constant: 0.278,
            safety_factor: 1.15,
            naturalistic_roughness: 0.025,
            engineered_roughness: 0.013,
            min_bed_slope: 0.005,
            validation_tolerance: 0.05,
            self_cleansing_velocity: 0.6,
            scour_velocity: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterGateConfig {
    /// Resolved elevations at or below this are open water.
    pub sea_level_m: f64,
    /// Water-covered fraction above which the site is open water.
    pub open_water_fraction: f64,
    /// Ramp over which nearby water raises flood risk.
    pub proximity: GateWindow,
    pub proximity_gain: f64,
}

impl Default for WaterGateConfig {
    fn default() -> Self {
        Self {
            sea_level_m: 0.0,
            open_water_fraction: 0.65,
            proximity: GateWindow::new(0.15, 0.65),
            proximity_gain: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Precipitation records with fewer valid days count as a provider failure.
    pub min_precipitation_days: usize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self { min_precipitation_days: 365 }
    }
}

/// Complete, versioned engine calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub version: String,
    pub slope: SlopeConfig,
    pub runoff: RunoffConfig,
    pub rainfall: RainfallConfig,
    pub risk: RiskConfig,
    pub topology: TopologyWeights,
    pub hydraulics: HydraulicConfig,
    pub water_gate: WaterGateConfig,
    pub acquisition: AcquisitionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: REFERENCE_VERSION.to_string(),
            slope: SlopeConfig::default(),
            runoff: RunoffConfig::default(),
            rainfall: RainfallConfig::default(),
            risk: RiskConfig::default(),
            topology: TopologyWeights::default(),
            hydraulics: HydraulicConfig::default(),
            water_gate: WaterGateConfig::default(),
            acquisition: AcquisitionConfig::default(),
        }
    }
}

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

fn invalid(msg: String) -> Error {
    Error::InvalidConfig(msg)
}

fn require_positive(name: &str, v: f64) -> Result<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be finite and > 0, got {v}")))
    }
}

fn require_unit(name: &str, v: f64) -> Result<()> {
    if v.is_finite() && (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must lie in [0, 1], got {v}")))
    }
}

fn require_window(name: &str, w: &GateWindow) -> Result<()> {
    if w.start.is_finite() && w.end.is_finite() && w.start < w.end {
        Ok(())
    } else {
        Err(invalid(format!("{name} window must have start < end, got [{}, {}]", w.start, w.end)))
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every constant for physical sense and internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(invalid("version must not be empty".into()));
        }

        require_positive("slope.cap_percent", self.slope.cap_percent)?;

        let r = &self.runoff;
        require_positive("runoff.clay_factor", r.clay_factor)?;
        require_positive("runoff.sand_factor", r.sand_factor)?;
        require_unit("runoff.vegetation_threshold", r.vegetation_threshold)?;
        if r.vegetation_threshold >= 1.0 {
            return Err(invalid("runoff.vegetation_threshold must be < 1".into()));
        }
        require_unit("runoff.vegetation_max_damping", r.vegetation_max_damping)?;
        require_unit("runoff.neutral_factor", r.neutral_factor)?;

        let rf = &self.rainfall;
        require_positive("rainfall.wetness_reference_mm", rf.wetness_reference_mm)?;
        require_positive("rainfall.extreme_reference_mm", rf.extreme_reference_mm)?;
        if !(rf.return_period_years.is_finite() && rf.return_period_years > 1.0) {
            return Err(invalid(format!(
                "rainfall.return_period_years must be > 1, got {}",
                rf.return_period_years
            )));
        }
        if rf.min_fit_years < 2 {
            return Err(invalid("rainfall.min_fit_years must be at least 2".into()));
        }
        require_positive("rainfall.fallback_design_depth_mm", rf.fallback_design_depth_mm)?;
        if let Some(regional) = &rf.regional {
            if !(regional.exponent_b > 0.0 && regional.exponent_b < 1.0) {
                return Err(invalid(format!(
                    "rainfall.regional.exponent_b must lie in (0, 1), got {}",
                    regional.exponent_b
                )));
            }
            require_positive("rainfall.regional.min_duration_h", regional.min_duration_h)?;
            regional.region.validate()?;
        }
        let g = &rf.generic;
        require_positive("rainfall.generic.scale", g.scale)?;
        require_positive("rainfall.generic.duration_offset_h", g.duration_offset_h)?;
        require_positive("rainfall.generic.exponent", g.exponent)?;
        require_positive("rainfall.generic.wettest_multiplier", g.wettest_multiplier)?;
        require_positive("rainfall.generic.unknown_multiplier", g.unknown_multiplier)?;
        for pair in g.climate_tiers.windows(2) {
            if pair[0].below_mm >= pair[1].below_mm {
                return Err(invalid("rainfall.generic.climate_tiers must be ascending".into()));
            }
        }
        for tier in &g.climate_tiers {
            require_positive("rainfall.generic.climate_tiers.multiplier", tier.multiplier)?;
        }
        let k = &rf.kirpich;
        require_positive("rainfall.kirpich.coefficient", k.coefficient)?;
        require_positive("rainfall.kirpich.min_slope", k.min_slope)?;
        require_positive("rainfall.kirpich.min_minutes", k.min_minutes)?;
        if k.min_minutes >= k.max_minutes {
            return Err(invalid("rainfall.kirpich.min_minutes must be < max_minutes".into()));
        }

        let rk = &self.risk;
        for (name, v) in [
            ("risk.wetness_weight", rk.wetness_weight),
            ("risk.imperviousness_weight", rk.imperviousness_weight),
            ("risk.slope_weight", rk.slope_weight),
            ("risk.wet_block_mean_share", rk.wet_block_mean_share),
            ("risk.peak_threshold", rk.peak_threshold),
        ] {
            require_unit(name, v)?;
        }
        let sum = rk.wetness_weight + rk.imperviousness_weight + rk.slope_weight;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(invalid(format!("risk weights must sum to 1, got {sum}")));
        }
        let gains = [("risk.peak_gain", rk.peak_gain), ("risk.aridity_gain", rk.aridity_gain)];
        for (name, v) in gains {
            if !(v.is_finite() && v >= 0.0) {
                return Err(invalid(format!("{name} must be finite and >= 0, got {v}")));
            }
        }
        require_window("risk.urban_gate", &rk.urban_gate)?;
        require_window("risk.storm_gate", &rk.storm_gate)?;
        let ladder = rk.level_thresholds;
        let ascending = ladder.windows(2).all(|p| p[0] < p[1]);
        if !ascending || ladder[0] <= 0.0 || ladder[3] > 1.0 {
            return Err(invalid(format!(
                "risk.level_thresholds must be strictly ascending inside (0, 1], got {ladder:?}"
            )));
        }

        self.topology.validate()?;

        let h = &self.hydraulics;
        require_positive("hydraulics.runoff_constant", h.runoff_constant)?;
        require_positive("hydraulics.safety_factor", h.safety_factor)?;
        require_positive("hydraulics.naturalistic_roughness", h.naturalistic_roughness)?;
        require_positive("hydraulics.engineered_roughness", h.engineered_roughness)?;
        require_positive("hydraulics.min_bed_slope", h.min_bed_slope)?;
        require_positive("hydraulics.validation_tolerance", h.validation_tolerance)?;
        require_positive("hydraulics.self_cleansing_velocity", h.self_cleansing_velocity)?;
        if h.scour_velocity <= h.self_cleansing_velocity {
            return Err(invalid(
                "hydraulics.scour_velocity must exceed self_cleansing_velocity".into(),
            ));
        }

        let w = &self.water_gate;
        if !w.sea_level_m.is_finite() {
            return Err(invalid("water_gate.sea_level_m must be finite".into()));
        }
        require_unit("water_gate.open_water_fraction", w.open_water_fraction)?;
        require_window("water_gate.proximity", &w.proximity)?;
        require_unit("water_gate.proximity_gain", w.proximity_gain)?;

        Ok(())
    }
}
