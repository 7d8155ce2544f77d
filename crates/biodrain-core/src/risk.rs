//! Flood risk composer.
//!
//!   W_blk    = 0.6·W* + 0.4·R_ext
//!   S_risk   = |2S − 1|                    (flat and steep both score high)
//!   Risk_lin = 0.45·W_blk + 0.45·C + 0.10·S_risk
//!   peak     = max(0, R_ext − 0.75) · 0.4
//!   aridity  = 0.3 · (1 − W*) · urban_gate(C) · storm_gate(R_ext)
//!   water    = proximity_gain · ramp(water_fraction)
//!   Risk     = clamp(Risk_lin + peak + aridity + water, 0, 1)
//!
//! The two aridity gates are independent ramps, so a dry site is only
//! penalised when it is both impervious and storm-prone.

use serde::{Deserialize, Serialize};

use crate::config::{RiskConfig, WaterGateConfig};
use crate::factors::RiskFactors;

/// Five-bucket ordinal flood risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FloodRiskLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    Critical,
}

impl FloodRiskLevel {
    /// Bucket a score against ascending lower bounds of
    /// low / moderate / high / critical.
    pub fn from_score(score: f64, thresholds: &[f64; 4]) -> Self {
        const LEVELS: [FloodRiskLevel; 4] = [
            FloodRiskLevel::Low,
            FloodRiskLevel::Moderate,
            FloodRiskLevel::High,
            FloodRiskLevel::Critical,
        ];
        thresholds
            .iter()
            .zip(LEVELS)
            .rev()
            .find(|(bound, _)| score >= **bound)
            .map_or(FloodRiskLevel::VeryLow, |(_, level)| level)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FloodRiskLevel::VeryLow => "very-low",
            FloodRiskLevel::Low => "low",
            FloodRiskLevel::Moderate => "moderate",
            FloodRiskLevel::High => "high",
            FloodRiskLevel::Critical => "critical",
        }
    }
}

/// Additive parts of the score, before the final clamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskComponents {
    pub wet_block: f64,
    pub slope_risk: f64,
    pub linear: f64,
    pub peak_boost: f64,
    pub urban_gate: f64,
    pub storm_gate: f64,
    pub aridity_penalty: f64,
    pub water_proximity_penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodRiskScore {
    /// In [0, 1].
    pub score: f64,
    pub level: FloodRiskLevel,
    pub components: RiskComponents,
}

/// Penalty for standing water inside the footprint that is not enough to
/// make the site open water.
pub fn water_proximity_penalty(water_fraction: f64, config: &WaterGateConfig) -> f64 {
    if !water_fraction.is_finite() || water_fraction > config.open_water_fraction {
        return 0.0;
    }
    config.proximity_gain * config.proximity.ramp(water_fraction)
}

pub fn compose_flood_risk(
    factors: &RiskFactors,
    water_fraction: f64,
    config: &RiskConfig,
    water: &WaterGateConfig,
) -> FloodRiskScore {
    let w = factors.wetness;
    let r = factors.extreme;
    let c = factors.runoff_coefficient;

    let wet_block = config.wet_block_mean_share * w + (1.0 - config.wet_block_mean_share) * r;
    let slope_risk = (2.0 * factors.slope_factor - 1.0).abs();
    let linear = config.wetness_weight * wet_block
        + config.imperviousness_weight * c
        + config.slope_weight * slope_risk;

    let peak_boost = (r - config.peak_threshold).max(0.0) * config.peak_gain;

    let urban_gate = config.urban_gate.ramp(c);
    let storm_gate = config.storm_gate.ramp(r);
    let aridity_penalty = config.aridity_gain * (1.0 - w) * urban_gate * storm_gate;

    let water_proximity_penalty = water_proximity_penalty(water_fraction, water);

    let total = linear + peak_boost + aridity_penalty + water_proximity_penalty;
    let score = if total.is_finite() { total.clamp(0.0, 1.0) } else { 0.0 };
    let level = FloodRiskLevel::from_score(score, &config.level_thresholds);

    FloodRiskScore {
        score,
        level,
        components: RiskComponents {
            wet_block,
            slope_risk,
            linear,
            peak_boost,
            urban_gate,
            storm_gate,
            aridity_penalty,
            water_proximity_penalty,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn factors(s: f64, c: f64, w: f64, r: f64) -> RiskFactors {
        RiskFactors {
            slope_percent: s * 20.0,
            slope_factor: s,
            runoff_coefficient: c,
            permeability_index: 1.0 - c,
            wetness: w,
            extreme: r,
            soil_multiplier: 1.0,
            vegetation_multiplier: 1.0,
            fallbacks: Vec::new(),
        }
    }

    fn score(f: &RiskFactors, water_fraction: f64) -> FloodRiskScore {
        compose_flood_risk(f, water_fraction, &RiskConfig::default(), &WaterGateConfig::default())
    }

    #[test]
    fn wet_flat_urban_site_is_critical() {
        // slope 2 % → S = 0.1
        let r = score(&factors(0.1, 0.75, 0.9, 0.95), 0.0);
        assert_relative_eq!(r.components.linear, 0.8315, epsilon = 1e-9);
        assert_relative_eq!(r.components.peak_boost, 0.08, epsilon = 1e-9);
        assert_relative_eq!(r.components.aridity_penalty, 0.03, epsilon = 1e-9);
        assert_eq!(r.level, FloodRiskLevel::Critical);
    }

    #[test]
    fn dry_steep_rural_site_is_low() {
        // slope 18 % → S = 0.9
        let r = score(&factors(0.9, 0.2, 0.3, 0.2), 0.0);
        assert_eq!(r.components.urban_gate, 0.0);
        assert_eq!(r.components.aridity_penalty, 0.0);
        assert!(r.score < 0.4, "score {:.3} should be below the moderate bound", r.score);
        assert!(matches!(r.level, FloodRiskLevel::VeryLow | FloodRiskLevel::Low));
    }

    #[test]
    fn aridity_needs_both_gates() {
        let impervious_but_calm = score(&factors(0.5, 0.9, 0.1, 0.1), 0.0);
        assert_eq!(impervious_but_calm.components.aridity_penalty, 0.0);

        let stormy_but_rural = score(&factors(0.5, 0.2, 0.1, 0.9), 0.0);
        assert_eq!(stormy_but_rural.components.aridity_penalty, 0.0);

        let both = score(&factors(0.5, 0.9, 0.1, 0.9), 0.0);
        assert_relative_eq!(both.components.aridity_penalty, 0.3 * 0.9, epsilon = 1e-12);
    }

    #[test]
    fn nearby_water_raises_risk() {
        let f = factors(0.4, 0.4, 0.5, 0.4);
        let dry = score(&f, 0.0);
        let near = score(&f, 0.30);
        assert!(
            near.score > dry.score,
            "water 0.30 ({:.3}) must exceed dry ({:.3})",
            near.score,
            dry.score
        );
        assert_eq!(score(&f, 0.15).components.water_proximity_penalty, 0.0);
    }

    #[test]
    fn ladder_covers_full_range() {
        let t = RiskConfig::default().level_thresholds;
        assert_eq!(FloodRiskLevel::from_score(0.0, &t), FloodRiskLevel::VeryLow);
        assert_eq!(FloodRiskLevel::from_score(0.2, &t), FloodRiskLevel::Low);
        assert_eq!(FloodRiskLevel::from_score(0.59, &t), FloodRiskLevel::Moderate);
        assert_eq!(FloodRiskLevel::from_score(0.6, &t), FloodRiskLevel::High);
        assert_eq!(FloodRiskLevel::from_score(1.0, &t), FloodRiskLevel::Critical);
    }

    #[test]
    fn score_stays_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..5_000 {
            let f = factors(rng.gen(), rng.gen(), rng.gen(), rng.gen());
            let r = score(&f, rng.gen_range(0.0..0.65));
            assert!((0.0..=1.0).contains(&r.score), "score {} out of range for {f:?}", r.score);
        }
    }

    #[test]
    fn level_is_monotone_in_score() {
        let t = RiskConfig::default().level_thresholds;
        let mut prev = FloodRiskLevel::VeryLow;
        for i in 0..=100 {
            let level = FloodRiskLevel::from_score(i as f64 / 100.0, &t);
            assert!(level >= prev, "level regressed at {i}");
            prev = level;
        }
    }
}
