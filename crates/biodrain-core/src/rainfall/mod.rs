//! Extreme rainfall model.
//!
//! Pipeline:
//!   daily record → `RainfallStats` (mean annual, daily max, annual maxima)
//!   → Gumbel return level P_T (or a fallback depth)
//!   → Kirpich time of concentration → design-storm intensity (mm/h).
//!
//! The regional IDF curve scales P_T; the generic one scales the largest
//! observed day.
//!
//! A record may be empty or full of gaps; every path ends at a finite,
//! positive intensity, and the fallback taken is reported in `DesignStorm`.

pub mod gumbel;
pub mod intensity;

use serde::{Deserialize, Serialize};

use crate::config::RainfallConfig;
use crate::geometry::Coordinate;

use gumbel::gumbel_return_level;
use intensity::{select_policy, time_of_concentration_min, IntensityPolicy, RegionPredicate};

/// One calendar year of daily precipitation totals (mm). Gaps are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    pub year: i32,
    pub daily_mm: Vec<Option<f64>>,
}

/// Multi-year daily precipitation record for a fixed, already-resolved
/// date window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RainfallSeries {
    pub years: Vec<YearRecord>,
}

impl RainfallSeries {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Valid (finite, non-negative) daily values of one year.
    fn valid_days(year: &YearRecord) -> impl Iterator<Item = f64> + '_ {
        year.daily_mm
            .iter()
            .flatten()
            .copied()
            .filter(|v| v.is_finite() && *v >= 0.0)
    }

    pub fn valid_day_count(&self) -> usize {
        self.years.iter().map(|y| Self::valid_days(y).count()).sum()
    }

    pub fn stats(&self) -> RainfallStats {
        let mut annual_totals = Vec::new();
        let mut annual_maxima = Vec::new();
        let mut all_days = Vec::new();

        let mut years: Vec<&YearRecord> = self.years.iter().collect();
        years.sort_by_key(|y| y.year);

        for year in years {
            let days: Vec<f64> = Self::valid_days(year).collect();
            if days.is_empty() {
                continue;
            }
            annual_totals.push(days.iter().sum::<f64>());
            annual_maxima.push(days.iter().copied().fold(0.0_f64, f64::max));
            all_days.extend(days);
        }

        let mean_annual_mm = if annual_totals.is_empty() {
            None
        } else {
            Some(annual_totals.iter().sum::<f64>() / annual_totals.len() as f64)
        };
        let max_daily_mm = annual_maxima.iter().copied().reduce(f64::max);
        let p99_daily_mm = percentile(&mut all_days, 0.99);

        RainfallStats {
            mean_annual_mm,
            max_daily_mm,
            p99_daily_mm,
            annual_maxima,
            valid_days: all_days.len(),
        }
    }
}

/// Nearest-rank percentile. Sorts `values` in place.
fn percentile(values: &mut [f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let idx = ((values.len() as f64 * q) as usize).min(values.len() - 1);
    Some(values[idx])
}

/// Summary statistics derived from a `RainfallSeries`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainfallStats {
    pub mean_annual_mm: Option<f64>,
    pub max_daily_mm: Option<f64>,
    pub p99_daily_mm: Option<f64>,
    /// One value per year with data, in year order.
    pub annual_maxima: Vec<f64>,
    pub valid_days: usize,
}

/// Where the design-storm depth P_T came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DesignDepthSource {
    GumbelFit,
    /// Too few years for a fit; the largest observed day is used.
    HistoricalMaximum,
    /// No usable record at all.
    ConfiguredFallback,
}

/// Design storm for one footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignStorm {
    pub return_period_years: f64,
    /// 24-hour design depth P_T in mm.
    pub design_depth_mm: f64,
    pub depth_source: DesignDepthSource,
    /// Depth the IDF policy scaled: P_T when regional, the largest
    /// observed day when generic.
    pub idf_depth_mm: f64,
    pub time_of_concentration_min: f64,
    pub intensity_mm_h: f64,
    pub policy: IntensityPolicy,
}

/// Design depth P_T for return period `t_years`.
pub fn design_depth(
    stats: &RainfallStats,
    t_years: f64,
    config: &RainfallConfig,
) -> (f64, DesignDepthSource) {
    if stats.annual_maxima.len() >= config.min_fit_years {
        match gumbel_return_level(&stats.annual_maxima, t_years) {
            Some(p_t) if p_t > 0.0 => return (p_t, DesignDepthSource::GumbelFit),
            _ => {}
        }
    }
    match stats.max_daily_mm {
        Some(max) if max > 0.0 => (max, DesignDepthSource::HistoricalMaximum),
        _ => (config.fallback_design_depth_mm, DesignDepthSource::ConfiguredFallback),
    }
}

/// Build the design storm for a footprint.
///
/// `slope_percent` and `flow_length_m` feed Kirpich; `region` selects the
/// regional IDF policy when it contains `center`.
pub fn design_storm(
    stats: &RainfallStats,
    center: Coordinate,
    flow_length_m: f64,
    slope_percent: f64,
    t_years: f64,
    config: &RainfallConfig,
    region: Option<&dyn RegionPredicate>,
) -> DesignStorm {
    let (depth, source) = design_depth(stats, t_years, config);

    let tc_min = time_of_concentration_min(flow_length_m, slope_percent, &config.kirpich);
    let policy = select_policy(center, region, config);
    let idf_depth_mm = policy.base_depth_mm(depth, stats.max_daily_mm, config);
    let intensity_mm_h = policy.intensity_mm_h(idf_depth_mm, tc_min, stats.mean_annual_mm, config);

    tracing::debug!(
        depth_mm = depth,
        ?source,
        idf_depth_mm,
        tc_min,
        intensity_mm_h,
        ?policy,
        "design storm resolved"
    );

    DesignStorm {
        return_period_years: t_years,
        design_depth_mm: depth,
        depth_source: source,
        idf_depth_mm,
        time_of_concentration_min: tc_min,
        intensity_mm_h,
        policy,
    }
}
