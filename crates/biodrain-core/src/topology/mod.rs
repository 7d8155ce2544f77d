//! Drainage topology selector.
//!
//! Seven nature-inspired archetypes are scored as weighted sums over the
//! site criteria {S, 1−S, S_mid, C, K, F, 1−F, W*, 1−W*}. Each weight row is
//! non-negative and sums to 1, so every score lies in [0, 1]. The winner is
//! the arg-max; exact ties go to the archetype listed first in
//! `Topology::PRIORITY`.

pub mod rationale;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::factors::RiskFactors;
use crate::risk::FloodRiskScore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    Dendritic,
    Parallel,
    Reticular,
    Pinnate,
    Radial,
    Meandering,
    Hybrid,
}

impl Topology {
    /// Tie-break order: the earlier entry wins an exact tie.
    pub const PRIORITY: [Topology; 7] = [
        Topology::Dendritic,
        Topology::Parallel,
        Topology::Reticular,
        Topology::Pinnate,
        Topology::Radial,
        Topology::Meandering,
        Topology::Hybrid,
    ];

    /// Archetypes built as open, vegetated channels rather than pipes.
    pub fn is_naturalistic(self) -> bool {
        matches!(self, Topology::Meandering | Topology::Radial)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Topology::Dendritic => "dendritic",
            Topology::Parallel => "parallel",
            Topology::Reticular => "reticular",
            Topology::Pinnate => "pinnate",
            Topology::Radial => "radial",
            Topology::Meandering => "meandering",
            Topology::Hybrid => "hybrid",
        }
    }
}

/// Normalised site criteria fed to the scoring formulas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopologyInputs {
    pub slope: f64,
    pub mid_slope: f64,
    pub imperviousness: f64,
    pub permeability: f64,
    pub flood_risk: f64,
    pub wetness: f64,
}

impl TopologyInputs {
    pub fn new(factors: &RiskFactors, risk: &FloodRiskScore) -> Self {
        Self {
            slope: factors.slope_factor,
            mid_slope: factors.mid_slope(),
            imperviousness: factors.runoff_coefficient,
            permeability: factors.permeability_index,
            flood_risk: risk.score,
            wetness: factors.wetness,
        }
    }
}

/// One archetype's weight row. Unlisted criteria weigh zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriterionWeights {
    pub slope: f64,
    pub flatness: f64,
    pub mid_slope: f64,
    pub imperviousness: f64,
    pub permeability: f64,
    pub flood_risk: f64,
    pub flood_safety: f64,
    pub wetness: f64,
    pub dryness: f64,
}

impl CriterionWeights {
    fn as_array(&self) -> [f64; 9] {
        [
            self.slope,
            self.flatness,
            self.mid_slope,
            self.imperviousness,
            self.permeability,
            self.flood_risk,
            self.flood_safety,
            self.wetness,
            self.dryness,
        ]
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    pub fn score(&self, x: &TopologyInputs) -> f64 {
        self.slope * x.slope
            + self.flatness * (1.0 - x.slope)
            + self.mid_slope * x.mid_slope
            + self.imperviousness * x.imperviousness
            + self.permeability * x.permeability
            + self.flood_risk * x.flood_risk
            + self.flood_safety * (1.0 - x.flood_risk)
            + self.wetness * x.wetness
            + self.dryness * (1.0 - x.wetness)
    }
}

/// Weight table for all seven archetypes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyWeights {
    pub dendritic: CriterionWeights,
    pub parallel: CriterionWeights,
    pub reticular: CriterionWeights,
    pub pinnate: CriterionWeights,
    pub radial: CriterionWeights,
    pub meandering: CriterionWeights,
    pub hybrid: CriterionWeights,
}

impl Default for TopologyWeights {
    fn default() -> Self {
        let zero = CriterionWeights::default();
        Self {
            // Branching trunk on moderate-to-steep, risk-driven sites.
            dendritic: CriterionWeights {
                slope: 0.40,
                flood_risk: 0.25,
                imperviousness: 0.20,
                mid_slope: 0.15,
                ..zero
            },
            // Evenly spaced laterals on flat, permeable, low-risk ground.
            parallel: CriterionWeights {
                flatness: 0.40,
                permeability: 0.30,
                flood_safety: 0.30,
                ..zero
            },
            // Interconnected grid for dense, sealed, wet urban fabric.
            reticular: CriterionWeights {
                imperviousness: 0.45,
                flood_risk: 0.30,
                wetness: 0.25,
                ..zero
            },
            // Feather pattern on steep, permeable slopes.
            pinnate: CriterionWeights {
                slope: 0.45,
                permeability: 0.30,
                flood_safety: 0.25,
                ..zero
            },
            // Outward spokes from a crest on mid-slope, dry terrain.
            radial: CriterionWeights {
                mid_slope: 0.40,
                permeability: 0.30,
                dryness: 0.30,
                ..zero
            },
            // Sinuous vegetated channels on gentle, absorbent land.
            meandering: CriterionWeights {
                permeability: 0.35,
                flatness: 0.25,
                flood_safety: 0.25,
                wetness: 0.15,
                ..zero
            },
            // Mixed grey-green network for mid-slope, high-risk sites.
            hybrid: CriterionWeights {
                mid_slope: 0.40,
                flood_risk: 0.35,
                imperviousness: 0.25,
                ..zero
            },
        }
    }
}

impl TopologyWeights {
    pub fn row(&self, topology: Topology) -> &CriterionWeights {
        match topology {
            Topology::Dendritic => &self.dendritic,
            Topology::Parallel => &self.parallel,
            Topology::Reticular => &self.reticular,
            Topology::Pinnate => &self.pinnate,
            Topology::Radial => &self.radial,
            Topology::Meandering => &self.meandering,
            Topology::Hybrid => &self.hybrid,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for t in Topology::PRIORITY {
            let row = self.row(t);
            if row.as_array().iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "topology.{} weights must be finite and non-negative",
                    t.as_str()
                )));
            }
            let sum = row.sum();
            if (sum - 1.0).abs() > 1e-6 {
                return Err(Error::InvalidConfig(format!(
                    "topology.{} weights must sum to 1, got {sum}",
                    t.as_str()
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub selected: Topology,
    pub scores: BTreeMap<Topology, f64>,
    pub rationale: String,
}

/// Score every archetype.
pub fn score_topologies(
    inputs: &TopologyInputs,
    weights: &TopologyWeights,
) -> BTreeMap<Topology, f64> {
    Topology::PRIORITY
        .iter()
        .map(|&t| (t, weights.row(t).score(inputs)))
        .collect()
}

/// Arg-max over `scores`, walking `Topology::PRIORITY` so the first of
/// equal scores wins.
pub fn arg_max(scores: &BTreeMap<Topology, f64>) -> Topology {
    let mut best = Topology::PRIORITY[0];
    let mut best_score = f64::NEG_INFINITY;
    for t in Topology::PRIORITY {
        let s = scores.get(&t).copied().unwrap_or(f64::NEG_INFINITY);
        if s > best_score {
            best = t;
            best_score = s;
        }
    }
    best
}

pub fn select_topology(inputs: &TopologyInputs, weights: &TopologyWeights) -> SelectionResult {
    let scores = score_topologies(inputs, weights);
    let selected = arg_max(&scores);
    let rationale = rationale::render(selected, inputs);
    tracing::debug!(selected = selected.as_str(), ?scores, "topology selected");
    SelectionResult { selected, scores, rationale }
}
