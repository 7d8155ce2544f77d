//! Archetype → rationale template.
//!
//! Wording is presentation, but which template belongs to which archetype
//! is part of the output contract: each one cites the criteria that carry
//! the archetype's largest weights.

use super::{Topology, TopologyInputs};

fn pct(v: f64) -> String {
    format!("{:.0}%", v * 100.0)
}

pub fn render(topology: Topology, x: &TopologyInputs) -> String {
    match topology {
        Topology::Dendritic => format!(
            "Dendritic: slope factor {} and flood risk {} favour a branching network \
             converging on a single trunk that follows the natural fall line.",
            pct(x.slope),
            pct(x.flood_risk)
        ),
        Topology::Parallel => format!(
            "Parallel: flat terrain (slope factor {}) with permeability {} and low flood \
             risk ({}) suits evenly spaced laterals discharging to a common collector.",
            pct(x.slope),
            pct(x.permeability),
            pct(x.flood_risk)
        ),
        Topology::Reticular => format!(
            "Reticular: runoff coefficient {} and flood risk {} under wetness {} call for an \
             interconnected grid with redundant flow paths.",
            pct(x.imperviousness),
            pct(x.flood_risk),
            pct(x.wetness)
        ),
        Topology::Pinnate => format!(
            "Pinnate: steep ground (slope factor {}) with permeability {} favours short, \
             closely spaced feeders joining a central spine.",
            pct(x.slope),
            pct(x.permeability)
        ),
        Topology::Radial => format!(
            "Radial: mid-slope position ({}) on dry, permeable ground (wetness {}, \
             permeability {}) suits channels radiating from a crest.",
            pct(x.mid_slope),
            pct(x.wetness),
            pct(x.permeability)
        ),
        Topology::Meandering => format!(
            "Meandering: permeability {} and gentle slope (factor {}) allow sinuous, \
             vegetated channels that slow and infiltrate runoff; flood risk {}.",
            pct(x.permeability),
            pct(x.slope),
            pct(x.flood_risk)
        ),
        Topology::Hybrid => format!(
            "Hybrid: mid-slope position ({}) with flood risk {} and runoff coefficient {} \
             needs a piped core backed by green conveyance.",
            pct(x.mid_slope),
            pct(x.flood_risk),
            pct(x.imperviousness)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TopologyInputs {
        TopologyInputs {
            slope: 0.1,
            mid_slope: 0.2,
            imperviousness: 0.75,
            permeability: 0.25,
            flood_risk: 0.94,
            wetness: 0.9,
        }
    }

    #[test]
    fn every_template_names_its_archetype() {
        for t in Topology::PRIORITY {
            let text = render(t, &sample());
            let name = t.as_str();
            let mut chars = name.chars();
            let title: String =
                chars.next().map(|c| c.to_ascii_uppercase()).into_iter().chain(chars).collect();
            assert!(text.starts_with(&title), "{t:?} rationale does not lead with {title}: {text}");
        }
    }

    #[test]
    fn reticular_template_cites_drivers() {
        let text = render(Topology::Reticular, &sample());
        assert!(text.contains("75%"), "{text}");
        assert!(text.contains("94%"), "{text}");
    }
}
