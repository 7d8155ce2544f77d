//! Manning's equation for a circular conduit flowing full.
//!
//!   V = (1/n) · R_h^(2/3) · S^(1/2),   R_h = D/4
//!   Q = V · πD²/4
//! Inverted for D:
//!   D = ((4^(5/3) · n · Q) / (π · √S))^(3/8)
//!
//! Lengths in m, Q in m³/s, S in m/m.

use std::f64::consts::PI;

/// Full-flow diameter (m) carrying `q` at roughness `n` and bed slope `s`.
/// Zero for non-positive or non-finite inputs.
pub fn full_flow_diameter(q: f64, n: f64, s: f64) -> f64 {
    if !(q.is_finite() && n.is_finite() && s.is_finite()) || q <= 0.0 || n <= 0.0 || s <= 0.0 {
        return 0.0;
    }
    ((4.0_f64.powf(5.0 / 3.0) * n * q) / (PI * s.sqrt())).powf(3.0 / 8.0)
}

/// Full-flow velocity (m/s) in a conduit of diameter `d` (m).
pub fn full_flow_velocity(d: f64, n: f64, s: f64) -> f64 {
    if d <= 0.0 || n <= 0.0 || s <= 0.0 {
        return 0.0;
    }
    let r_h = d / 4.0;
    r_h.powf(2.0 / 3.0) * s.sqrt() / n
}

/// Full-flow capacity (m³/s) of a conduit of diameter `d` (m).
pub fn full_flow_capacity(d: f64, n: f64, s: f64) -> f64 {
    let area = PI * (d / 2.0).powi(2);
    area * full_flow_velocity(d, n, s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn inversion_round_trips_within_five_percent() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..2_000 {
            let q = rng.gen_range(0.001..50.0);
            let n = if rng.gen::<bool>() { 0.013 } else { 0.025 };
            let s = rng.gen_range(0.005..0.5);
            let d = full_flow_diameter(q, n, s);
            let cap = full_flow_capacity(d, n, s);
            let rel = (cap - q).abs() / q;
            assert!(
                rel <= 0.05,
                "Q={q:.4} n={n} S={s:.4}: D={d:.4} capacity {cap:.4} off by {rel:.2e}"
            );
        }
    }

    #[test]
    fn known_design_point() {
        // 1 m³/s, n = 0.013, S = 1 %: D ≈ 0.72 m.
        let d = full_flow_diameter(1.0, 0.013, 0.01);
        assert!((d - 0.72).abs() < 0.01, "got {d:.4} m");
    }

    #[test]
    fn rougher_pipe_needs_larger_diameter() {
        let smooth = full_flow_diameter(2.0, 0.013, 0.005);
        let rough = full_flow_diameter(2.0, 0.025, 0.005);
        assert!(rough > smooth);
    }

    #[test]
    fn zero_discharge_has_zero_diameter() {
        assert_eq!(full_flow_diameter(0.0, 0.013, 0.01), 0.0);
        assert_eq!(full_flow_diameter(1.0, 0.013, 0.0), 0.0);
        assert_eq!(full_flow_capacity(0.0, 0.013, 0.01), 0.0);
    }
}
