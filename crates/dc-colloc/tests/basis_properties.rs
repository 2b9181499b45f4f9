//! Property tests for the Lagrange collocation basis.
//!
//! Any polynomial of degree <= d is represented exactly by its node values, so
//! the C / D / B coefficients must reproduce its derivative at the nodes, its
//! value at 1 and its integral over [0, 1].

use dc_colloc::{CollocationScheme, NodeScheme, Polynomial};
use proptest::prelude::*;

fn scheme_strategy() -> impl Strategy<Value = NodeScheme> {
    prop_oneof![Just(NodeScheme::Radau), Just(NodeScheme::Legendre)]
}

proptest! {
    #[test]
    fn continuity_coefficients_partition_unity(degree in 1usize..=10, scheme in scheme_strategy()) {
        let s = CollocationScheme::build(degree, &scheme).unwrap();
        let total: f64 = s.d().iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9, "sum(D) = {}", total);
    }

    #[test]
    fn custom_points_partition_unity(raw in prop::collection::vec(0.05_f64..=1.0, 1..=4)) {
        let mut points = raw.clone();
        points.sort_by(|a, b| a.total_cmp(b));
        prop_assume!(points.windows(2).all(|w| w[1] - w[0] > 0.05));
        let degree = points.len();
        let s = CollocationScheme::build(degree, &NodeScheme::Custom { points }).unwrap();
        let total: f64 = s.d().iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-8, "sum(D) = {}", total);
    }

    #[test]
    fn reproduces_low_degree_polynomials(
        degree in 1usize..=8,
        scheme in scheme_strategy(),
        raw in prop::collection::vec(-1.0_f64..1.0, 9),
        trim in 0usize..=8,
    ) {
        let s = CollocationScheme::build(degree, &scheme).unwrap();
        // keep at most degree + 1 coefficients, and sometimes fewer
        let len = (degree + 1).saturating_sub(trim).max(1);
        let p = Polynomial::new(raw[..len].to_vec());
        let values: Vec<f64> = s.nodes().iter().map(|&tau| p.eval(tau)).collect();
        let dp = p.derivative();

        for (r, &tau) in s.nodes().iter().enumerate() {
            let approx: f64 = values.iter().enumerate().map(|(j, v)| v * s.c()[(j, r)]).sum();
            prop_assert!((approx - dp.eval(tau)).abs() < 1e-7, "node {}: {} vs {}", r, approx, dp.eval(tau));
        }

        let end: f64 = values.iter().zip(s.d()).map(|(v, d)| v * d).sum();
        prop_assert!((end - p.eval(1.0)).abs() < 1e-8);

        let integral: f64 = values.iter().zip(s.b()).map(|(v, b)| v * b).sum();
        prop_assert!((integral - p.integrate(0.0, 1.0)).abs() < 1e-8);
    }
}

#[test]
fn degree_above_basis_is_not_reproduced() {
    // x^2 through a degree-1 basis: the derivative at 0 is off by one.
    let s = CollocationScheme::build(1, &NodeScheme::Radau).unwrap();
    let values = [0.0, 1.0];
    let approx: f64 = values.iter().enumerate().map(|(j, v)| v * s.c()[(j, 0)]).sum();
    assert!((approx - 1.0).abs() < 1e-12);
}
