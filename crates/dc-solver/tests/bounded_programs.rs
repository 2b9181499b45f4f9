//! End-to-end solves of small bounded programs through the public API.

use dc_core::{DcError, DcResult};
use dc_solver::{AugmentedLagrangian, NlpProblem, NlpSolver, SolveStatus, SolverOptions};

/// Rosenbrock valley with an inequality cutting off its minimum:
/// min (1 - x)^2 + 100 (y - x^2)^2  s.t.  x + y <= 1.5
struct CutRosenbrock {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl NlpProblem for CutRosenbrock {
    fn num_variables(&self) -> usize {
        2
    }
    fn num_constraints(&self) -> usize {
        1
    }
    fn variable_lower(&self) -> &[f64] {
        &self.lower
    }
    fn variable_upper(&self) -> &[f64] {
        &self.upper
    }
    fn constraint_lower(&self) -> &[f64] {
        &[f64::NEG_INFINITY]
    }
    fn constraint_upper(&self) -> &[f64] {
        &[1.5]
    }
    fn cost(&self, x: &[f64]) -> DcResult<f64> {
        Ok((1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2))
    }
    fn constraints(&self, x: &[f64], out: &mut [f64]) -> DcResult<()> {
        out[0] = x[0] + x[1];
        Ok(())
    }
}

#[test]
fn inequality_is_satisfied_at_solution() {
    let problem = CutRosenbrock {
        lower: vec![-2.0, -2.0],
        upper: vec![2.0, 2.0],
    };
    let solution = AugmentedLagrangian
        .solve(&problem, &[0.0, 0.0], &SolverOptions::default())
        .unwrap();

    println!("diagnostics: {:?}", solution.diagnostics);
    assert!(solution.converged);
    assert!(solution.x[0] + solution.x[1] <= 1.5 + 1e-6);
    // The constraint is active, so its multiplier is positive
    assert!(solution.multipliers[0] > 0.0);
    assert!(solution.diagnostics.cost < 0.2);
}

#[test]
fn inactive_inequality_has_zero_multiplier() {
    let problem = CutRosenbrock {
        lower: vec![-2.0, -2.0],
        upper: vec![0.5, 2.0],
    };
    // With x <= 0.5 the optimum (0.5, 0.25) is strictly inside x + y <= 1.5
    let solution = AugmentedLagrangian
        .solve(&problem, &[0.0, 0.0], &SolverOptions::default())
        .unwrap();

    assert!(solution.converged, "{:?}", solution.diagnostics);
    assert_eq!(solution.x[0], 0.5);
    assert!((solution.x[1] - 0.25).abs() < 1e-5);
    assert_eq!(solution.multipliers[0], 0.0);
}

#[test]
fn guess_outside_box_is_projected() {
    let problem = CutRosenbrock {
        lower: vec![-2.0, -2.0],
        upper: vec![2.0, 2.0],
    };
    let options = SolverOptions::default().with_max_iterations(0);
    let solution = AugmentedLagrangian
        .solve(&problem, &[10.0, -10.0], &options)
        .unwrap();

    assert_eq!(solution.x, vec![2.0, -2.0]);
    assert_eq!(
        solution.diagnostics.status,
        SolveStatus::MaxIterationsExceeded
    );
}

/// Two quantities in very different units tied by an equality:
/// min (x - 3)^2 + 1e-6 (n - 500)^2  s.t.  n - 300 x = 0
struct MixedUnits;

impl NlpProblem for MixedUnits {
    fn num_variables(&self) -> usize {
        2
    }
    fn num_constraints(&self) -> usize {
        1
    }
    fn variable_lower(&self) -> &[f64] {
        &[0.0, 0.0]
    }
    fn variable_upper(&self) -> &[f64] {
        &[10.0, 1e5]
    }
    fn constraint_lower(&self) -> &[f64] {
        &[0.0]
    }
    fn constraint_upper(&self) -> &[f64] {
        &[0.0]
    }
    fn cost(&self, x: &[f64]) -> DcResult<f64> {
        Ok((x[0] - 3.0).powi(2) + 1e-6 * (x[1] - 500.0).powi(2))
    }
    fn constraints(&self, x: &[f64], out: &mut [f64]) -> DcResult<()> {
        out[0] = x[1] - 300.0 * x[0];
        Ok(())
    }
}

#[test]
fn mixed_units_meet_the_original_tolerances() {
    let options = SolverOptions::default();
    let solution = AugmentedLagrangian
        .solve(&MixedUnits, &[1.0, 800.0], &options)
        .unwrap();

    // 2 (x - 3) + 0.18 (x - 5/3) = 0
    let x = 6.3 / 2.18;
    assert!(solution.converged, "{:?}", solution.diagnostics);
    assert!((solution.x[0] - x).abs() < 1e-5);
    assert!((solution.x[1] - 300.0 * x).abs() < 1e-3);
    assert!(solution.diagnostics.constraint_violation <= options.constraint_tolerance);
    // dL/dn = 2e-6 (n - 500) + lambda = 0
    let lambda = -2e-6 * (300.0 * x - 500.0);
    assert!((solution.multipliers[0] - lambda).abs() < 1e-6);
}

struct FailsAtStart;

impl NlpProblem for FailsAtStart {
    fn num_variables(&self) -> usize {
        1
    }
    fn num_constraints(&self) -> usize {
        0
    }
    fn variable_lower(&self) -> &[f64] {
        &[-1.0]
    }
    fn variable_upper(&self) -> &[f64] {
        &[1.0]
    }
    fn constraint_lower(&self) -> &[f64] {
        &[]
    }
    fn constraint_upper(&self) -> &[f64] {
        &[]
    }
    fn cost(&self, x: &[f64]) -> DcResult<f64> {
        Err(DcError::NonFinite {
            what: "cost",
            index: 0,
            value: x[0] / 0.0,
        })
    }
    fn constraints(&self, _x: &[f64], _out: &mut [f64]) -> DcResult<()> {
        Ok(())
    }
}

#[test]
fn evaluation_error_at_guess_is_reported() {
    let err = AugmentedLagrangian
        .solve(&FailsAtStart, &[0.5], &SolverOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("Invalid model evaluation"), "{err}");
}

#[test]
fn invalid_options_rejected_before_evaluation() {
    let options = SolverOptions {
        tolerance: -1.0,
        ..SolverOptions::default()
    };
    assert!(
        AugmentedLagrangian
            .solve(&FailsAtStart, &[0.5], &options)
            .is_err()
    );
}
