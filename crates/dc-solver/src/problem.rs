//! The problem and solver capability boundary.

use crate::error::{SolverError, SolverResult};
use crate::jacobian::{
    SECOND_DIFFERENCE_STEP, central_difference_jacobian, forward_difference_hessian,
    free_indices, scatter_add,
};
use crate::options::SolverOptions;
use crate::solution::NlpSolution;
use dc_core::DcResult;
use nalgebra::DMatrix;

/// A nonlinear program in the form
///
/// ```text
/// minimise    cost(x)
/// subject to  variable_lower <= x    <= variable_upper
///             constraint_lower <= g(x) <= constraint_upper
/// ```
///
/// Evaluations must be deterministic; solvers may call them from several
/// threads at once.
///
/// Derivatives default to dense finite differences of [`cost`] and
/// [`constraints`]. Problems with sparse structure should override
/// [`constraint_jacobian`] and [`lagrangian_hessian`]; the dense defaults cost
/// `O(n)` and `O(n^2)` constraint evaluations.
///
/// [`cost`]: NlpProblem::cost
/// [`constraints`]: NlpProblem::constraints
/// [`constraint_jacobian`]: NlpProblem::constraint_jacobian
/// [`lagrangian_hessian`]: NlpProblem::lagrangian_hessian
pub trait NlpProblem: Sync {
    fn num_variables(&self) -> usize;

    fn num_constraints(&self) -> usize;

    fn variable_lower(&self) -> &[f64];

    fn variable_upper(&self) -> &[f64];

    fn constraint_lower(&self) -> &[f64];

    fn constraint_upper(&self) -> &[f64];

    fn cost(&self, x: &[f64]) -> DcResult<f64>;

    /// Write `g(x)` into `out` (length `num_constraints`).
    fn constraints(&self, x: &[f64], out: &mut [f64]) -> DcResult<()>;

    /// `num_constraints x num_variables` Jacobian of `g` at `x`.
    ///
    /// `step` is the relative finite-difference step. Columns of `frozen`
    /// variables may be left zero.
    fn constraint_jacobian(&self, x: &[f64], step: f64, frozen: &[bool]) -> DcResult<DMatrix<f64>> {
        let columns = free_indices(frozen);
        let m = self.num_constraints();
        let partial =
            central_difference_jacobian(x, &columns, m, |x, out| self.constraints(x, out), step)?;

        let mut jac = DMatrix::zeros(m, x.len());
        for (a, &j) in columns.iter().enumerate() {
            jac.set_column(j, &partial.column(a));
        }
        Ok(jac)
    }

    /// Hessian of `cost(x) + weights^T g(x)`.
    ///
    /// Rows and columns of `frozen` variables may be left zero.
    fn lagrangian_hessian(
        &self,
        x: &[f64],
        weights: &[f64],
        frozen: &[bool],
    ) -> DcResult<DMatrix<f64>> {
        let indices = free_indices(frozen);
        let m = self.num_constraints();
        let local = forward_difference_hessian(
            x,
            &indices,
            |x| {
                let mut g = vec![0.0; m];
                self.constraints(x, &mut g)?;
                let weighted: f64 = g.iter().zip(weights).map(|(gi, wi)| gi * wi).sum();
                Ok(self.cost(x)? + weighted)
            },
            SECOND_DIFFERENCE_STEP,
        )?;

        let mut hess = DMatrix::zeros(x.len(), x.len());
        scatter_add(&mut hess, &indices, &local);
        Ok(hess)
    }
}

/// A solver backend: one blocking call per problem.
pub trait NlpSolver {
    fn name(&self) -> &'static str;

    fn solve(
        &self,
        problem: &dyn NlpProblem,
        x0: &[f64],
        options: &SolverOptions,
    ) -> SolverResult<NlpSolution>;
}

/// Check sizes and bound ordering of `problem` and the starting point.
pub fn validate_problem(problem: &dyn NlpProblem, x0: &[f64]) -> SolverResult<()> {
    let n = problem.num_variables();
    let m = problem.num_constraints();
    let sizes = [
        ("initial guess", x0.len(), n),
        ("variable lower bounds", problem.variable_lower().len(), n),
        ("variable upper bounds", problem.variable_upper().len(), n),
        ("constraint lower bounds", problem.constraint_lower().len(), m),
        ("constraint upper bounds", problem.constraint_upper().len(), m),
    ];
    for (what, actual, expected) in sizes {
        if actual != expected {
            return Err(SolverError::ProblemSetup {
                what: format!("{what} length mismatch: {actual} != {expected}"),
            });
        }
    }

    check_ordering(
        "variable",
        problem.variable_lower(),
        problem.variable_upper(),
    )?;
    check_ordering(
        "constraint",
        problem.constraint_lower(),
        problem.constraint_upper(),
    )?;

    if let Some(i) = x0.iter().position(|v| !v.is_finite()) {
        return Err(SolverError::ProblemSetup {
            what: format!("initial guess {i} is not finite"),
        });
    }
    Ok(())
}

fn check_ordering(what: &str, lower: &[f64], upper: &[f64]) -> SolverResult<()> {
    for (i, (lo, hi)) in lower.iter().zip(upper).enumerate() {
        if lo.is_nan() || hi.is_nan() || lo > hi {
            return Err(SolverError::ProblemSetup {
                what: format!("{what} {i} has lower bound {lo} above upper bound {hi}"),
            });
        }
    }
    Ok(())
}

/// Largest distance of any `values[i]` from `[lower[i], upper[i]]`.
pub fn bound_violation(values: &[f64], lower: &[f64], upper: &[f64]) -> f64 {
    values
        .iter()
        .zip(lower.iter().zip(upper))
        .fold(0.0, |acc, (&v, (&lo, &hi))| {
            acc.max(lo - v).max(v - hi)
        })
}
