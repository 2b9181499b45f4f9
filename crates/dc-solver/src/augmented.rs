//! Augmented-Lagrangian (method of multipliers) NLP solver.
//!
//! Each outer iteration minimises
//!
//! ```text
//! phi(x) = cost(x) + mu/2 * sum_i r_i(x)^2,   r_i = s_i - clamp(s_i, gl_i, gu_i),
//!                                              s_i = g_i(x) + lambda_i / mu
//! ```
//!
//! over the variable box with projected Newton, then sets `lambda = mu * r`.
//! Two-sided rows and equalities share the same formula. The Hessian model is
//! the problem's Hessian of `cost + (mu r)^T g` plus the Gauss-Newton term
//! `mu * J_A^T J_A` over rows whose shifted value lies outside its interval.
//!
//! The iteration runs on the [`ScaledProblem`] built at the starting point.
//! Feasibility is judged on the original rows, optimality on the scaled ones.

use crate::error::SolverResult;
use crate::jacobian::central_difference_gradient;
use crate::options::SolverOptions;
use crate::problem::{NlpProblem, NlpSolver, bound_violation, validate_problem};
use crate::projected::{
    LocalModel, ProjectedNewtonConfig, project, projected_gradient_norm, projected_newton,
};
use crate::scaling::ScaledProblem;
use crate::solution::{Diagnostics, NlpSolution, SolveStatus};
use dc_core::DcResult;
use nalgebra::{DMatrix, DVector};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Built-in solver backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct AugmentedLagrangian;

impl NlpSolver for AugmentedLagrangian {
    fn name(&self) -> &'static str {
        "augmented-lagrangian"
    }

    fn solve(
        &self,
        problem: &dyn NlpProblem,
        x0: &[f64],
        options: &SolverOptions,
    ) -> SolverResult<NlpSolution> {
        options.validate()?;
        validate_problem(problem, x0)?;
        let started = Instant::now();
        let counted = Counted::new(problem);

        let mut start = DVector::from_column_slice(x0);
        project(&mut start, counted.variable_lower(), counted.variable_upper());
        let frozen: Vec<bool> = counted
            .variable_lower()
            .iter()
            .zip(counted.variable_upper())
            .map(|(lo, hi)| lo == hi)
            .collect();

        let scaled = if options.scaling {
            ScaledProblem::at(&counted, start.as_slice(), options.fd_step, &frozen)?
        } else {
            ScaledProblem::identity(&counted)
        };
        let mut state = Multipliers::new(&scaled, options);
        let mut y = DVector::from_vec(scaled.to_scaled(start.as_slice()));

        let mut g = vec![0.0; counted.num_constraints()];
        let (mut cost, mut violation) = original_point(&counted, &scaled, &y, &mut g)?;
        debug!(
            variables = counted.num_variables(),
            constraints = counted.num_constraints(),
            cost,
            violation,
            cost_scale = scaled.cost_scale(),
            "augmented Lagrangian start"
        );

        let mut status = SolveStatus::MaxIterationsExceeded;
        let mut iterations = 0;
        let mut inner_iterations = 0;
        let mut optimality = None;

        let inner_config = ProjectedNewtonConfig {
            max_iterations: options.max_inner_iterations,
            tolerance: options.tolerance,
            ..ProjectedNewtonConfig::default()
        };

        for outer in 0..options.max_iterations {
            let inner = projected_newton(
                y.clone(),
                scaled.variable_lower(),
                scaled.variable_upper(),
                |y| state.merit(y.as_slice()),
                |y| state.local_model(y.as_slice(), &frozen),
                &inner_config,
            )?;
            inner_iterations += inner.iterations;
            y = inner.x;
            iterations = outer + 1;

            (cost, violation) = original_point(&counted, &scaled, &y, &mut g)?;
            scaled.scale_rows(&mut g);
            state.update(&g);
            let kkt = state.optimality(y.as_slice(), &frozen)?;
            optimality = Some(kkt);

            debug!(
                iteration = iterations,
                inner = inner.iterations,
                cost,
                violation,
                optimality = kkt,
                penalty = state.mu,
                "outer iteration"
            );

            if violation <= options.constraint_tolerance && kkt <= options.tolerance {
                status = SolveStatus::Converged;
                break;
            }

            let at_max_penalty = state.mu >= options.max_penalty;
            if inner.stalled && at_max_penalty {
                warn!(iteration = iterations, "line search stalled at maximum penalty");
                status = SolveStatus::Stalled;
                break;
            }
            if violation > 0.25 * state.previous_violation {
                state.mu = (state.mu * options.penalty_growth).min(options.max_penalty);
            }
            state.previous_violation = violation;
        }

        let diagnostics = Diagnostics {
            status,
            iterations,
            inner_iterations,
            cost,
            constraint_violation: violation,
            optimality,
            penalty: state.mu,
            cost_evaluations: counted.cost_evals.load(Ordering::Relaxed),
            constraint_evaluations: counted.constraint_evals.load(Ordering::Relaxed),
            jacobian_evaluations: counted.jacobian_evals.load(Ordering::Relaxed),
            hessian_evaluations: counted.hessian_evals.load(Ordering::Relaxed),
            elapsed_s: started.elapsed().as_secs_f64(),
        };
        info!(
            status = %status,
            iterations,
            cost,
            violation,
            "augmented Lagrangian finished"
        );

        Ok(NlpSolution {
            x: scaled.to_original(y.as_slice()),
            multipliers: scaled.original_multipliers(state.lambda.as_slice()),
            converged: status.is_success(),
            diagnostics,
        })
    }
}

/// Cost and row violation of the original problem at scaled point `y`; `g`
/// receives the original row values.
fn original_point(
    problem: &dyn NlpProblem,
    scaled: &ScaledProblem<'_>,
    y: &DVector<f64>,
    g: &mut [f64],
) -> DcResult<(f64, f64)> {
    let x = scaled.to_original(y.as_slice());
    problem.constraints(&x, g)?;
    let violation = bound_violation(g, problem.constraint_lower(), problem.constraint_upper());
    Ok((problem.cost(&x)?, violation))
}

/// Multiplier/penalty state for one solve.
struct Multipliers<'a> {
    problem: &'a dyn NlpProblem,
    lambda: DVector<f64>,
    mu: f64,
    previous_violation: f64,
    fd_step: f64,
}

impl<'a> Multipliers<'a> {
    fn new(problem: &'a dyn NlpProblem, options: &SolverOptions) -> Self {
        Self {
            problem,
            lambda: DVector::zeros(problem.num_constraints()),
            mu: options.initial_penalty,
            previous_violation: f64::INFINITY,
            fd_step: options.fd_step,
        }
    }

    /// `r = s - clamp(s, gl, gu)` with `s = g + lambda / mu`.
    fn shifted_residual(&self, g: &[f64]) -> DVector<f64> {
        let lower = self.problem.constraint_lower();
        let upper = self.problem.constraint_upper();
        DVector::from_fn(g.len(), |i, _| {
            let s = g[i] + self.lambda[i] / self.mu;
            s - s.clamp(lower[i], upper[i])
        })
    }

    fn merit(&self, x: &[f64]) -> DcResult<f64> {
        let mut g = vec![0.0; self.problem.num_constraints()];
        self.problem.constraints(x, &mut g)?;
        let r = self.shifted_residual(&g);
        Ok(self.problem.cost(x)? + 0.5 * self.mu * r.norm_squared())
    }

    fn cost_gradient(&self, x: &[f64], frozen: &[bool]) -> DcResult<DVector<f64>> {
        central_difference_gradient(x, |x| self.problem.cost(x), self.fd_step, frozen)
    }

    fn local_model(&self, x: &[f64], frozen: &[bool]) -> DcResult<LocalModel> {
        let mut g = vec![0.0; self.problem.num_constraints()];
        self.problem.constraints(x, &mut g)?;
        let r = self.shifted_residual(&g);
        let jac = self.problem.constraint_jacobian(x, self.fd_step, frozen)?;

        let gradient = self.cost_gradient(x, frozen)? + self.mu * jac.tr_mul(&r);

        let lower = self.problem.constraint_lower();
        let upper = self.problem.constraint_upper();
        let mut active = jac;
        for i in 0..g.len() {
            let is_active = lower[i] == upper[i] || r[i] != 0.0;
            if !is_active {
                active.row_mut(i).fill(0.0);
            }
        }

        // Curvature of cost + w^T g with w = mu * r frozen at x
        let weights = self.mu * &r;
        let curvature = self
            .problem
            .lagrangian_hessian(x, weights.as_slice(), frozen)?;
        let hessian = curvature + self.mu * active.tr_mul(&active);

        Ok(LocalModel { gradient, hessian })
    }

    /// `lambda <- mu * r`, evaluated at the new point.
    fn update(&mut self, g: &[f64]) {
        self.lambda = self.mu * self.shifted_residual(g);
    }

    /// Projected gradient of `cost + lambda^T g` over the variable box.
    fn optimality(&self, x: &[f64], frozen: &[bool]) -> DcResult<f64> {
        let jac = self.problem.constraint_jacobian(x, self.fd_step, frozen)?;
        let gradient = self.cost_gradient(x, frozen)? + jac.tr_mul(&self.lambda);
        Ok(projected_gradient_norm(
            &DVector::from_column_slice(x),
            &gradient,
            self.problem.variable_lower(),
            self.problem.variable_upper(),
        ))
    }
}

/// Pass-through problem that counts evaluations.
struct Counted<'a> {
    inner: &'a dyn NlpProblem,
    cost_evals: AtomicUsize,
    constraint_evals: AtomicUsize,
    jacobian_evals: AtomicUsize,
    hessian_evals: AtomicUsize,
}

impl<'a> Counted<'a> {
    fn new(inner: &'a dyn NlpProblem) -> Self {
        Self {
            inner,
            cost_evals: AtomicUsize::new(0),
            constraint_evals: AtomicUsize::new(0),
            jacobian_evals: AtomicUsize::new(0),
            hessian_evals: AtomicUsize::new(0),
        }
    }
}

impl NlpProblem for Counted<'_> {
    fn num_variables(&self) -> usize {
        self.inner.num_variables()
    }

    fn num_constraints(&self) -> usize {
        self.inner.num_constraints()
    }

    fn variable_lower(&self) -> &[f64] {
        self.inner.variable_lower()
    }

    fn variable_upper(&self) -> &[f64] {
        self.inner.variable_upper()
    }

    fn constraint_lower(&self) -> &[f64] {
        self.inner.constraint_lower()
    }

    fn constraint_upper(&self) -> &[f64] {
        self.inner.constraint_upper()
    }

    fn cost(&self, x: &[f64]) -> DcResult<f64> {
        self.cost_evals.fetch_add(1, Ordering::Relaxed);
        self.inner.cost(x)
    }

    fn constraints(&self, x: &[f64], out: &mut [f64]) -> DcResult<()> {
        self.constraint_evals.fetch_add(1, Ordering::Relaxed);
        self.inner.constraints(x, out)
    }

    fn constraint_jacobian(&self, x: &[f64], step: f64, frozen: &[bool]) -> DcResult<DMatrix<f64>> {
        self.jacobian_evals.fetch_add(1, Ordering::Relaxed);
        self.inner.constraint_jacobian(x, step, frozen)
    }

    fn lagrangian_hessian(
        &self,
        x: &[f64],
        weights: &[f64],
        frozen: &[bool],
    ) -> DcResult<DMatrix<f64>> {
        self.hessian_evals.fetch_add(1, Ordering::Relaxed);
        self.inner.lagrangian_hessian(x, weights, frozen)
    }
}
