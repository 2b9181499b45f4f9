//! Projected Newton iteration for box-constrained minimisation.

use dc_core::{DcError, DcResult};
use nalgebra::{DMatrix, DVector};

/// Projected Newton configuration.
#[derive(Debug, Clone)]
pub struct ProjectedNewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Tolerance on the max-norm of the projected gradient
    pub tolerance: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
    /// Sufficient decrease constant
    pub armijo: f64,
}

impl Default for ProjectedNewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-6,
            line_search_beta: 0.5,
            max_line_search_iters: 40,
            armijo: 1e-4,
        }
    }
}

/// Projected Newton iteration result.
#[derive(Debug, Clone)]
pub struct ProjectedNewtonResult {
    /// Final point, inside the box
    pub x: DVector<f64>,
    /// Number of accepted steps
    pub iterations: usize,
    /// Projected gradient norm at `x`, when the last model was built there
    pub projected_gradient: Option<f64>,
    /// Tolerance met
    pub converged: bool,
    /// Line search failed or no free variable could move
    pub stalled: bool,
}

/// Second-order model of the objective at a point.
pub struct LocalModel {
    pub gradient: DVector<f64>,
    pub hessian: DMatrix<f64>,
}

pub fn project(x: &mut DVector<f64>, lower: &[f64], upper: &[f64]) {
    for i in 0..x.len() {
        x[i] = x[i].clamp(lower[i], upper[i]);
    }
}

/// `|| x - P(x - grad) ||_inf`
pub fn projected_gradient_norm(
    x: &DVector<f64>,
    gradient: &DVector<f64>,
    lower: &[f64],
    upper: &[f64],
) -> f64 {
    (0..x.len()).fold(0.0, |acc, i| {
        let moved = (x[i] - gradient[i]).clamp(lower[i], upper[i]);
        acc.max((x[i] - moved).abs())
    })
}

/// Minimise `value_fn` over the box `[lower, upper]`.
///
/// Variables on a bound whose gradient pushes outward are held fixed; the
/// Newton system on the rest is regularised until it factors, and the step is
/// projected back into the box with Armijo backtracking. A non-finite value at
/// a trial point only shortens the step.
pub fn projected_newton<F, M>(
    x0: DVector<f64>,
    lower: &[f64],
    upper: &[f64],
    value_fn: F,
    model_fn: M,
    config: &ProjectedNewtonConfig,
) -> DcResult<ProjectedNewtonResult>
where
    F: Fn(&DVector<f64>) -> DcResult<f64>,
    M: Fn(&DVector<f64>) -> DcResult<LocalModel>,
{
    let mut x = x0;
    project(&mut x, lower, upper);
    let mut value = value_fn(&x)?;
    if !value.is_finite() {
        return Err(DcError::NonFinite {
            what: "merit value at start of projected Newton",
            index: 0,
            value,
        });
    }

    for iter in 0..config.max_iterations {
        let model = model_fn(&x)?;
        let pg = projected_gradient_norm(&x, &model.gradient, lower, upper);
        if pg <= config.tolerance {
            return Ok(ProjectedNewtonResult {
                x,
                iterations: iter,
                projected_gradient: Some(pg),
                converged: true,
                stalled: false,
            });
        }

        let free = free_variables(&x, &model.gradient, lower, upper, pg);
        let Some(step) = newton_step(&model, &free) else {
            return Ok(stalled(x, iter, pg));
        };

        // Backtracking along the projected path
        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..config.max_line_search_iters {
            let mut trial = &x + alpha * &step;
            project(&mut trial, lower, upper);
            let decrease = model.gradient.dot(&(&trial - &x)).min(0.0);
            if let Ok(trial_value) = value_fn(&trial) {
                if trial_value.is_finite()
                    && trial_value <= value + config.armijo * decrease
                    && trial != x
                {
                    accepted = Some((trial, trial_value));
                    break;
                }
            }
            alpha *= config.line_search_beta;
        }

        match accepted {
            Some((trial, trial_value)) => {
                x = trial;
                value = trial_value;
            }
            None => return Ok(stalled(x, iter, pg)),
        }
    }

    Ok(ProjectedNewtonResult {
        x,
        iterations: config.max_iterations,
        projected_gradient: None,
        converged: false,
        stalled: false,
    })
}

fn stalled(x: DVector<f64>, iterations: usize, pg: f64) -> ProjectedNewtonResult {
    ProjectedNewtonResult {
        x,
        iterations,
        projected_gradient: Some(pg),
        converged: false,
        stalled: true,
    }
}

/// Indices not pinned by equal bounds or by an outward gradient at an active bound.
fn free_variables(
    x: &DVector<f64>,
    gradient: &DVector<f64>,
    lower: &[f64],
    upper: &[f64],
    pg: f64,
) -> Vec<usize> {
    let eps = pg.min(1e-8);
    (0..x.len())
        .filter(|&i| {
            if lower[i] == upper[i] {
                return false;
            }
            let at_lower = x[i] <= lower[i] + eps * (1.0 + lower[i].abs());
            let at_upper = x[i] >= upper[i] - eps * (1.0 + upper[i].abs());
            !(at_lower && gradient[i] > 0.0 || at_upper && gradient[i] < 0.0)
        })
        .collect()
}

/// Regularised Newton direction on the free variables; zero elsewhere.
fn newton_step(model: &LocalModel, free: &[usize]) -> Option<DVector<f64>> {
    if free.is_empty() {
        return None;
    }
    let k = free.len();
    let h_ff = DMatrix::from_fn(k, k, |a, b| model.hessian[(free[a], free[b])]);
    let rhs = DVector::from_fn(k, |a, _| -model.gradient[free[a]]);

    let scale = (0..k).fold(1.0_f64, |acc, a| acc.max(h_ff[(a, a)].abs()));
    let mut delta = 1e-12 * scale;
    while delta <= 1e8 * scale {
        let mut shifted = h_ff.clone();
        for a in 0..k {
            shifted[(a, a)] += delta;
        }
        if let Some(chol) = shifted.cholesky() {
            let p_free = chol.solve(&rhs);
            if p_free.iter().all(|v| v.is_finite()) {
                let mut step = DVector::zeros(model.gradient.len());
                for (a, &i) in free.iter().enumerate() {
                    step[i] = p_free[a];
                }
                return Some(step);
            }
        }
        delta *= 100.0;
    }
    None
}
