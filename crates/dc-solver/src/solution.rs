//! Solve outcome and diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Optimality and feasibility tolerances met
    Converged,
    /// `max_iterations` reached first
    MaxIterationsExceeded,
    /// No further progress possible at the largest penalty
    Stalled,
}

impl SolveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveStatus::Converged => "converged",
            SolveStatus::MaxIterationsExceeded => "max_iterations_exceeded",
            SolveStatus::Stalled => "stalled",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SolveStatus::Converged)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub status: SolveStatus,
    /// Outer iterations performed
    pub iterations: usize,
    pub inner_iterations: usize,
    /// Minimised cost at the returned point
    pub cost: f64,
    pub constraint_violation: f64,
    /// Projected Lagrangian gradient norm of the scaled program; absent when
    /// no iteration ran
    pub optimality: Option<f64>,
    pub penalty: f64,
    pub cost_evaluations: usize,
    pub constraint_evaluations: usize,
    pub jacobian_evaluations: usize,
    pub hessian_evaluations: usize,
    pub elapsed_s: f64,
}

/// Primal point, multipliers and convergence flag from one solve.
#[derive(Debug, Clone)]
pub struct NlpSolution {
    pub x: Vec<f64>,
    /// One multiplier per constraint row
    pub multipliers: Vec<f64>,
    pub converged: bool,
    pub diagnostics: Diagnostics,
}
