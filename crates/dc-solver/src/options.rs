//! Solver configuration.

use crate::error::{SolverError, SolverResult};
use serde::{Deserialize, Serialize};

/// Options understood by [`crate::AugmentedLagrangian`].
///
/// Only `max_iterations` is part of the generic solver contract; the rest tune
/// the built-in backend and are ignored by others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Cap on outer (multiplier update) iterations. Zero returns the guess unsolved.
    pub max_iterations: usize,
    /// Cap on projected Newton steps per outer iteration
    pub max_inner_iterations: usize,
    /// Projected-gradient tolerance on the Lagrangian
    pub tolerance: f64,
    /// Max-norm tolerance on constraint violation
    pub constraint_tolerance: f64,
    pub initial_penalty: f64,
    pub penalty_growth: f64,
    pub max_penalty: f64,
    /// Relative finite-difference step for first derivatives
    pub fd_step: f64,
    /// Rescale variables, rows and cost from derivatives at the starting point
    pub scaling: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            max_inner_iterations: 50,
            tolerance: 1e-6,
            constraint_tolerance: 1e-6,
            initial_penalty: 10.0,
            penalty_growth: 10.0,
            max_penalty: 1e12,
            fd_step: 1e-6,
            scaling: true,
        }
    }
}

impl SolverOptions {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn validate(&self) -> SolverResult<()> {
        let positive = [
            ("tolerance", self.tolerance),
            ("constraint_tolerance", self.constraint_tolerance),
            ("initial_penalty", self.initial_penalty),
            ("max_penalty", self.max_penalty),
            ("fd_step", self.fd_step),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SolverError::InvalidOption {
                    what: format!("{name} must be positive and finite, got {value}"),
                });
            }
        }
        if !(self.penalty_growth.is_finite() && self.penalty_growth > 1.0) {
            return Err(SolverError::InvalidOption {
                what: format!(
                    "penalty_growth must exceed 1, got {}",
                    self.penalty_growth
                ),
            });
        }
        if self.max_inner_iterations == 0 {
            return Err(SolverError::InvalidOption {
                what: "max_inner_iterations must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SolverOptions::default().validate().unwrap();
    }

    #[test]
    fn zero_iterations_is_a_valid_option() {
        SolverOptions::default()
            .with_max_iterations(0)
            .validate()
            .unwrap();
    }

    #[test]
    fn growth_must_exceed_one() {
        let options = SolverOptions {
            penalty_growth: 1.0,
            ..SolverOptions::default()
        };
        assert!(options.validate().is_err());
    }
}
