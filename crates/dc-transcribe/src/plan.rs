//! Horizon discretisation and per-interval bounds.

use crate::error::{TranscribeError, TranscribeResult};
use dc_core::Real;
use serde::{Deserialize, Serialize};

/// Lower/upper bounds and an initial guess for one block of variables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: Vec<Real>,
    pub upper: Vec<Real>,
    pub guess: Vec<Real>,
}

impl Bounds {
    pub fn new(lower: Vec<Real>, upper: Vec<Real>, guess: Vec<Real>) -> Self {
        Self {
            lower,
            upper,
            guess,
        }
    }

    /// Pinned block: lower = upper = guess.
    pub fn fixed(values: Vec<Real>) -> Self {
        Self {
            lower: values.clone(),
            upper: values.clone(),
            guess: values,
        }
    }

    /// Unbounded block with the given guess.
    pub fn free(guess: Vec<Real>) -> Self {
        Self {
            lower: vec![Real::NEG_INFINITY; guess.len()],
            upper: vec![Real::INFINITY; guess.len()],
            guess,
        }
    }

    /// Zero-width block, for models without controls.
    pub fn empty() -> Self {
        Self::fixed(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.guess.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guess.is_empty()
    }

    fn validate(&self, role: &str, interval: usize, dim: usize) -> TranscribeResult<()> {
        let lengths = [
            ("lower", self.lower.len()),
            ("upper", self.upper.len()),
            ("guess", self.guess.len()),
        ];
        for (which, len) in lengths {
            if len != dim {
                return Err(TranscribeError::InvalidPlan {
                    what: format!(
                        "interval {interval}: {role} {which} has length {len}, expected {dim}"
                    ),
                });
            }
        }
        for i in 0..dim {
            let (lo, hi) = (self.lower[i], self.upper[i]);
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(TranscribeError::InvalidPlan {
                    what: format!(
                        "interval {interval}: {role} component {i} has lower bound {lo} above upper bound {hi}"
                    ),
                });
            }
            if !self.guess[i].is_finite() {
                return Err(TranscribeError::InvalidPlan {
                    what: format!(
                        "interval {interval}: {role} guess component {i} is {}",
                        self.guess[i]
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Bounds for the variables introduced by one interval.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntervalBounds {
    /// Piecewise-constant control `U_k`
    pub control: Bounds,
    /// Shared by all `d` collocation states `Xc_{k,j}`
    pub collocation_state: Bounds,
    /// Boundary state `X_{k+1}` at the end of the interval
    pub end_state: Bounds,
}

/// Fixed horizon split into equal intervals, with a pinned initial state.
#[derive(Clone, Debug, PartialEq)]
pub struct IntervalPlan {
    horizon: Real,
    initial_state: Vec<Real>,
    intervals: Vec<IntervalBounds>,
}

impl IntervalPlan {
    /// Same control and state bounds on every interval.
    pub fn uniform(
        horizon: Real,
        intervals: usize,
        initial_state: Vec<Real>,
        control: Bounds,
        state: Bounds,
    ) -> Self {
        let per_interval = IntervalBounds {
            control,
            collocation_state: state.clone(),
            end_state: state,
        };
        Self {
            horizon,
            initial_state,
            intervals: vec![per_interval; intervals],
        }
    }

    pub fn horizon(&self) -> Real {
        self.horizon
    }

    pub fn num_intervals(&self) -> usize {
        self.intervals.len()
    }

    /// Interval width `h = T / N`.
    pub fn width(&self) -> Real {
        self.horizon / self.intervals.len() as Real
    }

    pub fn initial_state(&self) -> &[Real] {
        &self.initial_state
    }

    pub fn intervals(&self) -> &[IntervalBounds] {
        &self.intervals
    }

    pub fn interval(&self, k: usize) -> Option<&IntervalBounds> {
        self.intervals.get(k)
    }

    /// Override bounds or guesses of one interval.
    pub fn interval_mut(&mut self, k: usize) -> Option<&mut IntervalBounds> {
        self.intervals.get_mut(k)
    }

    /// `k * h` for `k = 0..=N`.
    pub fn boundary_times(&self) -> Vec<Real> {
        let h = self.width();
        (0..=self.intervals.len()).map(|k| k as Real * h).collect()
    }

    /// Check the plan against model dimensions before any assembly.
    pub fn validate(&self, state_dim: usize, control_dim: usize) -> TranscribeResult<()> {
        if self.intervals.is_empty() {
            return Err(TranscribeError::InvalidPlan {
                what: "at least one interval is required".to_string(),
            });
        }
        let h = self.width();
        if !(self.horizon.is_finite() && self.horizon > 0.0 && h.is_finite() && h > 0.0) {
            return Err(TranscribeError::InvalidPlan {
                what: format!(
                    "horizon {} over {} intervals gives width {h}",
                    self.horizon,
                    self.intervals.len()
                ),
            });
        }
        if self.initial_state.len() != state_dim {
            return Err(TranscribeError::InvalidPlan {
                what: format!(
                    "initial state has length {}, expected {state_dim}",
                    self.initial_state.len()
                ),
            });
        }
        if let Some(i) = self.initial_state.iter().position(|v| !v.is_finite()) {
            return Err(TranscribeError::InvalidPlan {
                what: format!("initial state component {i} is not finite"),
            });
        }
        for (k, interval) in self.intervals.iter().enumerate() {
            interval.control.validate("control", k, control_dim)?;
            interval
                .collocation_state
                .validate("collocation state", k, state_dim)?;
            interval.end_state.validate("end state", k, state_dim)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(intervals: usize) -> IntervalPlan {
        IntervalPlan::uniform(
            2.0,
            intervals,
            vec![1.0, 0.0],
            Bounds::new(vec![0.0], vec![1.0], vec![0.5]),
            Bounds::free(vec![0.0, 0.0]),
        )
    }

    #[test]
    fn uniform_plan_is_valid() {
        let p = plan(4);
        p.validate(2, 1).unwrap();
        assert_eq!(p.width(), 0.5);
        assert_eq!(p.boundary_times(), vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn zero_intervals_rejected() {
        let err = plan(0).validate(2, 1).unwrap_err();
        assert!(err.to_string().contains("at least one interval"), "{err}");
    }

    #[test]
    fn non_positive_horizon_rejected() {
        let mut p = plan(2);
        p.horizon = 0.0;
        assert!(p.validate(2, 1).is_err());
        p.horizon = Real::NAN;
        assert!(p.validate(2, 1).is_err());
    }

    #[test]
    fn dimension_mismatch_names_interval_and_role() {
        let mut p = plan(3);
        p.interval_mut(2).unwrap().end_state = Bounds::free(vec![0.0]);
        let err = p.validate(2, 1).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("interval 2") && msg.contains("end state"), "{msg}");
    }

    #[test]
    fn inverted_bound_rejected() {
        let mut p = plan(2);
        p.interval_mut(1).unwrap().control = Bounds::new(vec![2.0], vec![1.0], vec![1.5]);
        let err = p.validate(2, 1).unwrap_err();
        assert!(err.to_string().contains("component 0"), "{err}");
    }

    #[test]
    fn initial_state_length_checked() {
        assert!(plan(1).validate(3, 1).is_err());
    }
}
