//! Pluggable objective policies.

use dc_core::{DcError, DcResult, Real};
use serde::{Deserialize, Serialize};

/// Whether the objective is minimised or maximised.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

impl Sense {
    /// Factor turning the objective into a cost to minimise.
    pub fn sign(self) -> Real {
        match self {
            Sense::Minimize => 1.0,
            Sense::Maximize => -1.0,
        }
    }
}

/// Arguments of the per-interval objective term.
#[derive(Clone, Copy, Debug)]
pub struct StageTerm<'a> {
    /// Interval index `k`
    pub interval: usize,
    /// Interval count `N`
    pub intervals: usize,
    /// Boundary state `X_{k+1}` at the end of the interval
    pub state: &'a [Real],
    /// Control `U_k`
    pub control: &'a [Real],
    /// `U_{k-1}`; absent on the first interval
    pub previous_control: Option<&'a [Real]>,
}

impl StageTerm<'_> {
    pub fn is_last(&self) -> bool {
        self.interval + 1 == self.intervals
    }
}

/// Objective accumulated over the intervals of a transcription.
///
/// The total is `sum_k stage(k) + sum_k h * sum_{r=0..d} B[r] * running(x_r, U_k)`
/// with `x_0 = X_k` and `x_r = Xc_{k,r}` for `r >= 1`; the quadrature part is
/// only evaluated when [`has_running_cost`] is true.
///
/// [`has_running_cost`]: ObjectivePolicy::has_running_cost
pub trait ObjectivePolicy: Send + Sync {
    fn sense(&self) -> Sense;

    fn stage(&self, term: &StageTerm<'_>) -> DcResult<Real>;

    /// Integrand `L(state, control)` of the running cost.
    fn running(&self, _state: &[Real], _control: &[Real]) -> DcResult<Real> {
        Ok(0.0)
    }

    fn has_running_cost(&self) -> bool {
        false
    }
}

/// `weights . X_N`, minimised or maximised.
#[derive(Clone, Debug, PartialEq)]
pub struct TerminalObjective {
    weights: Vec<Real>,
    sense: Sense,
}

impl TerminalObjective {
    pub fn new(weights: Vec<Real>, sense: Sense) -> Self {
        Self { weights, sense }
    }

    pub fn weights(&self) -> &[Real] {
        &self.weights
    }
}

impl ObjectivePolicy for TerminalObjective {
    fn sense(&self) -> Sense {
        self.sense
    }

    fn stage(&self, term: &StageTerm<'_>) -> DcResult<Real> {
        if !term.is_last() {
            return Ok(0.0);
        }
        if term.state.len() != self.weights.len() {
            return Err(DcError::DimensionMismatch {
                what: "terminal objective weights",
                expected: term.state.len(),
                actual: self.weights.len(),
            });
        }
        Ok(self.weights.iter().zip(term.state).map(|(w, x)| w * x).sum())
    }
}

type StageFn = dyn Fn(&StageTerm<'_>) -> Real + Send + Sync;
type RunningFn = dyn Fn(&[Real], &[Real]) -> Real + Send + Sync;

/// Closure-backed objective.
pub struct FnObjective {
    sense: Sense,
    stage: Box<StageFn>,
    running: Option<Box<RunningFn>>,
}

impl FnObjective {
    pub fn new<S>(sense: Sense, stage: S) -> Self
    where
        S: Fn(&StageTerm<'_>) -> Real + Send + Sync + 'static,
    {
        Self {
            sense,
            stage: Box::new(stage),
            running: None,
        }
    }

    /// Objective made only of a running cost `integral L(x, u) dt`.
    pub fn running<L>(sense: Sense, running: L) -> Self
    where
        L: Fn(&[Real], &[Real]) -> Real + Send + Sync + 'static,
    {
        Self::new(sense, |_| 0.0).with_running(running)
    }

    pub fn with_running<L>(mut self, running: L) -> Self
    where
        L: Fn(&[Real], &[Real]) -> Real + Send + Sync + 'static,
    {
        self.running = Some(Box::new(running));
        self
    }
}

impl ObjectivePolicy for FnObjective {
    fn sense(&self) -> Sense {
        self.sense
    }

    fn stage(&self, term: &StageTerm<'_>) -> DcResult<Real> {
        Ok((self.stage)(term))
    }

    fn running(&self, state: &[Real], control: &[Real]) -> DcResult<Real> {
        Ok(self.running.as_ref().map_or(0.0, |l| l(state, control)))
    }

    fn has_running_cost(&self) -> bool {
        self.running.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term<'a>(interval: usize, state: &'a [Real]) -> StageTerm<'a> {
        StageTerm {
            interval,
            intervals: 3,
            state,
            control: &[],
            previous_control: None,
        }
    }

    #[test]
    fn terminal_objective_only_counts_last_interval() {
        let obj = TerminalObjective::new(vec![2.0, -1.0], Sense::Maximize);
        assert_eq!(obj.stage(&term(1, &[1.0, 1.0])).unwrap(), 0.0);
        assert_eq!(obj.stage(&term(2, &[1.0, 1.0])).unwrap(), 1.0);
        assert_eq!(obj.sense().sign(), -1.0);
    }

    #[test]
    fn terminal_weights_must_match_state() {
        let obj = TerminalObjective::new(vec![1.0], Sense::Minimize);
        assert!(obj.stage(&term(2, &[1.0, 1.0])).is_err());
    }

    #[test]
    fn running_cost_flag_follows_closure() {
        let plain = FnObjective::new(Sense::Minimize, |t| t.interval as Real);
        assert!(!plain.has_running_cost());
        assert_eq!(plain.running(&[1.0], &[]).unwrap(), 0.0);

        let with_running = FnObjective::running(Sense::Minimize, |x, _| x[0] * x[0]);
        assert!(with_running.has_running_cost());
        assert_eq!(with_running.running(&[3.0], &[]).unwrap(), 9.0);
        assert_eq!(with_running.stage(&term(0, &[1.0])).unwrap(), 0.0);
    }
}
