//! Decision-vector layout and trajectory recovery.

use crate::builder::VarRange;
use crate::error::TranscribeResult;
use dc_core::{NameMap, Real, ensure_len};
use nalgebra::DMatrix;

/// Variable ranges of one interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntervalLayout {
    /// `X_k`
    pub start: VarRange,
    /// `U_k`
    pub control: VarRange,
    /// `Xc_{k,1..d}`, `d` blocks of `state_dim` back to back
    pub collocation: VarRange,
    /// `X_{k+1}`
    pub end: VarRange,
}

/// Where every block of the decision vector lives, as recorded during assembly.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub(crate) state_dim: usize,
    pub(crate) control_dim: usize,
    pub(crate) degree: usize,
    pub(crate) width: Real,
    pub(crate) num_variables: usize,
    pub(crate) initial: VarRange,
    pub(crate) intervals: Vec<IntervalLayout>,
    pub(crate) state_names: NameMap,
    pub(crate) control_names: NameMap,
}

impl Layout {
    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    pub fn control_dim(&self) -> usize {
        self.control_dim
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Interval width `h`.
    pub fn width(&self) -> Real {
        self.width
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    /// The pinned `X_0`.
    pub fn initial(&self) -> VarRange {
        self.initial
    }

    pub fn intervals(&self) -> &[IntervalLayout] {
        &self.intervals
    }

    /// State at node `r` of interval `k`: `X_k` for `r = 0`, else `Xc_{k,r}`.
    pub fn node_state(&self, k: usize, r: usize) -> VarRange {
        let interval = &self.intervals[k];
        if r == 0 {
            interval.start
        } else {
            interval.collocation.chunk(r - 1, self.state_dim)
        }
    }

    /// Boundary states and controls of a decision vector.
    pub fn extract(&self, w: &[Real]) -> TranscribeResult<Trajectories> {
        ensure_len(w, self.num_variables, "decision vector")?;
        let n = self.intervals.len();

        let mut states = DMatrix::zeros(self.state_dim, n + 1);
        let mut controls = DMatrix::zeros(self.control_dim, n);
        states.column_mut(0).copy_from_slice(self.initial.slice(w));
        for (k, interval) in self.intervals.iter().enumerate() {
            states
                .column_mut(k + 1)
                .copy_from_slice(interval.end.slice(w));
            controls
                .column_mut(k)
                .copy_from_slice(interval.control.slice(w));
        }

        Ok(Trajectories {
            states,
            controls,
            times: (0..=n).map(|k| k as Real * self.width).collect(),
            state_names: self.state_names.clone(),
            control_names: self.control_names.clone(),
        })
    }
}

/// State and control trajectories at interval boundaries.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectories {
    /// `state_dim x (N + 1)`; column `k` is `X_k`
    pub states: DMatrix<Real>,
    /// `control_dim x N`; column `k` is `U_k`, held over `[t_k, t_{k+1})`
    pub controls: DMatrix<Real>,
    /// `t_k = k h`, `N + 1` entries
    pub times: Vec<Real>,
    pub state_names: NameMap,
    pub control_names: NameMap,
}

impl Trajectories {
    pub fn num_intervals(&self) -> usize {
        self.controls.ncols()
    }

    /// Time series of the named state.
    pub fn state(&self, name: &str) -> Option<Vec<Real>> {
        let i = self.state_names.index_of(name)?;
        Some(self.states.row(i).iter().copied().collect())
    }

    /// Piecewise-constant values of the named control.
    pub fn control(&self, name: &str) -> Option<Vec<Real>> {
        let i = self.control_names.index_of(name)?;
        Some(self.controls.row(i).iter().copied().collect())
    }

    pub fn final_state(&self) -> Vec<Real> {
        let last = self.states.ncols() - 1;
        self.states.column(last).iter().copied().collect()
    }

    /// Controls as one vector per interval.
    pub fn control_sequence(&self) -> Vec<Vec<Real>> {
        self.controls
            .column_iter()
            .map(|c| c.iter().copied().collect())
            .collect()
    }
}
