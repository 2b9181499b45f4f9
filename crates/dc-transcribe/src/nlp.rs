//! The transcribed program as seen by a solver.
//!
//! Derivatives are assembled block by block. Each constraint block is
//! differentiated only in the variables it reads, and second derivatives are
//! taken only where the model enters; the collocation and continuity
//! coefficients contribute no curvature. The objective is split into one term
//! per interval for the same reason.

use crate::builder::{AssembledNlp, ConstraintBlock, ConstraintKernel};
use crate::extract::Layout;
use crate::objective::{ObjectivePolicy, StageTerm};
use dc_core::{DcResult, Real, ensure_finite, ensure_len};
use dc_solver::NlpProblem;
use dc_solver::jacobian::{
    SECOND_DIFFERENCE_STEP, central_difference_jacobian, forward_difference_hessian, scatter_add,
};
use nalgebra::DMatrix;
use rayon::prelude::*;

/// Bounds, constraint blocks and objective of one transcription.
pub struct Nlp<'a> {
    kernel: ConstraintKernel<'a>,
    objective: &'a dyn ObjectivePolicy,
    layout: Layout,
    blocks: Vec<ConstraintBlock>,
    variable_lower: Vec<Real>,
    variable_upper: Vec<Real>,
    constraint_lower: Vec<Real>,
    constraint_upper: Vec<Real>,
}

impl<'a> Nlp<'a> {
    pub(crate) fn new(
        parts: AssembledNlp<'a>,
        objective: &'a dyn ObjectivePolicy,
        layout: Layout,
    ) -> (Self, Vec<Real>) {
        let nlp = Self {
            kernel: parts.kernel,
            objective,
            layout,
            blocks: parts.blocks,
            variable_lower: parts.variable_lower,
            variable_upper: parts.variable_upper,
            constraint_lower: parts.constraint_lower,
            constraint_upper: parts.constraint_upper,
        };
        (nlp, parts.guess)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Constraint blocks in row order.
    pub fn blocks(&self) -> &[ConstraintBlock] {
        &self.blocks
    }

    pub fn objective_policy(&self) -> &dyn ObjectivePolicy {
        self.objective
    }

    /// Objective in the user's sense (not sign-adjusted).
    pub fn objective(&self, w: &[Real]) -> DcResult<Real> {
        ensure_len(w, self.layout.num_variables(), "decision vector")?;
        let mut total = 0.0;
        for k in 0..self.layout.intervals().len() {
            total += self.interval_objective(k, w)?;
        }
        ensure_finite(total, "objective")
    }

    /// Stage term of interval `k` plus its running-cost quadrature.
    fn interval_objective(&self, k: usize, w: &[Real]) -> DcResult<Real> {
        let intervals = self.layout.intervals();
        let control = intervals[k].control.slice(w);
        let term = StageTerm {
            interval: k,
            intervals: intervals.len(),
            state: intervals[k].end.slice(w),
            control,
            previous_control: k
                .checked_sub(1)
                .map(|prev| intervals[prev].control.slice(w)),
        };
        let mut value = self.objective.stage(&term)?;

        if self.objective.has_running_cost() {
            let h = self.layout.width();
            for (r, b_r) in self.kernel.scheme.b().iter().enumerate() {
                let x_r = self.layout.node_state(k, r).slice(w);
                value += h * b_r * self.objective.running(x_r, control)?;
            }
        }
        Ok(value)
    }

    /// Variables [`Self::interval_objective`] reads for interval `k`.
    fn interval_objective_reads(&self, k: usize) -> Vec<usize> {
        let intervals = self.layout.intervals();
        let mut reads: Vec<usize> = intervals[k].control.range().collect();
        if k > 0 {
            reads.extend(intervals[k - 1].control.range());
        }
        reads.extend(intervals[k].end.range());
        if self.objective.has_running_cost() {
            for r in 0..=self.layout.degree() {
                reads.extend(self.layout.node_state(k, r).range());
            }
        }
        reads.sort_unstable();
        reads.dedup();
        reads
    }
}

fn unfrozen(indices: Vec<usize>, frozen: &[bool]) -> Vec<usize> {
    indices.into_iter().filter(|&j| !frozen[j]).collect()
}

impl NlpProblem for Nlp<'_> {
    fn num_variables(&self) -> usize {
        self.variable_lower.len()
    }

    fn num_constraints(&self) -> usize {
        self.constraint_lower.len()
    }

    fn variable_lower(&self) -> &[f64] {
        &self.variable_lower
    }

    fn variable_upper(&self) -> &[f64] {
        &self.variable_upper
    }

    fn constraint_lower(&self) -> &[f64] {
        &self.constraint_lower
    }

    fn constraint_upper(&self) -> &[f64] {
        &self.constraint_upper
    }

    fn cost(&self, x: &[f64]) -> DcResult<f64> {
        Ok(self.objective.sense().sign() * self.objective(x)?)
    }

    fn constraints(&self, x: &[f64], out: &mut [f64]) -> DcResult<()> {
        ensure_len(x, self.num_variables(), "decision vector")?;
        ensure_len(out, self.num_constraints(), "constraint buffer")?;
        for block in &self.blocks {
            self.kernel.eval(&block.expr, x, &mut out[block.rows()])?;
        }
        Ok(())
    }

    fn constraint_jacobian(&self, x: &[f64], step: f64, frozen: &[bool]) -> DcResult<DMatrix<f64>> {
        ensure_len(x, self.num_variables(), "decision vector")?;
        let parts = self
            .blocks
            .par_iter()
            .map(|block| -> DcResult<(Vec<usize>, DMatrix<f64>)> {
                let columns = unfrozen(self.kernel.reads(&block.expr), frozen);
                let local = central_difference_jacobian(
                    x,
                    &columns,
                    block.len,
                    |w, out| self.kernel.eval(&block.expr, w, out),
                    step,
                )?;
                Ok((columns, local))
            })
            .collect::<DcResult<Vec<_>>>()?;

        let mut jac = DMatrix::zeros(self.num_constraints(), self.num_variables());
        for (block, (columns, local)) in self.blocks.iter().zip(parts) {
            for (a, &j) in columns.iter().enumerate() {
                for (i, row) in block.rows().enumerate() {
                    jac[(row, j)] = local[(i, a)];
                }
            }
        }
        Ok(jac)
    }

    fn lagrangian_hessian(
        &self,
        x: &[f64],
        weights: &[f64],
        frozen: &[bool],
    ) -> DcResult<DMatrix<f64>> {
        ensure_len(x, self.num_variables(), "decision vector")?;
        ensure_len(weights, self.num_constraints(), "constraint weights")?;
        let sign = self.objective.sense().sign();

        let objective_parts = (0..self.layout.intervals().len())
            .into_par_iter()
            .map(|k| -> DcResult<(Vec<usize>, DMatrix<f64>)> {
                let indices = unfrozen(self.interval_objective_reads(k), frozen);
                let local = forward_difference_hessian(
                    x,
                    &indices,
                    |w| Ok(sign * self.interval_objective(k, w)?),
                    SECOND_DIFFERENCE_STEP,
                )?;
                Ok((indices, local))
            })
            .collect::<DcResult<Vec<_>>>()?;

        let constraint_parts = self
            .blocks
            .par_iter()
            .filter(|block| weights[block.rows()].iter().any(|&wi| wi != 0.0))
            .map(|block| -> DcResult<(Vec<usize>, DMatrix<f64>)> {
                let block_weights = &weights[block.rows()];
                let indices = unfrozen(self.kernel.curved(&block.expr), frozen);
                let local = forward_difference_hessian(
                    x,
                    &indices,
                    |w| {
                        let mut out = vec![0.0; block.len];
                        self.kernel.eval(&block.expr, w, &mut out)?;
                        Ok(out.iter().zip(block_weights).map(|(g, wi)| g * wi).sum())
                    },
                    SECOND_DIFFERENCE_STEP,
                )?;
                Ok((indices, local))
            })
            .collect::<DcResult<Vec<_>>>()?;

        let n = self.num_variables();
        let mut hess = DMatrix::zeros(n, n);
        for (indices, local) in objective_parts.iter().chain(&constraint_parts) {
            scatter_add(&mut hess, indices, local);
        }
        Ok(hess)
    }
}
