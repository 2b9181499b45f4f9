//! Positional assembly of variables and constraint rows.
//!
//! Bounds and guesses are aligned with variables, and row bounds with rows,
//! purely by position. [`NlpBuilder`] appends each block together with its
//! bounds in one call, so the arrays cannot drift apart.

use crate::dynamics::{Dynamics, evaluate_checked};
use crate::error::{TranscribeError, TranscribeResult};
use crate::plan::Bounds;
use dc_colloc::CollocationScheme;
use dc_core::{DcError, DcResult, Real, ensure_all_finite};
use std::ops::Range;

/// Contiguous run of decision variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VarRange {
    pub start: usize,
    pub len: usize,
}

impl VarRange {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    pub fn slice<'w>(&self, w: &'w [Real]) -> &'w [Real] {
        &w[self.range()]
    }

    /// The `index`-th sub-block of width `width`.
    pub fn chunk(&self, index: usize, width: usize) -> VarRange {
        VarRange {
            start: self.start + index * width,
            len: width,
        }
    }
}

/// What a block of constraint rows computes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConstraintExpr {
    /// `path(state, control)`, one row per path constraint
    Path { state: VarRange, control: VarRange },
    /// `h * f(Xc_j, U) - sum_r C[r][j] * x_r` at collocation point `point` (1-based)
    Defect {
        point: usize,
        start: VarRange,
        collocation: VarRange,
        control: VarRange,
    },
    /// `D[0] * X_k + sum_j D[j] * Xc_j - X_{k+1}`
    Continuity {
        start: VarRange,
        collocation: VarRange,
        next: VarRange,
    },
}

/// A constraint expression placed at `rows`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstraintBlock {
    pub expr: ConstraintExpr,
    pub first_row: usize,
    pub len: usize,
}

impl ConstraintBlock {
    pub fn rows(&self) -> Range<usize> {
        self.first_row..self.first_row + self.len
    }
}

/// Evaluates constraint expressions for one model and collocation scheme.
#[derive(Clone, Copy)]
pub struct ConstraintKernel<'a> {
    pub dynamics: &'a dyn Dynamics,
    pub scheme: &'a CollocationScheme,
    /// Interval width `h`
    pub width: Real,
}

impl ConstraintKernel<'_> {
    pub fn rows(&self, expr: &ConstraintExpr) -> usize {
        match expr {
            ConstraintExpr::Path { .. } => self.dynamics.path_dim(),
            ConstraintExpr::Defect { .. } | ConstraintExpr::Continuity { .. } => {
                self.dynamics.state_dim()
            }
        }
    }

    /// Variables the rows of `expr` read.
    pub fn reads(&self, expr: &ConstraintExpr) -> Vec<usize> {
        match *expr {
            ConstraintExpr::Path { state, control } => state.range().chain(control.range()).collect(),
            ConstraintExpr::Defect {
                start,
                collocation,
                control,
                ..
            } => start
                .range()
                .chain(collocation.range())
                .chain(control.range())
                .collect(),
            ConstraintExpr::Continuity {
                start,
                collocation,
                next,
            } => start
                .range()
                .chain(collocation.range())
                .chain(next.range())
                .collect(),
        }
    }

    /// Variables that enter `expr` through the model, i.e. other than linearly.
    pub fn curved(&self, expr: &ConstraintExpr) -> Vec<usize> {
        match *expr {
            ConstraintExpr::Path { state, control } => state.range().chain(control.range()).collect(),
            ConstraintExpr::Defect {
                point,
                start,
                collocation,
                control,
            } => {
                let x_j = if point == 0 {
                    start
                } else {
                    collocation.chunk(point - 1, start.len)
                };
                x_j.range().chain(control.range()).collect()
            }
            ConstraintExpr::Continuity { .. } => Vec::new(),
        }
    }

    /// State at node `r` of an interval: `X_k` for `r = 0`, else `Xc_r`.
    fn state_at<'w>(
        &self,
        w: &'w [Real],
        start: VarRange,
        collocation: VarRange,
        r: usize,
    ) -> &'w [Real] {
        if r == 0 {
            start.slice(w)
        } else {
            collocation.chunk(r - 1, start.len).slice(w)
        }
    }

    /// Write the rows of `expr` at `w` into `out`.
    pub fn eval(&self, expr: &ConstraintExpr, w: &[Real], out: &mut [Real]) -> DcResult<()> {
        match *expr {
            ConstraintExpr::Path { state, control } => {
                let e = evaluate_checked(self.dynamics, state.slice(w), control.slice(w))?;
                out.copy_from_slice(&e.path);
            }
            ConstraintExpr::Defect {
                point,
                start,
                collocation,
                control,
            } => {
                let x_j = self.state_at(w, start, collocation, point);
                let e = evaluate_checked(self.dynamics, x_j, control.slice(w))?;
                let c = self.scheme.c();
                for (i, slot) in out.iter_mut().enumerate() {
                    let slope: Real = (0..=self.scheme.degree())
                        .map(|r| c[(r, point)] * self.state_at(w, start, collocation, r)[i])
                        .sum();
                    *slot = self.width * e.derivative[i] - slope;
                }
            }
            ConstraintExpr::Continuity {
                start,
                collocation,
                next,
            } => {
                let d = self.scheme.d();
                let next = next.slice(w);
                for (i, slot) in out.iter_mut().enumerate() {
                    let end: Real = d
                        .iter()
                        .enumerate()
                        .map(|(r, d_r)| d_r * self.state_at(w, start, collocation, r)[i])
                        .sum();
                    *slot = end - next[i];
                }
            }
        }
        Ok(())
    }
}

/// Appends variable and constraint blocks with their bounds.
pub struct NlpBuilder<'a> {
    kernel: ConstraintKernel<'a>,
    lower: Vec<Real>,
    upper: Vec<Real>,
    guess: Vec<Real>,
    blocks: Vec<ConstraintBlock>,
    row_lower: Vec<Real>,
    row_upper: Vec<Real>,
}

impl<'a> NlpBuilder<'a> {
    pub fn new(kernel: ConstraintKernel<'a>) -> Self {
        Self {
            kernel,
            lower: Vec::new(),
            upper: Vec::new(),
            guess: Vec::new(),
            blocks: Vec::new(),
            row_lower: Vec::new(),
            row_upper: Vec::new(),
        }
    }

    pub fn num_variables(&self) -> usize {
        self.guess.len()
    }

    pub fn num_rows(&self) -> usize {
        self.row_lower.len()
    }

    /// Append a variable block. Nothing is appended on error.
    pub fn add_variable_block(&mut self, bounds: &Bounds) -> TranscribeResult<VarRange> {
        let len = bounds.guess.len();
        let lengths = [
            ("variable block lower bounds", bounds.lower.len()),
            ("variable block upper bounds", bounds.upper.len()),
        ];
        for (what, actual) in lengths {
            if actual != len {
                return Err(DcError::DimensionMismatch {
                    what,
                    expected: len,
                    actual,
                }
                .into());
            }
        }
        let start = self.num_variables();
        for i in 0..len {
            let (lo, hi) = (bounds.lower[i], bounds.upper[i]);
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(TranscribeError::InvertedBound {
                    what: "variable",
                    index: start + i,
                    lower: lo,
                    upper: hi,
                });
            }
        }

        self.lower.extend_from_slice(&bounds.lower);
        self.upper.extend_from_slice(&bounds.upper);
        self.guess.extend_from_slice(&bounds.guess);
        Ok(VarRange { start, len })
    }

    /// Append the rows of `expr` with bounds `[lower, upper]` on each row.
    ///
    /// The expression is evaluated at the current guess first; a failed or
    /// non-finite evaluation is rejected with the offending row. Nothing is
    /// appended on error.
    pub fn add_constraint_block(
        &mut self,
        expr: ConstraintExpr,
        lower: Real,
        upper: Real,
    ) -> TranscribeResult<ConstraintBlock> {
        let first_row = self.num_rows();
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(TranscribeError::InvertedBound {
                what: "constraint row",
                index: first_row,
                lower,
                upper,
            });
        }
        let len = self.kernel.rows(&expr);
        self.check_at_guess(&expr, first_row, len)?;

        let block = ConstraintBlock {
            expr,
            first_row,
            len,
        };
        self.blocks.push(block);
        self.row_lower.resize(first_row + len, lower);
        self.row_upper.resize(first_row + len, upper);
        Ok(block)
    }

    fn check_at_guess(
        &self,
        expr: &ConstraintExpr,
        first_row: usize,
        len: usize,
    ) -> TranscribeResult<()> {
        let located = |source: DcError| {
            let offset = match source {
                DcError::NonFinite { index, .. } => index,
                _ => 0,
            };
            TranscribeError::InvalidEvaluation {
                row: first_row + offset,
                source,
            }
        };
        let mut out = vec![0.0; len];
        self.kernel
            .eval(expr, &self.guess, &mut out)
            .map_err(&located)?;
        ensure_all_finite(&out, "constraint value").map_err(&located)
    }

    pub fn guess(&self) -> &[Real] {
        &self.guess
    }

    pub fn blocks(&self) -> &[ConstraintBlock] {
        &self.blocks
    }

    pub fn into_parts(self) -> AssembledNlp<'a> {
        AssembledNlp {
            kernel: self.kernel,
            variable_lower: self.lower,
            variable_upper: self.upper,
            guess: self.guess,
            blocks: self.blocks,
            constraint_lower: self.row_lower,
            constraint_upper: self.row_upper,
        }
    }
}

/// Arrays produced by [`NlpBuilder`], aligned by position.
pub struct AssembledNlp<'a> {
    pub kernel: ConstraintKernel<'a>,
    pub variable_lower: Vec<Real>,
    pub variable_upper: Vec<Real>,
    pub guess: Vec<Real>,
    pub blocks: Vec<ConstraintBlock>,
    pub constraint_lower: Vec<Real>,
    pub constraint_upper: Vec<Real>,
}
