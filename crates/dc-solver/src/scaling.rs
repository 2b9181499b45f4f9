//! Diagonal scaling of variables, constraint rows and cost.
//!
//! The scaled program works on `y = x / d` with `d_j = max(1, |x0_j|)`. Each
//! row is multiplied by `s_i = min(1, 1 / ||J_i D||_inf)` and the cost by
//! `s_c = min(1, 1 / ||grad f D||_inf)`, both measured at the starting point,
//! so that no row or variable dominates the penalty term by its units alone.

use crate::jacobian::central_difference_gradient;
use crate::problem::NlpProblem;
use dc_core::DcResult;
use nalgebra::DMatrix;
use tracing::debug;

/// `min(1, 1 / norm)`, one for a zero norm.
fn shrink(norm: f64) -> f64 {
    if norm > 1.0 && norm.is_finite() {
        1.0 / norm
    } else {
        1.0
    }
}

/// A problem seen through fixed diagonal scale factors.
pub struct ScaledProblem<'a> {
    inner: &'a dyn NlpProblem,
    variable_scale: Vec<f64>,
    row_scale: Vec<f64>,
    cost_scale: f64,
    lower: Vec<f64>,
    upper: Vec<f64>,
    row_lower: Vec<f64>,
    row_upper: Vec<f64>,
}

impl<'a> ScaledProblem<'a> {
    /// All factors one: the scaled problem is `inner` itself.
    pub fn identity(inner: &'a dyn NlpProblem) -> Self {
        Self::with_factors(
            inner,
            vec![1.0; inner.num_variables()],
            vec![1.0; inner.num_constraints()],
            1.0,
        )
    }

    /// Factors measured at `x0`, which must lie inside the variable box.
    pub fn at(
        inner: &'a dyn NlpProblem,
        x0: &[f64],
        step: f64,
        frozen: &[bool],
    ) -> DcResult<Self> {
        let variable_scale: Vec<f64> = x0.iter().map(|v| v.abs().max(1.0)).collect();

        let jac = inner.constraint_jacobian(x0, step, frozen)?;
        let row_scale: Vec<f64> = (0..jac.nrows())
            .map(|i| {
                let norm = (0..jac.ncols())
                    .fold(0.0_f64, |acc, j| acc.max((jac[(i, j)] * variable_scale[j]).abs()));
                shrink(norm)
            })
            .collect();

        let gradient = central_difference_gradient(x0, |x| inner.cost(x), step, frozen)?;
        let cost_norm = gradient
            .iter()
            .zip(&variable_scale)
            .fold(0.0_f64, |acc, (g, d)| acc.max((g * d).abs()));
        let cost_scale = shrink(cost_norm);

        debug!(
            cost_scale,
            smallest_row_scale = row_scale.iter().copied().fold(1.0, f64::min),
            largest_variable_scale = variable_scale.iter().copied().fold(1.0, f64::max),
            "scaling factors"
        );
        Ok(Self::with_factors(inner, variable_scale, row_scale, cost_scale))
    }

    fn with_factors(
        inner: &'a dyn NlpProblem,
        variable_scale: Vec<f64>,
        row_scale: Vec<f64>,
        cost_scale: f64,
    ) -> Self {
        let divide = |bounds: &[f64]| -> Vec<f64> {
            bounds.iter().zip(&variable_scale).map(|(b, d)| b / d).collect()
        };
        let multiply = |bounds: &[f64]| -> Vec<f64> {
            bounds.iter().zip(&row_scale).map(|(b, s)| b * s).collect()
        };
        let lower = divide(inner.variable_lower());
        let upper = divide(inner.variable_upper());
        let row_lower = multiply(inner.constraint_lower());
        let row_upper = multiply(inner.constraint_upper());
        Self {
            inner,
            variable_scale,
            row_scale,
            cost_scale,
            lower,
            upper,
            row_lower,
            row_upper,
        }
    }

    pub fn cost_scale(&self) -> f64 {
        self.cost_scale
    }

    pub fn to_scaled(&self, x: &[f64]) -> Vec<f64> {
        x.iter().zip(&self.variable_scale).map(|(v, d)| v / d).collect()
    }

    /// `x = d * y`; a `y` sitting on a scaled bound maps to the original bound exactly.
    pub fn to_original(&self, y: &[f64]) -> Vec<f64> {
        let lower = self.inner.variable_lower();
        let upper = self.inner.variable_upper();
        (0..y.len())
            .map(|j| {
                if y[j] == self.lower[j] {
                    lower[j]
                } else if y[j] == self.upper[j] {
                    upper[j]
                } else {
                    y[j] * self.variable_scale[j]
                }
            })
            .collect()
    }

    /// Original row values to scaled ones, in place.
    pub fn scale_rows(&self, values: &mut [f64]) {
        for (value, s) in values.iter_mut().zip(&self.row_scale) {
            *value *= s;
        }
    }

    /// Multipliers of the original rows from those of the scaled rows.
    pub fn original_multipliers(&self, lambda: &[f64]) -> Vec<f64> {
        lambda
            .iter()
            .zip(&self.row_scale)
            .map(|(l, s)| l * s / self.cost_scale)
            .collect()
    }
}

impl NlpProblem for ScaledProblem<'_> {
    fn num_variables(&self) -> usize {
        self.inner.num_variables()
    }

    fn num_constraints(&self) -> usize {
        self.inner.num_constraints()
    }

    fn variable_lower(&self) -> &[f64] {
        &self.lower
    }

    fn variable_upper(&self) -> &[f64] {
        &self.upper
    }

    fn constraint_lower(&self) -> &[f64] {
        &self.row_lower
    }

    fn constraint_upper(&self) -> &[f64] {
        &self.row_upper
    }

    fn cost(&self, y: &[f64]) -> DcResult<f64> {
        Ok(self.cost_scale * self.inner.cost(&self.to_original(y))?)
    }

    fn constraints(&self, y: &[f64], out: &mut [f64]) -> DcResult<()> {
        self.inner.constraints(&self.to_original(y), out)?;
        self.scale_rows(out);
        Ok(())
    }

    fn constraint_jacobian(&self, y: &[f64], step: f64, frozen: &[bool]) -> DcResult<DMatrix<f64>> {
        let mut jac = self
            .inner
            .constraint_jacobian(&self.to_original(y), step, frozen)?;
        for j in 0..jac.ncols() {
            for i in 0..jac.nrows() {
                jac[(i, j)] *= self.row_scale[i] * self.variable_scale[j];
            }
        }
        Ok(jac)
    }

    fn lagrangian_hessian(
        &self,
        y: &[f64],
        weights: &[f64],
        frozen: &[bool],
    ) -> DcResult<DMatrix<f64>> {
        // s_c (f + sum_i (w_i s_i / s_c) g_i), then both sides by D
        let inner_weights: Vec<f64> = weights
            .iter()
            .zip(&self.row_scale)
            .map(|(w, s)| w * s / self.cost_scale)
            .collect();
        let mut hess = self
            .inner
            .lagrangian_hessian(&self.to_original(y), &inner_weights, frozen)?;
        let n = hess.nrows();
        for j in 0..n {
            for i in 0..n {
                hess[(i, j)] *= self.cost_scale * self.variable_scale[i] * self.variable_scale[j];
            }
        }
        Ok(hess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// min 1e3 x0 + x1  s.t.  500 <= 100 x0 + x1^2 <= inf
    struct Lopsided;

    impl NlpProblem for Lopsided {
        fn num_variables(&self) -> usize {
            2
        }
        fn num_constraints(&self) -> usize {
            1
        }
        fn variable_lower(&self) -> &[f64] {
            &[0.0, -100.0]
        }
        fn variable_upper(&self) -> &[f64] {
            &[10.0, 100.0]
        }
        fn constraint_lower(&self) -> &[f64] {
            &[500.0]
        }
        fn constraint_upper(&self) -> &[f64] {
            &[f64::INFINITY]
        }
        fn cost(&self, x: &[f64]) -> DcResult<f64> {
            Ok(1e3 * x[0] + x[1])
        }
        fn constraints(&self, x: &[f64], out: &mut [f64]) -> DcResult<()> {
            out[0] = 100.0 * x[0] + x[1] * x[1];
            Ok(())
        }
    }

    #[test]
    fn factors_normalise_rows_and_cost() {
        let x0 = [2.0, 20.0];
        let scaled = ScaledProblem::at(&Lopsided, &x0, 1e-6, &[false, false]).unwrap();

        // d = (2, 20); J D = (200, 800); grad f D = (2000, 20)
        assert_eq!(scaled.variable_lower(), &[0.0, -5.0]);
        assert!((scaled.constraint_lower()[0] - 500.0 / 800.0).abs() < 1e-9);
        assert_eq!(scaled.constraint_upper()[0], f64::INFINITY);
        assert!((scaled.cost_scale() - 1.0 / 2000.0).abs() < 1e-12);

        let jac = scaled
            .constraint_jacobian(&scaled.to_scaled(&x0), 1e-6, &[false, false])
            .unwrap();
        assert!((jac[(0, 0)] - 0.25).abs() < 1e-6);
        assert!((jac[(0, 1)] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn bounds_map_back_exactly() {
        let scaled = ScaledProblem::at(&Lopsided, &[3.0, 7.0], 1e-6, &[false, false]).unwrap();
        let y = [scaled.variable_upper()[0], scaled.variable_lower()[1]];
        assert_eq!(scaled.to_original(&y), vec![10.0, -100.0]);
        assert_eq!(scaled.to_original(&scaled.to_scaled(&[1.5, 0.0]))[1], 0.0);
    }

    #[test]
    fn hessian_and_multipliers_undo_the_factors() {
        let x0 = [2.0, 20.0];
        let scaled = ScaledProblem::at(&Lopsided, &x0, 1e-6, &[false, false]).unwrap();
        let y = scaled.to_scaled(&x0);

        // Original curvature of w g is 2 w in x1; scaled: s_c d1^2 * 2 (w s / s_c)
        let w = [3.0];
        let hess = scaled
            .lagrangian_hessian(&y, &w, &[false, false])
            .unwrap();
        let expected = 2.0 * 3.0 * (1.0 / 800.0) * 20.0 * 20.0;
        assert!((hess[(1, 1)] - expected).abs() < 1e-6 * expected);

        let lambda = scaled.original_multipliers(&[4.0]);
        assert!((lambda[0] - 4.0 * (1.0 / 800.0) * 2000.0).abs() < 1e-6);
    }

    #[test]
    fn identity_passes_through() {
        let scaled = ScaledProblem::identity(&Lopsided);
        let mut g = [0.0];
        scaled.constraints(&[1.0, 2.0], &mut g).unwrap();
        assert_eq!(g[0], 104.0);
        assert_eq!(scaled.cost(&[1.0, 2.0]).unwrap(), 1002.0);
        assert_eq!(scaled.original_multipliers(&[0.5]), vec![0.5]);
    }
}
