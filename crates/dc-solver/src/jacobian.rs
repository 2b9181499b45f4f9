//! Finite difference derivatives.
//!
//! Jacobians and Hessians are taken over an explicit list of variable indices,
//! so a caller can restrict them to the variables a block of rows actually
//! reads. The rest of the point is held fixed.

use dc_core::DcResult;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

/// Relative step for second differences.
pub const SECOND_DIFFERENCE_STEP: f64 = 1e-4;

fn step_for(x: f64, epsilon: f64) -> f64 {
    epsilon * x.abs().max(1.0)
}

/// Indices whose `frozen` flag is unset.
pub fn free_indices(frozen: &[bool]) -> Vec<usize> {
    (0..frozen.len()).filter(|&j| !frozen[j]).collect()
}

/// Gradient of a scalar function by central differences.
pub fn central_difference_gradient<F>(
    x: &[f64],
    f: F,
    epsilon: f64,
    frozen: &[bool],
) -> DcResult<DVector<f64>>
where
    F: Fn(&[f64]) -> DcResult<f64>,
{
    let n = x.len();
    let mut grad = DVector::zeros(n);
    let mut shifted = x.to_vec();

    for j in 0..n {
        if frozen[j] {
            continue;
        }
        let dx = step_for(x[j], epsilon);
        shifted[j] = x[j] + dx;
        let f_plus = f(&shifted)?;
        shifted[j] = x[j] - dx;
        let f_minus = f(&shifted)?;
        shifted[j] = x[j];
        grad[j] = (f_plus - f_minus) / (2.0 * dx);
    }

    Ok(grad)
}

/// Jacobian of a vector function by central differences, one column per task.
///
/// `f` writes `m` outputs for the given point. Column `a` of the result is the
/// derivative with respect to `x[columns[a]]`.
pub fn central_difference_jacobian<F>(
    x: &[f64],
    columns: &[usize],
    m: usize,
    f: F,
    epsilon: f64,
) -> DcResult<DMatrix<f64>>
where
    F: Fn(&[f64], &mut [f64]) -> DcResult<()> + Sync,
{
    let derivatives = columns
        .par_iter()
        .map(|&j| -> DcResult<Vec<f64>> {
            let dx = step_for(x[j], epsilon);
            let mut shifted = x.to_vec();

            shifted[j] = x[j] + dx;
            let mut f_plus = vec![0.0; m];
            f(&shifted, &mut f_plus)?;

            shifted[j] = x[j] - dx;
            let mut f_minus = vec![0.0; m];
            f(&shifted, &mut f_minus)?;

            Ok(f_plus
                .iter()
                .zip(&f_minus)
                .map(|(p, q)| (p - q) / (2.0 * dx))
                .collect())
        })
        .collect::<DcResult<Vec<_>>>()?;

    let mut jac = DMatrix::zeros(m, columns.len());
    for (a, column) in derivatives.into_iter().enumerate() {
        for (i, value) in column.into_iter().enumerate() {
            jac[(i, a)] = value;
        }
    }

    Ok(jac)
}

/// Hessian of a scalar function by forward second differences.
///
/// Entry `(a, b)` is the second derivative with respect to `x[indices[a]]`
/// and `x[indices[b]]`. Uses `k (k + 1) / 2 + k + 1` evaluations for `k`
/// indices, rows in parallel.
pub fn forward_difference_hessian<F>(
    x: &[f64],
    indices: &[usize],
    f: F,
    epsilon: f64,
) -> DcResult<DMatrix<f64>>
where
    F: Fn(&[f64]) -> DcResult<f64> + Sync,
{
    let k = indices.len();
    let f_x = f(x)?;
    let steps: Vec<f64> = indices.iter().map(|&i| step_for(x[i], epsilon)).collect();

    let f_single = (0..k)
        .into_par_iter()
        .map(|a| -> DcResult<f64> {
            let mut shifted = x.to_vec();
            shifted[indices[a]] += steps[a];
            f(&shifted)
        })
        .collect::<DcResult<Vec<_>>>()?;

    let rows = (0..k)
        .into_par_iter()
        .map(|a| -> DcResult<Vec<f64>> {
            let mut shifted = x.to_vec();
            let i = indices[a];
            let mut row = Vec::with_capacity(k - a);
            for b in a..k {
                let j = indices[b];
                shifted[i] += steps[a];
                shifted[j] += steps[b];
                let f_both = f(&shifted)?;
                shifted[i] = x[i];
                shifted[j] = x[j];
                row.push((f_both - f_single[a] - f_single[b] + f_x) / (steps[a] * steps[b]));
            }
            Ok(row)
        })
        .collect::<DcResult<Vec<_>>>()?;

    let mut hess = DMatrix::zeros(k, k);
    for (a, row) in rows.into_iter().enumerate() {
        for (offset, h) in row.into_iter().enumerate() {
            let b = a + offset;
            hess[(a, b)] = h;
            hess[(b, a)] = h;
        }
    }

    Ok(hess)
}

/// Add the `k x k` matrix `local`, indexed by `indices`, into `target`.
pub fn scatter_add(target: &mut DMatrix<f64>, indices: &[usize], local: &DMatrix<f64>) {
    for (a, &i) in indices.iter().enumerate() {
        for (b, &j) in indices.iter().enumerate() {
            target[(i, j)] += local[(a, b)];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jacobian_linear() {
        // f(x) = 2*x, J = 2
        let f = |x: &[f64], out: &mut [f64]| -> DcResult<()> {
            out[0] = 2.0 * x[0];
            Ok(())
        };

        let jac = central_difference_jacobian(&[3.0], &[0], 1, f, 1e-6).unwrap();

        assert!((jac[(0, 0)] - 2.0).abs() < 1e-8);
    }

    #[test]
    fn jacobian_over_selected_columns() {
        // f(x, y) = (x^2, x*y), J = [[2x, 0], [y, x]]; only the y column is taken
        let f = |x: &[f64], out: &mut [f64]| -> DcResult<()> {
            out[0] = x[0] * x[0];
            out[1] = x[0] * x[1];
            Ok(())
        };

        let jac = central_difference_jacobian(&[3.0, 2.0], &[1], 2, f, 1e-6).unwrap();

        assert_eq!(jac.shape(), (2, 1));
        assert_eq!(jac[(0, 0)], 0.0);
        assert!((jac[(1, 0)] - 3.0).abs() < 1e-6);
        assert_eq!(free_indices(&[false, true, false]), vec![0, 2]);
    }

    #[test]
    fn gradient_and_hessian_of_quadratic() {
        // f = x^2 + 3xy, grad = (2x + 3y, 3x), H = [[2, 3], [3, 0]]
        let f = |x: &[f64]| -> DcResult<f64> { Ok(x[0] * x[0] + 3.0 * x[0] * x[1]) };
        let x = [1.0, -2.0];

        let grad = central_difference_gradient(&x, f, 1e-6, &[false, false]).unwrap();
        assert!((grad[0] + 4.0).abs() < 1e-6);
        assert!((grad[1] - 3.0).abs() < 1e-6);

        let hess = forward_difference_hessian(&x, &[0, 1], f, SECOND_DIFFERENCE_STEP).unwrap();
        assert!((hess[(0, 0)] - 2.0).abs() < 1e-4);
        assert!((hess[(0, 1)] - 3.0).abs() < 1e-4);
        assert!(hess[(1, 1)].abs() < 1e-4);
    }

    #[test]
    fn partial_hessian_scatters_into_place() {
        // f = x0 * x2 over (x0, x2); x1 does not enter
        let f = |x: &[f64]| -> DcResult<f64> { Ok(x[0] * x[2]) };
        let local = forward_difference_hessian(&[1.0, 5.0, 2.0], &[0, 2], f, 1e-4).unwrap();

        let mut full = DMatrix::identity(3, 3);
        scatter_add(&mut full, &[0, 2], &local);
        assert!((full[(0, 2)] - 1.0).abs() < 1e-6);
        assert!((full[(2, 0)] - 1.0).abs() < 1e-6);
        assert_eq!(full[(1, 1)], 1.0);
        assert_eq!(full[(0, 1)], 0.0);
    }
}
