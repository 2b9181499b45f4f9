//! Collocation point families on the unit interval.

use crate::error::{ColocError, ColocResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const MAX_NEWTON_ITERS: usize = 100;
const ROOT_RESIDUAL_TOL: f64 = 1e-10;

/// Which `d` points on `(0, 1]` follow the interval start.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeScheme {
    /// Right Radau points (Radau IIA); the last point is exactly `1`.
    #[default]
    Radau,
    /// Gauss-Legendre points; all strictly inside `(0, 1)`.
    Legendre,
    /// Caller-supplied points. Validated by [`crate::CollocationScheme::build`].
    Custom { points: Vec<f64> },
}

impl NodeScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeScheme::Radau => "radau",
            NodeScheme::Legendre => "legendre",
            NodeScheme::Custom { .. } => "custom",
        }
    }

    /// The `degree` collocation points, without the leading `0`.
    pub fn points(&self, degree: usize) -> ColocResult<Vec<f64>> {
        match self {
            NodeScheme::Radau => radau_points(degree),
            NodeScheme::Legendre => legendre_points(degree),
            NodeScheme::Custom { points } => {
                if points.len() != degree {
                    return Err(ColocError::NodeCountMismatch {
                        expected: degree,
                        actual: points.len(),
                    });
                }
                Ok(points.clone())
            }
        }
    }
}

/// Right Radau points on `(0, 1]`, ascending.
///
/// Roots of `P_d(t) - P_{d-1}(t)` on `[-1, 1]` mapped by `(1 + t) / 2`. The root
/// `t = 1` is exact; the interior ones are found by Newton iteration deflated
/// against the roots already located.
pub fn radau_points(degree: usize) -> ColocResult<Vec<f64>> {
    if degree == 0 {
        return Err(ColocError::InvalidDegree { degree });
    }
    let n = degree;
    let mut roots = vec![1.0];
    for i in 1..n {
        let mut x = (2.0 * PI * i as f64 / (2 * n - 1) as f64).cos();
        for _ in 0..MAX_NEWTON_ITERS {
            let (p, dp) = radau_residual(n, x);
            let deflation: f64 = roots.iter().map(|r| 1.0 / (x - r)).sum();
            let dx = -p / (dp - p * deflation);
            x += dx;
            if dx.abs() <= 4.0 * f64::EPSILON {
                break;
            }
        }
        let (p, _) = radau_residual(n, x);
        if !x.is_finite() || x <= -1.0 || x >= 1.0 || p.abs() > ROOT_RESIDUAL_TOL {
            return Err(ColocError::NodeGeneration {
                scheme: "radau",
                degree,
            });
        }
        roots.push(x);
    }
    let mut points: Vec<f64> = roots.iter().map(|t| 0.5 * (1.0 + t)).collect();
    points.sort_by(|a, b| a.total_cmp(b));
    Ok(points)
}

/// Gauss-Legendre points on `(0, 1)`, ascending.
pub fn legendre_points(degree: usize) -> ColocResult<Vec<f64>> {
    if degree == 0 {
        return Err(ColocError::InvalidDegree { degree });
    }
    let n = degree;
    let m = n.div_ceil(2);
    let mut points = vec![0.0; n];
    for i in 0..m {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..MAX_NEWTON_ITERS {
            let (p, dp) = legendre(n, x);
            let dx = -p / dp;
            x += dx;
            if dx.abs() <= 4.0 * f64::EPSILON {
                break;
            }
        }
        let (p, _) = legendre(n, x);
        if !x.is_finite() || p.abs() > ROOT_RESIDUAL_TOL {
            return Err(ColocError::NodeGeneration {
                scheme: "legendre",
                degree,
            });
        }
        let t = 0.5 * (x + 1.0);
        points[i] = t;
        points[n - i - 1] = 1.0 - t;
    }
    points.sort_by(|a, b| a.total_cmp(b));
    Ok(points)
}

fn radau_residual(n: usize, x: f64) -> (f64, f64) {
    let (pn, dpn) = legendre(n, x);
    let (pm, dpm) = legendre(n - 1, x);
    (pn - pm, dpn - dpm)
}

/// `(P_n(x), P_n'(x))` by the three-term recurrence. Valid for `|x| < 1`.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }
    let mut p0 = 1.0;
    let mut p1 = x;
    if n == 1 {
        return (p1, 1.0);
    }
    for k in 2..=n {
        let kf = k as f64;
        let pn = ((2.0 * kf - 1.0) * x * p1 - (kf - 1.0) * p0) / kf;
        p0 = p1;
        p1 = pn;
    }
    let dp = (n as f64) * (x * p1 - p0) / (x * x - 1.0);
    (p1, dp)
}
