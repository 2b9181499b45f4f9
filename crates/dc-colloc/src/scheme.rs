//! Collocation, continuity and quadrature coefficients.

use crate::error::{ColocError, ColocResult};
use crate::nodes::NodeScheme;
use crate::poly::Polynomial;
use nalgebra::DMatrix;

/// Nodes closer than this are treated as coincident.
const MIN_NODE_SEPARATION: f64 = 1e-10;

/// Immutable coefficient set for one collocation degree.
///
/// Built once and shared by reference across any number of transcriptions.
#[derive(Clone, Debug)]
pub struct CollocationScheme {
    degree: usize,
    node_scheme: NodeScheme,
    nodes: Vec<f64>,
    basis: Vec<Polynomial>,
    c: DMatrix<f64>,
    d: Vec<f64>,
    b: Vec<f64>,
}

impl CollocationScheme {
    /// Build the Lagrange basis over `0` followed by the `degree` points of `scheme`.
    pub fn build(degree: usize, scheme: &NodeScheme) -> ColocResult<Self> {
        if degree == 0 {
            return Err(ColocError::InvalidDegree { degree });
        }
        let points = scheme.points(degree)?;
        for (index, &value) in points.iter().enumerate() {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ColocError::NodeOutOfRange { index, value });
            }
        }

        let mut nodes = Vec::with_capacity(degree + 1);
        nodes.push(0.0);
        nodes.extend(points);
        check_distinct(&nodes)?;

        let basis: Vec<Polynomial> = (0..=degree).map(|j| lagrange_basis(&nodes, j)).collect();

        let mut c = DMatrix::zeros(degree + 1, degree + 1);
        let mut d = Vec::with_capacity(degree + 1);
        let mut b = Vec::with_capacity(degree + 1);
        for (j, p) in basis.iter().enumerate() {
            d.push(p.eval(1.0));
            let pder = p.derivative();
            for (r, &tau) in nodes.iter().enumerate() {
                c[(j, r)] = pder.eval(tau);
            }
            b.push(p.integrate(0.0, 1.0));
        }

        tracing::debug!(
            degree,
            scheme = scheme.as_str(),
            continuity_sum = d.iter().sum::<f64>(),
            "built collocation scheme"
        );

        Ok(Self {
            degree,
            node_scheme: scheme.clone(),
            nodes,
            basis,
            c,
            d,
            b,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn node_scheme(&self) -> &NodeScheme {
        &self.node_scheme
    }

    /// `d + 1` nodes, `nodes()[0] == 0`.
    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    /// Lagrange polynomial that is one at node `j` and zero at the others.
    pub fn basis(&self, j: usize) -> &Polynomial {
        &self.basis[j]
    }

    /// Collocation matrix; `c()[(j, r)]` is the derivative of basis `j` at node `r`.
    pub fn c(&self) -> &DMatrix<f64> {
        &self.c
    }

    /// Continuity coefficients; basis polynomials evaluated at `1`.
    pub fn d(&self) -> &[f64] {
        &self.d
    }

    /// Quadrature weights; basis polynomials integrated over `[0, 1]`.
    pub fn b(&self) -> &[f64] {
        &self.b
    }

    /// Evaluate the interpolant through `values` (one per node) at `tau`.
    pub fn interpolate(&self, values: &[f64], tau: f64) -> f64 {
        self.basis
            .iter()
            .zip(values)
            .map(|(p, v)| v * p.eval(tau))
            .sum()
    }
}

fn check_distinct(nodes: &[f64]) -> ColocResult<()> {
    for first in 0..nodes.len() {
        for second in first + 1..nodes.len() {
            if (nodes[first] - nodes[second]).abs() <= MIN_NODE_SEPARATION {
                return Err(ColocError::DuplicateNodes {
                    first,
                    second,
                    value: nodes[second],
                });
            }
        }
    }
    Ok(())
}

/// Product of `(tau - tau_r) / (tau_j - tau_r)` over `r != j`. Nodes must be distinct.
fn lagrange_basis(nodes: &[f64], j: usize) -> Polynomial {
    let mut p = Polynomial::constant(1.0);
    for (r, &tau_r) in nodes.iter().enumerate() {
        if r != j {
            let factor = Polynomial::monic_linear(tau_r).scale(1.0 / (nodes[j] - tau_r));
            p = &p * &factor;
        }
    }
    p
}
