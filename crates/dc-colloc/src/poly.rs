//! Dense univariate polynomials with real coefficients.

use std::ops::Mul;

/// Polynomial stored by ascending powers: `coeffs[k]` multiplies `x^k`.
///
/// The coefficient vector is never empty; the zero polynomial is `[0.0]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    coeffs: Vec<f64>,
}

impl Polynomial {
    pub fn new(coeffs: Vec<f64>) -> Self {
        if coeffs.is_empty() {
            Self::constant(0.0)
        } else {
            Self { coeffs }
        }
    }

    pub fn constant(c: f64) -> Self {
        Self { coeffs: vec![c] }
    }

    /// `x - root`
    pub fn monic_linear(root: f64) -> Self {
        Self {
            coeffs: vec![-root, 1.0],
        }
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Formal degree (length of the coefficient vector minus one).
    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    /// Horner evaluation.
    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self {
            coeffs: self.coeffs.iter().map(|c| c * factor).collect(),
        }
    }

    pub fn derivative(&self) -> Self {
        if self.coeffs.len() == 1 {
            return Self::constant(0.0);
        }
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, &c)| k as f64 * c)
            .collect();
        Self { coeffs }
    }

    /// Antiderivative with zero constant term.
    pub fn antiderivative(&self) -> Self {
        let mut coeffs = Vec::with_capacity(self.coeffs.len() + 1);
        coeffs.push(0.0);
        coeffs.extend(
            self.coeffs
                .iter()
                .enumerate()
                .map(|(k, &c)| c / (k + 1) as f64),
        );
        Self { coeffs }
    }

    /// Definite integral over `[a, b]`.
    pub fn integrate(&self, a: f64, b: f64) -> f64 {
        let anti = self.antiderivative();
        anti.eval(b) - anti.eval(a)
    }
}

impl Mul<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        let mut coeffs = vec![0.0; self.coeffs.len() + rhs.coeffs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in rhs.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Polynomial { coeffs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horner_matches_expansion() {
        // 1 + 2x + 3x^2
        let p = Polynomial::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(p.eval(0.0), 1.0);
        assert_eq!(p.eval(2.0), 17.0);
    }

    #[test]
    fn product_of_linear_factors() {
        let p = &Polynomial::monic_linear(1.0) * &Polynomial::monic_linear(-1.0);
        assert_eq!(p.coeffs(), &[-1.0, 0.0, 1.0]);
        assert_eq!(p.degree(), 2);
    }

    #[test]
    fn derivative_and_integral() {
        let p = Polynomial::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(p.derivative().coeffs(), &[2.0, 6.0]);
        // x + x^2 + x^3 on [0, 1]
        assert!((p.integrate(0.0, 1.0) - 3.0).abs() < 1e-15);
        assert_eq!(Polynomial::constant(5.0).derivative().coeffs(), &[0.0]);
    }

    #[test]
    fn empty_is_zero() {
        let p = Polynomial::new(vec![]);
        assert_eq!(p.eval(3.0), 0.0);
        assert_eq!(p.degree(), 0);
    }
}
