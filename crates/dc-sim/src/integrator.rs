//! Fixed-step integrators over a [`Dynamics`] model with a held control.

use dc_core::{DcResult, Real, ensure_all_finite};
use dc_transcribe::{Dynamics, evaluate_checked};
use serde::{Deserialize, Serialize};

/// One explicit step `x(t) -> x(t + dt)` with the control held constant.
pub trait Integrator {
    fn step(
        &self,
        dynamics: &dyn Dynamics,
        x: &[Real],
        u: &[Real],
        dt: Real,
    ) -> DcResult<Vec<Real>>;
}

fn axpy(x: &[Real], a: Real, k: &[Real]) -> Vec<Real> {
    x.iter().zip(k).map(|(xi, ki)| xi + a * ki).collect()
}

fn derivative(dynamics: &dyn Dynamics, x: &[Real], u: &[Real]) -> DcResult<Vec<Real>> {
    Ok(evaluate_checked(dynamics, x, u)?.derivative)
}

/// Classical fourth-order Runge-Kutta.
#[derive(Clone, Copy, Debug)]
pub struct Rk4;

impl Integrator for Rk4 {
    fn step(
        &self,
        dynamics: &dyn Dynamics,
        x: &[Real],
        u: &[Real],
        dt: Real,
    ) -> DcResult<Vec<Real>> {
        let k1 = derivative(dynamics, x, u)?;
        let k2 = derivative(dynamics, &axpy(x, 0.5 * dt, &k1), u)?;
        let k3 = derivative(dynamics, &axpy(x, 0.5 * dt, &k2), u)?;
        let k4 = derivative(dynamics, &axpy(x, dt, &k3), u)?;

        let next: Vec<Real> = (0..x.len())
            .map(|i| x[i] + dt / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]))
            .collect();
        ensure_all_finite(&next, "integrated state")?;
        Ok(next)
    }
}

/// Explicit Euler; one derivative per step.
#[derive(Clone, Copy, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step(
        &self,
        dynamics: &dyn Dynamics,
        x: &[Real],
        u: &[Real],
        dt: Real,
    ) -> DcResult<Vec<Real>> {
        let next = axpy(x, dt, &derivative(dynamics, x, u)?);
        ensure_all_finite(&next, "integrated state")?;
        Ok(next)
    }
}

/// Integrator selection for rollouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorType {
    #[default]
    Rk4,
    ForwardEuler,
}

impl Integrator for IntegratorType {
    fn step(
        &self,
        dynamics: &dyn Dynamics,
        x: &[Real],
        u: &[Real],
        dt: Real,
    ) -> DcResult<Vec<Real>> {
        match self {
            IntegratorType::Rk4 => Rk4.step(dynamics, x, u, dt),
            IntegratorType::ForwardEuler => ForwardEuler.step(dynamics, x, u, dt),
        }
    }
}

/// Advance `x` over `duration` in `steps` equal steps.
pub fn integrate(
    integrator: &dyn Integrator,
    dynamics: &dyn Dynamics,
    x: &[Real],
    u: &[Real],
    duration: Real,
    steps: usize,
) -> DcResult<Vec<Real>> {
    let dt = duration / steps.max(1) as Real;
    let mut state = x.to_vec();
    for _ in 0..steps.max(1) {
        state = integrator.step(dynamics, &state, u, dt)?;
    }
    Ok(state)
}
