//! Forward simulation under piecewise-constant controls.

use crate::error::{SimError, SimResult};
use crate::integrator::{IntegratorType, integrate};
use dc_core::Real;
use dc_transcribe::{Dynamics, Trajectories};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Options for rollouts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutOptions {
    /// Integration steps per interval (or per collocation sub-interval)
    pub substeps: usize,
    pub integrator: IntegratorType,
}

impl Default for RolloutOptions {
    fn default() -> Self {
        Self {
            substeps: 20,
            integrator: IntegratorType::default(),
        }
    }
}

/// States at interval boundaries.
#[derive(Clone, Debug, PartialEq)]
pub struct Rollout {
    /// `t_k = k h`
    pub times: Vec<Real>,
    /// `state_dim x (N + 1)`
    pub states: DMatrix<Real>,
}

/// Integrate from `x0` holding `controls[k]` over `[k h, (k + 1) h)`.
pub fn rollout(
    dynamics: &dyn Dynamics,
    x0: &[Real],
    controls: &[Vec<Real>],
    width: Real,
    options: &RolloutOptions,
) -> SimResult<Rollout> {
    if !(width.is_finite() && width > 0.0) {
        return Err(SimError::InvalidArg {
            what: "interval width must be positive",
        });
    }
    if options.substeps == 0 {
        return Err(SimError::InvalidArg {
            what: "substeps must be positive",
        });
    }
    if x0.len() != dynamics.state_dim() {
        return Err(SimError::InvalidArg {
            what: "initial state length differs from model state dimension",
        });
    }

    let mut states = DMatrix::zeros(x0.len(), controls.len() + 1);
    states.column_mut(0).copy_from_slice(x0);
    let mut x = x0.to_vec();
    for (k, u) in controls.iter().enumerate() {
        x = integrate(&options.integrator, dynamics, &x, u, width, options.substeps)
            .map_err(|source| SimError::Evaluation {
                interval: k,
                source,
            })?;
        states.column_mut(k + 1).copy_from_slice(&x);
    }

    Ok(Rollout {
        times: (0..=controls.len()).map(|k| k as Real * width).collect(),
        states,
    })
}

/// Largest relative gap between collocated and re-simulated boundary states.
///
/// The optimal controls are replayed from the first state column; each gap is
/// scaled by `max(1, |x|)` of the collocated value.
pub fn rollout_mismatch(
    dynamics: &dyn Dynamics,
    trajectories: &Trajectories,
    options: &RolloutOptions,
) -> SimResult<Real> {
    let n = trajectories.num_intervals();
    if n == 0 {
        return Ok(0.0);
    }
    let width = trajectories.times[1] - trajectories.times[0];
    let x0: Vec<Real> = trajectories.states.column(0).iter().copied().collect();
    let replay = rollout(
        dynamics,
        &x0,
        &trajectories.control_sequence(),
        width,
        options,
    )?;

    Ok(trajectories
        .states
        .iter()
        .zip(replay.states.iter())
        .fold(0.0, |acc, (collocated, simulated)| {
            acc.max((collocated - simulated).abs() / collocated.abs().max(1.0))
        }))
}
