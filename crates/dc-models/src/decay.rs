//! First-order decay `dx/dt = -a x`.

use dc_core::{DcError, DcResult, Real};
use dc_transcribe::{Dynamics, Evaluation};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExponentialDecay {
    pub rate: Real,
}

impl ExponentialDecay {
    pub fn new(rate: Real) -> DcResult<Self> {
        if !rate.is_finite() {
            return Err(DcError::InvalidArg {
                what: "decay rate must be finite",
            });
        }
        Ok(Self { rate })
    }

    /// `x0 exp(-a t)`
    pub fn exact(&self, x0: Real, t: Real) -> Real {
        x0 * (-self.rate * t).exp()
    }
}

impl Default for ExponentialDecay {
    fn default() -> Self {
        Self { rate: 1.0 }
    }
}

impl Dynamics for ExponentialDecay {
    fn state_dim(&self) -> usize {
        1
    }

    fn control_dim(&self) -> usize {
        0
    }

    fn path_dim(&self) -> usize {
        0
    }

    fn eval(&self, state: &[Real], _control: &[Real]) -> DcResult<Evaluation> {
        Ok(Evaluation::derivative_only(vec![-self.rate * state[0]]))
    }
}
