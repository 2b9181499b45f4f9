//! Forward simulation for collocation problems.
//!
//! Provides:
//! - fixed-step RK4 and forward Euler integrators over a `Dynamics` model
//! - rollouts under piecewise-constant controls
//! - a rollout check of solved trajectories
//! - rollout-based warm starts for interval plans

pub mod error;
pub mod integrator;
pub mod rollout;
pub mod warm;

pub use error::{SimError, SimResult};
pub use integrator::{ForwardEuler, Integrator, IntegratorType, Rk4, integrate};
pub use rollout::{Rollout, RolloutOptions, rollout, rollout_mismatch};
pub use warm::warm_start;
