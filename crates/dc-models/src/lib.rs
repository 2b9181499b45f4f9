//! Concrete models for collocation problems.
//!
//! - [`LuteinModel`] / [`LuteinObjective`]: fed-batch lutein photobioreactor
//! - [`ExponentialDecay`]: `dx/dt = -a x`, a reference problem with a known answer

pub mod decay;
pub mod lutein;

pub use decay::ExponentialDecay;
pub use lutein::{LuteinLimits, LuteinModel, LuteinObjective, LuteinParams};
