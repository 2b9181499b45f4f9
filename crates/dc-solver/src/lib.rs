//! Nonlinear-program solver boundary and a built-in augmented-Lagrangian backend.
//!
//! Problems are presented through [`NlpProblem`]: box-bounded variables, a
//! scalar cost to minimise, and constraint rows `lower <= g(x) <= upper`.
//! Derivatives default to finite differences, so a problem only has to
//! evaluate values; large structured problems supply their own Jacobian and
//! Lagrangian Hessian through the same trait.
//!
//! Any backend implementing [`NlpSolver`] can stand in for
//! [`AugmentedLagrangian`]. Failing to converge is reported through
//! [`SolveStatus`], never as an error.

pub mod augmented;
pub mod error;
pub mod jacobian;
pub mod options;
pub mod problem;
pub mod projected;
pub mod scaling;
pub mod solution;

pub use augmented::AugmentedLagrangian;
pub use error::{SolverError, SolverResult};
pub use options::SolverOptions;
pub use problem::{NlpProblem, NlpSolver, bound_violation, validate_problem};
pub use scaling::ScaledProblem;
pub use solution::{Diagnostics, NlpSolution, SolveStatus};
