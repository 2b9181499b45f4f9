//! Direct-collocation transcription of optimal-control problems.
//!
//! A continuous-time problem is given by a [`Dynamics`] model, an
//! [`IntervalPlan`] (horizon, interval count, bounds and guesses) and an
//! [`ObjectivePolicy`]. [`transcribe`] turns these into a finite [`Nlp`];
//! [`solve`] hands it to any [`dc_solver::NlpSolver`] once and maps the result
//! back to state and control trajectories.

pub mod builder;
pub mod dynamics;
pub mod error;
pub mod extract;
pub mod nlp;
pub mod objective;
pub mod orchestrate;
pub mod plan;
pub mod transcribe;

pub use builder::{ConstraintBlock, ConstraintExpr, ConstraintKernel, NlpBuilder, VarRange};
pub use dynamics::{Dynamics, Evaluation, FnDynamics, evaluate_checked};
pub use error::{TranscribeError, TranscribeResult};
pub use extract::{IntervalLayout, Layout, Trajectories};
pub use nlp::Nlp;
pub use objective::{FnObjective, ObjectivePolicy, Sense, StageTerm, TerminalObjective};
pub use orchestrate::{SolveResult, solve};
pub use plan::{Bounds, IntervalBounds, IntervalPlan};
pub use transcribe::{TranscribeOptions, Transcription, expected_rows, transcribe};
