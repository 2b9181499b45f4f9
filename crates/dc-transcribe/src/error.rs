//! Error types for transcription and solve orchestration.

use dc_colloc::ColocError;
use dc_core::DcError;
use dc_solver::SolverError;
use thiserror::Error;

/// Errors that abort transcription or a solve.
///
/// Solver non-convergence is not among them; it is reported through
/// [`crate::SolveResult::converged`].
#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("Invalid interval plan: {what}")]
    InvalidPlan { what: String },

    #[error("{what} {index} has lower bound {lower} above upper bound {upper}")]
    InvertedBound {
        what: &'static str,
        index: usize,
        lower: f64,
        upper: f64,
    },

    #[error("Invalid model evaluation at constraint row {row}: {source}")]
    InvalidEvaluation { row: usize, source: DcError },

    #[error("Invalid model evaluation in objective: {source}")]
    InvalidObjective { source: DcError },

    #[error("Collocation error: {0}")]
    Colloc(#[from] ColocError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Core(#[from] DcError),
}

pub type TranscribeResult<T> = Result<T, TranscribeError>;
