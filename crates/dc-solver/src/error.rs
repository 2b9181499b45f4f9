//! Error types for solver operations.

use dc_core::DcError;
use thiserror::Error;

/// Errors that stop a solve before or while it runs.
///
/// Running out of iterations is not an error; see [`crate::SolveStatus`].
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Invalid solver option: {what}")]
    InvalidOption { what: String },

    #[error("Invalid model evaluation: {0}")]
    Evaluation(#[from] DcError),
}

pub type SolverResult<T> = Result<T, SolverError>;
