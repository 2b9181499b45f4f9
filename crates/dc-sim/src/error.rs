//! Error types for simulation operations.

use dc_core::DcError;
use dc_transcribe::TranscribeError;
use thiserror::Error;

/// Errors encountered during forward simulation.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Model evaluation failed in interval {interval}: {source}")]
    Evaluation { interval: usize, source: DcError },

    #[error("Invalid plan: {0}")]
    Plan(#[from] TranscribeError),
}

pub type SimResult<T> = Result<T, SimError>;
