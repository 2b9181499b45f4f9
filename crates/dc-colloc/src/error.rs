//! Error types for collocation basis generation.

use thiserror::Error;

/// Malformed collocation input. Raised before any coefficient is computed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColocError {
    #[error("Invalid collocation degree {degree}: must be at least 1")]
    InvalidDegree { degree: usize },

    #[error("Expected {expected} collocation points, got {actual}")]
    NodeCountMismatch { expected: usize, actual: usize },

    #[error("Collocation point {index} = {value} lies outside (0, 1]")]
    NodeOutOfRange { index: usize, value: f64 },

    #[error("Collocation nodes {first} and {second} coincide (value {value})")]
    DuplicateNodes {
        first: usize,
        second: usize,
        value: f64,
    },

    #[error("Failed to generate {scheme} points of degree {degree}")]
    NodeGeneration { scheme: &'static str, degree: usize },
}

pub type ColocResult<T> = Result<T, ColocError>;
