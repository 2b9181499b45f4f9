//! Problem file validation.

use crate::compile::{build_dynamics, build_plan};
use crate::schema::{LATEST_VERSION, ModelDef, ObjectiveDef, ProblemFile};
use dc_colloc::{ColocError, CollocationScheme};
use dc_core::DcError;
use dc_solver::SolverError;
use dc_transcribe::TranscribeError;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Dimension mismatch for {field}: expected {expected}, got {actual}")]
    DimensionMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Invalid model: {0}")]
    Model(#[from] DcError),

    #[error("Invalid collocation: {0}")]
    Collocation(#[from] ColocError),

    #[error("Invalid bounds: {0}")]
    Plan(#[from] TranscribeError),

    #[error("Invalid solver options: {0}")]
    Solver(#[from] SolverError),
}

/// Check everything that would otherwise fail during transcription.
pub fn validate_problem(problem: &ProblemFile) -> Result<(), ValidationError> {
    if problem.version == 0 || problem.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: problem.version,
        });
    }

    if problem.name.trim().is_empty() {
        return Err(invalid("name", "\"\"", "must not be empty"));
    }
    if !(problem.horizon.is_finite() && problem.horizon > 0.0) {
        return Err(invalid(
            "horizon",
            problem.horizon,
            "must be positive and finite",
        ));
    }
    if problem.intervals == 0 {
        return Err(invalid("intervals", 0, "at least one interval is required"));
    }

    CollocationScheme::build(problem.collocation.degree, &problem.collocation.nodes)?;

    let dynamics = build_dynamics(&problem.model)?;
    let nd = dynamics.state_dim();
    let nu = dynamics.control_dim();

    match &problem.objective {
        ObjectiveDef::Terminal { weights, .. } => {
            if weights.len() != nd {
                return Err(ValidationError::DimensionMismatch {
                    field: "objective.weights".to_string(),
                    expected: nd,
                    actual: weights.len(),
                });
            }
            if let Some(i) = weights.iter().position(|w| !w.is_finite()) {
                return Err(invalid(
                    &format!("objective.weights[{i}]"),
                    weights[i],
                    "must be finite",
                ));
            }
        }
        ObjectiveDef::Lutein(objective) => {
            if !matches!(problem.model, ModelDef::Lutein { .. }) {
                return Err(invalid(
                    "objective.type",
                    "lutein",
                    &format!("requires the lutein model, found {}", problem.model.kind()),
                ));
            }
            let scales = [
                objective.lutein_weight,
                objective.nitrate_weight,
                objective.feed_move_scale,
                objective.light_move_scale,
            ];
            if scales.iter().any(|v| !v.is_finite()) {
                return Err(invalid(
                    "objective",
                    format!("{scales:?}"),
                    "weights and move scales must be finite",
                ));
            }
        }
    }

    build_plan(problem).validate(nd, nu)?;
    problem.solver.validate()?;

    if problem.warm_start.is_some_and(|warm| warm.substeps == 0) {
        return Err(invalid("warm_start.substeps", 0, "must be positive"));
    }

    Ok(())
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
