//! dc-project: problem file format, validation and compilation.

pub mod compile;
pub mod schema;
pub mod validate;

pub use compile::{CompiledProblem, compile};
pub use schema::*;
pub use validate::{ValidationError, validate_problem};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Warm start failed: {0}")]
    Simulation(#[from] dc_sim::SimError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<ProblemFile> {
    let content = std::fs::read_to_string(path)?;
    let problem: ProblemFile = serde_yaml::from_str(&content)?;
    validate_problem(&problem)?;
    Ok(problem)
}

pub fn save_yaml(path: &std::path::Path, problem: &ProblemFile) -> ProjectResult<()> {
    validate_problem(problem)?;
    let content = serde_yaml::to_string(problem)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<ProblemFile> {
    let content = std::fs::read_to_string(path)?;
    let problem: ProblemFile = serde_json::from_str(&content)?;
    validate_problem(&problem)?;
    Ok(problem)
}

/// Load by extension: `.json` as JSON, anything else as YAML.
pub fn load(path: &std::path::Path) -> ProjectResult<ProblemFile> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => load_json(path),
        _ => load_yaml(path),
    }
}
