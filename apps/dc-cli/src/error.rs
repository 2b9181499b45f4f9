//! Error type for the command line front end.

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Problem file error: {0}")]
    Project(#[from] dc_project::ProjectError),

    #[error("Collocation error: {0}")]
    Collocation(#[from] dc_colloc::ColocError),

    #[error("Transcription error: {0}")]
    Transcribe(#[from] dc_transcribe::TranscribeError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] dc_sim::SimError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;
