//! One solver call on a finished transcription.

use crate::error::{TranscribeError, TranscribeResult};
use crate::extract::Trajectories;
use crate::transcribe::Transcription;
use dc_core::Real;
use dc_solver::{Diagnostics, NlpProblem, NlpSolver, SolverOptions};
use tracing::{info, warn};

/// Solver output mapped back onto the transcription.
#[derive(Clone, Debug)]
pub struct SolveResult {
    /// Final decision vector, in transcription order
    pub primal: Vec<Real>,
    /// One multiplier per constraint row
    pub multipliers: Vec<Real>,
    /// As reported by the solver. A `false` primal may be infeasible.
    pub converged: bool,
    pub diagnostics: Diagnostics,
    pub trajectories: Trajectories,
    /// Objective at `primal`, in the user's sense
    pub objective: Real,
}

/// Hand the program and its guess to `solver` once and extract the result.
///
/// Bounds are not touched and nothing is retried. Non-convergence is reported
/// in [`SolveResult::converged`], not as an error.
pub fn solve(
    transcription: Transcription<'_>,
    solver: &dyn NlpSolver,
    options: &SolverOptions,
) -> TranscribeResult<SolveResult> {
    let (nlp, guess) = transcription.into_parts();
    info!(
        solver = solver.name(),
        variables = nlp.num_variables(),
        constraints = nlp.num_constraints(),
        max_iterations = options.max_iterations,
        "solving transcribed program"
    );

    let solution = solver.solve(&nlp, &guess, options)?;
    if !solution.converged {
        warn!(
            status = %solution.diagnostics.status,
            iterations = solution.diagnostics.iterations,
            violation = solution.diagnostics.constraint_violation,
            "solver did not converge; returning its last iterate"
        );
    }

    let trajectories = nlp.layout().extract(&solution.x)?;
    let objective = nlp
        .objective(&solution.x)
        .map_err(|source| TranscribeError::InvalidObjective { source })?;
    info!(
        converged = solution.converged,
        objective,
        iterations = solution.diagnostics.iterations,
        "solve finished"
    );

    Ok(SolveResult {
        primal: solution.x,
        multipliers: solution.multipliers,
        converged: solution.converged,
        diagnostics: solution.diagnostics,
        trajectories,
        objective,
    })
}
